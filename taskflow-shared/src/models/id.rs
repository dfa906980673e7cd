/// Record identifiers
///
/// The in-memory backend hands out sequential integers; a remote table
/// store may use integer or UUID primary keys. `RecordId` covers both and
/// serializes as the bare JSON value (`7` or `"6f1c..."`).

use crate::validators::is_positive_id;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

/// Opaque identifier assigned by storage on insert
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Integer primary key
    Int(i64),

    /// UUID primary key
    Uuid(Uuid),
}

impl RecordId {
    /// Parses a path segment into an id
    ///
    /// Accepts a positive integer or a UUID. Anything else (zero, negative
    /// numbers, free text) yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if is_positive_id(raw) {
            return raw.parse().ok().map(RecordId::Int);
        }
        Uuid::parse_str(raw).ok().map(RecordId::Uuid)
    }

    /// Reads an id from a request body value
    ///
    /// Only a positive JSON integer or a UUID string qualifies; a numeric
    /// string such as `"1"` does not.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Number(n) => n.as_i64().filter(|id| *id > 0).map(RecordId::Int),
            JsonValue::String(s) => Uuid::parse_str(s.trim()).ok().map(RecordId::Uuid),
            _ => None,
        }
    }

    /// JSON value as stored in the record's key-value form
    pub fn to_json(&self) -> JsonValue {
        match self {
            RecordId::Int(id) => JsonValue::from(*id),
            RecordId::Uuid(id) => JsonValue::String(id.to_string()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Uuid(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        RecordId::Uuid(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_integer_and_uuid() {
        assert_eq!(RecordId::parse("12"), Some(RecordId::Int(12)));

        let uuid = Uuid::new_v4();
        assert_eq!(
            RecordId::parse(&uuid.to_string()),
            Some(RecordId::Uuid(uuid))
        );
    }

    #[test]
    fn test_parse_rejects_non_positive_and_text() {
        assert_eq!(RecordId::parse("0"), None);
        assert_eq!(RecordId::parse("-4"), None);
        assert_eq!(RecordId::parse("abc"), None);
        assert_eq!(RecordId::parse(""), None);
    }

    #[test]
    fn test_from_json_body_value() {
        assert_eq!(RecordId::from_json(&json!(4)), Some(RecordId::Int(4)));

        let uuid = Uuid::new_v4();
        assert_eq!(
            RecordId::from_json(&json!(uuid.to_string())),
            Some(RecordId::Uuid(uuid))
        );

        for bad in [json!("1"), json!(0), json!(-2), json!(1.5), json!(true), json!(null), json!([1])] {
            assert_eq!(RecordId::from_json(&bad), None, "{}", bad);
        }
    }

    #[test]
    fn test_serializes_as_bare_value() {
        assert_eq!(serde_json::to_value(RecordId::Int(3)).unwrap(), json!(3));

        let uuid = Uuid::new_v4();
        assert_eq!(
            serde_json::to_value(RecordId::Uuid(uuid)).unwrap(),
            json!(uuid.to_string())
        );
        assert_eq!(RecordId::Uuid(uuid).to_json(), json!(uuid.to_string()));
    }

    #[test]
    fn test_deserializes_either_shape() {
        let id: RecordId = serde_json::from_value(json!(9)).unwrap();
        assert_eq!(id, RecordId::Int(9));

        let uuid = Uuid::new_v4();
        let id: RecordId = serde_json::from_value(json!(uuid.to_string())).unwrap();
        assert_eq!(id, RecordId::Uuid(uuid));
    }
}
