/// User model
///
/// Users are referenced by tasks through `usuario_id`. Field names on the
/// wire (HTTP and remote table store) are Spanish; Rust code
/// uses English identifiers.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     nombre TEXT NOT NULL,
///     email TEXT NOT NULL UNIQUE,
///     rol TEXT NOT NULL DEFAULT 'usuario'
/// );
/// ```

use super::{present, RecordId};
use crate::storage::Record;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

/// Field holding the user's email in the key-value form
pub const EMAIL_FIELD: &str = "email";

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    /// Full administrative access
    #[serde(rename = "administrador", alias = "administrator")]
    Administrator,

    /// Regular user
    #[default]
    #[serde(rename = "usuario", alias = "user")]
    User,
}

impl Role {
    /// Every role, in display order
    pub const ALL: [Role; 2] = [Role::Administrator, Role::User];

    /// Stored (lowercase) representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrador",
            Role::User => "usuario",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "administrador" | "administrator" => Ok(Role::Administrator),
            "usuario" | "user" => Ok(Role::User),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Stored user record, also the view returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Identifier assigned by storage
    pub id: RecordId,

    /// Display name (trimmed, never blank)
    #[serde(rename = "nombre")]
    pub name: String,

    /// Email address, unique among current users
    pub email: String,

    /// Role
    #[serde(rename = "rol", default)]
    pub role: Role,
}

/// Validated data for inserting a user
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "rol")]
    pub role: Role,
}

/// Validated partial update
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserChanges {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "rol", skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserChanges {
    /// True when nothing would be written
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.role.is_none()
    }
}

/// Raw create-user request body
///
/// Fields hold the JSON exactly as sent; the service decides what is
/// acceptable. A key sent as `null` is `Some(JsonValue::Null)`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(rename = "nombre", default, deserialize_with = "present")]
    pub name: Option<JsonValue>,

    #[serde(default, deserialize_with = "present")]
    pub email: Option<JsonValue>,

    /// Defaults to `usuario` when omitted
    #[serde(rename = "rol", default, deserialize_with = "present")]
    pub role: Option<JsonValue>,

    /// Unrecognised keys
    #[serde(flatten)]
    pub other: JsonMap<String, JsonValue>,
}

impl CreateUserRequest {
    /// True when the body carried no keys at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.role.is_none() && self.other.is_empty()
    }
}

/// Raw update-user request body
///
/// `None` means "leave unchanged". Any supplied value, `null` included,
/// must pass the same checks as on create.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(rename = "nombre", default, deserialize_with = "present")]
    pub name: Option<JsonValue>,

    #[serde(default, deserialize_with = "present")]
    pub email: Option<JsonValue>,

    #[serde(rename = "rol", default, deserialize_with = "present")]
    pub role: Option<JsonValue>,

    /// Unrecognised keys
    #[serde(flatten)]
    pub other: JsonMap<String, JsonValue>,
}

impl UpdateUserRequest {
    /// True when the body carried no keys at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.role.is_none() && self.other.is_empty()
    }
}

impl Record for User {
    const TABLE: &'static str = "users";

    type Draft = NewUser;
    type Patch = UserChanges;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: NewUser) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            role: draft.role,
        }
    }

    fn apply(&mut self, patch: UserChanges) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
    }
}
