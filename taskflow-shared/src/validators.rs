/// Field validators
///
/// Pure, side-effect-free checks used by the services before anything is
/// written to storage. None of these functions panic or return errors;
/// malformed input simply yields `false` (or `None` for `sanitize`).
///
/// # Example
///
/// ```
/// use taskflow_shared::validators::{is_valid_email, sanitize};
///
/// assert!(is_valid_email("ana@example.com"));
/// assert_eq!(sanitize(Some("  Ana  ")).as_deref(), Some("Ana"));
/// ```

use crate::models::{task::Priority, user::Role};
use regex::Regex;
use std::sync::LazyLock;

/// `local@domain.tld`, with a purely alphabetic TLD of at least two letters
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

/// Returns true if `email` is non-empty and looks like `local@domain.tld`
pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && EMAIL_PATTERN.is_match(email)
}

/// Returns true if `text` is present and not blank after trimming
pub fn is_nonempty_string(text: Option<&str>) -> bool {
    text.is_some_and(|t| !t.trim().is_empty())
}

/// Returns true if `priority` names a known priority (case-insensitive)
pub fn is_valid_priority(priority: &str) -> bool {
    priority.parse::<Priority>().is_ok()
}

/// Returns true if `role` names a known role (case-insensitive)
pub fn is_valid_role(role: &str) -> bool {
    role.parse::<Role>().is_ok()
}

/// Trims surrounding whitespace
///
/// Returns `None` when the input is absent or empty. A whitespace-only
/// string is *not* empty, so it trims down to `Some("")`; pair this with
/// [`is_nonempty_string`] when blank values must be rejected.
pub fn sanitize(text: Option<&str>) -> Option<String> {
    match text {
        Some(t) if !t.is_empty() => Some(t.trim().to_string()),
        _ => None,
    }
}

/// Returns true if `value` parses as an integer greater than zero
pub fn is_positive_id(value: &str) -> bool {
    value.trim().parse::<i64>().is_ok_and(|id| id > 0)
}
