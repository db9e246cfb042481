//! `validate_json`: checks an agent instance document (the JSON an author
//! would feed a compiled agent, as opposed to the ADL source that defines
//! its shape) against the well-known field-length bounds — `description`
//! (1..5000 chars) and `owner` (1..100 chars) — without needing a full JSON
//! Schema validator dependency.

use serde_json::Value;

use crate::error::{Code, Diagnostic};
use crate::location::SourceLocation;

const DESCRIPTION_BOUNDS: (usize, usize) = (1, 5000);
const OWNER_BOUNDS: (usize, usize) = (1, 100);

/// Validates the well-known string fields of an agent instance document.
/// Fields absent from `instance` are not checked (presence/requiredness is
/// the JSON Schema emitter's concern, not this function's).
pub fn validate_json(instance: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_bounds(instance, "description", DESCRIPTION_BOUNDS, &mut diagnostics);
    check_bounds(instance, "owner", OWNER_BOUNDS, &mut diagnostics);
    diagnostics
}

fn check_bounds(
    instance: &Value,
    field: &str,
    (min, max): (usize, usize),
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(value) = instance.get(field).and_then(Value::as_str) else {
        return;
    };
    let len = value.chars().count();
    if len < min {
        diagnostics.push(Diagnostic::new(
            Code::StringTooShort,
            format!("`{}` must be at least {} character(s), got {}", field, min, len),
            SourceLocation::dummy(),
        ));
    } else if len > max {
        diagnostics.push(Diagnostic::new(
            Code::StringTooLong,
            format!("`{}` must be at most {} character(s), got {}", field, max, len),
            SourceLocation::dummy(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_description_is_too_short() {
        let instance = json!({"description": ""});
        let diagnostics = validate_json(&instance);
        assert!(diagnostics.iter().any(|d| d.code == Code::StringTooShort));
    }

    #[test]
    fn long_owner_is_too_long() {
        let instance = json!({"owner": "x".repeat(101)});
        let diagnostics = validate_json(&instance);
        assert!(diagnostics.iter().any(|d| d.code == Code::StringTooLong));
    }

    #[test]
    fn well_formed_fields_pass() {
        let instance = json!({"description": "a well-formed agent", "owner": "platform-team"});
        let diagnostics = validate_json(&instance);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn absent_fields_are_not_checked() {
        let instance = json!({});
        let diagnostics = validate_json(&instance);
        assert!(diagnostics.is_empty());
    }
}
