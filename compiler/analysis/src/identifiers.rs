//! C identifier checks for names that flow into generated code.

use std::sync::OnceLock;

use regex::Regex;

use crate::SchemaError;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
    })
}

/// Whether `name` is a valid C identifier
pub fn is_identifier(name: &str) -> bool { identifier_pattern().is_match(name) }

/// Fail with [`SchemaError::InvalidIdentifier`] unless `name` is a valid C identifier
pub fn ensure_identifier(what: &'static str, name: &str) -> Result<(), SchemaError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier { what, name: name.to_string() })
    }
}
