//! SQL utility functions

/// Quote a value as a single-quoted SQL string literal
///
/// Embedded single quotes are doubled, so the result is always one literal.
///
/// # Example
///
/// ```
/// use airlens_server::utils::sql::quote_literal;
///
/// assert_eq!(quote_literal("it's"), "'it''s'");
/// ```
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote a value as a double-quoted SQL identifier
pub fn quote_identifier(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// True if `s` is safe to use as a bare column alias
pub fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
