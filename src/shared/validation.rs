use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for SQL identifiers we are willing to interpolate (after quoting)
    /// Lowercase, letter or underscore first, at most 63 bytes (Postgres NAMEDATALEN - 1)
    /// - Valid: "my_data", "_x", "col_2nd_col"
    /// - Invalid: "2nd", "My_Data", "a-b", "", "a\"b"
    pub static ref IDENTIFIER_REGEX: Regex = Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").unwrap();
}

/// Whether `name` is safe to place inside a double-quoted SQL identifier
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_REGEX.is_match(name)
}
