//! SQL identifier sanitization
//!
//! Column names come from typed fields and table names from entity
//! definitions, so they are quoted rather than trusted. Names supplied at
//! runtime (the configured schema) are validated as well.

use std::sync::LazyLock;

use regex::Regex;

static IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("identifier pattern is valid"));

/// PostgreSQL reserved keywords that cannot be used as unquoted identifiers
pub const POSTGRES_RESERVED_WORDS: &[&str] = &[
    "ALL",
    "ANALYSE",
    "ANALYZE",
    "AND",
    "ANY",
    "ARRAY",
    "AS",
    "ASC",
    "ASYMMETRIC",
    "BOTH",
    "CASE",
    "CAST",
    "CHECK",
    "COLLATE",
    "COLUMN",
    "CONSTRAINT",
    "CREATE",
    "CURRENT_CATALOG",
    "CURRENT_DATE",
    "CURRENT_ROLE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "DEFAULT",
    "DEFERRABLE",
    "DESC",
    "DISTINCT",
    "DO",
    "ELSE",
    "END",
    "EXCEPT",
    "FALSE",
    "FETCH",
    "FOR",
    "FOREIGN",
    "FROM",
    "GRANT",
    "GROUP",
    "HAVING",
    "IN",
    "INITIALLY",
    "INTERSECT",
    "INTO",
    "LATERAL",
    "LEADING",
    "LIMIT",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "NOT",
    "NULL",
    "OFFSET",
    "ON",
    "ONLY",
    "OR",
    "ORDER",
    "PLACING",
    "PRIMARY",
    "REFERENCES",
    "RETURNING",
    "SELECT",
    "SESSION_USER",
    "SOME",
    "SYMMETRIC",
    "TABLE",
    "THEN",
    "TO",
    "TRAILING",
    "TRUE",
    "UNION",
    "UNIQUE",
    "USER",
    "USING",
    "VARIADIC",
    "WHEN",
    "WHERE",
    "WINDOW",
    "WITH",
];

/// Quote a SQL identifier, doubling any embedded double quotes
///
/// # Example
/// ```
/// use criteria_dsl::sql::quote_identifier;
///
/// assert_eq!(quote_identifier("tv_show"), "\"tv_show\"");
/// assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    let escaped = identifier.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Validate a schema or table name supplied at runtime
///
/// Rules:
/// - Must start with a lowercase letter or underscore
/// - Can only contain lowercase letters, numbers, and underscores
/// - Cannot be a PostgreSQL reserved word
///
/// # Example
/// ```
/// use criteria_dsl::sql::validate_identifier;
///
/// assert!(validate_identifier("media").is_ok());
/// assert!(validate_identifier("select").is_err());
/// assert!(validate_identifier("Media").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if !IDENTIFIER_PATTERN.is_match(name) {
        return Err(format!(
            "Identifier '{}' is invalid. Must start with a lowercase letter or underscore and contain only lowercase letters, numbers, and underscores.",
            name
        ));
    }

    if POSTGRES_RESERVED_WORDS.contains(&name.to_uppercase().as_str()) {
        return Err(format!(
            "Identifier '{}' is a PostgreSQL reserved keyword and cannot be used.",
            name
        ));
    }

    Ok(())
}
