//! Query builder helper functions.

use crate::{DataBridgeError, Result};
use unicode_normalization::UnicodeNormalization;

/// Maximum name length accepted by the store for keyspaces and tables.
const MAX_TABLE_NAME_LEN: usize = 48;

/// Reserved CQL keywords. These cannot be used unquoted as identifiers.
const CQL_RESERVED_KEYWORDS: &[&str] = &[
    "add", "allow", "alter", "and", "apply", "asc", "authorize", "batch", "begin", "by",
    "columnfamily", "create", "delete", "desc", "describe", "drop", "entries", "execute",
    "from", "full", "grant", "if", "in", "index", "infinity", "insert", "into", "keyspace",
    "limit", "modify", "nan", "norecursive", "not", "null", "of", "on", "or", "order",
    "primary", "rename", "replace", "revoke", "schema", "select", "set", "table", "to",
    "token", "truncate", "unlogged", "update", "use", "using", "where", "with",
];

/// Keyspaces owned by the store itself.
const SYSTEM_KEYSPACES: &[&str] = &[
    "system",
    "system_auth",
    "system_distributed",
    "system_schema",
    "system_traces",
    "system_views",
    "system_virtual_schema",
];

/// Wraps a single identifier segment.
///
/// The `*` wildcard passes through; embedded double quotes are doubled.
pub fn wrap_value(value: &str) -> String {
    if value == "*" {
        return value.to_string();
    }
    value.replace('"', "\"\"")
}

/// Wraps a possibly keyspace-qualified identifier, segment by segment.
pub fn wrap(name: &str) -> String {
    if name.contains('.') {
        name.split('.').map(wrap_value).collect::<Vec<_>>().join(".")
    } else {
        wrap_value(name)
    }
}

/// Wraps and joins a list of columns.
pub fn columnize<S: AsRef<str>>(columns: &[S]) -> String {
    columns
        .iter()
        .map(|c| wrap(c.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validates a table name, optionally qualified as `keyspace.table`.
pub fn validate_table(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DataBridgeError::Query("Table name cannot be empty".to_string()));
    }

    if name.contains('.') {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() != 2 {
            return Err(DataBridgeError::Query(format!(
                "Invalid qualified table '{}': must be in format 'keyspace.table'",
                name
            )));
        }

        let keyspace = parts[0].to_ascii_lowercase();
        if SYSTEM_KEYSPACES.contains(&keyspace.as_str()) {
            return Err(DataBridgeError::Query(format!(
                "Access to system keyspace '{}' is not allowed",
                parts[0]
            )));
        }

        for part in parts {
            validate_table_segment(part)?;
        }
        return Ok(());
    }

    validate_table_segment(name)
}

fn validate_table_segment(name: &str) -> Result<()> {
    validate_identifier(name)?;
    if name.len() > MAX_TABLE_NAME_LEN {
        return Err(DataBridgeError::Query(format!(
            "Name '{}' exceeds maximum length of {}",
            name, MAX_TABLE_NAME_LEN
        )));
    }
    Ok(())
}

/// Validates a column used in a projection; `*` is allowed.
pub fn validate_column(name: &str) -> Result<()> {
    if name == "*" {
        return Ok(());
    }
    validate_identifier(name)
}

/// Validates a single unqualified identifier.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DataBridgeError::Query("Identifier cannot be empty".to_string()));
    }

    // Compatibility forms (full-width letters, ligatures) would reach the CQL text as-is
    if !name.nfkc().eq(name.chars()) {
        return Err(DataBridgeError::Query(format!(
            "Identifier '{}' is not in NFKC normal form",
            name
        )));
    }

    let first_char = name.chars().next().ok_or_else(|| {
        DataBridgeError::Query(format!("Identifier '{}' is empty or invalid", name))
    })?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(DataBridgeError::Query(format!(
            "Identifier '{}' must start with a letter or underscore",
            name
        )));
    }

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(DataBridgeError::Query(format!(
                "Identifier '{}' contains invalid character '{}'",
                name, ch
            )));
        }
    }

    let name_lower = name.to_ascii_lowercase();
    if CQL_RESERVED_KEYWORDS.contains(&name_lower.as_str()) {
        return Err(DataBridgeError::Query(format!(
            "Identifier '{}' is a reserved CQL keyword",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_value() {
        assert_eq!(wrap_value("*"), "*");
        assert_eq!(wrap_value("name"), "name");
        assert_eq!(wrap_value("we\"ird"), "we\"\"ird");
    }

    #[test]
    fn test_wrap_qualified() {
        assert_eq!(wrap("app.users"), "app.users");
        assert_eq!(columnize(&["id", "name"]), "id, name");
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("key").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("user-name").is_err());
        assert!(validate_identifier("SELECT").is_err());
        assert!(validate_identifier("token").is_err());
        assert!(validate_identifier(&"a".repeat(60)).is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_compatibility_forms() {
        assert!(validate_identifier("\u{ff55}\u{ff53}\u{ff45}\u{ff52}").is_err());
        assert!(validate_identifier("\u{fb01}eld").is_err());
    }

    #[test]
    fn test_table_name_length_limit() {
        assert!(validate_table(&"t".repeat(48)).is_ok());
        assert!(validate_table(&"t".repeat(49)).is_err());
        assert!(validate_table(&format!("app.{}", "t".repeat(49))).is_err());
        assert!(validate_table(&format!("{}.users", "k".repeat(49))).is_err());
    }

    #[test]
    fn test_validate_table() {
        assert!(validate_table("app.users").is_ok());
        assert!(validate_table("users").is_ok());
        assert!(validate_table("a.b.c").is_err());
        assert!(validate_table(".users").is_err());
        assert!(validate_table("system_schema.tables").is_err());
        assert!(validate_table("System.local").is_err());
    }

    #[test]
    fn test_validate_column_wildcard() {
        assert!(validate_column("*").is_ok());
        assert!(validate_column("**").is_err());
    }
}
