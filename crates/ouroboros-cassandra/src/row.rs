//! Result row representation.

use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::{CqlValue, DataBridgeError, Result};

/// Represents a single row from a CQL result page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Column name to value mapping
    pub(crate) columns: HashMap<String, CqlValue>,
}

impl Row {
    /// Creates a new row from a column map.
    pub fn new(columns: HashMap<String, CqlValue>) -> Self {
        Self { columns }
    }

    /// Builds a row from `(column, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<CqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Gets a value by column name.
    pub fn get(&self, column: &str) -> Result<&CqlValue> {
        self.columns.get(column).ok_or_else(|| {
            DataBridgeError::Query(format!("Column '{}' not found in result set", column))
        })
    }

    /// Gets a value by column name, treating NULL as absent.
    pub fn get_opt(&self, column: &str) -> Option<&CqlValue> {
        self.columns.get(column).filter(|v| !v.is_null())
    }

    /// Gets all column names.
    pub fn columns(&self) -> Vec<&str> {
        self.columns.keys().map(|s| s.as_str()).collect()
    }

    /// Gets a reference to the column map.
    pub fn columns_map(&self) -> &HashMap<String, CqlValue> {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Converts row to a JSON object. Collection cells become native arrays/objects.
    pub fn to_json(&self) -> JsonValue {
        let map = self
            .columns
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollectionValue, CqlType};

    #[test]
    fn test_get_missing_column() {
        let row = Row::from_pairs([("id", 1)]);
        assert_eq!(row.get("id").unwrap(), &CqlValue::Int(1));
        assert!(matches!(row.get("name"), Err(DataBridgeError::Query(_))));
    }

    #[test]
    fn test_get_opt_skips_null() {
        let row = Row::from_pairs([("id", CqlValue::Int(1)), ("name", CqlValue::Null)]);
        assert!(row.get_opt("name").is_none());
        assert!(row.get_opt("id").is_some());
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_to_json_with_collections() {
        let tags = CollectionValue::set(CqlType::Text, ["a", "b"]).unwrap();
        let row = Row::from_pairs([
            ("id", CqlValue::Int(7)),
            ("tags", CqlValue::Collection(tags)),
        ]);
        assert_eq!(
            row.to_json(),
            serde_json::json!({"id": 7, "tags": ["a", "b"]})
        );
    }
}
