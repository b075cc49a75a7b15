//! QueryBuilder struct and core implementation.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::executor::Executor;
use crate::transport::ExecutionOptions;
use crate::{CqlValue, DataBridgeError, Result};
use super::bindings::{BindingKind, BindingStore};
use super::helpers::{validate_column, validate_table};
use super::types::{CollectionMutation, Predicate};

/// Page size used by `paginate` when neither the caller nor the session gives one.
pub const DEFAULT_PAGE_SIZE: i32 = 15;

/// Fluent CQL statement builder.
///
/// Accumulates the intent of one statement (table, projection, predicates,
/// flags, collection mutations, passthrough options) and compiles it through
/// [`Grammar`](super::Grammar) when a terminal method is called. A builder
/// describes exactly one statement; build a fresh one for the next.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    pub(crate) executor: Executor,
    pub(crate) table: String,
    /// Projected columns; None means "not set yet"
    pub(crate) columns: Option<Vec<String>>,
    pub(crate) wheres: Vec<Predicate>,
    pub(crate) limit_value: Option<u32>,
    pub(crate) distinct: bool,
    pub(crate) allow_filtering: bool,
    pub(crate) update_collections: Vec<CollectionMutation>,
    /// Passthrough transport options (consistency, timeout, ...)
    pub(crate) options: JsonMap<String, JsonValue>,
    pub(crate) bindings: BindingStore,
    pub(crate) default_page_size: i32,
}

impl QueryBuilder {
    /// Creates a builder without a target table. Call [`QueryBuilder::from`] next.
    pub fn new(executor: Executor) -> Self {
        Self {
            executor,
            table: String::new(),
            columns: None,
            wheres: Vec::new(),
            limit_value: None,
            distinct: false,
            allow_filtering: false,
            update_collections: Vec::new(),
            options: JsonMap::new(),
            bindings: BindingStore::new(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the table the statement targets.
    ///
    /// # Errors
    ///
    /// Returns error if the table name is invalid.
    pub fn from(mut self, table: &str) -> Result<Self> {
        validate_table(table)?;
        self.table = table.to_string();
        Ok(self)
    }

    /// Get the table name
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn bindings(&self) -> &BindingStore {
        &self.bindings
    }

    pub fn options(&self) -> &JsonMap<String, JsonValue> {
        &self.options
    }

    /// Page size `paginate` falls back to.
    pub fn with_default_page_size(mut self, page_size: i32) -> Self {
        self.default_page_size = page_size;
        self
    }

    /// Pushes a value into one binding bucket.
    pub fn add_binding(mut self, kind: BindingKind, value: impl Into<CqlValue>) -> Self {
        self.bindings.push(kind, value.into());
        self
    }

    /// Like [`QueryBuilder::add_binding`], with the bucket given by name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown bucket name.
    pub fn add_binding_named(self, kind: &str, value: impl Into<CqlValue>) -> Result<Self> {
        let kind: BindingKind = kind.parse()?;
        Ok(self.add_binding(kind, value))
    }

    pub(crate) fn ensure_table(&self) -> Result<()> {
        if self.table.is_empty() {
            return Err(DataBridgeError::Query(
                "No table selected; call from() first".to_string(),
            ));
        }
        Ok(())
    }

    /// Sets the projection only if none was chosen explicitly.
    pub(crate) fn default_columns(&mut self, columns: &[&str]) -> Result<()> {
        if self.columns.is_none() {
            for col in columns {
                validate_column(col)?;
            }
            self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        }
        Ok(())
    }

    /// Options for a statement bound with `arguments`, carrying the passthrough map.
    pub(crate) fn execution_options(&self, arguments: Vec<CqlValue>) -> ExecutionOptions {
        ExecutionOptions::new(arguments, self.options.clone())
    }
}

/// Payload accepted by `insert`.
///
/// A single row keeps its column order. A batch has every row sorted by
/// column name so all rows share the one column list of the statement.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertValues {
    Row(Vec<(String, CqlValue)>),
    Rows(Vec<Vec<(String, CqlValue)>>),
}

impl InsertValues {
    /// True when there is nothing to insert.
    pub fn is_empty(&self) -> bool {
        match self {
            InsertValues::Row(row) => row.is_empty(),
            InsertValues::Rows(rows) => rows.is_empty(),
        }
    }

    /// Normalized rows sharing one column order.
    ///
    /// # Errors
    ///
    /// Returns error on invalid or duplicated column names, or when rows of a
    /// batch do not all carry the same columns.
    pub(crate) fn into_rows(self) -> Result<Vec<Vec<(String, CqlValue)>>> {
        let rows = match self {
            InsertValues::Row(row) => vec![row],
            InsertValues::Rows(mut rows) => {
                for row in &mut rows {
                    row.sort_by(|a, b| a.0.cmp(&b.0));
                }
                rows
            }
        };

        let first = match rows.first() {
            Some(first) => first,
            None => return Ok(rows),
        };
        if first.is_empty() {
            return Err(DataBridgeError::Query("Cannot insert with no values".to_string()));
        }

        let mut seen = HashSet::with_capacity(first.len());
        for (col, _) in first {
            validate_column(col)?;
            if col == "*" || !seen.insert(col.as_str()) {
                return Err(DataBridgeError::Query(format!(
                    "Invalid insert column '{}'",
                    col
                )));
            }
        }

        for (i, row) in rows.iter().enumerate().skip(1) {
            let same = row.len() == first.len()
                && row.iter().zip(first).all(|((a, _), (b, _))| a == b);
            if !same {
                return Err(DataBridgeError::Query(format!(
                    "Insert row {} has columns [{}], expected [{}]",
                    i,
                    column_names(row),
                    column_names(first)
                )));
            }
        }

        Ok(rows)
    }
}

fn column_names(row: &[(String, CqlValue)]) -> String {
    row.iter()
        .map(|(col, _)| col.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<Vec<(String, CqlValue)>> for InsertValues {
    fn from(row: Vec<(String, CqlValue)>) -> Self {
        InsertValues::Row(row)
    }
}

impl From<Vec<(&str, CqlValue)>> for InsertValues {
    fn from(row: Vec<(&str, CqlValue)>) -> Self {
        InsertValues::Row(row.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl From<Vec<Vec<(String, CqlValue)>>> for InsertValues {
    fn from(rows: Vec<Vec<(String, CqlValue)>>) -> Self {
        InsertValues::Rows(rows)
    }
}

impl From<Vec<Vec<(&str, CqlValue)>>> for InsertValues {
    fn from(rows: Vec<Vec<(&str, CqlValue)>>) -> Self {
        InsertValues::Rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
                .collect(),
        )
    }
}

impl From<BTreeMap<String, CqlValue>> for InsertValues {
    fn from(row: BTreeMap<String, CqlValue>) -> Self {
        InsertValues::Row(row.into_iter().collect())
    }
}

impl From<Vec<BTreeMap<String, CqlValue>>> for InsertValues {
    fn from(rows: Vec<BTreeMap<String, CqlValue>>) -> Self {
        InsertValues::Rows(rows.into_iter().map(|row| row.into_iter().collect()).collect())
    }
}
