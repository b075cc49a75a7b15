//! INSERT, UPDATE, DELETE and index methods for QueryBuilder.

use tracing::debug;

use crate::collection::CollectionKind;
use crate::pagination::ResultPage;
use crate::transport::ResultFuture;
use crate::{CqlValue, DataBridgeError, Result};
use super::bindings::BindingKind;
use super::builder::{InsertValues, QueryBuilder};
use super::grammar::Grammar;
use super::helpers::validate_identifier;
use super::types::{CollectionMutation, CollectionOperation};

impl QueryBuilder {
    /// Queues a mutation of a map, set or list column for the next `update`.
    ///
    /// `operation` None replaces the column wholesale (`col = ?`).
    ///
    /// # Errors
    ///
    /// Returns `InvalidBindingType` when `value` is not a collection, and a
    /// validation error for a prepend on anything but a list.
    pub fn update_collection(
        mut self,
        column: &str,
        operation: Option<CollectionOperation>,
        value: impl Into<CqlValue>,
    ) -> Result<Self> {
        let value = match value.into() {
            CqlValue::Collection(c) => c,
            other => {
                return Err(DataBridgeError::InvalidBindingType(format!(
                    "{}, should be any one of map, set, list",
                    other.cql_type_name()
                )))
            }
        };
        validate_identifier(column)?;

        if operation == Some(CollectionOperation::Prepend) && value.kind() != CollectionKind::List {
            return Err(DataBridgeError::Validation(format!(
                "Cannot prepend to a {} column '{}'",
                value.kind(),
                column
            )));
        }

        self.bindings
            .push(BindingKind::UpdateCollection, CqlValue::Collection(value.clone()));
        self.update_collections.push(CollectionMutation {
            column: column.to_string(),
            operation,
            value,
        });
        Ok(self)
    }

    /// Replaces a collection column; same as `update_collection(column, None, value)`.
    pub fn replace_collection(self, column: &str, value: impl Into<CqlValue>) -> Result<Self> {
        self.update_collection(column, None, value)
    }

    /// Builds an INSERT and returns (CQL, parameters).
    ///
    /// # Errors
    ///
    /// Returns error for an empty payload or rows that do not share columns.
    pub fn build_insert(&self, values: impl Into<InsertValues>) -> Result<(String, Vec<CqlValue>)> {
        let rows = values.into().into_rows()?;
        if rows.is_empty() {
            return Err(DataBridgeError::Query("Cannot insert with no values".to_string()));
        }
        let cql = Grammar::compile_insert(self, &rows);
        let params = rows
            .into_iter()
            .flat_map(|row| row.into_iter().map(|(_, v)| v))
            .collect();
        Ok((cql, params))
    }

    /// Builds an UPDATE and returns (CQL, parameters).
    ///
    /// # Errors
    ///
    /// Returns error when there is neither a direct assignment nor a
    /// collection mutation, or when a column name is invalid.
    pub fn build_update(&self, values: &[(String, CqlValue)]) -> Result<(String, Vec<CqlValue>)> {
        if values.is_empty() && self.update_collections.is_empty() {
            return Err(DataBridgeError::Query("Cannot update with no values".to_string()));
        }
        for (col, _) in values {
            validate_identifier(col)?;
        }

        let cql = Grammar::compile_update(self, values);
        let params = Grammar::prepare_bindings_for_update(&self.bindings, values);
        Ok((cql, params))
    }

    /// Builds a DELETE and returns (CQL, parameters). No columns deletes the whole row.
    ///
    /// Queued collection mutations have no placeholder here and are not sent.
    pub fn build_delete(&self, columns: &[&str]) -> Result<(String, Vec<CqlValue>)> {
        let columns = Self::owned_columns(columns)?;
        let cql = Grammar::compile_delete(self, &columns);
        Ok((cql, self.bindings.flatten_except(&[BindingKind::UpdateCollection])))
    }

    /// Builds a `CREATE INDEX IF NOT EXISTS` statement. It takes no parameters.
    pub fn build_index(&self, columns: &[&str]) -> Result<(String, Vec<CqlValue>)> {
        if columns.is_empty() {
            return Err(DataBridgeError::Query("Cannot create an index on no columns".to_string()));
        }
        let columns = Self::owned_columns(columns)?;
        Ok((Grammar::compile_index(self, &columns), Vec::new()))
    }

    /// Inserts one row or a batch of rows.
    ///
    /// An empty payload is a successful no-op: nothing is compiled or sent.
    pub async fn insert(self, values: impl Into<InsertValues>) -> Result<bool> {
        let values = values.into();
        if values.is_empty() {
            debug!(table = %self.table, "Empty insert skipped");
            return Ok(true);
        }
        self.ensure_table()?;
        let (cql, arguments) = self.build_insert(values)?;
        self.executor
            .execute(&cql, self.execution_options(arguments))
            .await?;
        Ok(true)
    }

    /// Asynchronous `insert`. An empty payload resolves immediately to an empty page.
    pub fn insert_async(self, values: impl Into<InsertValues>) -> Result<ResultFuture> {
        let values = values.into();
        if values.is_empty() {
            debug!(table = %self.table, "Empty insert skipped");
            return Ok(Box::pin(async { Ok(ResultPage::empty()) }));
        }
        self.ensure_table()?;
        let (cql, arguments) = self.build_insert(values)?;
        let options = self.execution_options(arguments);
        Ok(self.executor.execute_async(cql, options))
    }

    /// Updates matching rows with direct assignments and any queued collection mutations.
    pub async fn update(self, values: Vec<(String, CqlValue)>) -> Result<ResultPage> {
        self.ensure_table()?;
        let (cql, arguments) = self.build_update(&values)?;
        self.executor
            .execute(&cql, self.execution_options(arguments))
            .await
    }

    /// Deletes matching rows.
    ///
    /// Deletes are always dispatched asynchronously; await the returned future
    /// to observe the acknowledgement, or drop it to fire and forget.
    pub fn delete_row(self) -> Result<ResultFuture> {
        self.dispatch_delete(&[])
    }

    /// Deletes only the given columns of matching rows. Always asynchronous.
    pub fn delete_column(self, columns: &[&str]) -> Result<ResultFuture> {
        if columns.is_empty() {
            return Err(DataBridgeError::Query("No columns given to delete".to_string()));
        }
        self.dispatch_delete(columns)
    }

    /// Creates a secondary index on `columns` if it does not exist.
    pub async fn index(self, columns: &[&str]) -> Result<ResultPage> {
        self.ensure_table()?;
        let (cql, arguments) = self.build_index(columns)?;
        self.executor
            .execute(&cql, self.execution_options(arguments))
            .await
    }

    fn dispatch_delete(self, columns: &[&str]) -> Result<ResultFuture> {
        self.ensure_table()?;
        let (cql, arguments) = self.build_delete(columns)?;
        let options = self.execution_options(arguments);
        Ok(self.executor.execute_async(cql, options))
    }

    fn owned_columns(columns: &[&str]) -> Result<Vec<String>> {
        columns
            .iter()
            .map(|col| {
                validate_identifier(col)?;
                Ok(col.to_string())
            })
            .collect()
    }
}
