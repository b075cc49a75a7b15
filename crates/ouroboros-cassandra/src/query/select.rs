//! SELECT query building methods for QueryBuilder.

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, instrument, warn};

use crate::pagination::{PagingState, ResultPage, Rows};
use crate::transport::ResultFuture;
use crate::{CqlValue, DataBridgeError, Result, Row};
use super::bindings::BindingKind;
use super::builder::QueryBuilder;
use super::grammar::Grammar;
use super::helpers::{validate_column, validate_identifier};
use super::types::{Operator, Predicate};

impl QueryBuilder {
    /// Specifies which columns to SELECT.
    ///
    /// # Arguments
    ///
    /// * `columns` - Column names to select; `*` is accepted
    pub fn select(mut self, columns: &[&str]) -> Result<Self> {
        for col in columns {
            validate_column(col)?;
        }
        self.columns = Some(columns.iter().map(|c| c.to_string()).collect());
        Ok(self)
    }

    /// Adds a WHERE predicate.
    ///
    /// # Arguments
    ///
    /// * `column` - Column name
    /// * `operator` - Comparison operator
    /// * `value` - Value bound to the predicate's placeholder
    pub fn where_clause(
        mut self,
        column: &str,
        operator: Operator,
        value: impl Into<CqlValue>,
    ) -> Result<Self> {
        validate_identifier(column)?;
        let value = value.into();
        self.bindings.push(BindingKind::Where, value.clone());
        self.wheres.push(Predicate {
            column: column.to_string(),
            operator,
            value,
        });
        Ok(self)
    }

    /// Equality predicate, `column = ?`.
    pub fn where_eq(self, column: &str, value: impl Into<CqlValue>) -> Result<Self> {
        self.where_clause(column, Operator::Eq, value)
    }

    /// Predicate with a textual operator such as `"contains key"`.
    pub fn where_op(self, column: &str, operator: &str, value: impl Into<CqlValue>) -> Result<Self> {
        let operator: Operator = operator.parse()?;
        self.where_clause(column, operator, value)
    }

    /// CQL has no disjunction; always fails.
    pub fn or_where(
        self,
        column: &str,
        _operator: Operator,
        _value: impl Into<CqlValue>,
    ) -> Result<Self> {
        Err(DataBridgeError::NotImplemented(format!(
            "or_where({}): CQL does not support OR predicates",
            column
        )))
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn allow_filtering(mut self) -> Self {
        self.allow_filtering = true;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit_value = Some(limit);
        self
    }

    /// Replaces the passthrough options (consistency level, timeouts, ...).
    ///
    /// Last call wins; nothing is merged.
    pub fn with_options(mut self, options: JsonMap<String, JsonValue>) -> Self {
        self.options = options;
        self
    }

    /// Builds a SELECT and returns (CQL, parameters).
    ///
    /// Queued collection mutations only apply to `update` and are left out.
    pub fn build_select(&self) -> (String, Vec<CqlValue>) {
        (
            Grammar::compile_select(self),
            self.bindings.flatten_except(&[BindingKind::UpdateCollection]),
        )
    }

    /// Runs the select and returns the rows of the first page.
    pub async fn get(self, columns: &[&str]) -> Result<Vec<Row>> {
        Ok(self.cassandra_rows(columns).await?.into_page().into_rows())
    }

    /// Runs the select and returns a page handle that can walk later pages.
    pub async fn cassandra_rows(mut self, columns: &[&str]) -> Result<Rows> {
        self.ensure_table()?;
        self.default_columns(columns)?;
        let (cql, arguments) = self.build_select();
        let options = self.execution_options(arguments);
        let page = self.executor.execute(&cql, options.clone()).await?;
        Ok(Rows::new(self.executor, cql, options, page))
    }

    /// Hands the select to the transport and returns its future.
    pub fn get_async(mut self, columns: &[&str]) -> Result<ResultFuture> {
        self.ensure_table()?;
        self.default_columns(columns)?;
        let (cql, arguments) = self.build_select();
        let options = self.execution_options(arguments);
        Ok(self.executor.execute_async(cql, options))
    }

    /// First matching row, via `limit 1`.
    pub async fn first(self, columns: &[&str]) -> Result<Option<Row>> {
        Ok(self.limit(1).get(columns).await?.into_iter().next())
    }

    /// Counts matching rows by fetching every page and summing client side.
    ///
    /// This is a full scan: the store offers no cheap server-side count, so
    /// the cost grows with the size of the result set.
    #[instrument(skip(self, columns), fields(table = %self.table))]
    pub async fn count(self, columns: &[&str]) -> Result<u64> {
        if self.wheres.is_empty() {
            warn!(table = %self.table, "Counting rows without predicates scans the whole table");
        } else {
            debug!(table = %self.table, "Counting rows page by page");
        }
        self.cassandra_rows(columns).await?.count_all().await
    }

    /// Fetches one page of `per_page` rows, resuming at `page` when given.
    ///
    /// Passthrough options are sent along with the paging options.
    pub async fn paginate(
        mut self,
        per_page: Option<i32>,
        columns: &[&str],
        page: Option<PagingState>,
    ) -> Result<ResultPage> {
        self.ensure_table()?;
        self.default_columns(columns)?;
        let page_size = per_page.unwrap_or(self.default_page_size);
        if page_size <= 0 {
            return Err(DataBridgeError::Query(format!(
                "Page size must be positive, got {}",
                page_size
            )));
        }

        let (cql, arguments) = self.build_select();
        let mut options = self.execution_options(arguments);
        options.page_size = Some(page_size);
        options.paging_state = page;

        self.executor.execute(&cql, options).await
    }
}
