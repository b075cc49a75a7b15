//! CQL text generation.
//!
//! Everything here is a pure function of the builder state. Placeholders are
//! always positional `?`; the order in which they appear is the order in which
//! the matching values must be bound (see [`Grammar::prepare_bindings_for_update`]).

use crate::collection::CollectionValue;
use crate::types::{quote_string, CqlType};
use crate::CqlValue;

use super::bindings::{BindingKind, BindingStore};
use super::builder::QueryBuilder;
use super::helpers::{columnize, wrap};
use super::types::{CollectionMutation, CollectionOperation};

/// Stateless CQL compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grammar;

impl Grammar {
    /// `select [distinct] cols from table [where ..] [limit n] [allow filtering]`
    pub fn compile_select(query: &QueryBuilder) -> String {
        let columns = match &query.columns {
            Some(cols) if !cols.is_empty() => columnize(cols),
            _ => "*".to_string(),
        };

        let mut cql = String::from("select ");
        if query.distinct {
            cql.push_str("distinct ");
        }
        cql.push_str(&columns);
        cql.push_str(" from ");
        cql.push_str(&wrap(&query.table));

        Self::push_clause(&mut cql, &Self::compile_wheres(query));
        if let Some(limit) = query.limit_value {
            cql.push_str(&format!(" limit {}", limit));
        }
        Self::push_clause(&mut cql, Self::compile_allow_filtering(query));
        cql
    }

    /// One placeholder group per row; columns come from the first row.
    ///
    /// Rows must already share one column order.
    pub fn compile_insert(query: &QueryBuilder, rows: &[Vec<(String, CqlValue)>]) -> String {
        let columns: Vec<&str> = rows
            .first()
            .map(|row| row.iter().map(|(col, _)| col.as_str()).collect())
            .unwrap_or_default();

        let groups = rows
            .iter()
            .map(|row| format!("({})", Self::parameterize(row.len())))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "insert into {} ({}) values {}",
            wrap(&query.table),
            columnize(&columns),
            groups
        )
    }

    /// `update table set <collection exprs>, <col = ?..> [where ..] [allow filtering]`
    ///
    /// Collection expressions come first so that placeholder order matches
    /// the update binding order.
    pub fn compile_update(query: &QueryBuilder, values: &[(String, CqlValue)]) -> String {
        let mut assignments = Vec::with_capacity(query.update_collections.len() + values.len());
        let collections = Self::compile_update_collections(&query.update_collections);
        if !collections.is_empty() {
            assignments.push(collections);
        }
        assignments.extend(values.iter().map(|(col, _)| format!("{} = ?", wrap(col))));

        let mut cql = format!("update {} set {}", wrap(&query.table), assignments.join(", "));
        Self::push_clause(&mut cql, &Self::compile_wheres(query));
        Self::push_clause(&mut cql, Self::compile_allow_filtering(query));
        cql
    }

    /// Renders the pending collection mutations, comma separated.
    pub fn compile_update_collections(mutations: &[CollectionMutation]) -> String {
        mutations
            .iter()
            .map(|mutation| {
                let col = wrap(&mutation.column);
                match mutation.operation {
                    Some(CollectionOperation::Append) => format!("{col} = {col} + ?"),
                    Some(CollectionOperation::Prepend) => format!("{col} = ? + {col}"),
                    Some(CollectionOperation::Remove) => format!("{col} = {col} - ?"),
                    None => format!("{col} = ?"),
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `delete [cols] from table [where ..] [allow filtering]`
    ///
    /// An empty column list deletes the whole row.
    pub fn compile_delete(query: &QueryBuilder, columns: &[String]) -> String {
        let mut cql = String::from("delete");
        if !columns.is_empty() {
            cql.push(' ');
            cql.push_str(&columnize(columns));
        }
        cql.push_str(" from ");
        cql.push_str(&wrap(&query.table));
        Self::push_clause(&mut cql, &Self::compile_wheres(query));
        Self::push_clause(&mut cql, Self::compile_allow_filtering(query));
        cql
    }

    pub fn compile_index(query: &QueryBuilder, columns: &[String]) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS ON {}({})",
            wrap(&query.table),
            columnize(columns)
        )
    }

    /// `where a = ? and b > ?`, or an empty string without predicates.
    pub fn compile_wheres(query: &QueryBuilder) -> String {
        if query.wheres.is_empty() {
            return String::new();
        }
        let predicates = query
            .wheres
            .iter()
            .map(|p| format!("{} {} ?", wrap(&p.column), p.operator))
            .collect::<Vec<_>>()
            .join(" and ");
        format!("where {}", predicates)
    }

    pub fn compile_allow_filtering(query: &QueryBuilder) -> &'static str {
        if query.allow_filtering {
            "allow filtering"
        } else {
            ""
        }
    }

    /// Argument list of an UPDATE.
    ///
    /// `join ++ updateCollection ++ values ++ every other bucket except select`,
    /// matching the placeholder order of [`Grammar::compile_update`].
    pub fn prepare_bindings_for_update(
        bindings: &BindingStore,
        values: &[(String, CqlValue)],
    ) -> Vec<CqlValue> {
        let mut out = Vec::with_capacity(bindings.len() + values.len());
        out.extend_from_slice(bindings.get(BindingKind::Join));
        out.extend_from_slice(bindings.get(BindingKind::UpdateCollection));
        out.extend(values.iter().map(|(_, v)| v.clone()));
        out.extend(bindings.flatten_except(&[
            BindingKind::Select,
            BindingKind::Join,
            BindingKind::UpdateCollection,
        ]));
        out
    }

    /// Collection literal: `{..}` for maps and sets, `[..]` for lists, `{}` when empty.
    pub fn compile_collection_values(collection: &CollectionValue) -> String {
        if collection.is_empty() {
            return "{}".to_string();
        }
        match collection {
            CollectionValue::Map {
                key_type,
                value_type,
                entries,
            } => {
                let body = entries
                    .iter()
                    .map(|(k, v)| {
                        format!(
                            "{}: {}",
                            Self::compile_collection_element(k, *key_type),
                            Self::compile_collection_element(v, *value_type)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{}}}", body)
            }
            CollectionValue::Set {
                element_type,
                values,
            } => format!("{{{}}}", Self::compile_elements(values, *element_type)),
            CollectionValue::List {
                element_type,
                values,
            } => format!("[{}]", Self::compile_elements(values, *element_type)),
        }
    }

    /// String-typed elements are quoted; everything else renders as its literal.
    pub fn compile_collection_element(value: &CqlValue, element_type: CqlType) -> String {
        if element_type.is_string_type() {
            quote_string(&value.to_raw_string())
        } else {
            value.to_cql_literal()
        }
    }

    fn compile_elements(values: &[CqlValue], element_type: CqlType) -> String {
        values
            .iter()
            .map(|v| Self::compile_collection_element(v, element_type))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn parameterize(count: usize) -> String {
        vec!["?"; count].join(", ")
    }

    fn push_clause(cql: &mut String, clause: &str) {
        if !clause.is_empty() {
            cql.push(' ');
            cql.push_str(clause);
        }
    }
}
