//! Primary-key aware queries.
//!
//! [`ModelQuery`] wraps a [`QueryBuilder`] together with the table's
//! [`PrimaryKey`] descriptor. Keys can be a single column or a composite of
//! several columns; each component may carry a [`KeyCaster`] that converts raw
//! values (usually text from a request) into the column's native type.

use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::pagination::{PagingState, ResultPage, Rows};
use crate::query::QueryBuilder;
use crate::transport::ResultFuture;
use crate::{CqlValue, DataBridgeError, Result, Row};

/// Conversion applied to a key value before it is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyCaster {
    Uuid,
    TimeUuid,
    BigInt,
    Int,
    Text,
    Timestamp,
    Date,
    Decimal,
    Inet,
}

impl KeyCaster {
    /// Converts `value` to the caster's type.
    ///
    /// Values already of the target type pass through unchanged, as does NULL.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the value cannot be converted.
    pub fn cast(&self, value: CqlValue) -> Result<CqlValue> {
        let cast = match (self, value) {
            (_, CqlValue::Null) => Some(CqlValue::Null),

            (KeyCaster::Uuid, v @ CqlValue::Uuid(_)) => Some(v),
            (KeyCaster::Uuid, CqlValue::TimeUuid(u)) => Some(CqlValue::Uuid(u)),
            (KeyCaster::Uuid, CqlValue::Text(s)) => Uuid::parse_str(s.trim()).ok().map(CqlValue::Uuid),

            (KeyCaster::TimeUuid, v @ CqlValue::TimeUuid(_)) => Some(v),
            (KeyCaster::TimeUuid, CqlValue::Uuid(u)) => time_uuid(u),
            (KeyCaster::TimeUuid, CqlValue::Text(s)) => {
                Uuid::parse_str(s.trim()).ok().and_then(time_uuid)
            }

            (KeyCaster::BigInt, v @ CqlValue::BigInt(_)) => Some(v),
            (KeyCaster::BigInt, CqlValue::Int(v)) => Some(CqlValue::BigInt(v.into())),
            (KeyCaster::BigInt, CqlValue::SmallInt(v)) => Some(CqlValue::BigInt(v.into())),
            (KeyCaster::BigInt, CqlValue::TinyInt(v)) => Some(CqlValue::BigInt(v.into())),
            (KeyCaster::BigInt, CqlValue::Text(s)) => s.trim().parse().ok().map(CqlValue::BigInt),

            (KeyCaster::Int, v @ CqlValue::Int(_)) => Some(v),
            (KeyCaster::Int, CqlValue::SmallInt(v)) => Some(CqlValue::Int(v.into())),
            (KeyCaster::Int, CqlValue::TinyInt(v)) => Some(CqlValue::Int(v.into())),
            (KeyCaster::Int, CqlValue::BigInt(v)) => i32::try_from(v).ok().map(CqlValue::Int),
            (KeyCaster::Int, CqlValue::Text(s)) => s.trim().parse().ok().map(CqlValue::Int),

            (KeyCaster::Text, CqlValue::Collection(_)) => None,
            (KeyCaster::Text, v @ CqlValue::Text(_)) => Some(v),
            (KeyCaster::Text, v) => Some(CqlValue::Text(v.to_raw_string())),

            (KeyCaster::Timestamp, v @ CqlValue::Timestamp(_)) => Some(v),
            (KeyCaster::Timestamp, CqlValue::BigInt(ms)) => millis(ms),
            (KeyCaster::Timestamp, CqlValue::Int(ms)) => millis(ms.into()),
            (KeyCaster::Timestamp, CqlValue::Text(s)) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| CqlValue::Timestamp(dt.with_timezone(&Utc))),

            (KeyCaster::Date, v @ CqlValue::Date(_)) => Some(v),
            (KeyCaster::Date, CqlValue::Timestamp(ts)) => Some(CqlValue::Date(ts.date_naive())),
            (KeyCaster::Date, CqlValue::Text(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .map(CqlValue::Date),

            (KeyCaster::Decimal, v @ CqlValue::Decimal(_)) => Some(v),
            (KeyCaster::Decimal, CqlValue::Int(v)) => Some(CqlValue::Decimal(Decimal::from(v))),
            (KeyCaster::Decimal, CqlValue::BigInt(v)) => Some(CqlValue::Decimal(Decimal::from(v))),
            (KeyCaster::Decimal, CqlValue::Text(s)) => {
                Decimal::from_str(s.trim()).ok().map(CqlValue::Decimal)
            }

            (KeyCaster::Inet, v @ CqlValue::Inet(_)) => Some(v),
            (KeyCaster::Inet, CqlValue::Text(s)) => s.trim().parse::<IpAddr>().ok().map(CqlValue::Inet),

            (caster, v) => {
                return Err(DataBridgeError::Validation(format!(
                    "Cannot cast {} value to {:?}",
                    v.cql_type_name(),
                    caster
                )))
            }
        };

        cast.ok_or_else(|| {
            DataBridgeError::Validation(format!("Value is not a valid {:?} key", self))
        })
    }
}

fn time_uuid(u: Uuid) -> Option<CqlValue> {
    (u.get_version_num() == 1).then_some(CqlValue::TimeUuid(u))
}

fn millis(ms: i64) -> Option<CqlValue> {
    Utc.timestamp_millis_opt(ms).single().map(CqlValue::Timestamp)
}

/// One column of a composite primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyComponent {
    pub name: String,
    #[serde(default)]
    pub caster: Option<KeyCaster>,
}

impl KeyComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            caster: None,
        }
    }

    pub fn with_caster(name: impl Into<String>, caster: KeyCaster) -> Self {
        Self {
            name: name.into(),
            caster: Some(caster),
        }
    }

    fn cast(&self, value: CqlValue) -> Result<CqlValue> {
        match self.caster {
            Some(caster) => caster.cast(value),
            None => Ok(value),
        }
    }
}

/// Primary key metadata of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Single(String),
    /// Components in declaration order; predicates follow this order.
    Composite(Vec<KeyComponent>),
}

impl PrimaryKey {
    pub fn single(name: impl Into<String>) -> Self {
        PrimaryKey::Single(name.into())
    }

    pub fn composite(components: impl IntoIterator<Item = KeyComponent>) -> Self {
        PrimaryKey::Composite(components.into_iter().collect())
    }

    /// Column names making up the key.
    pub fn names(&self) -> Vec<&str> {
        match self {
            PrimaryKey::Single(name) => vec![name.as_str()],
            PrimaryKey::Composite(components) => {
                components.iter().map(|c| c.name.as_str()).collect()
            }
        }
    }

    /// # Errors
    ///
    /// Returns a configuration error when no key column is declared.
    pub fn validate(&self) -> Result<()> {
        let empty = match self {
            PrimaryKey::Single(name) => name.is_empty(),
            PrimaryKey::Composite(components) => {
                components.is_empty() || components.iter().any(|c| c.name.is_empty())
            }
        };
        if empty {
            return Err(DataBridgeError::Configuration("Primary key not set".to_string()));
        }
        Ok(())
    }

    /// Adds the key predicates that pin a save (update) to one stored row.
    ///
    /// Every component takes its value from `original` (the row as loaded),
    /// falling back to `attributes` (the row as modified), then is cast.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a key component has no value in
    /// either row.
    pub fn apply_save_constraints(
        &self,
        mut query: QueryBuilder,
        original: &Row,
        attributes: &Row,
    ) -> Result<QueryBuilder> {
        self.validate()?;
        let components = match self {
            PrimaryKey::Single(name) => vec![KeyComponent::new(name.clone())],
            PrimaryKey::Composite(components) => components.clone(),
        };

        for component in &components {
            let value = original
                .get_opt(&component.name)
                .or_else(|| attributes.get_opt(&component.name))
                .cloned()
                .ok_or_else(|| {
                    DataBridgeError::Configuration(format!(
                        "No value for primary key column '{}'",
                        component.name
                    ))
                })?;
            query = query.where_eq(&component.name, component.cast(value)?)?;
        }
        Ok(query)
    }
}

/// A key value to look a row up by.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Single(CqlValue),
    /// Column name to value; components not listed (or NULL) are skipped.
    Composite(Vec<(String, CqlValue)>),
}

impl KeyValue {
    pub fn single(value: impl Into<CqlValue>) -> Self {
        KeyValue::Single(value.into())
    }

    pub fn composite<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<CqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        KeyValue::Composite(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    fn lookup(&self, name: &str) -> Option<&CqlValue> {
        match self {
            KeyValue::Single(_) => None,
            KeyValue::Composite(entries) => entries
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v),
        }
    }
}

/// A query bound to a table's primary key.
#[derive(Debug, Clone)]
pub struct ModelQuery {
    query: QueryBuilder,
    primary_key: PrimaryKey,
}

impl ModelQuery {
    /// # Errors
    ///
    /// Returns a configuration error for empty key metadata.
    pub fn new(query: QueryBuilder, primary_key: PrimaryKey) -> Result<Self> {
        primary_key.validate()?;
        Ok(Self { query, primary_key })
    }

    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    pub fn into_query(self) -> QueryBuilder {
        self.query
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }

    /// Applies further builder calls to the wrapped query.
    pub fn map_query<F>(mut self, f: F) -> Result<Self>
    where
        F: FnOnce(QueryBuilder) -> Result<QueryBuilder>,
    {
        self.query = f(self.query)?;
        Ok(self)
    }

    /// Constrains the query to the row(s) with the given key.
    ///
    /// For composite keys every listed, non-NULL component becomes its own
    /// equality predicate, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the key value does not fit the key
    /// shape, or when a composite key value resolves no component.
    pub fn where_key(mut self, id: KeyValue) -> Result<Self> {
        match &self.primary_key {
            PrimaryKey::Single(name) => {
                let value = match &id {
                    KeyValue::Single(v) => v.clone(),
                    KeyValue::Composite(_) => id.lookup(name).cloned().ok_or_else(|| {
                        DataBridgeError::Configuration(format!(
                            "No value for primary key column '{}'",
                            name
                        ))
                    })?,
                };
                self.query = self.query.where_eq(name, value)?;
            }
            PrimaryKey::Composite(components) => {
                if matches!(id, KeyValue::Single(_)) {
                    return Err(DataBridgeError::Configuration(
                        "A composite primary key needs a column to value mapping".to_string(),
                    ));
                }

                let resolved = components
                    .iter()
                    .filter_map(|c| match id.lookup(&c.name) {
                        Some(v) if !v.is_null() => Some((c, v.clone())),
                        _ => None,
                    })
                    .collect::<Vec<_>>();
                if resolved.is_empty() {
                    return Err(DataBridgeError::Configuration(
                        "No primary key was specified".to_string(),
                    ));
                }

                let mut query = self.query;
                for (component, value) in resolved {
                    query = query.where_eq(&component.name, component.cast(value)?)?;
                }
                self.query = query;
            }
        }
        Ok(self)
    }

    /// Negated key lookups cannot be expressed in CQL; always fails.
    pub fn where_key_not(self, _id: KeyValue) -> Result<Self> {
        Err(DataBridgeError::NotImplemented(
            "where_key_not is not supported by CQL; use the query builder".to_string(),
        ))
    }

    /// Row with the given key, if any.
    pub async fn find(self, id: KeyValue, columns: &[&str]) -> Result<Option<Row>> {
        self.where_key(id)?.query.first(columns).await
    }

    /// Row with the given key.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no row matches.
    pub async fn find_or_fail(self, id: KeyValue, columns: &[&str]) -> Result<Row> {
        let table = self.query.table().to_string();
        let description = format!("{:?}", id);
        self.find(id, columns).await?.ok_or_else(|| {
            DataBridgeError::NotFound(format!("No row in '{}' for key {}", table, description))
        })
    }

    /// Every matching row, walking all pages.
    pub async fn get_models(self, columns: &[&str]) -> Result<Vec<Row>> {
        let rows = self.query.cassandra_rows(columns).await?.collect_all().await?;
        debug!(rows = rows.len(), "Loaded rows across all pages");
        Ok(rows)
    }

    pub fn get_async(self, columns: &[&str]) -> Result<ResultFuture> {
        self.query.get_async(columns)
    }

    pub async fn cassandra_rows(self, columns: &[&str]) -> Result<Rows> {
        self.query.cassandra_rows(columns).await
    }

    pub async fn paginate(
        self,
        per_page: Option<i32>,
        columns: &[&str],
        page: Option<PagingState>,
    ) -> Result<ResultPage> {
        self.query.paginate(per_page, columns, page).await
    }
}
