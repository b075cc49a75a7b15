//! CQL query builder.
//!
//! This module provides the fluent [`QueryBuilder`] and the stateless
//! [`Grammar`] that compiles it into CQL text plus an ordered argument list.
//!
//! # Examples
//!
//! ## SELECT Query
//!
//! ```ignore
//! use ouroboros_cassandra::{Operator, Session};
//!
//! let rows = session.table("users")?
//!     .where_clause("id", Operator::Eq, 42)?
//!     .get(&["name"])
//!     .await?;
//! // CQL: "select name from users where id = ?", arguments: [42]
//! ```
//!
//! ## Collection UPDATE
//!
//! ```ignore
//! use ouroboros_cassandra::{CollectionOperation, CollectionValue, CqlType};
//!
//! let tags = CollectionValue::set(CqlType::Text, ["a", "b"])?;
//! session.table("users")?
//!     .update_collection("tags", Some(CollectionOperation::Append), tags)?
//!     .where_eq("id", 1)?
//!     .update(vec![])
//!     .await?;
//! // CQL: "update users set tags = tags + ? where id = ?"
//! ```
//!
//! ## INSERT Query
//!
//! ```ignore
//! use ouroboros_cassandra::CqlValue;
//!
//! let (cql, params) = session.table("users")?.build_insert(vec![
//!     vec![("name", CqlValue::from("Alice")), ("id", CqlValue::Int(1))],
//!     vec![("name", CqlValue::from("Bob")), ("id", CqlValue::Int(2))],
//! ])?;
//! // CQL: "insert into users (id, name) values (?, ?), (?, ?)"
//! ```

mod bindings;
mod builder;
mod grammar;
mod helpers;
mod modify;
mod select;
mod types;


// Re-export all public types
pub use bindings::{BindingKind, BindingStore};
pub use builder::{InsertValues, QueryBuilder, DEFAULT_PAGE_SIZE};
pub use grammar::Grammar;
pub use helpers::{validate_column, validate_identifier, validate_table};
pub use types::{CollectionMutation, CollectionOperation, Operator, Predicate};
