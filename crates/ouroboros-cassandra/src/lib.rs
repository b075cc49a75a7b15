//! CQL query builder and compiler for Cassandra-compatible stores.
//!
//! This crate turns a fluently built statement description into CQL text plus
//! an ordered argument list, and covers the store's non-relational features:
//!
//! - **Collections**: typed `map`, `set` and `list` values, rendered as CQL
//!   literals and mutated through `update_collection` (append, prepend,
//!   remove, replace)
//! - **Composite primary keys**: key descriptors with per-component casting,
//!   `where_key` lookups and save constraints
//! - **Cursor paging**: opaque paging states, forward-only page cursors and
//!   row streams instead of offsets
//!
//! The crate never opens a connection itself. Compiled statements go through
//! the [`Transport`] trait, implemented by the caller on top of a driver.
//!
//! # Architecture
//!
//! ```text
//!   Session ──> QueryBuilder ──> Grammar (CQL text)
//!                    │             BindingStore (argument order)
//!                    v
//!                Executor (tracing, slow statement log)
//!                    │
//!                    v
//!              dyn Transport ──> ResultPage / Rows / PageCursor
//! ```
//!
//! # Usage Examples
//!
//! ## Select
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ouroboros_cassandra::{Operator, Session};
//!
//! # async fn example(transport: Arc<dyn ouroboros_cassandra::Transport>) -> ouroboros_cassandra::Result<()> {
//! let session = Session::new(transport);
//! let rows = session
//!     .table("users")?
//!     .where_clause("id", Operator::Eq, 42)?
//!     .get(&["name"])
//!     .await?;
//! // select name from users where id = ?   arguments: [42]
//! # Ok(())
//! # }
//! ```
//!
//! ## Walking every page
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//!
//! let mut stream = session.table("events")?.cassandra_rows(&["*"]).await?.into_row_stream();
//! while let Some(row) = stream.try_next().await? {
//!     println!("{}", row.to_json());
//! }
//! ```
//!
//! ## Composite keys
//!
//! ```rust,ignore
//! use ouroboros_cassandra::{KeyComponent, KeyValue, ModelQuery, PrimaryKey};
//!
//! let key = PrimaryKey::composite([KeyComponent::new("tenant"), KeyComponent::new("id")]);
//! let row = ModelQuery::new(session.table("accounts")?, key)?
//!     .find_or_fail(KeyValue::composite([("tenant", "x".into()), ("id", 7.into())]), &["*"])
//!     .await?;
//! ```
//!
//! # Errors
//!
//! Misconfiguration (bad binding bucket, non-collection value for a
//! collection update, unusable key metadata) is reported by the offending
//! builder call, before anything is compiled. Transport errors are passed
//! through unchanged from the terminal call; nothing is retried.

/// Value model: `CqlValue`, `CqlType` and literal rendering.
pub mod types;

/// Typed map, set and list values.
pub mod collection;

/// Query builder and CQL grammar.
///
/// Includes SELECT, INSERT, UPDATE, DELETE and CREATE INDEX with:
/// - Predicates over a closed operator set
/// - Collection mutations
/// - Categorised bindings with a fixed update order
pub mod query;

/// Result rows.
pub mod row;

/// Result pages, paging states and page cursors.
pub mod pagination;

/// Driver boundary.
pub mod transport;

/// Statement execution with tracing and slow statement logging.
pub mod executor;

/// Session handle and configuration.
pub mod session;

/// Primary-key aware queries.
pub mod model;

pub use collection::{CollectionKind, CollectionValue};
pub use executor::{Executor, ExecutorConfig};
pub use model::{KeyCaster, KeyComponent, KeyValue, ModelQuery, PrimaryKey};
pub use pagination::{PageCursor, PagingState, ResultPage, Rows};
pub use query::{
    BindingKind, BindingStore, CollectionMutation, CollectionOperation, Grammar, InsertValues,
    Operator, Predicate, QueryBuilder,
};
pub use row::Row;
pub use session::{Session, SessionConfig};
pub use transport::{ExecutionOptions, ResultFuture, Transport};
pub use types::{quote_string, CqlType, CqlValue};

pub use ouroboros_common::{DataBridgeError, Result};
