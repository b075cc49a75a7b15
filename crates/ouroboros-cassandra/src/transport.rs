//! The boundary to the driver that actually talks to the cluster.
//!
//! The query layer never opens sessions or sockets. It hands a compiled
//! statement and its [`ExecutionOptions`] to a [`Transport`] and gets a
//! [`ResultPage`] back.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::pagination::{PagingState, ResultPage};
use crate::{CqlValue, DataBridgeError, Result};

/// Handle for a statement whose result is awaited later (or never).
pub type ResultFuture = BoxFuture<'static, Result<ResultPage>>;

/// Per-statement options handed to the transport.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Positional values for the statement's `?` placeholders.
    pub arguments: Vec<CqlValue>,
    /// Requested page size; None lets the transport decide.
    pub page_size: Option<i32>,
    /// Cursor from a previous page.
    pub paging_state: Option<PagingState>,
    /// Free-form options (consistency level, timeouts, ...) set via `with_options`.
    pub passthrough: JsonMap<String, JsonValue>,
}

impl ExecutionOptions {
    pub fn new(arguments: Vec<CqlValue>, passthrough: JsonMap<String, JsonValue>) -> Self {
        Self {
            arguments,
            passthrough,
            ..Default::default()
        }
    }

    /// Mapping form of the options, for transports configured through key/value maps.
    ///
    /// Recognized keys (`arguments`, `page_size`, `paging_state_token`) override
    /// passthrough entries of the same name.
    pub fn to_json(&self) -> JsonValue {
        let mut map = self.passthrough.clone();
        map.insert(
            "arguments".to_string(),
            JsonValue::Array(self.arguments.iter().map(CqlValue::to_json).collect()),
        );
        if let Some(size) = self.page_size {
            map.insert("page_size".to_string(), JsonValue::from(size));
        }
        if let Some(state) = &self.paging_state {
            map.insert(
                "paging_state_token".to_string(),
                JsonValue::String(state.to_hex()),
            );
        }
        JsonValue::Object(map)
    }
}

/// A driver able to run compiled CQL.
///
/// Errors are returned as-is to the caller of the terminal builder method; the
/// query layer does not retry or rewrite statements.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Executes a statement and waits for its first page.
    async fn execute(&self, cql: &str, options: ExecutionOptions) -> Result<ResultPage>;

    /// Hands a statement over for asynchronous execution.
    ///
    /// The default spawns [`Transport::execute`] on the current Tokio runtime,
    /// so the statement is sent even when the returned future is dropped.
    /// Must be called from within a runtime.
    fn execute_async(self: Arc<Self>, cql: String, options: ExecutionOptions) -> ResultFuture {
        let handle = tokio::spawn(async move { self.execute(&cql, options).await });
        Box::pin(async move {
            handle.await.map_err(|e| {
                DataBridgeError::Transport(format!("Asynchronous statement did not complete: {}", e))
            })?
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_to_json() {
        let mut passthrough = JsonMap::new();
        passthrough.insert("consistency".to_string(), JsonValue::from("LOCAL_QUORUM"));
        passthrough.insert("arguments".to_string(), JsonValue::from("overridden"));

        let mut options = ExecutionOptions::new(vec![CqlValue::Int(1)], passthrough);
        options.page_size = Some(50);
        options.paging_state = Some(PagingState::from_bytes(vec![0x01, 0xab]));

        assert_eq!(
            options.to_json(),
            serde_json::json!({
                "consistency": "LOCAL_QUORUM",
                "arguments": [1],
                "page_size": 50,
                "paging_state_token": "01ab",
            })
        );
    }

    #[test]
    fn test_default_options_are_empty() {
        let options = ExecutionOptions::default();
        assert!(options.arguments.is_empty());
        assert!(options.page_size.is_none());
        assert!(options.paging_state.is_none());
        assert_eq!(options.to_json(), serde_json::json!({"arguments": []}));
    }
}
