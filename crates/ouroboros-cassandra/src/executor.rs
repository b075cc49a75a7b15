//! Statement execution with observability.
//!
//! This module wraps a [`Transport`] with:
//! - Tracing spans for statement monitoring
//! - Slow statement logging
//! - Logging of transport failures
//!
//! Failures are returned unchanged. There is no retry loop here: whether a
//! statement is safe to re-send is the transport's call.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::pagination::ResultPage;
use crate::transport::{ExecutionOptions, ResultFuture, Transport};
use crate::Result;

/// Configuration for statement execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Threshold for slow statement logging in milliseconds
    pub slow_query_threshold_ms: u64,
    /// Number of characters of CQL included in log fields
    pub cql_preview_len: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: 1000, // 1 second
            cql_preview_len: 100,
        }
    }
}

/// Statement executor shared by every builder of a session.
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
    config: ExecutorConfig,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Create a new executor.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            config: ExecutorConfig::default(),
        }
    }

    /// Create an executor with custom configuration.
    pub fn with_config(transport: Arc<dyn Transport>, config: ExecutorConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute a statement and wait for its first page.
    #[instrument(skip(self, cql, options), fields(
        cql_preview = %self.preview(cql),
        arguments = options.arguments.len(),
        paged = options.paging_state.is_some()
    ))]
    pub async fn execute(&self, cql: &str, options: ExecutionOptions) -> Result<ResultPage> {
        let start = Instant::now();

        match self.transport.execute(cql, options).await {
            Ok(page) => {
                self.log_statement_completion(cql, start.elapsed(), page.count());
                Ok(page)
            }
            Err(e) => {
                warn!(
                    cql = %self.preview(cql),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Statement failed"
                );
                Err(e)
            }
        }
    }

    /// Hand a statement to the transport without waiting for it.
    pub fn execute_async(&self, cql: String, options: ExecutionOptions) -> ResultFuture {
        debug!(
            cql = %self.preview(&cql),
            arguments = options.arguments.len(),
            "Dispatching asynchronous statement"
        );
        Arc::clone(&self.transport).execute_async(cql, options)
    }

    fn preview(&self, cql: &str) -> String {
        cql.chars().take(self.config.cql_preview_len).collect()
    }

    /// Log statement completion with slow statement detection.
    fn log_statement_completion(&self, cql: &str, elapsed: Duration, rows: usize) {
        let elapsed_ms = elapsed.as_millis() as u64;

        if elapsed_ms >= self.config.slow_query_threshold_ms {
            warn!(
                cql = %self.preview(cql),
                elapsed_ms = elapsed_ms,
                threshold_ms = self.config.slow_query_threshold_ms,
                rows = rows,
                "Slow statement detected"
            );
        } else {
            debug!(
                cql = %self.preview(cql),
                elapsed_ms = elapsed_ms,
                rows = rows,
                "Statement completed"
            );
        }
    }
}
