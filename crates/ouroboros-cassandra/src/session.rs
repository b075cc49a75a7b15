//! Session handle: a transport plus the configuration every builder starts from.

use std::env;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{info, instrument};

use crate::executor::{Executor, ExecutorConfig};
use crate::query::QueryBuilder;
use crate::transport::Transport;
use crate::{DataBridgeError, Result};

/// Environment variable overriding [`SessionConfig::default_page_size`].
pub const ENV_PAGE_SIZE: &str = "OUROBOROS_CQL_PAGE_SIZE";
/// Environment variable overriding [`ExecutorConfig::slow_query_threshold_ms`].
pub const ENV_SLOW_QUERY_MS: &str = "OUROBOROS_CQL_SLOW_QUERY_MS";

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Page size used by `paginate` when the caller gives none.
    pub default_page_size: i32,
    /// Statement execution settings.
    pub executor: ExecutorConfig,
    /// Passthrough options (e.g. consistency) every new builder starts with.
    pub default_options: JsonMap<String, JsonValue>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_page_size: 15,
            executor: ExecutorConfig::default(),
            default_options: JsonMap::new(),
        }
    }
}

impl SessionConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `OUROBOROS_CQL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = SessionConfig::default();

        if let Ok(raw) = env::var(ENV_PAGE_SIZE) {
            config.default_page_size = raw.trim().parse().map_err(|_| {
                DataBridgeError::Configuration(format!("{} must be an integer, got '{}'", ENV_PAGE_SIZE, raw))
            })?;
        }
        if let Ok(raw) = env::var(ENV_SLOW_QUERY_MS) {
            config.executor.slow_query_threshold_ms = raw.trim().parse().map_err(|_| {
                DataBridgeError::Configuration(format!("{} must be an integer, got '{}'", ENV_SLOW_QUERY_MS, raw))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_page_size <= 0 {
            return Err(DataBridgeError::Configuration(format!(
                "default_page_size must be positive, got {}",
                self.default_page_size
            )));
        }
        Ok(())
    }
}

/// Entry point for building statements against one transport.
///
/// Cloning is cheap; clones share the transport.
#[derive(Debug, Clone)]
pub struct Session {
    executor: Executor,
    config: SessionConfig,
}

impl Session {
    /// Creates a session with default configuration.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            executor: Executor::new(transport),
            config: SessionConfig::default(),
        }
    }

    /// Creates a session with custom configuration.
    #[instrument(skip(transport, config), fields(
        default_page_size = config.default_page_size,
        slow_query_threshold_ms = config.executor.slow_query_threshold_ms
    ))]
    pub fn with_config(transport: Arc<dyn Transport>, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        info!("Session initialized");
        Ok(Self {
            executor: Executor::with_config(transport, config.executor.clone()),
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// A fresh builder with no target table yet.
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.executor.clone())
            .with_options(self.config.default_options.clone())
            .with_default_page_size(self.config.default_page_size)
    }

    /// A fresh builder targeting `table`.
    pub fn table(&self, table: &str) -> Result<QueryBuilder> {
        self.query().from(table)
    }
}
