//! Configuration handling for the DB tools MCP server.
//!
//! Two layers live here. Process options (logging, pool sizing) come from
//! CLI arguments and environment variables via clap. Database settings are
//! read per tool call through a [`ConfigProvider`], so tests can inject them
//! without touching the process environment.

use crate::error::{DbError, DbResult};
use crate::models::{ConnectionSettings, DbEngine, mask_connection_string};
use clap::Parser;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the connection string.
pub const ENV_CONNECTION_STRING: &str = "DB_CONNECTION_STRING";
/// Environment variable holding the engine identifier.
pub const ENV_DATABASE_TYPE: &str = "DB_TYPE";
/// Engine used when `DB_TYPE` is unset or blank.
pub const DEFAULT_DATABASE_TYPE: &str = "MySql";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Process options for the DB tools MCP server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "db-tools-mcp",
    about = "MCP server exposing SQL query, command and schema tools for a configured database",
    version,
    author
)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Log every executed SQL statement with its bound values
    #[arg(long, env = "MCP_LOG_SQL")]
    pub log_sql: bool,

    /// Maximum connections per tool-call pool
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS, env = "MCP_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection
    #[arg(long, default_value_t = DEFAULT_ACQUIRE_TIMEOUT_SECS, env = "MCP_ACQUIRE_TIMEOUT")]
    pub acquire_timeout: u64,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            log_sql: false,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }

    /// Validate option values and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }
        if self.acquire_timeout == 0 {
            return Err("acquire_timeout must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Options handed to the client factory.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout),
            log_sql: self.log_sql,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Pool and logging options applied to every client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Emit one log line per executed statement
    pub log_sql: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Config::default_config().client_options()
    }
}

/// Source of database settings.
pub trait ConfigProvider: Send + Sync {
    /// Raw value for `key`, `None` when unset.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads settings from the process environment at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfigProvider;

impl ConfigProvider for EnvConfigProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed in-memory settings.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    values: HashMap<String, String>,
}

impl StaticConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// What `get_database_config` reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSummary {
    pub configured: bool,
    pub database_type: String,
    /// Password already masked
    pub connection_string: Option<String>,
    pub message: String,
}

/// Resolves database settings from a provider.
#[derive(Clone)]
pub struct ConfigResolver {
    provider: Arc<dyn ConfigProvider>,
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver").finish_non_exhaustive()
    }
}

impl ConfigResolver {
    pub fn new(provider: Arc<dyn ConfigProvider>) -> Self {
        Self { provider }
    }

    /// Resolver backed by the process environment.
    pub fn from_env() -> Self {
        Self::new(Arc::new(EnvConfigProvider))
    }

    fn non_blank(&self, key: &str) -> Option<String> {
        self.provider
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// The configured connection string.
    pub fn connection_string(&self) -> DbResult<String> {
        self.non_blank(ENV_CONNECTION_STRING).ok_or_else(|| {
            DbError::configuration(format!(
                "Environment variable {} is not set",
                ENV_CONNECTION_STRING
            ))
        })
    }

    /// The configured engine identifier, `MySql` when unset.
    pub fn database_type(&self) -> String {
        self.non_blank(ENV_DATABASE_TYPE)
            .unwrap_or_else(|| DEFAULT_DATABASE_TYPE.to_string())
    }

    /// The configured engine.
    pub fn parsed_db_type(&self) -> DbResult<DbEngine> {
        DbEngine::from_identifier(&self.database_type())
    }

    /// Yes/no probe: both settings resolve.
    pub fn validate(&self) -> bool {
        self.connection_string().is_ok() && self.parsed_db_type().is_ok()
    }

    /// Settings for one tool call.
    pub fn connection_settings(&self) -> DbResult<ConnectionSettings> {
        let connection_string = self.connection_string()?;
        let engine = self.parsed_db_type()?;
        Ok(ConnectionSettings::new(connection_string, engine))
    }

    pub fn summary(&self) -> ConfigurationSummary {
        let database_type = self.database_type();
        match self.connection_string() {
            Ok(cs) => {
                let message = match self.parsed_db_type() {
                    Ok(engine) => format!("Configured for {}", engine),
                    Err(e) => e.to_string(),
                };
                ConfigurationSummary {
                    configured: self.validate(),
                    database_type,
                    connection_string: Some(mask_connection_string(&cs)),
                    message,
                }
            }
            Err(_) => ConfigurationSummary {
                configured: false,
                database_type,
                connection_string: None,
                message: format!(
                    "Database connection is not configured. Set {} (and optionally {})",
                    ENV_CONNECTION_STRING, ENV_DATABASE_TYPE
                ),
            },
        }
    }
}
