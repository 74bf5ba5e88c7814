//! DB Tools MCP Server - Main entry point.
//!
//! Serves the database tools over stdio. Database settings come from
//! `DB_CONNECTION_STRING` and `DB_TYPE` and are read on every tool call.

use db_tools_mcp::config::{Config, ConfigResolver};
use db_tools_mcp::mcp::DbService;
use db_tools_mcp::transport::{StdioTransport, Transport};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber. stdout belongs to the protocol, so
/// every layer writes to stderr.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse_args();

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    init_tracing(&config);

    info!(
        max_connections = config.max_connections,
        acquire_timeout = config.acquire_timeout,
        log_sql = config.log_sql,
        "Starting DB Tools MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let summary = ConfigResolver::from_env().summary();
    if summary.configured {
        info!(
            database_type = %summary.database_type,
            connection_string = summary.connection_string.as_deref().unwrap_or_default(),
            "Database configured"
        );
    } else {
        warn!("{}", summary.message);
    }

    let transport = StdioTransport::new(DbService::from_config(&config));
    info!(transport = transport.name(), "Using stdio transport");

    if let Err(e) = transport.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
