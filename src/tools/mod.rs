//! MCP tool implementations.
//!
//! This module contains all database tool handlers:
//! - `connection`: connectivity probe and configuration reporting
//! - `query`: row, scalar, multi-result-set and IN-list queries
//! - `write`: single commands, row insert/update/delete and GO scripts
//! - `transaction`: transactional and batched command lists
//! - `procedure`: stored procedure calls
//! - `schema`: catalog introspection and existence checks
//! - `alter`: schema mutation
//! - `guard`: the dangerous-operation filter
//!
//! Every handler opens its own [`ScopedClient`] and releases it before
//! returning, whatever the outcome. [`run_tool`] is the only place where a
//! handler's `DbResult` turns into the response envelope.

/// Open a client, evaluate `$body` with it bound to `$client`, then release
/// the client before yielding the body's `DbResult`.
macro_rules! with_client {
    ($ctx:expr, |$client:ident| $body:expr) => {{
        let $client = $ctx.open_client()?;
        let result = async { $body }.await;
        $client.release().await;
        result
    }};
}

pub mod alter;
pub mod connection;
pub mod guard;
pub mod procedure;
pub mod query;
pub mod schema;
pub mod transaction;
pub mod write;

pub use alter::AlterToolHandler;
pub use connection::ConnectionToolHandler;
pub use procedure::ProcedureToolHandler;
pub use query::QueryToolHandler;
pub use schema::SchemaToolHandler;
pub use transaction::TransactionToolHandler;
pub use write::WriteToolHandler;

use crate::config::{ClientOptions, ConfigResolver};
use crate::db::{ClientFactory, Dialect, ScopedClient};
use crate::error::{DbError, DbResult};
use crate::models::ToolResponse;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

/// What every handler needs to open a client.
#[derive(Debug, Clone)]
pub struct ToolContext {
    resolver: ConfigResolver,
    factory: ClientFactory,
}

impl ToolContext {
    pub fn new(resolver: ConfigResolver, options: ClientOptions) -> Self {
        Self {
            resolver,
            factory: ClientFactory::new(options),
        }
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Resolve settings and build a client for this call.
    pub fn open_client(&self) -> DbResult<ScopedClient> {
        let settings = self.resolver.connection_settings()?;
        self.factory.create(&settings)
    }
}

/// Dialect of a client's driver.
pub(crate) fn dialect(client: &ScopedClient) -> Dialect {
    Dialect::new(client.driver())
}

/// Run one tool call inside its span and render the envelope.
pub async fn run_tool<T, F>(tool: &'static str, call: F) -> String
where
    T: Serialize,
    F: Future<Output = DbResult<T>>,
{
    let span = info_span!("tool", name = tool, call_id = %Uuid::new_v4());
    async move {
        debug!("Tool call started");
        let outcome = call.await.and_then(|payload| {
            serde_json::to_value(payload)
                .map_err(|e| DbError::internal(format!("Failed to serialize result: {}", e)))
        });
        let response = match outcome {
            Ok(payload) => ToolResponse::ok(payload),
            Err(e) => {
                warn!(tool, code = e.code().as_i32(), error = %e, "Tool call failed");
                ToolResponse::from_error(&e)
            }
        };
        response.to_json()
    }
    .instrument(span)
    .await
}

/// Parse a required JSON argument.
pub(crate) fn parse_json_arg<T: DeserializeOwned>(name: &str, text: &str) -> DbResult<T> {
    if text.trim().is_empty() {
        return Err(DbError::invalid_parameters(format!("'{}' is required", name)));
    }
    serde_json::from_str(text)
        .map_err(|e| DbError::invalid_parameters(format!("'{}' is not valid JSON: {}", name, e)))
}

/// Parse an optional JSON argument; absent or blank text is `None`.
pub(crate) fn parse_optional_json_arg<T: DeserializeOwned>(
    name: &str,
    text: Option<&str>,
) -> DbResult<Option<T>> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => parse_json_arg(name, t).map(Some),
        None => Ok(None),
    }
}

/// Reject a blank required string argument.
pub(crate) fn require(name: &str, value: &str) -> DbResult<()> {
    if value.trim().is_empty() {
        return Err(DbError::invalid_parameters(format!("'{}' is required", name)));
    }
    Ok(())
}
