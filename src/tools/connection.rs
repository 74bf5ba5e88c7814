//! Connection and configuration tools.

use crate::config::ConfigurationSummary;
use crate::error::DbResult;
use crate::tools::ToolContext;
use serde::Serialize;
use tracing::info;

/// Output of `test_connection`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionOutput {
    pub message: String,
    pub connected: bool,
    pub database_type: String,
}

/// Output of `validate_configuration`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutput {
    pub valid: bool,
    #[serde(flatten)]
    pub summary: ConfigurationSummary,
}

pub struct ConnectionToolHandler {
    ctx: ToolContext,
}

impl ConnectionToolHandler {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Run `SELECT 1` against the configured database.
    pub async fn test_connection(&self) -> DbResult<TestConnectionOutput> {
        let client = self.ctx.open_client()?;
        let engine = client.engine();
        let probe = client.probe().await;
        client.release().await;
        probe?;

        info!(engine = %engine, "Connection test succeeded");
        Ok(TestConnectionOutput {
            message: format!("Successfully connected to {}", engine),
            connected: true,
            database_type: engine.to_string(),
        })
    }

    pub fn get_database_config(&self) -> ConfigurationSummary {
        self.ctx.resolver().summary()
    }

    pub fn validate_configuration(&self) -> ValidationOutput {
        let resolver = self.ctx.resolver();
        ValidationOutput {
            valid: resolver.validate(),
            summary: resolver.summary(),
        }
    }
}
