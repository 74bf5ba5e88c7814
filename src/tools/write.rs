//! Command tools.
//!
//! This module implements `execute_command`, the row-level insert, update
//! and delete tools and `execute_command_with_go`. Raw SQL passes the
//! dangerous-operation filter before a client is opened.

use crate::error::{DbError, DbResult};
use crate::models::{parameters_from_value, parse_parameters};
use crate::tools::guard::ensure_safe;
use crate::tools::{ToolContext, dialect, parse_json_arg, require};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::LazyLock;
use tracing::info;

static GO_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*GO[ \t]*;?[ \t]*\r?$").expect("GO pattern is valid"));

/// Input for the execute_command tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteCommandInput {
    /// SQL command (INSERT, UPDATE, DELETE, ...). Schema changes are rejected; use the schema tools.
    pub sql: String,
    /// Optional JSON object of parameters for @name markers
    #[serde(default)]
    pub parameters: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InsertDataInput {
    /// Target table, optionally schema-qualified
    pub table_name: String,
    /// JSON object mapping column names to values
    pub data: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateDataInput {
    /// Target table, optionally schema-qualified
    pub table_name: String,
    /// JSON object mapping column names to new values
    pub data: String,
    /// WHERE condition (required), e.g. "id = 5"
    pub where_clause: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteDataInput {
    /// Target table, optionally schema-qualified
    pub table_name: String,
    /// WHERE condition (required), e.g. "id = 5"
    pub where_clause: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GoScriptInput {
    /// Script whose batches are separated by lines containing only GO
    pub sql: String,
}

/// Output from the command tools.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteOutput {
    /// Number of rows affected by the operation
    pub affected_rows: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoScriptOutput {
    pub batch_count: usize,
    pub affected_rows: u64,
}

/// Split a script on `GO` separator lines, dropping empty batches.
pub fn split_go_batches(sql: &str) -> Vec<String> {
    GO_SEPARATOR
        .split(sql)
        .map(str::trim)
        .filter(|batch| !batch.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct WriteToolHandler {
    ctx: ToolContext,
}

impl WriteToolHandler {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    pub async fn execute_command(&self, input: ExecuteCommandInput) -> DbResult<ExecuteOutput> {
        require("sql", &input.sql)?;
        ensure_safe(&input.sql)?;
        let params = parse_parameters(input.parameters.as_deref())?;

        let client = self.ctx.open_client()?;
        let result = client.execute(&input.sql, params.as_ref()).await;
        client.release().await;
        let affected_rows = result?;

        info!(affected_rows, "Command executed");
        Ok(ExecuteOutput { affected_rows })
    }

    pub async fn insert_data(&self, input: InsertDataInput) -> DbResult<ExecuteOutput> {
        require("table_name", &input.table_name)?;
        let data: JsonValue = parse_json_arg("data", &input.data)?;
        let data = parameters_from_value(&data)?;

        let client = self.ctx.open_client()?;
        let result = async {
            let (sql, params) = dialect(&client).insert(&input.table_name, &data)?;
            client.execute(&sql, Some(&params)).await
        }
        .await;
        client.release().await;
        let affected_rows = result?;

        info!(table = %input.table_name, affected_rows, "Row inserted");
        Ok(ExecuteOutput { affected_rows })
    }

    pub async fn update_data(&self, input: UpdateDataInput) -> DbResult<ExecuteOutput> {
        require("table_name", &input.table_name)?;
        require("where_clause", &input.where_clause)?;
        ensure_safe(&input.where_clause)?;
        let data: JsonValue = parse_json_arg("data", &input.data)?;
        let data = parameters_from_value(&data)?;

        let client = self.ctx.open_client()?;
        let result = async {
            let (sql, params) =
                dialect(&client).update(&input.table_name, &data, &input.where_clause)?;
            client.execute(&sql, Some(&params)).await
        }
        .await;
        client.release().await;
        let affected_rows = result?;

        info!(table = %input.table_name, affected_rows, "Rows updated");
        Ok(ExecuteOutput { affected_rows })
    }

    pub async fn delete_data(&self, input: DeleteDataInput) -> DbResult<ExecuteOutput> {
        require("table_name", &input.table_name)?;
        require("where_clause", &input.where_clause)?;
        ensure_safe(&input.where_clause)?;

        let client = self.ctx.open_client()?;
        let result = async {
            let sql = dialect(&client).delete(&input.table_name, &input.where_clause)?;
            client.execute(&sql, None).await
        }
        .await;
        client.release().await;
        let affected_rows = result?;

        info!(table = %input.table_name, affected_rows, "Rows deleted");
        Ok(ExecuteOutput { affected_rows })
    }

    /// Run each batch in order, stopping at the first failure.
    pub async fn execute_command_with_go(&self, input: GoScriptInput) -> DbResult<GoScriptOutput> {
        require("sql", &input.sql)?;
        let batches = split_go_batches(&input.sql);
        if batches.is_empty() {
            return Err(DbError::invalid_parameters("The script contains no statements"));
        }
        for batch in &batches {
            ensure_safe(batch)?;
        }

        let client = self.ctx.open_client()?;
        let result = async {
            let mut total = 0;
            for batch in &batches {
                total += client.execute(batch, None).await?;
            }
            Ok::<_, DbError>(total)
        }
        .await;
        client.release().await;
        let affected_rows = result?;

        info!(batches = batches.len(), affected_rows, "GO script executed");
        Ok(GoScriptOutput {
            batch_count: batches.len(),
            affected_rows,
        })
    }
}
