//! Transaction and batch tools.
//!
//! Both tools run a list of commands on one connection and check each
//! command against the dangerous-operation filter. A flagged or failing
//! command aborts and rolls back a transaction, while in a batch it only
//! fails its own entry.

use crate::db::{PreparedStatement, ScopedClient};
use crate::error::{DbError, DbResult};
use crate::models::{ParameterSet, parameters_from_value};
use crate::tools::guard::ensure_safe;
use crate::tools::{ToolContext, parse_json_arg, parse_optional_json_arg};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteTransactionInput {
    /// JSON array of SQL strings or {"sql": "...", "parameters": {...}} objects
    pub commands: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BatchCommandsInput {
    /// JSON array of SQL command strings
    pub commands: String,
    /// Optional JSON array of parameter objects, matched to commands by position
    #[serde(default)]
    pub parameters_array: Option<String>,
}

/// One command of a transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandSpec {
    Sql(String),
    WithParameters {
        sql: String,
        #[serde(default)]
        parameters: Option<JsonValue>,
    },
}

impl CommandSpec {
    fn into_parts(self) -> (String, Option<JsonValue>) {
        match self {
            Self::Sql(sql) => (sql, None),
            Self::WithParameters { sql, parameters } => (sql, parameters),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutput {
    pub statement_count: usize,
    pub affected_rows: u64,
}

/// Outcome of one batch entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCommandResult {
    pub command_index: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
}

impl BatchCommandResult {
    fn from_outcome(command_index: usize, outcome: DbResult<u64>) -> Self {
        match outcome {
            Ok(affected) => Self {
                command_index,
                success: true,
                affected_rows: Some(affected),
                error: None,
                error_code: None,
            },
            Err(e) => Self {
                command_index,
                success: false,
                affected_rows: None,
                error: Some(e.envelope_message()),
                error_code: Some(e.code().as_i32()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutput {
    pub total_commands: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<BatchCommandResult>,
}

/// Filter and parameterize one command without touching the database.
fn prepare_command(
    client: &ScopedClient,
    sql: &str,
    parameters: Option<&JsonValue>,
) -> DbResult<PreparedStatement> {
    if sql.trim().is_empty() {
        return Err(DbError::invalid_parameters("Command is empty"));
    }
    ensure_safe(sql)?;
    let params: Option<ParameterSet> = parameters.map(parameters_from_value).transpose()?;
    Ok(client.prepare(sql, params.as_ref()))
}

fn non_empty<T>(list: Vec<T>) -> DbResult<Vec<T>> {
    if list.is_empty() {
        return Err(DbError::invalid_parameters("The command list is empty"));
    }
    Ok(list)
}

pub struct TransactionToolHandler {
    ctx: ToolContext,
}

impl TransactionToolHandler {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// All commands commit together or not at all.
    pub async fn execute_transaction(
        &self,
        input: ExecuteTransactionInput,
    ) -> DbResult<TransactionOutput> {
        let commands: Vec<CommandSpec> = non_empty(parse_json_arg("commands", &input.commands)?)?;
        let statement_count = commands.len();

        let client = self.ctx.open_client()?;
        let statements = commands
            .into_iter()
            .map(|command| {
                let (sql, parameters) = command.into_parts();
                prepare_command(&client, &sql, parameters.as_ref())
            })
            .collect();
        let result = client.execute_in_transaction(statements).await;
        client.release().await;
        let affected_rows = result?;

        info!(statement_count, affected_rows, "Transaction committed");
        Ok(TransactionOutput {
            statement_count,
            affected_rows,
        })
    }

    /// Run each command independently on one held connection.
    pub async fn batch_execute_commands(&self, input: BatchCommandsInput) -> DbResult<BatchOutput> {
        let commands: Vec<String> = non_empty(parse_json_arg("commands", &input.commands)?)?;
        let parameters: Vec<JsonValue> =
            parse_optional_json_arg("parameters_array", input.parameters_array.as_deref())?
                .unwrap_or_default();

        let client = self.ctx.open_client()?;
        let statements = commands
            .iter()
            .enumerate()
            .map(|(i, sql)| prepare_command(&client, sql, parameters.get(i)))
            .collect();
        let outcome = client.execute_batch(statements).await;
        client.release().await;

        let results: Vec<BatchCommandResult> = outcome?
            .into_iter()
            .enumerate()
            .map(|(i, outcome)| BatchCommandResult::from_outcome(i, outcome))
            .collect();
        let success_count = results.iter().filter(|r| r.success).count();
        let failure_count = results.len() - success_count;
        if failure_count > 0 {
            warn!(success_count, failure_count, "Batch finished with failures");
        } else {
            info!(success_count, "Batch executed");
        }

        Ok(BatchOutput {
            total_commands: results.len(),
            success_count,
            failure_count,
            results,
        })
    }
}
