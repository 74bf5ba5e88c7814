//! Stored procedure tools.

use crate::error::{DbError, DbResult};
use crate::models::{ParameterSet, Row, parse_parameters};
use crate::tools::{ToolContext, dialect, parse_optional_json_arg, require};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CallProcedureInput {
    /// Procedure name, optionally schema-qualified
    pub procedure_name: String,
    /// Optional JSON object of input parameters, passed in object order
    #[serde(default)]
    pub parameters: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CallProcedureWithOutputInput {
    /// Procedure name, optionally schema-qualified
    pub procedure_name: String,
    /// Optional JSON object of input parameters
    #[serde(default)]
    pub input_parameters: Option<String>,
    /// Optional JSON array of output parameter names, e.g. ["total"]
    #[serde(default)]
    pub output_parameters: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureOutput {
    pub row_count: usize,
    pub data: Vec<Row>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureWithOutputOutput {
    pub row_count: usize,
    pub data: Vec<Row>,
    pub output_parameters: Row,
}

/// Output names become session variables or column names; keep them plain.
fn validate_output_names(names: &[String]) -> DbResult<Vec<String>> {
    names
        .iter()
        .map(|raw| {
            let name = crate::models::params::normalize_name(raw);
            let valid = !name.is_empty()
                && name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
                && name.chars().all(|c| c.is_alphanumeric() || c == '_');
            if valid {
                Ok(name.to_string())
            } else {
                Err(DbError::invalid_parameters(format!(
                    "Invalid output parameter name '{}'",
                    raw
                )))
            }
        })
        .collect()
}

pub struct ProcedureToolHandler {
    ctx: ToolContext,
}

impl ProcedureToolHandler {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    pub async fn call_stored_procedure(&self, input: CallProcedureInput) -> DbResult<ProcedureOutput> {
        require("procedure_name", &input.procedure_name)?;
        let params = parse_parameters(input.parameters.as_deref())?.unwrap_or_default();

        let client = self.ctx.open_client()?;
        let result = async {
            let name = dialect(&client).quote_ident(&input.procedure_name)?;
            client.call_procedure(&name, &params).await
        }
        .await;
        client.release().await;
        let data = result?;

        info!(procedure = %input.procedure_name, rows = data.len(), "Procedure called");
        Ok(ProcedureOutput {
            row_count: data.len(),
            data,
        })
    }

    pub async fn call_stored_procedure_with_output(
        &self,
        input: CallProcedureWithOutputInput,
    ) -> DbResult<ProcedureWithOutputOutput> {
        require("procedure_name", &input.procedure_name)?;
        let inputs: ParameterSet =
            parse_parameters(input.input_parameters.as_deref())?.unwrap_or_default();
        let outputs: Vec<String> =
            parse_optional_json_arg("output_parameters", input.output_parameters.as_deref())?
                .unwrap_or_default();
        let outputs = validate_output_names(&outputs)?;

        let client = self.ctx.open_client()?;
        let result = async {
            let name = dialect(&client).quote_ident(&input.procedure_name)?;
            client
                .call_procedure_with_output(&name, &inputs, &outputs)
                .await
        }
        .await;
        client.release().await;
        let (data, output_parameters) = result?;

        info!(
            procedure = %input.procedure_name,
            rows = data.len(),
            outputs = outputs.len(),
            "Procedure called with output parameters"
        );
        Ok(ProcedureWithOutputOutput {
            row_count: data.len(),
            data,
            output_parameters,
        })
    }
}
