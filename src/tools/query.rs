//! Query tools.
//!
//! These tools return rows and do not run the dangerous-operation filter:
//! whatever SQL the caller submits here is sent as-is.

use crate::db::expand_in_list;
use crate::error::{DbError, DbResult};
use crate::models::{ParameterSet, Row, ScalarType, parse_parameters};
use crate::tools::{ToolContext, parse_json_arg, require};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;

/// Input shared by the plain query tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SqlQueryInput {
    /// SQL to execute. Named parameters use @name or :name markers.
    pub sql: String,
    /// Optional JSON object of parameters, e.g. {"id": 5, "name": "a"}
    #[serde(default)]
    pub parameters: Option<String>,
}

/// Input for `get_scalar`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ScalarInput {
    /// SQL whose first column of the first row is returned
    pub sql: String,
    /// Optional JSON object of parameters
    #[serde(default)]
    pub parameters: Option<String>,
    /// Convert the value to: any (default), string, int, long, double, decimal or datetime
    #[serde(default)]
    pub value_type: Option<ScalarType>,
}

/// Input for `sql_query_with_in_parameter`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InParameterInput {
    /// SQL containing the list marker, e.g. SELECT * FROM orders WHERE id IN (@ids)
    pub sql: String,
    /// Name of the list parameter, e.g. "ids"
    pub in_parameter_name: String,
    /// JSON array of values, e.g. [1, 2, 3]
    pub in_values: String,
    /// Optional JSON object with the other parameters
    #[serde(default)]
    pub other_parameters: Option<String>,
}

/// Rows of one result set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutput {
    pub row_count: usize,
    pub data: Vec<Row>,
}

impl From<Vec<Row>> for QueryOutput {
    fn from(data: Vec<Row>) -> Self {
        Self {
            row_count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SingleRowOutput {
    pub data: Option<Row>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSetsOutput {
    pub result_set_count: usize,
    pub result_sets: Vec<QueryOutput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoResultSetsOutput {
    pub first_result_set: Vec<Row>,
    pub second_result_set: Vec<Row>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarOutput {
    pub value: JsonValue,
    pub value_type: &'static str,
}

pub struct QueryToolHandler {
    ctx: ToolContext,
}

impl QueryToolHandler {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Parse parameters first so malformed JSON never opens a client.
    fn prepare(input: &SqlQueryInput) -> DbResult<Option<ParameterSet>> {
        require("sql", &input.sql)?;
        parse_parameters(input.parameters.as_deref())
    }

    pub async fn sql_query(&self, input: SqlQueryInput) -> DbResult<QueryOutput> {
        let params = Self::prepare(&input)?;
        let client = self.ctx.open_client()?;
        let result = client.query(&input.sql, params.as_ref()).await;
        client.release().await;
        let rows = result?;

        info!(rows = rows.len(), "Query executed");
        Ok(rows.into())
    }

    pub async fn sql_query_single(&self, input: SqlQueryInput) -> DbResult<SingleRowOutput> {
        let params = Self::prepare(&input)?;
        let client = self.ctx.open_client()?;
        let result = client.query_first(&input.sql, params.as_ref()).await;
        client.release().await;
        Ok(SingleRowOutput { data: result? })
    }

    /// Every result set of a multi-statement script.
    pub async fn get_data_set_all(&self, input: SqlQueryInput) -> DbResult<ResultSetsOutput> {
        let params = Self::prepare(&input)?;
        let client = self.ctx.open_client()?;
        let result = client.query_sets(&input.sql, params.as_ref()).await;
        client.release().await;
        let sets = result?;

        info!(result_sets = sets.len(), "Script executed");
        Ok(ResultSetsOutput {
            result_set_count: sets.len(),
            result_sets: sets.into_iter().map(QueryOutput::from).collect(),
        })
    }

    /// The first two result sets of a script; fewer than two is an error.
    pub async fn sql_query_multiple(&self, input: SqlQueryInput) -> DbResult<TwoResultSetsOutput> {
        let params = Self::prepare(&input)?;
        let client = self.ctx.open_client()?;
        let result = client.query_sets(&input.sql, params.as_ref()).await;
        client.release().await;

        let mut sets = result?.into_iter();
        match (sets.next(), sets.next()) {
            (Some(first_result_set), Some(second_result_set)) => Ok(TwoResultSetsOutput {
                first_result_set,
                second_result_set,
            }),
            _ => Err(DbError::invalid_parameters(
                "The SQL must produce at least two result sets (two SELECT statements separated by ';')",
            )),
        }
    }

    pub async fn get_scalar(&self, input: ScalarInput) -> DbResult<ScalarOutput> {
        require("sql", &input.sql)?;
        let params = parse_parameters(input.parameters.as_deref())?;
        let value_type = input.value_type.unwrap_or_default();

        let client = self.ctx.open_client()?;
        let result = client.query_first(&input.sql, params.as_ref()).await;
        client.release().await;

        let value = match result?.as_ref().and_then(Row::first) {
            Some(value) => value.coerce(value_type)?,
            None => JsonValue::Null,
        };
        Ok(ScalarOutput {
            value,
            value_type: value_type.name(),
        })
    }

    /// Expand a JSON array into an IN list and run the query.
    pub async fn sql_query_with_in_parameter(
        &self,
        input: InParameterInput,
    ) -> DbResult<QueryOutput> {
        require("sql", &input.sql)?;
        let values: Vec<JsonValue> = parse_json_arg("in_values", &input.in_values)?;
        let other = parse_parameters(input.other_parameters.as_deref())?;

        let client = self.ctx.open_client()?;
        let result = async {
            let (sql, mut params) =
                expand_in_list(&input.sql, &input.in_parameter_name, &values, client.driver())?;
            if let Some(other) = other {
                params.extend(other);
            }
            client.query(&sql, Some(&params)).await
        }
        .await;
        client.release().await;
        let rows = result?;

        info!(rows = rows.len(), in_values = values.len(), "IN-list query executed");
        Ok(rows.into())
    }
}
