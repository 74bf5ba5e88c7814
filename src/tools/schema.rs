//! Schema introspection tools.
//!
//! This module implements the catalog listing tools, `get_table_schema` and
//! the existence checks. Each call opens a client, asks the
//! [`SchemaInspector`], and releases the client before returning.

use crate::db::SchemaInspector;
use crate::error::DbResult;
use crate::models::{ColumnInfo, DbObjectInfo, TableSchema};
use crate::tools::{ToolContext, require};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableInput {
    /// Table name, optionally schema-qualified
    pub table_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ColumnInput {
    /// Table name, optionally schema-qualified
    pub table_name: String,
    /// Column name
    pub column_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ConstraintInput {
    /// Constraint name
    pub constraint_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct IndexInput {
    /// Index name
    pub index_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamesOutput {
    pub count: usize,
    pub data: Vec<String>,
}

impl From<Vec<String>> for NamesOutput {
    fn from(data: Vec<String>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectsOutput {
    pub count: usize,
    pub data: Vec<DbObjectInfo>,
}

impl From<Vec<DbObjectInfo>> for ObjectsOutput {
    fn from(data: Vec<DbObjectInfo>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnsOutput {
    pub table_name: String,
    pub count: usize,
    pub data: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExistsOutput {
    pub exists: bool,
}

impl From<bool> for ExistsOutput {
    fn from(exists: bool) -> Self {
        Self { exists }
    }
}

pub struct SchemaToolHandler {
    ctx: ToolContext,
}

impl SchemaToolHandler {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    pub async fn get_database_list(&self) -> DbResult<NamesOutput> {
        with_client!(self.ctx, |client| SchemaInspector::list_databases(&client).await)
            .map(NamesOutput::from)
    }

    pub async fn get_table_info_list(&self) -> DbResult<ObjectsOutput> {
        with_client!(self.ctx, |client| SchemaInspector::list_tables(&client).await)
            .map(ObjectsOutput::from)
    }

    pub async fn get_view_info_list(&self) -> DbResult<ObjectsOutput> {
        with_client!(self.ctx, |client| SchemaInspector::list_views(&client).await)
            .map(ObjectsOutput::from)
    }

    pub async fn get_column_infos_by_table_name(&self, input: TableInput) -> DbResult<ColumnsOutput> {
        require("table_name", &input.table_name)?;
        let data = with_client!(self.ctx, |client| {
            SchemaInspector::list_columns(&client, &input.table_name).await
        })?;
        Ok(ColumnsOutput {
            table_name: input.table_name,
            count: data.len(),
            data,
        })
    }

    pub async fn get_is_identities(&self, input: TableInput) -> DbResult<NamesOutput> {
        require("table_name", &input.table_name)?;
        with_client!(self.ctx, |client| {
            SchemaInspector::identity_columns(&client, &input.table_name).await
        })
        .map(NamesOutput::from)
    }

    pub async fn get_primaries(&self, input: TableInput) -> DbResult<NamesOutput> {
        require("table_name", &input.table_name)?;
        with_client!(self.ctx, |client| {
            SchemaInspector::primary_keys(&client, &input.table_name).await
        })
        .map(NamesOutput::from)
    }

    pub async fn get_index_list(&self, input: TableInput) -> DbResult<NamesOutput> {
        require("table_name", &input.table_name)?;
        with_client!(self.ctx, |client| {
            SchemaInspector::list_indexes(&client, &input.table_name).await
        })
        .map(NamesOutput::from)
    }

    pub async fn get_proc_list(&self) -> DbResult<NamesOutput> {
        with_client!(self.ctx, |client| SchemaInspector::list_procedures(&client).await)
            .map(NamesOutput::from)
    }

    pub async fn get_func_list(&self) -> DbResult<NamesOutput> {
        with_client!(self.ctx, |client| SchemaInspector::list_functions(&client).await)
            .map(NamesOutput::from)
    }

    pub async fn get_trigger_names(&self, input: TableInput) -> DbResult<NamesOutput> {
        require("table_name", &input.table_name)?;
        with_client!(self.ctx, |client| {
            SchemaInspector::list_triggers(&client, &input.table_name).await
        })
        .map(NamesOutput::from)
    }

    pub async fn get_db_types(&self) -> DbResult<NamesOutput> {
        with_client!(self.ctx, |client| SchemaInspector::list_db_types(&client).await)
            .map(NamesOutput::from)
    }

    pub async fn get_table_schema(&self, input: TableInput) -> DbResult<TableSchema> {
        require("table_name", &input.table_name)?;
        with_client!(self.ctx, |client| {
            SchemaInspector::table_schema(&client, &input.table_name).await
        })
    }

    pub async fn is_any_table(&self, input: TableInput) -> DbResult<ExistsOutput> {
        require("table_name", &input.table_name)?;
        with_client!(self.ctx, |client| {
            SchemaInspector::table_exists(&client, &input.table_name).await
        })
        .map(ExistsOutput::from)
    }

    pub async fn is_any_column(&self, input: ColumnInput) -> DbResult<ExistsOutput> {
        require("table_name", &input.table_name)?;
        require("column_name", &input.column_name)?;
        with_client!(self.ctx, |client| {
            SchemaInspector::column_exists(&client, &input.table_name, &input.column_name).await
        })
        .map(ExistsOutput::from)
    }

    pub async fn is_primary_key(&self, input: ColumnInput) -> DbResult<ExistsOutput> {
        require("table_name", &input.table_name)?;
        require("column_name", &input.column_name)?;
        with_client!(self.ctx, |client| {
            SchemaInspector::is_primary_key(&client, &input.table_name, &input.column_name).await
        })
        .map(ExistsOutput::from)
    }

    pub async fn is_identity(&self, input: ColumnInput) -> DbResult<ExistsOutput> {
        require("table_name", &input.table_name)?;
        require("column_name", &input.column_name)?;
        with_client!(self.ctx, |client| {
            SchemaInspector::is_identity(&client, &input.table_name, &input.column_name).await
        })
        .map(ExistsOutput::from)
    }

    pub async fn is_any_constraint(&self, input: ConstraintInput) -> DbResult<ExistsOutput> {
        require("constraint_name", &input.constraint_name)?;
        with_client!(self.ctx, |client| {
            SchemaInspector::constraint_exists(&client, &input.constraint_name).await
        })
        .map(ExistsOutput::from)
    }

    pub async fn is_any_index(&self, input: IndexInput) -> DbResult<ExistsOutput> {
        require("index_name", &input.index_name)?;
        with_client!(self.ctx, |client| {
            SchemaInspector::index_exists(&client, &input.index_name).await
        })
        .map(ExistsOutput::from)
    }

    pub async fn is_any_table_remark(&self, input: TableInput) -> DbResult<ExistsOutput> {
        require("table_name", &input.table_name)?;
        with_client!(self.ctx, |client| {
            SchemaInspector::table_has_remark(&client, &input.table_name).await
        })
        .map(ExistsOutput::from)
    }
}
