//! MCP service implementation using rmcp.
//!
//! This module defines the DbService struct with every database tool
//! exposed via the MCP protocol using the rmcp framework's macros. Each tool
//! builds its handler from the shared [`ToolContext`], runs it through
//! [`run_tool`] and returns the response envelope as pretty JSON text.

use crate::config::{Config, ConfigResolver};
use crate::tools::alter::{
    AlterToolHandler, BackupTableInput, ColumnDefinitionInput, ColumnNameInput,
    ColumnRemarkInput, ConstraintNameInput, CreateIndexInput, DefaultValueInput, ObjectNameInput,
    PrimaryKeyInput, RenameColumnInput, RenameTableInput, TableNameInput, TableRemarkInput,
};
use crate::tools::procedure::{
    CallProcedureInput, CallProcedureWithOutputInput, ProcedureToolHandler,
};
use crate::tools::query::{InParameterInput, QueryToolHandler, ScalarInput, SqlQueryInput};
use crate::tools::schema::{
    ColumnInput, ConstraintInput, IndexInput, SchemaToolHandler, TableInput,
};
use crate::tools::transaction::{
    BatchCommandsInput, ExecuteTransactionInput, TransactionToolHandler,
};
use crate::tools::write::{
    DeleteDataInput, ExecuteCommandInput, GoScriptInput, InsertDataInput, UpdateDataInput,
    WriteToolHandler,
};
use crate::tools::{ConnectionToolHandler, ToolContext, run_tool};
use rmcp::{
    ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

#[derive(Clone)]
pub struct DbService {
    /// Settings source and client options shared by every tool call
    ctx: ToolContext,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl DbService {
    pub fn new(ctx: ToolContext) -> Self {
        Self {
            ctx,
            tool_router: Self::tool_router(),
        }
    }

    /// Service reading database settings from the process environment.
    pub fn from_config(config: &Config) -> Self {
        Self::new(ToolContext::new(
            ConfigResolver::from_env(),
            config.client_options(),
        ))
    }

    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }
}

#[tool_router]
impl DbService {
    // Connection and configuration

    #[tool(description = "Test the configured database connection by running SELECT 1.")]
    pub async fn test_connection(&self) -> String {
        let handler = ConnectionToolHandler::new(self.ctx.clone());
        run_tool("test_connection", handler.test_connection()).await
    }

    #[tool(
        description = "Show the database configuration: type and connection string with the password masked."
    )]
    pub async fn get_database_config(&self) -> String {
        let handler = ConnectionToolHandler::new(self.ctx.clone());
        run_tool("get_database_config", async {
            Ok(handler.get_database_config())
        })
        .await
    }

    #[tool(
        description = "Check that a connection string is configured and the database type is recognized. Does not connect."
    )]
    pub async fn validate_configuration(&self) -> String {
        let handler = ConnectionToolHandler::new(self.ctx.clone());
        run_tool("validate_configuration", async {
            Ok(handler.validate_configuration())
        })
        .await
    }

    // Queries

    #[tool(
        description = "Run a query and return all rows.\nParameters are a JSON object bound to @name markers.\nQueries are not checked by the dangerous-operation filter."
    )]
    pub async fn sql_query(&self, Parameters(input): Parameters<SqlQueryInput>) -> String {
        let handler = QueryToolHandler::new(self.ctx.clone());
        run_tool("sql_query", handler.sql_query(input)).await
    }

    #[tool(description = "Run a query and return only its first row, or null when there is none.")]
    pub async fn sql_query_single(&self, Parameters(input): Parameters<SqlQueryInput>) -> String {
        let handler = QueryToolHandler::new(self.ctx.clone());
        run_tool("sql_query_single", handler.sql_query_single(input)).await
    }

    #[tool(
        description = "Run one or more queries separated by ';' and return every result set."
    )]
    pub async fn get_data_set_all(&self, Parameters(input): Parameters<SqlQueryInput>) -> String {
        let handler = QueryToolHandler::new(self.ctx.clone());
        run_tool("get_data_set_all", handler.get_data_set_all(input)).await
    }

    #[tool(
        description = "Run a script producing at least two result sets and return the first two."
    )]
    pub async fn sql_query_multiple(&self, Parameters(input): Parameters<SqlQueryInput>) -> String {
        let handler = QueryToolHandler::new(self.ctx.clone());
        run_tool("sql_query_multiple", handler.sql_query_multiple(input)).await
    }

    #[tool(
        description = "Return the first column of the first row, optionally converted to value_type (any, string, int, long, double, decimal, datetime)."
    )]
    pub async fn get_scalar(&self, Parameters(input): Parameters<ScalarInput>) -> String {
        let handler = QueryToolHandler::new(self.ctx.clone());
        run_tool("get_scalar", handler.get_scalar(input)).await
    }

    #[tool(
        description = "Run a query with an IN (@name) list expanded from a JSON array of values."
    )]
    pub async fn sql_query_with_in_parameter(
        &self,
        Parameters(input): Parameters<InParameterInput>,
    ) -> String {
        let handler = QueryToolHandler::new(self.ctx.clone());
        run_tool(
            "sql_query_with_in_parameter",
            handler.sql_query_with_in_parameter(input),
        )
        .await
    }

    // Commands

    #[tool(
        description = "Execute a command (INSERT, UPDATE, DELETE, ...) and return the affected row count.\nDROP/TRUNCATE/ALTER/CREATE TABLE and DROP DATABASE are rejected; use the schema tools instead."
    )]
    pub async fn execute_command(
        &self,
        Parameters(input): Parameters<ExecuteCommandInput>,
    ) -> String {
        let handler = WriteToolHandler::new(self.ctx.clone());
        run_tool("execute_command", handler.execute_command(input)).await
    }

    #[tool(description = "Insert one row from a JSON object of column values.")]
    pub async fn insert_data(&self, Parameters(input): Parameters<InsertDataInput>) -> String {
        let handler = WriteToolHandler::new(self.ctx.clone());
        run_tool("insert_data", handler.insert_data(input)).await
    }

    #[tool(description = "Update rows matching a required WHERE clause with a JSON object of column values.")]
    pub async fn update_data(&self, Parameters(input): Parameters<UpdateDataInput>) -> String {
        let handler = WriteToolHandler::new(self.ctx.clone());
        run_tool("update_data", handler.update_data(input)).await
    }

    #[tool(description = "Delete rows matching a required WHERE clause.")]
    pub async fn delete_data(&self, Parameters(input): Parameters<DeleteDataInput>) -> String {
        let handler = WriteToolHandler::new(self.ctx.clone());
        run_tool("delete_data", handler.delete_data(input)).await
    }

    #[tool(
        description = "Execute a JSON array of commands in one transaction. Any failure rolls back all of them."
    )]
    pub async fn execute_transaction(
        &self,
        Parameters(input): Parameters<ExecuteTransactionInput>,
    ) -> String {
        let handler = TransactionToolHandler::new(self.ctx.clone());
        run_tool("execute_transaction", handler.execute_transaction(input)).await
    }

    #[tool(
        description = "Execute a JSON array of commands independently and report each outcome."
    )]
    pub async fn batch_execute_commands(
        &self,
        Parameters(input): Parameters<BatchCommandsInput>,
    ) -> String {
        let handler = TransactionToolHandler::new(self.ctx.clone());
        run_tool("batch_execute_commands", handler.batch_execute_commands(input)).await
    }

    #[tool(
        description = "Execute a script split into batches on lines containing only GO. Stops at the first failing batch."
    )]
    pub async fn execute_command_with_go(
        &self,
        Parameters(input): Parameters<GoScriptInput>,
    ) -> String {
        let handler = WriteToolHandler::new(self.ctx.clone());
        run_tool("execute_command_with_go", handler.execute_command_with_go(input)).await
    }

    // Stored procedures

    #[tool(description = "Call a stored procedure and return its rows.")]
    pub async fn call_stored_procedure(
        &self,
        Parameters(input): Parameters<CallProcedureInput>,
    ) -> String {
        let handler = ProcedureToolHandler::new(self.ctx.clone());
        run_tool("call_stored_procedure", handler.call_stored_procedure(input)).await
    }

    #[tool(
        description = "Call a stored procedure and return its rows plus the values of the named output parameters."
    )]
    pub async fn call_stored_procedure_with_output(
        &self,
        Parameters(input): Parameters<CallProcedureWithOutputInput>,
    ) -> String {
        let handler = ProcedureToolHandler::new(self.ctx.clone());
        run_tool(
            "call_stored_procedure_with_output",
            handler.call_stored_procedure_with_output(input),
        )
        .await
    }

    // Schema introspection

    #[tool(description = "List the databases visible to the connection.")]
    pub async fn get_database_list(&self) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("get_database_list", handler.get_database_list()).await
    }

    #[tool(description = "List tables with their descriptions.")]
    pub async fn get_table_info_list(&self) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("get_table_info_list", handler.get_table_info_list()).await
    }

    #[tool(description = "List views with their descriptions.")]
    pub async fn get_view_info_list(&self) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("get_view_info_list", handler.get_view_info_list()).await
    }

    #[tool(description = "List the columns of a table with type, nullability, key and default details.")]
    pub async fn get_column_infos_by_table_name(
        &self,
        Parameters(input): Parameters<TableInput>,
    ) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool(
            "get_column_infos_by_table_name",
            handler.get_column_infos_by_table_name(input),
        )
        .await
    }

    #[tool(description = "List the identity (auto-increment) columns of a table.")]
    pub async fn get_is_identities(&self, Parameters(input): Parameters<TableInput>) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("get_is_identities", handler.get_is_identities(input)).await
    }

    #[tool(description = "List the primary key columns of a table.")]
    pub async fn get_primaries(&self, Parameters(input): Parameters<TableInput>) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("get_primaries", handler.get_primaries(input)).await
    }

    #[tool(description = "List the index names of a table.")]
    pub async fn get_index_list(&self, Parameters(input): Parameters<TableInput>) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("get_index_list", handler.get_index_list(input)).await
    }

    #[tool(description = "List stored procedure names.")]
    pub async fn get_proc_list(&self) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("get_proc_list", handler.get_proc_list()).await
    }

    #[tool(description = "List user-defined function names.")]
    pub async fn get_func_list(&self) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("get_func_list", handler.get_func_list()).await
    }

    #[tool(description = "List the triggers defined on a table.")]
    pub async fn get_trigger_names(&self, Parameters(input): Parameters<TableInput>) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("get_trigger_names", handler.get_trigger_names(input)).await
    }

    #[tool(description = "List the column data types the database supports.")]
    pub async fn get_db_types(&self) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("get_db_types", handler.get_db_types()).await
    }

    #[tool(
        description = "Describe a table: columns, primary keys, identity columns and indexes."
    )]
    pub async fn get_table_schema(&self, Parameters(input): Parameters<TableInput>) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("get_table_schema", handler.get_table_schema(input)).await
    }

    #[tool(description = "Check whether a table exists.")]
    pub async fn is_any_table(&self, Parameters(input): Parameters<TableInput>) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("is_any_table", handler.is_any_table(input)).await
    }

    #[tool(description = "Check whether a table has the given column.")]
    pub async fn is_any_column(&self, Parameters(input): Parameters<ColumnInput>) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("is_any_column", handler.is_any_column(input)).await
    }

    #[tool(description = "Check whether a column is part of the table's primary key.")]
    pub async fn is_primary_key(&self, Parameters(input): Parameters<ColumnInput>) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("is_primary_key", handler.is_primary_key(input)).await
    }

    #[tool(description = "Check whether a column is an identity (auto-increment) column.")]
    pub async fn is_identity(&self, Parameters(input): Parameters<ColumnInput>) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("is_identity", handler.is_identity(input)).await
    }

    #[tool(description = "Check whether a constraint with the given name exists.")]
    pub async fn is_any_constraint(
        &self,
        Parameters(input): Parameters<ConstraintInput>,
    ) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("is_any_constraint", handler.is_any_constraint(input)).await
    }

    #[tool(description = "Check whether an index with the given name exists.")]
    pub async fn is_any_index(&self, Parameters(input): Parameters<IndexInput>) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("is_any_index", handler.is_any_index(input)).await
    }

    #[tool(description = "Check whether a table has a description.")]
    pub async fn is_any_table_remark(&self, Parameters(input): Parameters<TableInput>) -> String {
        let handler = SchemaToolHandler::new(self.ctx.clone());
        run_tool("is_any_table_remark", handler.is_any_table_remark(input)).await
    }

    // Schema mutation

    #[tool(description = "Drop a table.")]
    pub async fn drop_table(&self, Parameters(input): Parameters<TableNameInput>) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("drop_table", handler.drop_table(input)).await
    }

    #[tool(description = "Remove every row of a table.")]
    pub async fn truncate_table(&self, Parameters(input): Parameters<TableNameInput>) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("truncate_table", handler.truncate_table(input)).await
    }

    #[tool(description = "Copy a table's structure and rows into a new table, optionally capped at max_rows.")]
    pub async fn backup_table(&self, Parameters(input): Parameters<BackupTableInput>) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("backup_table", handler.backup_table(input)).await
    }

    #[tool(description = "Rename a table.")]
    pub async fn rename_table(&self, Parameters(input): Parameters<RenameTableInput>) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("rename_table", handler.rename_table(input)).await
    }

    #[tool(
        description = "Add a column from a JSON definition: {DbColumnName, DataType, Length, DecimalDigits, IsNullable, DefaultValue, ColumnDescription}."
    )]
    pub async fn add_column(
        &self,
        Parameters(input): Parameters<ColumnDefinitionInput>,
    ) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("add_column", handler.add_column(input)).await
    }

    #[tool(description = "Change a column's type, nullability and default from a JSON definition.")]
    pub async fn update_column(
        &self,
        Parameters(input): Parameters<ColumnDefinitionInput>,
    ) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("update_column", handler.update_column(input)).await
    }

    #[tool(description = "Drop a column from a table.")]
    pub async fn drop_column(&self, Parameters(input): Parameters<ColumnNameInput>) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("drop_column", handler.drop_column(input)).await
    }

    #[tool(description = "Rename a column.")]
    pub async fn rename_column(&self, Parameters(input): Parameters<RenameColumnInput>) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("rename_column", handler.rename_column(input)).await
    }

    #[tool(description = "Add a primary key over one or more columns.")]
    pub async fn add_primary_key(&self, Parameters(input): Parameters<PrimaryKeyInput>) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("add_primary_key", handler.add_primary_key(input)).await
    }

    #[tool(description = "Drop a named constraint from a table.")]
    pub async fn drop_constraint(
        &self,
        Parameters(input): Parameters<ConstraintNameInput>,
    ) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("drop_constraint", handler.drop_constraint(input)).await
    }

    #[tool(description = "Create an index, optionally unique, over one or more columns.")]
    pub async fn create_index(&self, Parameters(input): Parameters<CreateIndexInput>) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("create_index", handler.create_index(input)).await
    }

    #[tool(description = "Set a column's default value.")]
    pub async fn add_default_value(
        &self,
        Parameters(input): Parameters<DefaultValueInput>,
    ) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("add_default_value", handler.add_default_value(input)).await
    }

    #[tool(description = "Set a table's description.")]
    pub async fn add_table_remark(
        &self,
        Parameters(input): Parameters<TableRemarkInput>,
    ) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("add_table_remark", handler.add_table_remark(input)).await
    }

    #[tool(description = "Remove a table's description.")]
    pub async fn delete_table_remark(
        &self,
        Parameters(input): Parameters<TableNameInput>,
    ) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("delete_table_remark", handler.delete_table_remark(input)).await
    }

    #[tool(description = "Set a column's description.")]
    pub async fn add_column_remark(
        &self,
        Parameters(input): Parameters<ColumnRemarkInput>,
    ) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("add_column_remark", handler.add_column_remark(input)).await
    }

    #[tool(description = "Remove a column's description.")]
    pub async fn delete_column_remark(
        &self,
        Parameters(input): Parameters<ColumnNameInput>,
    ) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("delete_column_remark", handler.delete_column_remark(input)).await
    }

    #[tool(description = "Drop a view.")]
    pub async fn drop_view(&self, Parameters(input): Parameters<ObjectNameInput>) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("drop_view", handler.drop_view(input)).await
    }

    #[tool(description = "Drop a user-defined function.")]
    pub async fn drop_func(&self, Parameters(input): Parameters<ObjectNameInput>) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("drop_func", handler.drop_func(input)).await
    }

    #[tool(description = "Drop a stored procedure.")]
    pub async fn drop_proc(&self, Parameters(input): Parameters<ObjectNameInput>) -> String {
        let handler = AlterToolHandler::new(self.ctx.clone());
        run_tool("drop_proc", handler.drop_proc(input)).await
    }
}

#[tool_handler]
impl ServerHandler for DbService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "db-tools-mcp".to_owned(),
                title: Some("DB Tools MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Database tools for one configured SQL database.\n\
                \n\
                ## Configuration\n\
                The database is chosen by DB_CONNECTION_STRING and DB_TYPE (default MySql).\n\
                Call `test_connection` or `get_database_config` to check it.\n\
                \n\
                ## Responses\n\
                Every tool returns a JSON envelope with `success` and `timestamp`.\n\
                Failures carry `error` and `errorCode` (1001 connection, 1002 execution,\n\
                1003 dangerous operation, 1004 invalid parameters, 1005 configuration).\n\
                \n\
                ## Parameters\n\
                `parameters`, `data` and `commands` are strings holding JSON.\n\
                Bind values with @name markers, e.g. `SELECT * FROM t WHERE id = @id`.\n\
                \n\
                ## Schema changes\n\
                Command tools reject DROP TABLE, DROP DATABASE, TRUNCATE TABLE, ALTER TABLE\n\
                and CREATE TABLE. Use `drop_table`, `add_column` and the other schema tools."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ClientOptions, ENV_CONNECTION_STRING, ENV_DATABASE_TYPE, StaticConfigProvider,
    };
    use serde_json::Value as JsonValue;
    use std::sync::Arc;

    fn create_test_service(provider: StaticConfigProvider) -> DbService {
        let resolver = ConfigResolver::new(Arc::new(provider));
        DbService::new(ToolContext::new(resolver, ClientOptions::default()))
    }

    fn memory_service() -> DbService {
        create_test_service(
            StaticConfigProvider::new()
                .with(ENV_CONNECTION_STRING, "sqlite::memory:")
                .with(ENV_DATABASE_TYPE, "sqlite"),
        )
    }

    fn parse(text: &str) -> JsonValue {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_server_info() {
        let info = memory_service().get_info();
        assert_eq!(info.server_info.name, "db-tools-mcp");
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("DB_CONNECTION_STRING"));
    }

    #[test]
    fn test_all_tools_registered() {
        let service = memory_service();
        let tools = service.tool_router.list_all();
        for name in [
            "test_connection",
            "sql_query",
            "get_scalar",
            "execute_command",
            "execute_transaction",
            "batch_execute_commands",
            "execute_command_with_go",
            "call_stored_procedure_with_output",
            "get_table_schema",
            "is_any_table_remark",
            "add_column",
            "drop_proc",
        ] {
            assert!(tools.iter().any(|t| t.name == name), "missing tool {}", name);
        }
        assert_eq!(tools.len(), 56);
    }

    #[tokio::test]
    async fn test_missing_configuration_envelope() {
        let service = create_test_service(StaticConfigProvider::new());
        let json = parse(&service.test_connection().await);
        assert_eq!(json["success"], false);
        assert_eq!(json["errorCode"], 1005);
    }

    #[tokio::test]
    async fn test_get_database_config_masks_password() {
        let service = create_test_service(
            StaticConfigProvider::new()
                .with(
                    ENV_CONNECTION_STRING,
                    "Server=db;Database=app;Uid=app;Pwd=s3cret;",
                )
                .with(ENV_DATABASE_TYPE, "MySql"),
        );
        let text = service.get_database_config().await;
        assert!(!text.contains("s3cret"));
        let json = parse(&text);
        assert_eq!(json["success"], true);
        assert_eq!(json["configured"], true);
    }

    #[tokio::test]
    async fn test_query_on_memory_database() {
        let service = memory_service();
        let json = parse(
            &service
                .sql_query(Parameters(SqlQueryInput {
                    sql: "SELECT @a + 1 AS total".to_string(),
                    parameters: Some(r#"{"a": 41}"#.to_string()),
                }))
                .await,
        );
        assert_eq!(json["success"], true);
        assert_eq!(json["rowCount"], 1);
        assert_eq!(json["data"][0]["total"], 42);
    }

    #[tokio::test]
    async fn test_dangerous_command_rejected() {
        let service = memory_service();
        let json = parse(
            &service
                .execute_command(Parameters(ExecuteCommandInput {
                    sql: "drop   TABLE users".to_string(),
                    parameters: None,
                }))
                .await,
        );
        assert_eq!(json["success"], false);
        assert_eq!(json["errorCode"], 1003);
    }
}
