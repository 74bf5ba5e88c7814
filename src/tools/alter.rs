//! Schema mutation tools.
//!
//! These are the dedicated tools the dangerous-operation filter points
//! callers to, so they do not run the filter themselves. Identifiers are
//! validated and quoted by the [`Dialect`](crate::db::Dialect); statements a
//! dialect cannot express fail as unsupported before anything runs.

use crate::db::{PreparedStatement, SchemaInspector, ScopedClient};
use crate::error::{DbError, DbResult};
use crate::models::{ColumnSpec, DatabaseType};
use crate::tools::{ToolContext, dialect, parse_json_arg, require};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableNameInput {
    /// Table name, optionally schema-qualified
    pub table_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BackupTableInput {
    /// Source table
    pub table_name: String,
    /// Name of the new table receiving the copy
    pub backup_table_name: String,
    /// Optional cap on the number of copied rows
    #[serde(default)]
    pub max_rows: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RenameTableInput {
    /// Current table name
    pub table_name: String,
    /// New table name (unqualified)
    pub new_table_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ColumnDefinitionInput {
    /// Table name, optionally schema-qualified
    pub table_name: String,
    /// JSON column definition, e.g. {"DbColumnName": "age", "DataType": "int", "IsNullable": false}
    pub column: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ColumnNameInput {
    /// Table name, optionally schema-qualified
    pub table_name: String,
    /// Column name
    pub column_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RenameColumnInput {
    /// Table name, optionally schema-qualified
    pub table_name: String,
    /// Current column name
    pub old_column_name: String,
    /// New column name
    pub new_column_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PrimaryKeyInput {
    /// Table name, optionally schema-qualified
    pub table_name: String,
    /// Key columns as a JSON array or a comma-separated list
    pub column_names: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ConstraintNameInput {
    /// Table name, optionally schema-qualified
    pub table_name: String,
    /// Constraint name (PRIMARY drops the primary key on MySQL)
    pub constraint_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateIndexInput {
    /// Table name, optionally schema-qualified
    pub table_name: String,
    /// Indexed columns as a JSON array or a comma-separated list
    pub column_names: String,
    /// Optional index name; defaults to idx_<table>_<columns>
    #[serde(default)]
    pub index_name: Option<String>,
    /// Create a UNIQUE index
    #[serde(default)]
    pub is_unique: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DefaultValueInput {
    /// Table name, optionally schema-qualified
    pub table_name: String,
    /// Column name
    pub column_name: String,
    /// Default value; numbers and keywords such as CURRENT_TIMESTAMP are written as-is
    pub default_value: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableRemarkInput {
    /// Table name, optionally schema-qualified
    pub table_name: String,
    /// Table description
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ColumnRemarkInput {
    /// Table name, optionally schema-qualified
    pub table_name: String,
    /// Column name
    pub column_name: String,
    /// Column description
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ObjectNameInput {
    /// Object name, optionally schema-qualified
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlterOutput {
    pub message: String,
    pub affected_rows: u64,
}

/// Column list given as a JSON array or as comma-separated names.
fn parse_column_names(raw: &str) -> DbResult<Vec<String>> {
    let trimmed = raw.trim();
    let names: Vec<String> = if trimmed.starts_with('[') {
        parse_json_arg("column_names", trimmed)?
    } else {
        trimmed.split(',').map(str::to_string).collect()
    };
    let names: Vec<String> = names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        return Err(DbError::invalid_parameters("'column_names' is required"));
    }
    Ok(names)
}

/// Run one statement directly, several inside a transaction.
async fn run_statements(client: &ScopedClient, statements: Vec<String>) -> DbResult<u64> {
    match statements.as_slice() {
        [single] => client.execute(single, None).await,
        _ => {
            let prepared = statements
                .into_iter()
                .map(|sql| Ok(PreparedStatement::raw(sql)))
                .collect();
            client.execute_in_transaction(prepared).await
        }
    }
}

fn done(message: String, affected_rows: u64) -> AlterOutput {
    info!(affected_rows, "{}", message);
    AlterOutput {
        message,
        affected_rows,
    }
}

pub struct AlterToolHandler {
    ctx: ToolContext,
}

impl AlterToolHandler {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    pub async fn drop_table(&self, input: TableNameInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).drop_table(&input.table_name)?;
            client.execute(&sql, None).await
        })?;
        Ok(done(format!("Table '{}' dropped", input.table_name), affected))
    }

    pub async fn truncate_table(&self, input: TableNameInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).truncate_table(&input.table_name)?;
            client.execute(&sql, None).await
        })?;
        Ok(done(format!("Table '{}' truncated", input.table_name), affected))
    }

    pub async fn backup_table(&self, input: BackupTableInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        require("backup_table_name", &input.backup_table_name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).backup_table(
                &input.table_name,
                &input.backup_table_name,
                input.max_rows,
            )?;
            client.execute(&sql, None).await
        })?;
        Ok(done(
            format!(
                "Table '{}' backed up to '{}'",
                input.table_name, input.backup_table_name
            ),
            affected,
        ))
    }

    pub async fn rename_table(&self, input: RenameTableInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        require("new_table_name", &input.new_table_name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).rename_table(&input.table_name, &input.new_table_name)?;
            client.execute(&sql, None).await
        })?;
        Ok(done(
            format!(
                "Table '{}' renamed to '{}'",
                input.table_name, input.new_table_name
            ),
            affected,
        ))
    }

    pub async fn add_column(&self, input: ColumnDefinitionInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        let spec: ColumnSpec = parse_json_arg("column", &input.column)?;
        require("DbColumnName", &spec.name)?;
        let affected = with_client!(self.ctx, |client| {
            let statements = dialect(&client).add_column(&input.table_name, &spec)?;
            run_statements(&client, statements).await
        })?;
        Ok(done(
            format!("Column '{}' added to '{}'", spec.name, input.table_name),
            affected,
        ))
    }

    pub async fn update_column(&self, input: ColumnDefinitionInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        let spec: ColumnSpec = parse_json_arg("column", &input.column)?;
        require("DbColumnName", &spec.name)?;
        let affected = with_client!(self.ctx, |client| {
            let statements = dialect(&client).update_column(&input.table_name, &spec)?;
            run_statements(&client, statements).await
        })?;
        Ok(done(
            format!("Column '{}' of '{}' updated", spec.name, input.table_name),
            affected,
        ))
    }

    pub async fn drop_column(&self, input: ColumnNameInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        require("column_name", &input.column_name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).drop_column(&input.table_name, &input.column_name)?;
            client.execute(&sql, None).await
        })?;
        Ok(done(
            format!(
                "Column '{}' dropped from '{}'",
                input.column_name, input.table_name
            ),
            affected,
        ))
    }

    pub async fn rename_column(&self, input: RenameColumnInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        require("old_column_name", &input.old_column_name)?;
        require("new_column_name", &input.new_column_name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).rename_column(
                &input.table_name,
                &input.old_column_name,
                &input.new_column_name,
            )?;
            client.execute(&sql, None).await
        })?;
        Ok(done(
            format!(
                "Column '{}' renamed to '{}'",
                input.old_column_name, input.new_column_name
            ),
            affected,
        ))
    }

    pub async fn add_primary_key(&self, input: PrimaryKeyInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        let columns = parse_column_names(&input.column_names)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).add_primary_key(&input.table_name, &columns)?;
            client.execute(&sql, None).await
        })?;
        Ok(done(
            format!(
                "Primary key ({}) added to '{}'",
                columns.join(", "),
                input.table_name
            ),
            affected,
        ))
    }

    pub async fn drop_constraint(&self, input: ConstraintNameInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        require("constraint_name", &input.constraint_name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).drop_constraint(&input.table_name, &input.constraint_name)?;
            client.execute(&sql, None).await
        })?;
        Ok(done(
            format!(
                "Constraint '{}' dropped from '{}'",
                input.constraint_name, input.table_name
            ),
            affected,
        ))
    }

    pub async fn create_index(&self, input: CreateIndexInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        let columns = parse_column_names(&input.column_names)?;
        let unique = input.is_unique.unwrap_or(false);
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).create_index(
                &input.table_name,
                &columns,
                input.index_name.as_deref(),
                unique,
            )?;
            client.execute(&sql, None).await
        })?;
        Ok(done(
            format!("Index on '{}' ({}) created", input.table_name, columns.join(", ")),
            affected,
        ))
    }

    pub async fn add_default_value(&self, input: DefaultValueInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        require("column_name", &input.column_name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).add_default_value(
                &input.table_name,
                &input.column_name,
                &input.default_value,
            )?;
            client.execute(&sql, None).await
        })?;
        Ok(done(
            format!(
                "Default value of '{}.{}' set",
                input.table_name, input.column_name
            ),
            affected,
        ))
    }

    pub async fn add_table_remark(&self, input: TableRemarkInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).table_remark(&input.table_name, Some(&input.description))?;
            client.execute(&sql, None).await
        })?;
        Ok(done(
            format!("Description of '{}' set", input.table_name),
            affected,
        ))
    }

    pub async fn delete_table_remark(&self, input: TableNameInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).table_remark(&input.table_name, None)?;
            client.execute(&sql, None).await
        })?;
        Ok(done(
            format!("Description of '{}' removed", input.table_name),
            affected,
        ))
    }

    pub async fn add_column_remark(&self, input: ColumnRemarkInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        require("column_name", &input.column_name)?;
        let affected = with_client!(self.ctx, |client| {
            self.set_column_remark(
                &client,
                &input.table_name,
                &input.column_name,
                Some(&input.description),
            )
            .await
        })?;
        Ok(done(
            format!(
                "Description of '{}.{}' set",
                input.table_name, input.column_name
            ),
            affected,
        ))
    }

    pub async fn delete_column_remark(&self, input: ColumnNameInput) -> DbResult<AlterOutput> {
        require("table_name", &input.table_name)?;
        require("column_name", &input.column_name)?;
        let affected = with_client!(self.ctx, |client| {
            self.set_column_remark(&client, &input.table_name, &input.column_name, None)
                .await
        })?;
        Ok(done(
            format!(
                "Description of '{}.{}' removed",
                input.table_name, input.column_name
            ),
            affected,
        ))
    }

    pub async fn drop_view(&self, input: ObjectNameInput) -> DbResult<AlterOutput> {
        require("name", &input.name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).drop_view(&input.name)?;
            client.execute(&sql, None).await
        })?;
        Ok(done(format!("View '{}' dropped", input.name), affected))
    }

    pub async fn drop_func(&self, input: ObjectNameInput) -> DbResult<AlterOutput> {
        require("name", &input.name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).drop_function(&input.name)?;
            client.execute(&sql, None).await
        })?;
        Ok(done(format!("Function '{}' dropped", input.name), affected))
    }

    pub async fn drop_proc(&self, input: ObjectNameInput) -> DbResult<AlterOutput> {
        require("name", &input.name)?;
        let affected = with_client!(self.ctx, |client| {
            let sql = dialect(&client).drop_procedure(&input.name)?;
            client.execute(&sql, None).await
        })?;
        Ok(done(format!("Procedure '{}' dropped", input.name), affected))
    }

    /// MySQL restates the column to change its comment, so it reads the
    /// current definition first.
    async fn set_column_remark(
        &self,
        client: &ScopedClient,
        table: &str,
        column: &str,
        remark: Option<&str>,
    ) -> DbResult<u64> {
        let dialect = dialect(client);
        let definition = match dialect.db_type() {
            DatabaseType::MySQL => {
                Some(SchemaInspector::mysql_column_definition(client, table, column).await?)
            }
            _ => None,
        };
        let sql = dialect.column_remark(table, column, remark, definition.as_deref())?;
        client.execute(&sql, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_names() {
        assert_eq!(parse_column_names(r#"["id", "tenant"]"#).unwrap(), vec!["id", "tenant"]);
        assert_eq!(parse_column_names(" id , tenant ,").unwrap(), vec!["id", "tenant"]);
        assert!(parse_column_names(" , ").is_err());
        assert!(parse_column_names("[1, 2]").is_err());
    }

    #[test]
    fn test_column_definition_input() {
        let input: ColumnDefinitionInput = serde_json::from_str(
            r#"{"table_name": "users", "column": "{\"DbColumnName\": \"age\", \"DataType\": \"int\"}"}"#,
        )
        .unwrap();
        let spec: ColumnSpec = parse_json_arg("column", &input.column).unwrap();
        assert_eq!(spec.name, "age");
        assert_eq!(spec.data_type, "int");
        assert!(spec.is_nullable);
    }

    #[test]
    fn test_alter_output_shape() {
        let json = serde_json::to_value(AlterOutput {
            message: "Table 't' dropped".into(),
            affected_rows: 0,
        })
        .unwrap();
        assert_eq!(json["message"], "Table 't' dropped");
        assert_eq!(json["affectedRows"], 0);
    }
}
