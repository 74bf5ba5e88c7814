//! Query execution engine.
//!
//! This module provides statement execution with support for:
//! - Named parameters rewritten per driver
//! - Multiple result sets from one script
//! - Transactions and batches on a single connection
//! - Stored procedure calls with output parameters
//!
//! # Architecture
//!
//! The executor uses database-specific implementations generated per driver
//! by `engine_ops!`:
//! - `mysql`: MySQL-specific statement execution
//! - `postgres`: PostgreSQL-specific statement execution
//! - `sqlite`: SQLite-specific statement execution
//!
//! Each generated module provides identical functionality adapted to the
//! database's type system.

use crate::db::params::PreparedStatement;
use crate::db::pool::DbPool;
use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, ParameterSet, Row, SqlValue};
use std::time::Instant;
use tracing::{debug, info};

/// Target used for per-statement SQL logging.
pub const SQL_LOG_TARGET: &str = "db_tools_mcp::sql";

/// Hook run before every statement is sent to the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlHook {
    enabled: bool,
}

impl SqlHook {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log the final SQL and its bound values.
    pub fn before(&self, stmt: &PreparedStatement) {
        if !self.enabled {
            return;
        }
        let params: Vec<String> = stmt
            .values
            .iter()
            .map(|v| match v.as_text() {
                Some(text) => format!("{}({})", v.type_name(), text),
                None => "NULL".to_string(),
            })
            .collect();
        info!(target: SQL_LOG_TARGET, sql = %stmt.sql, params = ?params, "Executing SQL");
    }
}

engine_ops!(mysql, sqlx::MySql, crate::db::params::bind_mysql_value);
engine_ops!(postgres, sqlx::Postgres, crate::db::params::bind_postgres_value);
engine_ops!(sqlite, sqlx::Sqlite, crate::db::params::bind_sqlite_value);

/// Query executor that handles statement execution against a pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor {
    hook: SqlHook,
}

impl QueryExecutor {
    /// Create a new query executor.
    pub fn new(log_sql: bool) -> Self {
        Self {
            hook: SqlHook::new(log_sql),
        }
    }

    pub fn hook(&self) -> SqlHook {
        self.hook
    }

    /// Execute a query and return all rows.
    pub async fn fetch_rows(&self, pool: &DbPool, stmt: &PreparedStatement) -> DbResult<Vec<Row>> {
        let start = Instant::now();
        let rows = impl_db_dispatch!(pool, {
            MySql(p) => mysql::fetch_rows(p, stmt, self.hook).await?,
            Postgres(p) => postgres::fetch_rows(p, stmt, self.hook).await?,
            SQLite(p) => sqlite::fetch_rows(p, stmt, self.hook).await?,
        });
        debug!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query executed"
        );
        Ok(rows)
    }

    /// Execute a query and return its first row, if any.
    pub async fn fetch_first(
        &self,
        pool: &DbPool,
        stmt: &PreparedStatement,
    ) -> DbResult<Option<Row>> {
        impl_db_dispatch!(pool, {
            MySql(p) => mysql::fetch_first(p, stmt, self.hook).await,
            Postgres(p) => postgres::fetch_first(p, stmt, self.hook).await,
            SQLite(p) => sqlite::fetch_first(p, stmt, self.hook).await,
        })
    }

    /// Execute a command and return the affected row count.
    pub async fn execute(&self, pool: &DbPool, stmt: &PreparedStatement) -> DbResult<u64> {
        let start = Instant::now();
        let affected = impl_db_dispatch!(pool, {
            MySql(p) => mysql::execute(p, stmt, self.hook).await?,
            Postgres(p) => postgres::execute(p, stmt, self.hook).await?,
            SQLite(p) => sqlite::execute(p, stmt, self.hook).await?,
        });
        debug!(
            affected,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Command executed"
        );
        Ok(affected)
    }

    /// Execute a script and return each result set it produces.
    pub async fn fetch_result_sets(
        &self,
        pool: &DbPool,
        stmt: &PreparedStatement,
    ) -> DbResult<Vec<Vec<Row>>> {
        impl_db_dispatch!(pool, {
            MySql(p) => mysql::fetch_result_sets(p, stmt, self.hook).await,
            Postgres(p) => postgres::fetch_result_sets(p, stmt, self.hook).await,
            SQLite(p) => sqlite::fetch_result_sets(p, stmt, self.hook).await,
        })
    }

    /// Run all statements in one transaction.
    ///
    /// An `Err` entry aborts the transaction at that position, exactly like a
    /// statement that fails in the database.
    pub async fn execute_in_transaction(
        &self,
        pool: &DbPool,
        statements: Vec<DbResult<PreparedStatement>>,
    ) -> DbResult<u64> {
        impl_db_dispatch!(pool, {
            MySql(p) => mysql::execute_in_transaction(p, statements, self.hook).await,
            Postgres(p) => postgres::execute_in_transaction(p, statements, self.hook).await,
            SQLite(p) => sqlite::execute_in_transaction(p, statements, self.hook).await,
        })
    }

    /// Run statements independently on one held connection.
    pub async fn execute_batch(
        &self,
        pool: &DbPool,
        statements: Vec<DbResult<PreparedStatement>>,
    ) -> DbResult<Vec<DbResult<u64>>> {
        impl_db_dispatch!(pool, {
            MySql(p) => mysql::execute_batch(p, statements, self.hook).await,
            Postgres(p) => postgres::execute_batch(p, statements, self.hook).await,
            SQLite(p) => sqlite::execute_batch(p, statements, self.hook).await,
        })
    }

    /// Call a stored procedure and return the rows it selects.
    ///
    /// `name` must already be quoted for the dialect.
    pub async fn call_procedure(
        &self,
        pool: &DbPool,
        name: &str,
        inputs: &ParameterSet,
    ) -> DbResult<Vec<Row>> {
        let args = placeholders(pool.db_type(), 0, inputs.len());
        let stmt = PreparedStatement {
            sql: format!("CALL {}({})", name, args.join(", ")),
            values: inputs.values(),
        };
        match pool {
            DbPool::MySql(p) => mysql::fetch_rows(p, &stmt, self.hook).await,
            DbPool::Postgres(p) => postgres::fetch_rows(p, &stmt, self.hook).await,
            DbPool::SQLite(_) => Err(procedures_unsupported()),
        }
    }

    /// Call a stored procedure and read its output parameters back.
    ///
    /// Inputs not named as outputs are passed first, in order, followed by
    /// one argument per output. An output that also appears among the inputs
    /// is passed in with that value (INOUT).
    pub async fn call_procedure_with_output(
        &self,
        pool: &DbPool,
        name: &str,
        inputs: &ParameterSet,
        outputs: &[String],
    ) -> DbResult<(Vec<Row>, Row)> {
        let plain: Vec<SqlValue> = inputs
            .iter()
            .filter(|(n, _)| !outputs.iter().any(|o| o.eq_ignore_ascii_case(n)))
            .map(|(_, v)| v.clone())
            .collect();

        match pool {
            DbPool::MySql(p) => {
                let mut conn = p.acquire().await?;
                for output in outputs {
                    let initial = inputs.get(output).cloned().unwrap_or(SqlValue::Null);
                    let set = PreparedStatement {
                        sql: format!("SET @{} = ?", output),
                        values: vec![initial],
                    };
                    mysql::execute(&mut *conn, &set, self.hook).await?;
                }

                let mut args = placeholders(DatabaseType::MySQL, 0, plain.len());
                args.extend(outputs.iter().map(|o| format!("@{}", o)));
                let call = PreparedStatement {
                    sql: format!("CALL {}({})", name, args.join(", ")),
                    values: plain,
                };
                let rows = mysql::fetch_rows(&mut *conn, &call, self.hook).await?;

                if outputs.is_empty() {
                    return Ok((rows, Row::new()));
                }
                let select = PreparedStatement::raw(format!(
                    "SELECT {}",
                    outputs
                        .iter()
                        .map(|o| format!("@{} AS `{}`", o, o))
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
                let values = mysql::fetch_first(&mut *conn, &select, self.hook)
                    .await?
                    .unwrap_or_default();
                Ok((rows, collect_outputs(outputs, &values)))
            }
            DbPool::Postgres(p) => {
                let mut values = plain;
                let mut args = placeholders(DatabaseType::PostgreSQL, 0, values.len());
                for output in outputs {
                    match inputs.get(output) {
                        Some(v) => {
                            values.push(v.clone());
                            args.push(format!("${}", values.len()));
                        }
                        None => args.push("NULL".to_string()),
                    }
                }
                let call = PreparedStatement {
                    sql: format!("CALL {}({})", name, args.join(", ")),
                    values,
                };
                let rows = postgres::fetch_rows(p, &call, self.hook).await?;
                let first = rows.first().cloned().unwrap_or_default();
                Ok((rows, collect_outputs(outputs, &first)))
            }
            DbPool::SQLite(_) => Err(procedures_unsupported()),
        }
    }
}

fn procedures_unsupported() -> DbError {
    DbError::unsupported("Stored procedures", DatabaseType::SQLite.display_name())
}

/// Driver placeholders for `count` values starting after `offset` bound ones.
fn placeholders(db: DatabaseType, offset: usize, count: usize) -> Vec<String> {
    (offset + 1..=offset + count)
        .map(|i| match db {
            DatabaseType::PostgreSQL => format!("${}", i),
            _ => "?".to_string(),
        })
        .collect()
}

/// Output values by name; MySQL session variables holding text come back as
/// bytes and are returned as text.
fn collect_outputs(outputs: &[String], source: &Row) -> Row {
    outputs
        .iter()
        .map(|name| {
            let value = match source.get(name).cloned().unwrap_or(SqlValue::Null) {
                SqlValue::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => SqlValue::String(text),
                    Err(e) => SqlValue::Binary(e.into_bytes()),
                },
                other => other,
            };
            (name.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(DatabaseType::MySQL, 0, 2), vec!["?", "?"]);
        assert_eq!(
            placeholders(DatabaseType::PostgreSQL, 1, 2),
            vec!["$2", "$3"]
        );
        assert!(placeholders(DatabaseType::SQLite, 0, 0).is_empty());
    }

    #[test]
    fn test_collect_outputs_decodes_text_bytes() {
        let mut row = Row::new();
        row.push("total", SqlValue::Int(3));
        row.push("label", SqlValue::Binary(b"done".to_vec()));
        let outputs = vec!["TOTAL".to_string(), "label".to_string(), "missing".to_string()];
        let collected = collect_outputs(&outputs, &row);
        assert_eq!(collected.get("TOTAL"), Some(&SqlValue::Int(3)));
        assert_eq!(
            collected.get("label"),
            Some(&SqlValue::String("done".to_string()))
        );
        assert_eq!(collected.get("missing"), Some(&SqlValue::Null));
    }

    #[test]
    fn test_hook_disabled_by_default() {
        assert!(!QueryExecutor::default().hook().is_enabled());
        assert!(QueryExecutor::new(true).hook().is_enabled());
    }
}
