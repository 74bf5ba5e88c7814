//! Database dispatch macros for reducing code duplication.
//!
//! This module provides declarative macros that generate database-specific
//! implementations while maintaining linear readability. The macros expand
//! at compile time with zero runtime overhead.

/// Macro for generating database dispatch match arms.
///
/// This macro generates match arms for `DbPool` variants, reducing the need
/// to manually write repetitive match statements.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(pool, {
///     MySql(p) => do_mysql(p),
///     Postgres(p) => do_postgres(p),
///     SQLite(p) => do_sqlite(p),
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($pool:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $pool {
            $(
                $crate::db::pool::DbPool::$variant($p) => $body,
            )+
        }
    };
}

/// Generates one statement-execution module per driver.
///
/// Every generated function is generic over `sqlx::Executor`, so the same
/// code runs against a pool, a held connection or an open transaction.
/// Statements without bound values run as raw SQL, which keeps multi-statement
/// scripts and `CALL`/`CREATE PROCEDURE` bodies working on every driver.
macro_rules! engine_ops {
    ($module:ident, $db:ty, $bind:path) => {
        pub(crate) mod $module {
            use crate::db::executor::SqlHook;
            use crate::db::params::PreparedStatement;
            use crate::db::types::RowDecode;
            use crate::error::{DbError, DbResult};
            use crate::models::Row;
            use futures_util::TryStreamExt;
            use sqlx::Either;
            use tracing::warn;

            type Db = $db;

            fn build<'q>(
                stmt: &'q PreparedStatement,
            ) -> sqlx::query::Query<'q, Db, <Db as sqlx::Database>::Arguments<'q>> {
                stmt.values
                    .iter()
                    .fold(sqlx::query(&stmt.sql), |query, value| $bind(query, value))
            }

            pub async fn fetch_rows<'c, E>(
                executor: E,
                stmt: &PreparedStatement,
                hook: SqlHook,
            ) -> DbResult<Vec<Row>>
            where
                E: sqlx::Executor<'c, Database = Db>,
            {
                hook.before(stmt);
                let rows = if stmt.has_values() {
                    build(stmt).fetch_all(executor).await?
                } else {
                    executor.fetch_all(stmt.sql.as_str()).await?
                };
                Ok(rows.iter().map(RowDecode::decode_row).collect())
            }

            pub async fn fetch_first<'c, E>(
                executor: E,
                stmt: &PreparedStatement,
                hook: SqlHook,
            ) -> DbResult<Option<Row>>
            where
                E: sqlx::Executor<'c, Database = Db>,
            {
                hook.before(stmt);
                let row = if stmt.has_values() {
                    build(stmt).fetch_optional(executor).await?
                } else {
                    executor.fetch_optional(stmt.sql.as_str()).await?
                };
                Ok(row.as_ref().map(RowDecode::decode_row))
            }

            pub async fn execute<'c, E>(
                executor: E,
                stmt: &PreparedStatement,
                hook: SqlHook,
            ) -> DbResult<u64>
            where
                E: sqlx::Executor<'c, Database = Db>,
            {
                hook.before(stmt);
                let result = if stmt.has_values() {
                    build(stmt).execute(executor).await?
                } else {
                    executor.execute(stmt.sql.as_str()).await?
                };
                Ok(result.rows_affected())
            }

            /// Every result set a script produces, in order.
            ///
            /// A statement that returns no rows but reports affected rows is
            /// a command, not an empty result set, and is skipped.
            #[allow(deprecated)]
            pub async fn fetch_result_sets<'c, E>(
                executor: E,
                stmt: &PreparedStatement,
                hook: SqlHook,
            ) -> DbResult<Vec<Vec<Row>>>
            where
                E: sqlx::Executor<'c, Database = Db>,
            {
                hook.before(stmt);
                let mut stream = if stmt.has_values() {
                    build(stmt).fetch_many(executor)
                } else {
                    executor.fetch_many(stmt.sql.as_str())
                };

                let mut sets = Vec::new();
                let mut current = Vec::new();
                while let Some(item) = stream.try_next().await? {
                    match item {
                        Either::Right(row) => current.push(row.decode_row()),
                        Either::Left(done) => {
                            if !current.is_empty() || done.rows_affected() == 0 {
                                sets.push(std::mem::take(&mut current));
                            }
                        }
                    }
                }
                if !current.is_empty() {
                    sets.push(current);
                }
                Ok(sets)
            }

            /// Run statements in one transaction; the first failure rolls back.
            pub async fn execute_in_transaction(
                pool: &sqlx::Pool<Db>,
                statements: Vec<DbResult<PreparedStatement>>,
                hook: SqlHook,
            ) -> DbResult<u64> {
                let mut tx = pool.begin().await?;
                let mut total = 0;
                for (index, statement) in statements.into_iter().enumerate() {
                    let outcome = match statement {
                        Ok(stmt) => execute(&mut *tx, &stmt, hook).await,
                        Err(e) => Err(e),
                    };
                    match outcome {
                        Ok(affected) => total += affected,
                        Err(e) => {
                            if let Err(rollback_err) = tx.rollback().await {
                                warn!(error = %rollback_err, "Rollback failed");
                            }
                            warn!(statement = index, error = %e, "Transaction rolled back");
                            return Err(e);
                        }
                    }
                }
                tx.commit().await.map_err(DbError::from)?;
                Ok(total)
            }

            /// Run statements one by one on a single held connection.
            pub async fn execute_batch(
                pool: &sqlx::Pool<Db>,
                statements: Vec<DbResult<PreparedStatement>>,
                hook: SqlHook,
            ) -> DbResult<Vec<DbResult<u64>>> {
                let mut conn = pool.acquire().await?;
                let mut results = Vec::with_capacity(statements.len());
                for statement in statements {
                    let outcome = match statement {
                        Ok(stmt) => execute(&mut *conn, &stmt, hook).await,
                        Err(e) => Err(e),
                    };
                    results.push(outcome);
                }
                Ok(results)
            }
        }
    };
}
