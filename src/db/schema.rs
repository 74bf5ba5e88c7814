//! Schema introspection module.
//!
//! This module provides database schema introspection functionality
//! for SQLite, PostgreSQL, and MySQL databases.
//!
//! # Architecture
//!
//! SQL queries are organized in the `queries` submodule with constants for each
//! database type. Every query selects the same column aliases, so the
//! inspector reads all three catalogs through one code path on top of
//! [`ScopedClient`]. Table names are bound as the `@table` parameter and only
//! their unqualified part is matched against the current schema.

use crate::db::ddl::object_name;
use crate::db::pool::ScopedClient;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnInfo, DatabaseType, DbObjectInfo, ParameterSet, Row, SqlValue, TableSchema,
};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static DECLARED_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\)").expect("declared size pattern is valid")
});

/// Catalog SQL for one driver. `None` means the engine has no such objects.
struct CatalogQueries {
    databases: &'static str,
    tables: &'static str,
    views: &'static str,
    columns: &'static str,
    indexes: &'static str,
    procedures: Option<&'static str>,
    functions: Option<&'static str>,
    triggers: &'static str,
    db_types: &'static str,
    constraint_exists: &'static str,
    index_exists: &'static str,
}

mod queries {
    use super::CatalogQueries;

    pub static MYSQL: CatalogQueries = CatalogQueries {
        databases: "SELECT CONVERT(SCHEMA_NAME USING utf8mb4) AS name \
                    FROM information_schema.SCHEMATA ORDER BY SCHEMA_NAME",
        tables: r#"
            SELECT CONVERT(TABLE_NAME USING utf8mb4) AS name,
                   CONVERT(TABLE_COMMENT USING utf8mb4) AS description
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
            "#,
        views: r#"
            SELECT CONVERT(TABLE_NAME USING utf8mb4) AS name,
                   CONVERT(TABLE_COMMENT USING utf8mb4) AS description
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'VIEW'
            ORDER BY TABLE_NAME
            "#,
        columns: r#"
            SELECT CONVERT(COLUMN_NAME USING utf8mb4) AS name,
                   CONVERT(DATA_TYPE USING utf8mb4) AS data_type,
                   CONVERT(COLUMN_TYPE USING utf8mb4) AS declared_type,
                   CHARACTER_MAXIMUM_LENGTH AS char_length,
                   NUMERIC_PRECISION AS num_precision,
                   NUMERIC_SCALE AS num_scale,
                   IS_NULLABLE = 'YES' AS is_nullable,
                   COLUMN_KEY = 'PRI' AS is_pk,
                   EXTRA LIKE '%auto_increment%' AS is_identity,
                   CONVERT(COLUMN_DEFAULT USING utf8mb4) AS default_value,
                   CONVERT(COLUMN_COMMENT USING utf8mb4) AS description
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = @table
            ORDER BY ORDINAL_POSITION
            "#,
        indexes: r#"
            SELECT DISTINCT CONVERT(INDEX_NAME USING utf8mb4) AS name
            FROM information_schema.STATISTICS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = @table
            ORDER BY name
            "#,
        procedures: Some(
            "SELECT CONVERT(ROUTINE_NAME USING utf8mb4) AS name FROM information_schema.ROUTINES \
             WHERE ROUTINE_SCHEMA = DATABASE() AND ROUTINE_TYPE = 'PROCEDURE' ORDER BY ROUTINE_NAME",
        ),
        functions: Some(
            "SELECT CONVERT(ROUTINE_NAME USING utf8mb4) AS name FROM information_schema.ROUTINES \
             WHERE ROUTINE_SCHEMA = DATABASE() AND ROUTINE_TYPE = 'FUNCTION' ORDER BY ROUTINE_NAME",
        ),
        triggers: r#"
            SELECT CONVERT(TRIGGER_NAME USING utf8mb4) AS name
            FROM information_schema.TRIGGERS
            WHERE EVENT_OBJECT_SCHEMA = DATABASE() AND EVENT_OBJECT_TABLE = @table
            ORDER BY TRIGGER_NAME
            "#,
        db_types: "SELECT DISTINCT CONVERT(DATA_TYPE USING utf8mb4) AS name \
                   FROM information_schema.COLUMNS ORDER BY name",
        constraint_exists: r#"
            SELECT COUNT(*) AS matches
            FROM information_schema.TABLE_CONSTRAINTS
            WHERE CONSTRAINT_SCHEMA = DATABASE() AND CONSTRAINT_NAME = @name
            "#,
        index_exists: r#"
            SELECT COUNT(*) AS matches
            FROM information_schema.STATISTICS
            WHERE TABLE_SCHEMA = DATABASE() AND INDEX_NAME = @name
            "#,
    };

    pub static POSTGRES: CatalogQueries = CatalogQueries {
        databases: "SELECT datname::text AS name FROM pg_database \
                    WHERE datistemplate = false ORDER BY datname",
        tables: r#"
            SELECT c.relname::text AS name,
                   obj_description(c.oid, 'pg_class')::text AS description
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relkind IN ('r', 'p') AND n.nspname = current_schema()
            ORDER BY c.relname
            "#,
        views: r#"
            SELECT c.relname::text AS name,
                   obj_description(c.oid, 'pg_class')::text AS description
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relkind IN ('v', 'm') AND n.nspname = current_schema()
            ORDER BY c.relname
            "#,
        columns: r#"
            SELECT a.attname::text AS name,
                   t.typname::text AS data_type,
                   format_type(a.atttypid, a.atttypmod)::text AS declared_type,
                   ic.character_maximum_length::bigint AS char_length,
                   ic.numeric_precision::bigint AS num_precision,
                   ic.numeric_scale::bigint AS num_scale,
                   NOT a.attnotnull AS is_nullable,
                   EXISTS (
                       SELECT 1 FROM pg_index i
                       WHERE i.indrelid = c.oid AND i.indisprimary AND a.attnum = ANY(i.indkey)
                   ) AS is_pk,
                   (a.attidentity <> '' OR coalesce(pg_get_expr(d.adbin, d.adrelid), '') LIKE 'nextval(%') AS is_identity,
                   pg_get_expr(d.adbin, d.adrelid)::text AS default_value,
                   col_description(c.oid, a.attnum)::text AS description
            FROM pg_attribute a
            JOIN pg_class c ON c.oid = a.attrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            JOIN pg_type t ON t.oid = a.atttypid
            LEFT JOIN pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
            LEFT JOIN information_schema.columns ic
                ON ic.table_schema = n.nspname AND ic.table_name = c.relname AND ic.column_name = a.attname
            WHERE n.nspname = current_schema() AND c.relname = @table
              AND a.attnum > 0 AND NOT a.attisdropped
            ORDER BY a.attnum
            "#,
        indexes: "SELECT indexname::text AS name FROM pg_indexes \
                  WHERE schemaname = current_schema() AND tablename = @table ORDER BY indexname",
        procedures: Some(
            "SELECT p.proname::text AS name FROM pg_proc p JOIN pg_namespace n ON n.oid = p.pronamespace \
             WHERE n.nspname = current_schema() AND p.prokind = 'p' ORDER BY p.proname",
        ),
        functions: Some(
            "SELECT p.proname::text AS name FROM pg_proc p JOIN pg_namespace n ON n.oid = p.pronamespace \
             WHERE n.nspname = current_schema() AND p.prokind = 'f' ORDER BY p.proname",
        ),
        triggers: r#"
            SELECT t.tgname::text AS name
            FROM pg_trigger t
            JOIN pg_class c ON c.oid = t.tgrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE NOT t.tgisinternal AND n.nspname = current_schema() AND c.relname = @table
            ORDER BY t.tgname
            "#,
        db_types: "SELECT typname::text AS name FROM pg_type \
                   WHERE typtype IN ('b', 'd', 'e', 'r') AND typname NOT LIKE '\\_%' ORDER BY typname",
        constraint_exists: r#"
            SELECT COUNT(*) AS matches
            FROM pg_constraint c
            JOIN pg_namespace n ON n.oid = c.connamespace
            WHERE n.nspname = current_schema() AND c.conname = @name
            "#,
        index_exists: "SELECT COUNT(*) AS matches FROM pg_indexes \
                       WHERE schemaname = current_schema() AND indexname = @name",
    };

    pub static SQLITE: CatalogQueries = CatalogQueries {
        databases: "SELECT name FROM pragma_database_list ORDER BY seq",
        tables: r#"
            SELECT name, NULL AS description FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
            ORDER BY name
            "#,
        views: "SELECT name, NULL AS description FROM sqlite_master WHERE type = 'view' ORDER BY name",
        columns: r#"
            SELECT p.name AS name,
                   p.type AS data_type,
                   p.type AS declared_type,
                   NULL AS char_length,
                   NULL AS num_precision,
                   NULL AS num_scale,
                   p."notnull" = 0 AS is_nullable,
                   p.pk > 0 AS is_pk,
                   (p.pk = 1 AND lower(p.type) = 'integer'
                    AND (SELECT COUNT(*) FROM pragma_table_info(@table) WHERE pk > 0) = 1) AS is_identity,
                   p.dflt_value AS default_value,
                   NULL AS description
            FROM pragma_table_info(@table) p
            ORDER BY p.cid
            "#,
        indexes: "SELECT name FROM pragma_index_list(@table) ORDER BY name",
        procedures: None,
        functions: None,
        triggers: "SELECT name FROM sqlite_master WHERE type = 'trigger' AND tbl_name = @table ORDER BY name",
        db_types: "SELECT 'INTEGER' AS name UNION ALL SELECT 'REAL' UNION ALL SELECT 'TEXT' \
                   UNION ALL SELECT 'BLOB' UNION ALL SELECT 'NUMERIC'",
        constraint_exists: r#"
            SELECT COUNT(*) AS matches FROM sqlite_master
            WHERE sql IS NOT NULL AND instr(lower(sql), lower('constraint ' || @name)) > 0
            "#,
        index_exists: "SELECT COUNT(*) AS matches FROM sqlite_master WHERE type = 'index' AND name = @name",
    };
}

fn catalog(db: DatabaseType) -> &'static CatalogQueries {
    match db {
        DatabaseType::MySQL => &queries::MYSQL,
        DatabaseType::PostgreSQL => &queries::POSTGRES,
        DatabaseType::SQLite => &queries::SQLITE,
    }
}

/// Text of a catalog column. MySQL catalogs may hand back text as bytes.
fn text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        SqlValue::Binary(bytes) => String::from_utf8(bytes.clone()).ok(),
        other => other.as_text(),
    }
}

fn integer(row: &Row, column: &str) -> Option<i64> {
    match row.get(column)? {
        SqlValue::Int(i) => Some(*i),
        SqlValue::Float(f) => Some(*f as i64),
        other => other.as_text()?.trim().parse().ok(),
    }
}

fn flag(row: &Row, column: &str) -> bool {
    row.get(column).is_some_and(SqlValue::as_flag)
}

fn names(rows: &[Row]) -> Vec<String> {
    rows.iter().filter_map(|row| text(row, "name")).collect()
}

fn table_param(table: &str) -> ParameterSet {
    ParameterSet::new().with("table", SqlValue::String(object_name(table).to_string()))
}

/// Length and scale from a declared type such as `VARCHAR(50)` or `DECIMAL(10,2)`.
fn declared_size(declared: &str) -> (Option<i64>, Option<i64>) {
    match DECLARED_SIZE.captures(declared) {
        Some(caps) => (
            caps.get(1).and_then(|m| m.as_str().parse().ok()),
            caps.get(2).and_then(|m| m.as_str().parse().ok()),
        ),
        None => (None, None),
    }
}

fn column_from_row(table: &str, row: &Row) -> Option<ColumnInfo> {
    let name = text(row, "name")?;
    let declared = text(row, "declared_type").unwrap_or_default();
    let (declared_length, declared_scale) = declared_size(&declared);
    let data_type = text(row, "data_type")
        .map(|t| match t.split_once('(') {
            Some((base, _)) => base.trim().to_string(),
            None => t,
        })
        .unwrap_or_default();

    Some(ColumnInfo {
        table_name: object_name(table).to_string(),
        db_column_name: name,
        data_type,
        length: integer(row, "char_length")
            .or_else(|| integer(row, "num_precision"))
            .or(declared_length),
        decimal_digits: integer(row, "num_scale").or(declared_scale),
        is_nullable: flag(row, "is_nullable"),
        is_primary_key: flag(row, "is_pk"),
        is_identity: flag(row, "is_identity"),
        default_value: text(row, "default_value"),
        column_description: text(row, "description").filter(|d| !d.is_empty()),
    })
}

/// Schema inspector for database introspection.
pub struct SchemaInspector;

impl SchemaInspector {
    /// List all databases visible to the connection.
    pub async fn list_databases(client: &ScopedClient) -> DbResult<Vec<String>> {
        let rows = client
            .query(catalog(client.driver()).databases, None)
            .await?;
        Ok(names(&rows))
    }

    /// List base tables in the current schema.
    pub async fn list_tables(client: &ScopedClient) -> DbResult<Vec<DbObjectInfo>> {
        let rows = client.query(catalog(client.driver()).tables, None).await?;
        let tables = objects(&rows);
        debug!(count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// List views in the current schema.
    pub async fn list_views(client: &ScopedClient) -> DbResult<Vec<DbObjectInfo>> {
        let rows = client.query(catalog(client.driver()).views, None).await?;
        Ok(objects(&rows))
    }

    /// Columns of a table in ordinal order; empty when the table is unknown.
    pub async fn list_columns(client: &ScopedClient, table: &str) -> DbResult<Vec<ColumnInfo>> {
        let params = table_param(table);
        let rows = client
            .query(catalog(client.driver()).columns, Some(&params))
            .await?;
        let columns: Vec<ColumnInfo> = rows
            .iter()
            .filter_map(|row| column_from_row(table, row))
            .collect();
        debug!(table, count = columns.len(), "Listed columns");
        Ok(columns)
    }

    pub async fn identity_columns(client: &ScopedClient, table: &str) -> DbResult<Vec<String>> {
        Ok(Self::list_columns(client, table)
            .await?
            .into_iter()
            .filter(|c| c.is_identity)
            .map(|c| c.db_column_name)
            .collect())
    }

    pub async fn primary_keys(client: &ScopedClient, table: &str) -> DbResult<Vec<String>> {
        Ok(Self::list_columns(client, table)
            .await?
            .into_iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.db_column_name)
            .collect())
    }

    pub async fn list_indexes(client: &ScopedClient, table: &str) -> DbResult<Vec<String>> {
        let params = table_param(table);
        let rows = client
            .query(catalog(client.driver()).indexes, Some(&params))
            .await?;
        Ok(names(&rows))
    }

    /// Stored procedure names; SQLite has none.
    pub async fn list_procedures(client: &ScopedClient) -> DbResult<Vec<String>> {
        match catalog(client.driver()).procedures {
            Some(sql) => Ok(names(&client.query(sql, None).await?)),
            None => Ok(Vec::new()),
        }
    }

    /// Function names; SQLite has none.
    pub async fn list_functions(client: &ScopedClient) -> DbResult<Vec<String>> {
        match catalog(client.driver()).functions {
            Some(sql) => Ok(names(&client.query(sql, None).await?)),
            None => Ok(Vec::new()),
        }
    }

    pub async fn list_triggers(client: &ScopedClient, table: &str) -> DbResult<Vec<String>> {
        let params = table_param(table);
        let rows = client
            .query(catalog(client.driver()).triggers, Some(&params))
            .await?;
        Ok(names(&rows))
    }

    /// Data type names the database knows about.
    pub async fn list_db_types(client: &ScopedClient) -> DbResult<Vec<String>> {
        let rows = client
            .query(catalog(client.driver()).db_types, None)
            .await?;
        Ok(names(&rows))
    }

    /// Columns, keys, identities and indexes of one table.
    pub async fn table_schema(client: &ScopedClient, table: &str) -> DbResult<TableSchema> {
        let columns = Self::list_columns(client, table).await?;
        if columns.is_empty() {
            return Err(DbError::invalid_parameters(format!(
                "Table '{}' not found",
                table.trim()
            )));
        }
        let primary_keys = columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.db_column_name.clone())
            .collect();
        let identity_columns = columns
            .iter()
            .filter(|c| c.is_identity)
            .map(|c| c.db_column_name.clone())
            .collect();
        let indexes = Self::list_indexes(client, table).await?;

        Ok(TableSchema {
            table_name: object_name(table).to_string(),
            columns,
            primary_keys,
            identity_columns,
            indexes,
        })
    }

    pub async fn table_exists(client: &ScopedClient, table: &str) -> DbResult<bool> {
        let wanted = object_name(table);
        Ok(Self::list_tables(client)
            .await?
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(wanted)))
    }

    async fn find_column(
        client: &ScopedClient,
        table: &str,
        column: &str,
    ) -> DbResult<Option<ColumnInfo>> {
        let column = column.trim();
        Ok(Self::list_columns(client, table)
            .await?
            .into_iter()
            .find(|c| c.db_column_name.eq_ignore_ascii_case(column)))
    }

    pub async fn column_exists(client: &ScopedClient, table: &str, column: &str) -> DbResult<bool> {
        Ok(Self::find_column(client, table, column).await?.is_some())
    }

    pub async fn is_primary_key(client: &ScopedClient, table: &str, column: &str) -> DbResult<bool> {
        Ok(Self::find_column(client, table, column)
            .await?
            .is_some_and(|c| c.is_primary_key))
    }

    pub async fn is_identity(client: &ScopedClient, table: &str, column: &str) -> DbResult<bool> {
        Ok(Self::find_column(client, table, column)
            .await?
            .is_some_and(|c| c.is_identity))
    }

    pub async fn constraint_exists(client: &ScopedClient, name: &str) -> DbResult<bool> {
        Self::count_matches(client, catalog(client.driver()).constraint_exists, name).await
    }

    pub async fn index_exists(client: &ScopedClient, name: &str) -> DbResult<bool> {
        Self::count_matches(client, catalog(client.driver()).index_exists, name).await
    }

    /// Whether the table carries a non-empty description.
    pub async fn table_has_remark(client: &ScopedClient, table: &str) -> DbResult<bool> {
        let wanted = object_name(table);
        Ok(Self::list_tables(client)
            .await?
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(wanted) && t.description.is_some()))
    }

    /// MySQL column definition (type, nullability, default, auto-increment)
    /// suitable for restating the column in `MODIFY COLUMN`.
    pub async fn mysql_column_definition(
        client: &ScopedClient,
        table: &str,
        column: &str,
    ) -> DbResult<String> {
        let found = Self::find_column(client, table, column).await?;
        let params = table_param(table).with("column", SqlValue::String(column.trim().to_string()));
        let row = client
            .query_first(
                "SELECT CONVERT(COLUMN_TYPE USING utf8mb4) AS column_type, \
                 CONVERT(EXTRA USING utf8mb4) AS extra \
                 FROM information_schema.COLUMNS \
                 WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = @table AND COLUMN_NAME = @column",
                Some(&params),
            )
            .await?;
        let (Some(info), Some(row)) = (found, row) else {
            return Err(DbError::invalid_parameters(format!(
                "Column '{}' not found in table '{}'",
                column.trim(),
                table.trim()
            )));
        };

        let mut definition = text(&row, "column_type").unwrap_or(info.data_type);
        definition.push_str(if info.is_nullable { " NULL" } else { " NOT NULL" });
        if let Some(default) = info.default_value {
            let dialect = crate::db::ddl::Dialect::new(DatabaseType::MySQL);
            definition.push_str(&format!(" DEFAULT {}", dialect.default_literal(&default)));
        }
        if let Some(extra) = text(&row, "extra").filter(|e| e.to_lowercase().contains("auto_increment")) {
            definition.push(' ');
            definition.push_str(&extra);
        }
        Ok(definition)
    }

    async fn count_matches(client: &ScopedClient, sql: &str, name: &str) -> DbResult<bool> {
        let params = ParameterSet::new().with("name", SqlValue::String(name.trim().to_string()));
        let row = client.query_first(sql, Some(&params)).await?;
        Ok(row
            .as_ref()
            .and_then(|r| integer(r, "matches"))
            .is_some_and(|n| n > 0))
    }
}

fn objects(rows: &[Row]) -> Vec<DbObjectInfo> {
    rows.iter()
        .filter_map(|row| {
            let name = text(row, "name")?;
            Some(DbObjectInfo::new(name, text(row, "description")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_size() {
        assert_eq!(declared_size("VARCHAR(50)"), (Some(50), None));
        assert_eq!(declared_size("decimal(10, 2)"), (Some(10), Some(2)));
        assert_eq!(declared_size("INTEGER"), (None, None));
    }

    #[test]
    fn test_column_from_row() {
        let mut row = Row::new();
        row.push("name", SqlValue::Binary(b"price".to_vec()));
        row.push("data_type", SqlValue::String("DECIMAL(10,2)".into()));
        row.push("declared_type", SqlValue::String("DECIMAL(10,2)".into()));
        row.push("char_length", SqlValue::Null);
        row.push("num_precision", SqlValue::Null);
        row.push("num_scale", SqlValue::Null);
        row.push("is_nullable", SqlValue::Int(1));
        row.push("is_pk", SqlValue::Int(0));
        row.push("is_identity", SqlValue::Bool(false));
        row.push("default_value", SqlValue::String("0".into()));
        row.push("description", SqlValue::String(String::new()));

        let column = column_from_row("main.items", &row).unwrap();
        assert_eq!(column.table_name, "items");
        assert_eq!(column.db_column_name, "price");
        assert_eq!(column.data_type, "DECIMAL");
        assert_eq!(column.length, Some(10));
        assert_eq!(column.decimal_digits, Some(2));
        assert!(column.is_nullable);
        assert!(!column.is_primary_key);
        assert_eq!(column.default_value.as_deref(), Some("0"));
        assert!(column.column_description.is_none());
    }

    #[test]
    fn test_sqlite_has_no_routines() {
        assert!(catalog(DatabaseType::SQLite).procedures.is_none());
        assert!(catalog(DatabaseType::MySQL).functions.is_some());
    }
}
