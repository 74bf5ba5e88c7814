//! SQL text builders for the data and schema mutation tools.
//!
//! Identifiers are validated before they are quoted, so nothing a caller
//! passes as a table, column or index name can break out of the identifier
//! position. Values never go into the text; they are returned as parameters.

use crate::error::{DbError, DbResult};
use crate::models::{ColumnSpec, DatabaseType, ParameterSet};
use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}_][\p{L}\p{N}_$]*$").expect("identifier pattern is valid")
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("number pattern is valid"));

/// Default-value keywords written without quotes.
const DEFAULT_KEYWORDS: &[&str] = &[
    "NULL",
    "TRUE",
    "FALSE",
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "NOW()",
    "LOCALTIMESTAMP",
];

/// Per-driver SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    db: DatabaseType,
}

impl Dialect {
    pub fn new(db: DatabaseType) -> Self {
        Self { db }
    }

    pub fn db_type(&self) -> DatabaseType {
        self.db
    }

    fn unsupported(&self, operation: &str) -> DbError {
        DbError::unsupported(operation, self.db.display_name())
    }

    /// Validate and quote an identifier, allowing one `schema.` qualifier.
    pub fn quote_ident(&self, name: &str) -> DbResult<String> {
        let name = name.trim();
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() > 2 || parts.iter().any(|p| !IDENTIFIER.is_match(p)) {
            return Err(DbError::invalid_parameters(format!(
                "Invalid identifier '{}': use letters, digits, '_' or '$', optionally qualified as schema.name",
                name
            )));
        }
        Ok(parts
            .iter()
            .map(|p| self.quote_part(p))
            .collect::<Vec<_>>()
            .join("."))
    }

    fn quote_part(&self, part: &str) -> String {
        match self.db {
            DatabaseType::MySQL => format!("`{}`", part),
            DatabaseType::PostgreSQL | DatabaseType::SQLite => format!("\"{}\"", part),
        }
    }

    /// Quote a single, unqualified identifier.
    pub fn quote_column(&self, name: &str) -> DbResult<String> {
        if name.contains('.') {
            return Err(DbError::invalid_parameters(format!(
                "Column name '{}' must not be qualified",
                name.trim()
            )));
        }
        self.quote_ident(name)
    }

    /// String literal with quotes escaped for the dialect.
    pub fn literal(&self, text: &str) -> String {
        let escaped = text.replace('\'', "''");
        match self.db {
            DatabaseType::MySQL => format!("'{}'", escaped.replace('\\', "\\\\")),
            _ => format!("'{}'", escaped),
        }
    }

    /// Render a column default.
    ///
    /// Numbers, well-known keywords and values already wrapped in single
    /// quotes are written as-is; anything else becomes a string literal.
    pub fn default_literal(&self, value: &str) -> String {
        let trimmed = value.trim();
        let is_quoted = trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'');
        if is_quoted
            || NUMBER.is_match(trimmed)
            || DEFAULT_KEYWORDS
                .iter()
                .any(|k| k.eq_ignore_ascii_case(trimmed))
        {
            trimmed.to_string()
        } else {
            self.literal(trimmed)
        }
    }

    fn column_list(&self, columns: &[String]) -> DbResult<String> {
        if columns.is_empty() {
            return Err(DbError::invalid_parameters("At least one column is required"));
        }
        Ok(columns
            .iter()
            .map(|c| self.quote_column(c))
            .collect::<DbResult<Vec<_>>>()?
            .join(", "))
    }

    /// `INSERT` for one row; values are bound as `@val_N`.
    pub fn insert(&self, table: &str, data: &ParameterSet) -> DbResult<(String, ParameterSet)> {
        if data.is_empty() {
            return Err(DbError::invalid_parameters("Data must contain at least one column"));
        }
        let mut columns = Vec::with_capacity(data.len());
        let mut markers = Vec::with_capacity(data.len());
        let mut params = ParameterSet::new();
        for (i, (column, value)) in data.iter().enumerate() {
            columns.push(self.quote_column(column)?);
            markers.push(format!("@val_{}", i));
            params.push(format!("val_{}", i), value.clone());
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote_ident(table)?,
            columns.join(", "),
            markers.join(", ")
        );
        Ok((sql, params))
    }

    /// `UPDATE ... SET` with values bound as `@set_N`.
    pub fn update(
        &self,
        table: &str,
        data: &ParameterSet,
        where_clause: &str,
    ) -> DbResult<(String, ParameterSet)> {
        if data.is_empty() {
            return Err(DbError::invalid_parameters("Data must contain at least one column"));
        }
        let where_clause = require_where(where_clause)?;
        let mut assignments = Vec::with_capacity(data.len());
        let mut params = ParameterSet::new();
        for (i, (column, value)) in data.iter().enumerate() {
            assignments.push(format!("{} = @set_{}", self.quote_column(column)?, i));
            params.push(format!("set_{}", i), value.clone());
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.quote_ident(table)?,
            assignments.join(", "),
            where_clause
        );
        Ok((sql, params))
    }

    pub fn delete(&self, table: &str, where_clause: &str) -> DbResult<String> {
        let where_clause = require_where(where_clause)?;
        Ok(format!(
            "DELETE FROM {} WHERE {}",
            self.quote_ident(table)?,
            where_clause
        ))
    }

    pub fn drop_table(&self, table: &str) -> DbResult<String> {
        Ok(format!("DROP TABLE {}", self.quote_ident(table)?))
    }

    /// SQLite has no TRUNCATE; an unqualified DELETE is its equivalent.
    pub fn truncate_table(&self, table: &str) -> DbResult<String> {
        let table = self.quote_ident(table)?;
        Ok(match self.db {
            DatabaseType::SQLite => format!("DELETE FROM {}", table),
            _ => format!("TRUNCATE TABLE {}", table),
        })
    }

    /// Copy a table (structure and rows) into a new table.
    pub fn backup_table(
        &self,
        table: &str,
        backup: &str,
        max_rows: Option<u64>,
    ) -> DbResult<String> {
        let mut sql = format!(
            "CREATE TABLE {} AS SELECT * FROM {}",
            self.quote_ident(backup)?,
            self.quote_ident(table)?
        );
        if let Some(limit) = max_rows {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        Ok(sql)
    }

    pub fn rename_table(&self, table: &str, new_name: &str) -> DbResult<String> {
        let from = self.quote_ident(table)?;
        let to = self.quote_column(new_name)?;
        Ok(match self.db {
            DatabaseType::MySQL => format!("RENAME TABLE {} TO {}", from, to),
            _ => format!("ALTER TABLE {} RENAME TO {}", from, to),
        })
    }

    fn column_definition(&self, spec: &ColumnSpec) -> DbResult<String> {
        let mut def = format!("{} {}", self.quote_column(&spec.name)?, spec.type_sql());
        if !spec.is_nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = spec.default_value.as_deref().filter(|d| !d.trim().is_empty()) {
            def.push_str(&format!(" DEFAULT {}", self.default_literal(default)));
        }
        Ok(def)
    }

    /// Statements adding a column, including its description when given.
    pub fn add_column(&self, table: &str, spec: &ColumnSpec) -> DbResult<Vec<String>> {
        let quoted = self.quote_ident(table)?;
        let mut def = self.column_definition(spec)?;
        let description = spec
            .column_description
            .as_deref()
            .filter(|d| !d.is_empty());

        let mut statements = Vec::new();
        match (self.db, description) {
            (DatabaseType::MySQL, Some(d)) => {
                def.push_str(&format!(" COMMENT {}", self.literal(d)));
                statements.push(format!("ALTER TABLE {} ADD COLUMN {}", quoted, def));
            }
            (DatabaseType::PostgreSQL, Some(d)) => {
                statements.push(format!("ALTER TABLE {} ADD COLUMN {}", quoted, def));
                statements.push(format!(
                    "COMMENT ON COLUMN {}.{} IS {}",
                    quoted,
                    self.quote_column(&spec.name)?,
                    self.literal(d)
                ));
            }
            _ => statements.push(format!("ALTER TABLE {} ADD COLUMN {}", quoted, def)),
        }
        Ok(statements)
    }

    /// Statements changing a column's type, nullability and default.
    pub fn update_column(&self, table: &str, spec: &ColumnSpec) -> DbResult<Vec<String>> {
        let quoted = self.quote_ident(table)?;
        match self.db {
            DatabaseType::MySQL => {
                let mut def = self.column_definition(spec)?;
                if let Some(d) = spec.column_description.as_deref().filter(|d| !d.is_empty()) {
                    def.push_str(&format!(" COMMENT {}", self.literal(d)));
                }
                Ok(vec![format!("ALTER TABLE {} MODIFY COLUMN {}", quoted, def)])
            }
            DatabaseType::PostgreSQL => {
                let column = self.quote_column(&spec.name)?;
                let alter = |clause: String| {
                    format!("ALTER TABLE {} ALTER COLUMN {} {}", quoted, column, clause)
                };
                let mut statements = vec![alter(format!(
                    "TYPE {} USING {}::{}",
                    spec.type_sql(),
                    column,
                    spec.type_sql()
                ))];
                let nullability = if spec.is_nullable {
                    "DROP NOT NULL"
                } else {
                    "SET NOT NULL"
                };
                statements.push(alter(nullability.to_string()));
                match spec.default_value.as_deref().filter(|d| !d.trim().is_empty()) {
                    Some(d) => statements.push(alter(format!("SET DEFAULT {}", self.default_literal(d)))),
                    None => statements.push(alter("DROP DEFAULT".to_string())),
                }
                if let Some(d) = spec.column_description.as_deref().filter(|d| !d.is_empty()) {
                    statements.push(format!(
                        "COMMENT ON COLUMN {}.{} IS {}",
                        quoted,
                        column,
                        self.literal(d)
                    ));
                }
                Ok(statements)
            }
            DatabaseType::SQLite => Err(self.unsupported("Altering a column definition")),
        }
    }

    pub fn drop_column(&self, table: &str, column: &str) -> DbResult<String> {
        Ok(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_ident(table)?,
            self.quote_column(column)?
        ))
    }

    pub fn rename_column(&self, table: &str, column: &str, new_name: &str) -> DbResult<String> {
        Ok(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quote_ident(table)?,
            self.quote_column(column)?,
            self.quote_column(new_name)?
        ))
    }

    pub fn add_primary_key(&self, table: &str, columns: &[String]) -> DbResult<String> {
        let quoted = self.quote_ident(table)?;
        let list = self.column_list(columns)?;
        match self.db {
            DatabaseType::MySQL => Ok(format!("ALTER TABLE {} ADD PRIMARY KEY ({})", quoted, list)),
            DatabaseType::PostgreSQL => Ok(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
                quoted,
                self.quote_part(&format!("pk_{}", object_name(table))),
                list
            )),
            DatabaseType::SQLite => Err(self.unsupported("Adding a primary key to an existing table")),
        }
    }

    /// Drop a named constraint; on MySQL the name `PRIMARY` drops the primary key.
    pub fn drop_constraint(&self, table: &str, constraint: &str) -> DbResult<String> {
        let quoted = self.quote_ident(table)?;
        match self.db {
            DatabaseType::MySQL if constraint.trim().eq_ignore_ascii_case("PRIMARY") => {
                Ok(format!("ALTER TABLE {} DROP PRIMARY KEY", quoted))
            }
            DatabaseType::MySQL | DatabaseType::PostgreSQL => Ok(format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                quoted,
                self.quote_column(constraint)?
            )),
            DatabaseType::SQLite => Err(self.unsupported("Dropping a constraint")),
        }
    }

    /// `CREATE [UNIQUE] INDEX`; the name defaults to `idx_<table>_<columns>`.
    pub fn create_index(
        &self,
        table: &str,
        columns: &[String],
        index_name: Option<&str>,
        unique: bool,
    ) -> DbResult<String> {
        let list = self.column_list(columns)?;
        let name = match index_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => format!("idx_{}_{}", object_name(table), columns.join("_")),
        };
        Ok(format!(
            "CREATE {}INDEX {} ON {} ({})",
            if unique { "UNIQUE " } else { "" },
            self.quote_column(&name)?,
            self.quote_ident(table)?,
            list
        ))
    }

    pub fn add_default_value(&self, table: &str, column: &str, value: &str) -> DbResult<String> {
        match self.db {
            DatabaseType::SQLite => Err(self.unsupported("Changing a column default")),
            _ => Ok(format!(
                "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
                self.quote_ident(table)?,
                self.quote_column(column)?,
                self.default_literal(value)
            )),
        }
    }

    /// Set or clear (`None`) a table description.
    pub fn table_remark(&self, table: &str, remark: Option<&str>) -> DbResult<String> {
        let quoted = self.quote_ident(table)?;
        match self.db {
            DatabaseType::MySQL => Ok(format!(
                "ALTER TABLE {} COMMENT = {}",
                quoted,
                self.literal(remark.unwrap_or(""))
            )),
            DatabaseType::PostgreSQL => Ok(format!(
                "COMMENT ON TABLE {} IS {}",
                quoted,
                remark.map_or_else(|| "NULL".to_string(), |r| self.literal(r))
            )),
            DatabaseType::SQLite => Err(self.unsupported("Table descriptions")),
        }
    }

    /// Set or clear (`None`) a column description.
    ///
    /// MySQL can only change a comment by restating the column, so
    /// `mysql_definition` must carry the column's current type and options.
    pub fn column_remark(
        &self,
        table: &str,
        column: &str,
        remark: Option<&str>,
        mysql_definition: Option<&str>,
    ) -> DbResult<String> {
        let quoted = self.quote_ident(table)?;
        let column = self.quote_column(column)?;
        match self.db {
            DatabaseType::MySQL => {
                let definition = mysql_definition.ok_or_else(|| {
                    DbError::internal("Column definition is required to change a MySQL comment")
                })?;
                Ok(format!(
                    "ALTER TABLE {} MODIFY COLUMN {} {} COMMENT {}",
                    quoted,
                    column,
                    definition,
                    self.literal(remark.unwrap_or(""))
                ))
            }
            DatabaseType::PostgreSQL => Ok(format!(
                "COMMENT ON COLUMN {}.{} IS {}",
                quoted,
                column,
                remark.map_or_else(|| "NULL".to_string(), |r| self.literal(r))
            )),
            DatabaseType::SQLite => Err(self.unsupported("Column descriptions")),
        }
    }

    pub fn drop_view(&self, view: &str) -> DbResult<String> {
        Ok(format!("DROP VIEW {}", self.quote_ident(view)?))
    }

    pub fn drop_function(&self, function: &str) -> DbResult<String> {
        match self.db {
            DatabaseType::SQLite => Err(self.unsupported("Functions")),
            _ => Ok(format!("DROP FUNCTION {}", self.quote_ident(function)?)),
        }
    }

    pub fn drop_procedure(&self, procedure: &str) -> DbResult<String> {
        match self.db {
            DatabaseType::SQLite => Err(self.unsupported("Stored procedures")),
            _ => Ok(format!("DROP PROCEDURE {}", self.quote_ident(procedure)?)),
        }
    }
}

/// Unqualified part of a possibly `schema.`-qualified name.
pub fn object_name(name: &str) -> &str {
    let name = name.trim();
    name.rsplit('.').next().unwrap_or(name)
}

fn require_where(where_clause: &str) -> DbResult<&str> {
    let trimmed = where_clause.trim();
    let trimmed = trimmed
        .strip_prefix("WHERE ")
        .or_else(|| trimmed.strip_prefix("where "))
        .unwrap_or(trimmed)
        .trim();
    if trimmed.is_empty() {
        return Err(DbError::invalid_parameters(
            "A WHERE clause is required; refusing to touch every row",
        ));
    }
    Ok(trimmed)
}
