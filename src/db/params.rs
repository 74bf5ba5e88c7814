//! Named parameter rewriting and binding.
//!
//! Tool callers write `@name` or `:name` markers in SQL text. Before execution
//! the markers are rewritten into the driver's placeholder syntax (`?` for
//! MySQL and SQLite, `$n` for PostgreSQL) and the matching values are
//! collected in placeholder order. Quoted strings, quoted identifiers,
//! comments, `@@system_vars` and `::casts` are never touched.

use crate::error::{DbError, DbResult};
use crate::models::{DatabaseType, ParameterSet, SqlValue};
use crate::models::params::normalize_name;
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlArguments;
use sqlx::postgres::PgArguments;
use sqlx::sqlite::SqliteArguments;
use sqlx::{MySql, Postgres, Sqlite};

/// SQL ready for the driver plus its values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

impl PreparedStatement {
    /// Statement without bound values; executed as raw SQL.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            values: Vec::new(),
        }
    }

    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Named { name: &'a str, raw: &'a str },
    Positional(&'a str),
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split SQL into plain text, named markers and positional placeholders.
fn tokenize<'a>(sql: &'a str, db: DatabaseType) -> Vec<Segment<'a>> {
    let chars: Vec<(usize, char)> = sql.char_indices().collect();
    let at = |i: usize| chars.get(i).map(|(_, c)| *c);
    let offset = |i: usize| chars.get(i).map(|(o, _)| *o).unwrap_or(sql.len());
    let ident_end = |mut i: usize| {
        while at(i).is_some_and(is_ident_char) {
            i += 1;
        }
        i
    };

    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut i = 0;
    let flush = |segments: &mut Vec<Segment<'a>>, from: usize, to: usize| {
        if from < to {
            segments.push(Segment::Text(&sql[offset(from)..offset(to)]));
        }
    };

    while i < chars.len() {
        let c = chars[i].1;
        match c {
            '\'' | '"' | '`' => i = skip_quoted(&chars, i, db),
            '-' if at(i + 1) == Some('-') => {
                while at(i).is_some_and(|c| c != '\n') {
                    i += 1;
                }
            }
            '/' if at(i + 1) == Some('*') => {
                i += 2;
                while i < chars.len() && !(at(i) == Some('*') && at(i + 1) == Some('/')) {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            ':' if at(i + 1) == Some(':') => i += 2,
            '@' if at(i + 1) == Some('@') => i = ident_end(i + 2),
            '@' | ':' if at(i + 1).is_some_and(is_ident_start) => {
                let end = ident_end(i + 1);
                flush(&mut segments, text_start, i);
                segments.push(Segment::Named {
                    name: &sql[offset(i + 1)..offset(end)],
                    raw: &sql[offset(i)..offset(end)],
                });
                text_start = end;
                i = end;
            }
            '?' if db != DatabaseType::PostgreSQL => {
                let end = (i + 1..=chars.len())
                    .find(|&j| !at(j).is_some_and(|c| c.is_ascii_digit()))
                    .unwrap_or(chars.len());
                flush(&mut segments, text_start, i);
                segments.push(Segment::Positional(&sql[offset(i)..offset(end)]));
                text_start = end;
                i = end;
            }
            '$' if db == DatabaseType::PostgreSQL => {
                if at(i + 1).is_some_and(|c| c.is_ascii_digit()) {
                    let mut end = i + 1;
                    while at(end).is_some_and(|c| c.is_ascii_digit()) {
                        end += 1;
                    }
                    flush(&mut segments, text_start, i);
                    segments.push(Segment::Positional(&sql[offset(i)..offset(end)]));
                    text_start = end;
                    i = end;
                } else {
                    i = skip_dollar_quoted(sql, &chars, i);
                }
            }
            _ => i += 1,
        }
    }
    flush(&mut segments, text_start, chars.len());
    segments
}

/// Index just past a quoted literal or identifier starting at `start`.
fn skip_quoted(chars: &[(usize, char)], start: usize, db: DatabaseType) -> usize {
    let quote = chars[start].1;
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i].1;
        if c == '\\' && db == DatabaseType::MySQL && quote != '`' {
            i += 2;
            continue;
        }
        if c == quote {
            if chars.get(i + 1).map(|(_, c)| *c) == Some(quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

/// Skip a PostgreSQL `$tag$ ... $tag$` body; a lone `$` is plain text.
fn skip_dollar_quoted(sql: &str, chars: &[(usize, char)], start: usize) -> usize {
    let mut j = start + 1;
    while j < chars.len() && is_ident_char(chars[j].1) {
        j += 1;
    }
    if chars.get(j).map(|(_, c)| *c) != Some('$') {
        return start + 1;
    }
    let tag_end = chars[j].0 + 1;
    let tag = &sql[chars[start].0..tag_end];
    match sql[tag_end..].find(tag) {
        Some(pos) => {
            let close = tag_end + pos + tag.len();
            chars
                .iter()
                .position(|(o, _)| *o >= close)
                .unwrap_or(chars.len())
        }
        None => chars.len(),
    }
}

/// Rewrite named markers for the driver and collect their values.
///
/// Markers without a matching parameter are left as written. When the SQL
/// has no matching marker but contains positional placeholders, the values
/// bind positionally in parameter order.
pub fn prepare_statement(
    sql: &str,
    params: Option<&ParameterSet>,
    db: DatabaseType,
) -> PreparedStatement {
    let Some(params) = params.filter(|p| !p.is_empty()) else {
        return PreparedStatement::raw(sql);
    };

    let segments = tokenize(sql, db);
    let has_named = segments
        .iter()
        .any(|s| matches!(s, Segment::Named { name, .. } if params.contains(name)));

    if !has_named {
        if segments
            .iter()
            .any(|s| matches!(s, Segment::Positional(_)))
        {
            return PreparedStatement {
                sql: sql.to_string(),
                values: params.values(),
            };
        }
        tracing::debug!(
            params = params.len(),
            "Parameters supplied but the statement has no placeholders"
        );
        return PreparedStatement::raw(sql);
    }

    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut pg_slots: Vec<String> = Vec::new();
    for segment in segments {
        match segment {
            Segment::Text(text) | Segment::Positional(text) => out.push_str(text),
            Segment::Named { name, raw } => match params.get(name) {
                None => out.push_str(raw),
                Some(value) if db == DatabaseType::PostgreSQL => {
                    let slot = match pg_slots.iter().position(|n| n.eq_ignore_ascii_case(name)) {
                        Some(pos) => pos + 1,
                        None => {
                            pg_slots.push(name.to_string());
                            values.push(value.clone());
                            pg_slots.len()
                        }
                    };
                    out.push('$');
                    out.push_str(&slot.to_string());
                }
                Some(value) => {
                    out.push('?');
                    values.push(value.clone());
                }
            },
        }
    }

    PreparedStatement { sql: out, values }
}

/// Expand one named marker into a list of markers, one per array element.
///
/// `WHERE id IN (@ids)` with `[1, 2]` becomes `WHERE id IN (@ids_0, @ids_1)`
/// with parameters `ids_0 = 1` and `ids_1 = 2`.
pub fn expand_in_list(
    sql: &str,
    name: &str,
    items: &[JsonValue],
    db: DatabaseType,
) -> DbResult<(String, ParameterSet)> {
    let name = normalize_name(name);
    if name.is_empty() {
        return Err(DbError::invalid_parameters("Parameter name is required"));
    }
    if items.is_empty() {
        return Err(DbError::invalid_parameters(format!(
            "The value list for '@{}' is empty",
            name
        )));
    }

    let mut params = ParameterSet::new();
    for (i, item) in items.iter().enumerate() {
        params.push(format!("{}_{}", name, i), SqlValue::from_json(item));
    }

    let mut replaced = 0;
    let mut out = String::with_capacity(sql.len() + items.len() * (name.len() + 4));
    for segment in tokenize(sql, db) {
        match segment {
            Segment::Named { name: found, raw } if found.eq_ignore_ascii_case(name) => {
                let prefix = &raw[..1];
                let list = (0..items.len())
                    .map(|i| format!("{}{}_{}", prefix, found, i))
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push_str(&list);
                replaced += 1;
            }
            Segment::Text(text) | Segment::Positional(text) => out.push_str(text),
            Segment::Named { raw, .. } => out.push_str(raw),
        }
    }

    if replaced == 0 {
        return Err(DbError::invalid_parameters(format!(
            "Placeholder '@{}' was not found in the SQL",
            name
        )));
    }
    Ok((out, params))
}

/// Bind a value to a MySQL query.
pub(crate) fn bind_mysql_value<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    value: &'q SqlValue,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::String(v) => query.bind(v.as_str()),
        SqlValue::DateTime(v) => query.bind(*v),
        SqlValue::Binary(v) => query.bind(v.as_slice()),
    }
}

/// Bind a value to a PostgreSQL query.
pub(crate) fn bind_postgres_value<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    value: &'q SqlValue,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::String(v) => query.bind(v.as_str()),
        SqlValue::DateTime(v) => query.bind(*v),
        SqlValue::Binary(v) => query.bind(v.as_slice()),
    }
}

/// Bind a value to a SQLite query.
pub(crate) fn bind_sqlite_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::String(v) => query.bind(v.as_str()),
        SqlValue::DateTime(v) => query.bind(*v),
        SqlValue::Binary(v) => query.bind(v.as_slice()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, SqlValue)]) -> ParameterSet {
        pairs
            .iter()
            .fold(ParameterSet::new(), |set, (n, v)| set.with(n, v.clone()))
    }

    #[test]
    fn test_mysql_named_markers() {
        let p = params(&[
            ("id", SqlValue::Int(5)),
            ("name", SqlValue::String("a".into())),
        ]);
        let stmt = prepare_statement(
            "SELECT * FROM t WHERE id = @id AND name = :name",
            Some(&p),
            DatabaseType::MySQL,
        );
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE id = ? AND name = ?");
        assert_eq!(
            stmt.values,
            vec![SqlValue::Int(5), SqlValue::String("a".into())]
        );
    }

    #[test]
    fn test_postgres_reuses_index_for_repeated_name() {
        let p = params(&[("v", SqlValue::Int(1)), ("w", SqlValue::Int(2))]);
        let stmt = prepare_statement(
            "SELECT @v, @w, @V",
            Some(&p),
            DatabaseType::PostgreSQL,
        );
        assert_eq!(stmt.sql, "SELECT $1, $2, $1");
        assert_eq!(stmt.values, vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn test_repeated_name_binds_twice_for_question_marks() {
        let p = params(&[("v", SqlValue::Int(1))]);
        let stmt = prepare_statement("SELECT @v + @v", Some(&p), DatabaseType::SQLite);
        assert_eq!(stmt.sql, "SELECT ? + ?");
        assert_eq!(stmt.values.len(), 2);
    }

    #[test]
    fn test_markers_inside_literals_and_comments_are_ignored() {
        let p = params(&[("id", SqlValue::Int(1))]);
        let sql = "SELECT '@id', \"@id\", `@id` -- @id\n/* :id */ FROM t WHERE x = @id";
        let stmt = prepare_statement(sql, Some(&p), DatabaseType::MySQL);
        assert_eq!(
            stmt.sql,
            "SELECT '@id', \"@id\", `@id` -- @id\n/* :id */ FROM t WHERE x = ?"
        );
        assert_eq!(stmt.values, vec![SqlValue::Int(1)]);
    }

    #[test]
    fn test_escaped_quotes_do_not_end_literal() {
        let p = params(&[("id", SqlValue::Int(1))]);
        let stmt = prepare_statement(
            "SELECT 'it''s @id' WHERE a = @id",
            Some(&p),
            DatabaseType::SQLite,
        );
        assert_eq!(stmt.sql, "SELECT 'it''s @id' WHERE a = ?");
    }

    #[test]
    fn test_system_variables_and_casts_untouched() {
        let p = params(&[("version", SqlValue::Int(1)), ("text", SqlValue::Int(2))]);
        let stmt = prepare_statement(
            "SELECT @@version, x::text FROM t WHERE v = @version",
            Some(&p),
            DatabaseType::PostgreSQL,
        );
        assert_eq!(stmt.sql, "SELECT @@version, x::text FROM t WHERE v = $1");
    }

    #[test]
    fn test_unmatched_marker_left_as_written() {
        let p = params(&[("id", SqlValue::Int(1))]);
        let stmt = prepare_statement(
            "SET @counter = @id",
            Some(&p),
            DatabaseType::MySQL,
        );
        assert_eq!(stmt.sql, "SET @counter = ?");
        assert_eq!(stmt.values.len(), 1);
    }

    #[test]
    fn test_positional_fallback() {
        let p = params(&[("a", SqlValue::Int(1)), ("b", SqlValue::Int(2))]);
        let stmt = prepare_statement("SELECT ?, ?", Some(&p), DatabaseType::SQLite);
        assert_eq!(stmt.sql, "SELECT ?, ?");
        assert_eq!(stmt.values, vec![SqlValue::Int(1), SqlValue::Int(2)]);

        let stmt = prepare_statement("SELECT $1, $2", Some(&p), DatabaseType::PostgreSQL);
        assert_eq!(stmt.values.len(), 2);
    }

    #[test]
    fn test_no_params_is_raw() {
        let stmt = prepare_statement("SELECT @x", None, DatabaseType::MySQL);
        assert_eq!(stmt, PreparedStatement::raw("SELECT @x"));
        assert!(!stmt.has_values());
    }

    #[test]
    fn test_dollar_quoted_body_is_skipped() {
        let p = params(&[("id", SqlValue::Int(1))]);
        let stmt = prepare_statement(
            "SELECT $fn$ @id $fn$, @id",
            Some(&p),
            DatabaseType::PostgreSQL,
        );
        assert_eq!(stmt.sql, "SELECT $fn$ @id $fn$, $1");
    }

    #[test]
    fn test_expand_in_list() {
        let (sql, p) = expand_in_list(
            "SELECT * FROM t WHERE id IN (@ids)",
            "ids",
            &[json!(1), json!(2), json!(3)],
            DatabaseType::MySQL,
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE id IN (@ids_0, @ids_1, @ids_2)");
        assert_eq!(p.len(), 3);
        assert_eq!(p.get("ids_2"), Some(&SqlValue::Int(3)));

        let stmt = prepare_statement(&sql, Some(&p), DatabaseType::PostgreSQL);
        assert_eq!(stmt.sql, "SELECT * FROM t WHERE id IN ($1, $2, $3)");
    }

    #[test]
    fn test_expand_in_list_rejects_empty_and_missing() {
        let err = expand_in_list("SELECT @ids", "@ids", &[], DatabaseType::MySQL).unwrap_err();
        assert!(matches!(err, DbError::InvalidParameters { .. }));

        let err = expand_in_list("SELECT 1", "ids", &[json!(1)], DatabaseType::MySQL).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
