//! Dangerous operation filter for the command tools.
//!
//! This is a textual heuristic, not a SQL parser and not a security control.
//! It matches five keyword pairs anywhere in the text, case-insensitively,
//! so it flags them inside comments and string literals too, and it misses
//! vendor-specific equivalents. Query tools do not run it.

use crate::error::{DbError, DbResult};
use regex::Regex;
use std::sync::LazyLock;

/// Type of dangerous SQL operation detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DangerousOperation {
    DropTable,
    DropDatabase,
    TruncateTable,
    AlterTable,
    CreateTable,
}

impl DangerousOperation {
    pub const ALL: [DangerousOperation; 5] = [
        Self::DropTable,
        Self::DropDatabase,
        Self::TruncateTable,
        Self::AlterTable,
        Self::CreateTable,
    ];

    /// Get the operation name for error messages.
    pub fn operation_name(&self) -> &'static str {
        match self {
            Self::DropTable => "DROP TABLE",
            Self::DropDatabase => "DROP DATABASE",
            Self::TruncateTable => "TRUNCATE TABLE",
            Self::AlterTable => "ALTER TABLE",
            Self::CreateTable => "CREATE TABLE",
        }
    }

    fn pattern(&self) -> &'static Regex {
        &PATTERNS[*self as usize]
    }
}

static PATTERNS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    DangerousOperation::ALL.map(|op| {
        let (first, second) = op
            .operation_name()
            .split_once(' ')
            .expect("operation names are two words");
        Regex::new(&format!(r"(?i)\b{}\s+{}\b", first, second))
            .expect("danger pattern is valid")
    })
});

/// First dangerous operation found in `sql`, if any.
pub fn find_dangerous_operation(sql: &str) -> Option<DangerousOperation> {
    DangerousOperation::ALL
        .into_iter()
        .find(|op| op.pattern().is_match(sql))
}

/// Whether `sql` matches any of the dangerous patterns.
pub fn detect_dangerous_operation(sql: &str) -> bool {
    find_dangerous_operation(sql).is_some()
}

/// Reject flagged SQL before it reaches the database.
pub fn ensure_safe(sql: &str) -> DbResult<()> {
    match find_dangerous_operation(sql) {
        Some(op) => Err(DbError::dangerous_operation(op.operation_name())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_all_shapes() {
        for sql in [
            "DROP TABLE x",
            "drop   table x",
            "DROP DATABASE x",
            "TRUNCATE TABLE x",
            "ALTER TABLE x ADD y INT",
            "CREATE TABLE x (id INT)",
            "create\ttable x (id int)",
            "Drop\n Table x",
        ] {
            assert!(detect_dangerous_operation(sql), "{}", sql);
        }
    }

    #[test]
    fn test_ordinary_statements_pass() {
        for sql in [
            "SELECT * FROM users",
            "INSERT INTO users (name) VALUES ('a')",
            "UPDATE users SET name = 'b' WHERE id = 1",
            "DELETE FROM users WHERE id = 1",
            "SELECT drop_table_flag FROM t",
            "CREATE INDEX idx ON t (a)",
        ] {
            assert!(!detect_dangerous_operation(sql), "{}", sql);
        }
    }

    #[test]
    fn test_heuristic_limits() {
        // Flags inside literals
        assert!(detect_dangerous_operation(
            "INSERT INTO notes (body) VALUES ('never DROP TABLE prod')"
        ));
        // Misses vendor equivalents
        assert!(!detect_dangerous_operation("DROP VIEW v"));
    }

    #[test]
    fn test_ensure_safe_names_operation() {
        let err = ensure_safe("truncate table logs").unwrap_err();
        assert!(matches!(
            err,
            DbError::DangerousOperation { ref operation } if operation == "TRUNCATE TABLE"
        ));
        assert!(ensure_safe("SELECT 1").is_ok());
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            find_dangerous_operation("CREATE TABLE a (id int); DROP TABLE b"),
            Some(DangerousOperation::DropTable)
        );
    }
}
