//! Integration tests for the dangerous-operation filter.
//!
//! Random casing and whitespace variants are generated from a fixed seed so
//! failures are reproducible.

use db_tools_mcp::error::DbError;
use db_tools_mcp::tools::guard::{
    DangerousOperation, detect_dangerous_operation, ensure_safe, find_dangerous_operation,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEPARATORS: [&str; 4] = [" ", "\t", "\n", "\r\n"];

fn random_case(rng: &mut StdRng, word: &str) -> String {
    word.chars()
        .map(|c| {
            if rng.gen_bool(0.5) {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect()
}

fn random_gap(rng: &mut StdRng) -> String {
    (0..rng.gen_range(1..4))
        .map(|_| SEPARATORS[rng.gen_range(0..SEPARATORS.len())])
        .collect()
}

fn variant(rng: &mut StdRng, op: DangerousOperation) -> String {
    let (first, second) = op.operation_name().split_once(' ').unwrap();
    format!(
        "{}{}{} some_object",
        random_case(rng, first),
        random_gap(rng),
        random_case(rng, second)
    )
}

#[test]
fn test_random_variants_are_flagged() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for op in DangerousOperation::ALL {
        for _ in 0..50 {
            let sql = variant(&mut rng, op);
            assert_eq!(find_dangerous_operation(&sql), Some(op), "{:?}", sql);
        }
    }
}

#[test]
fn test_flagged_anywhere_in_text() {
    let mut rng = StdRng::seed_from_u64(7);
    for op in DangerousOperation::ALL {
        let sql = format!(
            "DELETE FROM audit WHERE note = 'x';{}{}",
            random_gap(&mut rng),
            variant(&mut rng, op)
        );
        assert!(detect_dangerous_operation(&sql), "{:?}", sql);
    }
    // Comments and literals are not parsed
    assert!(detect_dangerous_operation("SELECT 1 -- drop table later"));
    assert!(detect_dangerous_operation("UPDATE notes SET body = 'please ALTER TABLE x'"));
}

#[test]
fn test_word_boundaries() {
    for sql in [
        "SELECT * FROM backdrop tables",
        "UPDATE t SET dropped = 1 WHERE table_id = 3",
        "INSERT INTO created_tables (name) VALUES ('a')",
        "DROP VIEW adults",
        "DROP INDEX idx_users_name",
        "CREATE INDEX idx ON t (a)",
        "DELETE FROM users WHERE id = 1",
    ] {
        assert!(!detect_dangerous_operation(sql), "{:?}", sql);
        assert!(ensure_safe(sql).is_ok());
    }
}

#[test]
fn test_ensure_safe_error() {
    let err = ensure_safe("truncate   table orders").unwrap_err();
    assert!(matches!(err, DbError::DangerousOperation { .. }));
    assert_eq!(err.code().as_i32(), 1003);
    assert!(err.to_string().contains("TRUNCATE TABLE"));
}
