//! Integration tests for the query tools.

mod common;

use common::{TestDb, assert_error_code, assert_success, parse};
use db_tools_mcp::models::ScalarType;
use db_tools_mcp::tools::query::{InParameterInput, ScalarInput, SqlQueryInput};
use rmcp::handler::server::wrapper::Parameters;
use serde_json::Value as JsonValue;

fn input(sql: &str, parameters: Option<&str>) -> Parameters<SqlQueryInput> {
    Parameters(SqlQueryInput {
        sql: sql.to_string(),
        parameters: parameters.map(str::to_string),
    })
}

async fn scalar(db: &TestDb, sql: &str, value_type: Option<ScalarType>) -> JsonValue {
    parse(
        &db.service
            .get_scalar(Parameters(ScalarInput {
                sql: sql.to_string(),
                parameters: None,
                value_type,
            }))
            .await,
    )
}

#[tokio::test]
async fn test_sql_query_returns_rows_in_column_order() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .sql_query(input(
                "SELECT id, name, age FROM users WHERE age > @min ORDER BY id",
                Some(r#"{"min": 18}"#),
            ))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["rowCount"], 2);

    let first = json["data"][0].as_object().unwrap();
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    assert_eq!(columns, vec!["id", "name", "age"]);
    assert_eq!(json["data"][0]["name"], "alice");
    assert_eq!(json["data"][1]["name"], "carol");
}

#[tokio::test]
async fn test_sql_query_nulls_and_decimals() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .sql_query(input(
                "SELECT u.email, o.total FROM users u JOIN orders o ON o.user_id = u.id ORDER BY o.order_id",
                None,
            ))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["data"][0]["email"], "none");
    assert_eq!(json["data"][0]["total"], 12.5);

    let json = parse(&db.service.sql_query(input("SELECT NULL AS nothing", None)).await);
    assert!(json["data"][0]["nothing"].is_null());
}

#[tokio::test]
async fn test_query_tools_do_not_run_danger_filter() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .sql_query(input("CREATE TABLE scratch (id INTEGER)", None))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["rowCount"], 0);
}

#[tokio::test]
async fn test_sql_query_single() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .sql_query_single(input("SELECT name FROM users ORDER BY id", None))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["data"]["name"], "alice");

    let json = parse(
        &db.service
            .sql_query_single(input("SELECT name FROM users WHERE id = -1", None))
            .await,
    );
    assert_success(&json);
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_get_data_set_all() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .get_data_set_all(input(
                "SELECT id FROM users ORDER BY id; SELECT order_id FROM orders WHERE order_id = -1; SELECT COUNT(*) AS n FROM orders",
                None,
            ))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["resultSetCount"], 3);
    assert_eq!(json["resultSets"][0]["rowCount"], 3);
    assert_eq!(json["resultSets"][1]["rowCount"], 0);
    assert_eq!(json["resultSets"][2]["data"][0]["n"], 2);
}

#[tokio::test]
async fn test_sql_query_multiple_without_trailing_semicolon() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .sql_query_multiple(input(
                "SELECT name FROM users WHERE id = 1;\nSELECT total FROM orders WHERE order_id = 11",
                None,
            ))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["firstResultSet"][0]["name"], "alice");
    assert_eq!(json["secondResultSet"][0]["total"], 99.99);
}

#[tokio::test]
async fn test_sql_query_multiple_needs_two_sets() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .sql_query_multiple(input("SELECT 1 AS only_one", None))
            .await,
    );
    assert_error_code(&json, 1004);
}

#[tokio::test]
async fn test_get_scalar_types() {
    let db = TestDb::new().await;

    let json = scalar(&db, "SELECT COUNT(*) FROM users", None).await;
    assert_success(&json);
    assert_eq!(json["value"], 3);
    assert_eq!(json["valueType"], "any");

    let json = scalar(&db, "SELECT COUNT(*) FROM users", Some(ScalarType::String)).await;
    assert_eq!(json["value"], "3");

    let json = scalar(&db, "SELECT '42'", Some(ScalarType::Int)).await;
    assert_eq!(json["value"], 42);

    let json = scalar(&db, "SELECT total FROM orders WHERE order_id = 10", Some(ScalarType::Double)).await;
    assert_eq!(json["value"], 12.5);

    let json = scalar(&db, "SELECT '2024-03-01 08:30:00'", Some(ScalarType::DateTime)).await;
    assert_eq!(json["value"], "2024-03-01T08:30:00");

    let json = scalar(&db, "SELECT name FROM users WHERE id = -1", Some(ScalarType::Long)).await;
    assert_success(&json);
    assert!(json["value"].is_null());
}

#[tokio::test]
async fn test_get_scalar_conversion_failure() {
    let db = TestDb::new().await;
    let json = scalar(&db, "SELECT name FROM users WHERE id = 1", Some(ScalarType::Int)).await;
    assert_error_code(&json, 1004);
    assert!(json["error"].as_str().unwrap().contains("alice"));
}

#[tokio::test]
async fn test_in_parameter_expansion() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .sql_query_with_in_parameter(Parameters(InParameterInput {
                sql: "SELECT name FROM users WHERE id IN (@ids) AND age > @min ORDER BY id".to_string(),
                in_parameter_name: "ids".to_string(),
                in_values: "[1, 2, 3]".to_string(),
                other_parameters: Some(r#"{"min": 20}"#.to_string()),
            }))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["rowCount"], 2);
    assert_eq!(json["data"][1]["name"], "carol");
}

#[tokio::test]
async fn test_in_parameter_rejects_empty_list() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .sql_query_with_in_parameter(Parameters(InParameterInput {
                sql: "SELECT name FROM users WHERE id IN (@ids)".to_string(),
                in_parameter_name: "@ids".to_string(),
                in_values: "[]".to_string(),
                other_parameters: None,
            }))
            .await,
    );
    assert_error_code(&json, 1004);
}

#[tokio::test]
async fn test_sql_error_keeps_envelope_shape() {
    let db = TestDb::new().await;
    let json = parse(&db.service.sql_query(input("SELECT * FROM no_such_table", None)).await);
    assert_error_code(&json, 1002);
    assert!(json.get("data").is_none());
}
