//! Integration tests for the command, transaction, batch and GO script tools.

mod common;

use common::{TestDb, assert_error_code, assert_success, parse};
use db_tools_mcp::tools::query::SqlQueryInput;
use db_tools_mcp::tools::transaction::{BatchCommandsInput, ExecuteTransactionInput};
use db_tools_mcp::tools::write::{
    DeleteDataInput, ExecuteCommandInput, GoScriptInput, InsertDataInput, UpdateDataInput,
};
use rmcp::handler::server::wrapper::Parameters;
use serde_json::Value as JsonValue;

async fn command(db: &TestDb, sql: &str, parameters: Option<&str>) -> JsonValue {
    parse(
        &db.service
            .execute_command(Parameters(ExecuteCommandInput {
                sql: sql.to_string(),
                parameters: parameters.map(str::to_string),
            }))
            .await,
    )
}

async fn single(db: &TestDb, sql: &str) -> JsonValue {
    let json = parse(
        &db.service
            .sql_query_single(Parameters(SqlQueryInput {
                sql: sql.to_string(),
                parameters: None,
            }))
            .await,
    );
    assert_success(&json);
    json["data"].clone()
}

#[tokio::test]
async fn test_execute_command_with_parameters() {
    let db = TestDb::new().await;
    let json = command(
        &db,
        "INSERT INTO users (id, name, age) VALUES (@id, @name, @age)",
        Some(r#"{"@id": 4, "name": "dave", "age": 51}"#),
    )
    .await;
    assert_success(&json);
    assert_eq!(json["affectedRows"], 1);

    let row = single(&db, "SELECT name, age FROM users WHERE id = 4").await;
    assert_eq!(row["name"], "dave");
    assert_eq!(row["age"], 51);
}

#[tokio::test]
async fn test_repeated_marker_binds_same_value() {
    let db = TestDb::new().await;
    let json = command(
        &db,
        "UPDATE users SET age = @age WHERE age < @age",
        Some(r#"{"age": 40}"#),
    )
    .await;
    assert_success(&json);
    assert_eq!(json["affectedRows"], 2);
}

#[tokio::test]
async fn test_dangerous_command_is_rejected_before_running() {
    let db = TestDb::new().await;
    let json = command(&db, "DROP TABLE users", None).await;
    assert_error_code(&json, 1003);
    assert!(json["error"].as_str().unwrap().contains("DROP TABLE"));
    assert_eq!(db.count("users").await, 3);
}

#[tokio::test]
async fn test_invalid_parameters_json() {
    let db = TestDb::new().await;
    let json = command(&db, "DELETE FROM users WHERE id = @id", Some("{not json")).await;
    assert_error_code(&json, 1004);
}

#[tokio::test]
async fn test_sql_error_is_execution_failure() {
    let db = TestDb::new().await;
    let json = command(&db, "INSERT INTO missing_table VALUES (1)", None).await;
    assert_error_code(&json, 1002);
}

#[tokio::test]
async fn test_insert_update_delete_data() {
    let db = TestDb::new().await;

    let json = parse(
        &db.service
            .insert_data(Parameters(InsertDataInput {
                table_name: "users".to_string(),
                data: r#"{"id": 7, "name": "erin", "age": 22, "email": null}"#.to_string(),
            }))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["affectedRows"], 1);

    let json = parse(
        &db.service
            .update_data(Parameters(UpdateDataInput {
                table_name: "users".to_string(),
                data: r#"{"age": 23, "email": "erin@example.com"}"#.to_string(),
                where_clause: "id = 7".to_string(),
            }))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["affectedRows"], 1);
    let row = single(&db, "SELECT age, email FROM users WHERE id = 7").await;
    assert_eq!(row["age"], 23);
    assert_eq!(row["email"], "erin@example.com");

    let json = parse(
        &db.service
            .delete_data(Parameters(DeleteDataInput {
                table_name: "users".to_string(),
                where_clause: "WHERE id = 7".to_string(),
            }))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["affectedRows"], 1);
    assert_eq!(db.count("users").await, 3);
}

#[tokio::test]
async fn test_delete_requires_where_clause() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .delete_data(Parameters(DeleteDataInput {
                table_name: "users".to_string(),
                where_clause: "   ".to_string(),
            }))
            .await,
    );
    assert_error_code(&json, 1004);
    assert_eq!(db.count("users").await, 3);
}

#[tokio::test]
async fn test_insert_rejects_bad_table_name() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .insert_data(Parameters(InsertDataInput {
                table_name: "users; DELETE FROM users".to_string(),
                data: r#"{"id": 8}"#.to_string(),
            }))
            .await,
    );
    assert_error_code(&json, 1004);
}

#[tokio::test]
async fn test_transaction_commits_all() {
    let db = TestDb::new().await;
    let commands = r#"[
        "INSERT INTO users (id, name) VALUES (20, 'x')",
        {"sql": "INSERT INTO users (id, name) VALUES (@id, @name)", "parameters": {"id": 21, "name": "y"}},
        "UPDATE users SET age = 1 WHERE id >= 20"
    ]"#;
    let json = parse(
        &db.service
            .execute_transaction(Parameters(ExecuteTransactionInput {
                commands: commands.to_string(),
            }))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["statementCount"], 3);
    assert_eq!(json["affectedRows"], 4);
    assert_eq!(db.count("users").await, 5);
}

#[tokio::test]
async fn test_transaction_rolls_back_on_failure() {
    let db = TestDb::new().await;
    let commands = r#"[
        "INSERT INTO users (id, name) VALUES (30, 'kept?')",
        "INSERT INTO users (id, name) VALUES (1, 'duplicate key')"
    ]"#;
    let json = parse(
        &db.service
            .execute_transaction(Parameters(ExecuteTransactionInput {
                commands: commands.to_string(),
            }))
            .await,
    );
    assert_error_code(&json, 1002);
    assert_eq!(db.count("users").await, 3);
}

#[tokio::test]
async fn test_transaction_rolls_back_on_dangerous_command() {
    let db = TestDb::new().await;
    let commands = r#"["DELETE FROM orders", "drop table orders"]"#;
    let json = parse(
        &db.service
            .execute_transaction(Parameters(ExecuteTransactionInput {
                commands: commands.to_string(),
            }))
            .await,
    );
    assert_error_code(&json, 1003);
    assert_eq!(db.count("orders").await, 2);
}

#[tokio::test]
async fn test_batch_reports_each_command() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .batch_execute_commands(Parameters(BatchCommandsInput {
                commands: r#"["UPDATE users SET age = @age WHERE id = 1", "INSERT INTO nowhere VALUES (1)"]"#
                    .to_string(),
                parameters_array: Some(r#"[{"age": 31}]"#.to_string()),
            }))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["totalCommands"], 2);
    assert_eq!(json["successCount"], 1);
    assert_eq!(json["failureCount"], 1);

    let results = json["results"].as_array().unwrap();
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[0]["affectedRows"], 1);
    assert_eq!(results[1]["success"], false);
    assert_eq!(results[1]["errorCode"], 1002);

    let row = single(&db, "SELECT age FROM users WHERE id = 1").await;
    assert_eq!(row["age"], 31);
}

#[tokio::test]
async fn test_batch_flags_dangerous_entry_only() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .batch_execute_commands(Parameters(BatchCommandsInput {
                commands: r#"["TRUNCATE TABLE orders", "DELETE FROM orders WHERE order_id = 10"]"#
                    .to_string(),
                parameters_array: None,
            }))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["results"][0]["errorCode"], 1003);
    assert_eq!(json["results"][1]["success"], true);
    assert_eq!(db.count("orders").await, 1);
}

#[tokio::test]
async fn test_empty_command_list_is_invalid() {
    let db = TestDb::new().await;
    let json = parse(
        &db.service
            .execute_transaction(Parameters(ExecuteTransactionInput {
                commands: "[]".to_string(),
            }))
            .await,
    );
    assert_error_code(&json, 1004);
}

#[tokio::test]
async fn test_go_script_runs_batches_in_order() {
    let db = TestDb::new().await;
    let script = "INSERT INTO users (id, name) VALUES (40, 'go1')\nGO\nUPDATE users SET age = 99 WHERE id = 40\ngo\n";
    let json = parse(
        &db.service
            .execute_command_with_go(Parameters(GoScriptInput {
                sql: script.to_string(),
            }))
            .await,
    );
    assert_success(&json);
    assert_eq!(json["batchCount"], 2);
    assert_eq!(json["affectedRows"], 2);
    let row = single(&db, "SELECT age FROM users WHERE id = 40").await;
    assert_eq!(row["age"], 99);
}

#[tokio::test]
async fn test_go_script_checks_every_batch_first() {
    let db = TestDb::new().await;
    let script = "DELETE FROM orders\nGO\nDROP TABLE orders\n";
    let json = parse(
        &db.service
            .execute_command_with_go(Parameters(GoScriptInput {
                sql: script.to_string(),
            }))
            .await,
    );
    assert_error_code(&json, 1003);
    assert_eq!(db.count("orders").await, 2);
}
