//! Shared fixtures for the integration tests.
//!
//! Each fixture owns a temporary directory holding a seeded SQLite file and
//! a `DbService` whose settings come from a `StaticConfigProvider`, so the
//! tests never read or write the process environment.

#![allow(dead_code)]

use db_tools_mcp::DbService;
use db_tools_mcp::config::{
    ClientOptions, ConfigResolver, ENV_CONNECTION_STRING, ENV_DATABASE_TYPE,
    StaticConfigProvider,
};
use db_tools_mcp::tools::ToolContext;
use db_tools_mcp::tools::query::ScalarInput;
use rmcp::handler::server::wrapper::Parameters;
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, Executor};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const SCHEMA: &str = r#"
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER,
    email VARCHAR(120) DEFAULT 'none'
);
CREATE INDEX idx_users_name ON users (name);
CREATE TABLE orders (
    order_id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    total DECIMAL(10,2),
    CONSTRAINT fk_orders_user FOREIGN KEY (user_id) REFERENCES users (id)
);
CREATE VIEW adults AS SELECT id, name FROM users WHERE age >= 18;
CREATE TRIGGER users_touch AFTER UPDATE ON users BEGIN SELECT 1; END;
INSERT INTO users (id, name, age) VALUES (1, 'alice', 30), (2, 'bob', 17), (3, 'carol', 45);
INSERT INTO orders (order_id, user_id, total) VALUES (10, 1, 12.50), (11, 3, 99.99);
"#;

pub struct TestDb {
    _dir: TempDir,
    pub path: PathBuf,
    pub service: DbService,
}

impl TestDb {
    /// Seeded database file plus a service pointed at it.
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tools.db");

        let mut conn = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        conn.execute(SCHEMA).await.unwrap();
        conn.close().await.unwrap();

        let connection_string = format!("Data Source={}", path.display());
        let service = service_for(
            StaticConfigProvider::new()
                .with(ENV_CONNECTION_STRING, connection_string)
                .with(ENV_DATABASE_TYPE, "Sqlite"),
        );
        Self {
            _dir: dir,
            path,
            service,
        }
    }

    /// Count rows through the service itself.
    pub async fn count(&self, table: &str) -> i64 {
        let json = parse(
            &self
                .service
                .get_scalar(Parameters(ScalarInput {
                    sql: format!("SELECT COUNT(*) FROM {}", table),
                    parameters: None,
                    value_type: None,
                }))
                .await,
        );
        assert_success(&json);
        json["value"].as_i64().unwrap()
    }
}

pub fn service_for(provider: StaticConfigProvider) -> DbService {
    let resolver = ConfigResolver::new(Arc::new(provider));
    DbService::new(ToolContext::new(resolver, ClientOptions::default()))
}

pub fn parse(text: &str) -> JsonValue {
    serde_json::from_str(text).unwrap_or_else(|e| panic!("invalid envelope {}: {}", e, text))
}

pub fn assert_success(json: &JsonValue) {
    assert_eq!(json["success"], true, "expected success: {}", json);
    assert!(json["timestamp"].is_string());
}

pub fn assert_error_code(json: &JsonValue, code: i64) {
    assert_eq!(json["success"], false, "expected failure: {}", json);
    assert_eq!(json["errorCode"], code, "unexpected code: {}", json);
    assert!(json["error"].is_string());
}
