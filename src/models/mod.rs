//! Data models for the DB tools MCP server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod engine;
pub mod params;
pub mod response;
pub mod schema;
pub mod value;

// Re-export commonly used types
pub use connection::{
    ConnectTarget, ConnectionSettings, DatabaseType, PASSWORD_MASK, mask_connection_string,
};
pub use engine::DbEngine;
pub use params::{ParameterSet, parameters_from_value, parse_parameters};
pub use response::{ToolResponse, serialize_result};
pub use schema::{ColumnInfo, ColumnSpec, DbObjectInfo, TableSchema};
pub use value::{Row, ScalarType, SqlValue};
