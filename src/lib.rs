//! DB Tools MCP Server Library
//!
//! This library exposes one configured SQL database (MySQL, PostgreSQL or
//! SQLite families) to AI assistants as MCP tools: queries, commands,
//! transactions, stored procedures, schema introspection and schema changes.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::DbService;
