//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Per-call connection pools and scoped clients
//! - Named parameter rewriting and value binding
//! - Statement execution, transactions and batches
//! - Schema introspection and DDL generation
//! - Type mappings
//! - Database dispatch macros for reducing code duplication

#[macro_use]
pub mod macros;
pub mod ddl;
pub mod executor;
pub mod params;
pub mod pool;
pub mod schema;
pub mod types;

pub use ddl::Dialect;
pub use executor::{QueryExecutor, SqlHook};
pub use params::{PreparedStatement, expand_in_list, prepare_statement};
pub use pool::{ClientFactory, DbPool, ScopedClient};
pub use schema::SchemaInspector;
