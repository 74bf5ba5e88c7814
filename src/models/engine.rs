//! Database engine identifiers.
//!
//! `DB_TYPE` is resolved through a fixed, case-insensitive table. Unknown
//! identifiers are a hard error listing every accepted spelling.

use crate::error::{DbError, DbResult};
use crate::models::DatabaseType;
use schemars::JsonSchema;
use serde::Serialize;

/// Database products the server can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub enum DbEngine {
    MySql,
    SqlServer,
    Sqlite,
    Oracle,
    PostgreSQL,
    Dm,
    Kdbndp,
    Oscar,
    MySqlConnector,
    Access,
    OpenGauss,
    QuestDB,
    HG,
    ClickHouse,
    GBase,
    Odbc,
    OceanBaseForOracle,
    TDengine,
    GaussDB,
    OceanBase,
    Tidb,
    Vastbase,
    PolarDB,
    Doris,
    Xugu,
    GoldenDB,
    TDSQLForPGODBC,
    TDSQL,
    HANA,
    DB2,
    GaussDBNative,
    DuckDB,
    MongoDb,
    Custom,
}

/// Lower-case identifier → engine.
const ENGINE_TABLE: &[(&str, DbEngine)] = &[
    ("mysql", DbEngine::MySql),
    ("mysqlconnector", DbEngine::MySqlConnector),
    ("mariadb", DbEngine::MySql),
    ("sqlserver", DbEngine::SqlServer),
    ("mssql", DbEngine::SqlServer),
    ("sqlite", DbEngine::Sqlite),
    ("sqlite3", DbEngine::Sqlite),
    ("oracle", DbEngine::Oracle),
    ("postgresql", DbEngine::PostgreSQL),
    ("postgres", DbEngine::PostgreSQL),
    ("pgsql", DbEngine::PostgreSQL),
    ("dm", DbEngine::Dm),
    ("dameng", DbEngine::Dm),
    ("kdbndp", DbEngine::Kdbndp),
    ("kingbase", DbEngine::Kdbndp),
    ("kingbasees", DbEngine::Kdbndp),
    ("oscar", DbEngine::Oscar),
    ("shentong", DbEngine::Oscar),
    ("access", DbEngine::Access),
    ("opengauss", DbEngine::OpenGauss),
    ("questdb", DbEngine::QuestDB),
    ("hg", DbEngine::HG),
    ("highgo", DbEngine::HG),
    ("clickhouse", DbEngine::ClickHouse),
    ("gbase", DbEngine::GBase),
    ("odbc", DbEngine::Odbc),
    ("oceanbasefororacle", DbEngine::OceanBaseForOracle),
    ("tdengine", DbEngine::TDengine),
    ("gaussdb", DbEngine::GaussDB),
    ("gaussdbnative", DbEngine::GaussDBNative),
    ("oceanbase", DbEngine::OceanBase),
    ("tidb", DbEngine::Tidb),
    ("vastbase", DbEngine::Vastbase),
    ("polardb", DbEngine::PolarDB),
    ("doris", DbEngine::Doris),
    ("xugu", DbEngine::Xugu),
    ("goldendb", DbEngine::GoldenDB),
    ("tdsqlforpgodbc", DbEngine::TDSQLForPGODBC),
    ("tdsql", DbEngine::TDSQL),
    ("hana", DbEngine::HANA),
    ("db2", DbEngine::DB2),
    ("duckdb", DbEngine::DuckDB),
    ("mongodb", DbEngine::MongoDb),
    ("custom", DbEngine::Custom),
];

impl DbEngine {
    /// Resolve a configuration identifier (case-insensitive).
    pub fn from_identifier(identifier: &str) -> DbResult<Self> {
        let key = identifier.trim().to_lowercase();
        ENGINE_TABLE
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, engine)| *engine)
            .ok_or_else(|| {
                DbError::invalid_parameters(format!(
                    "Unsupported database type '{}'. Supported types: {}",
                    identifier,
                    Self::supported_identifiers().join(", ")
                ))
            })
    }

    /// Every accepted identifier, in table order.
    pub fn supported_identifiers() -> Vec<&'static str> {
        ENGINE_TABLE.iter().map(|(name, _)| *name).collect()
    }

    /// Wire-protocol family used to pick a driver, if one is available.
    pub fn driver(&self) -> Option<DatabaseType> {
        match self {
            Self::MySql
            | Self::MySqlConnector
            | Self::Tidb
            | Self::OceanBase
            | Self::Doris
            | Self::GoldenDB
            | Self::TDSQL => Some(DatabaseType::MySQL),
            Self::PostgreSQL
            | Self::OpenGauss
            | Self::GaussDB
            | Self::GaussDBNative
            | Self::Vastbase
            | Self::PolarDB
            | Self::Kdbndp
            | Self::HG
            | Self::QuestDB
            | Self::TDSQLForPGODBC => Some(DatabaseType::PostgreSQL),
            Self::Sqlite => Some(DatabaseType::SQLite),
            _ => None,
        }
    }

    /// Canonical display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MySql => "MySql",
            Self::SqlServer => "SqlServer",
            Self::Sqlite => "Sqlite",
            Self::Oracle => "Oracle",
            Self::PostgreSQL => "PostgreSQL",
            Self::Dm => "Dm",
            Self::Kdbndp => "Kdbndp",
            Self::Oscar => "Oscar",
            Self::MySqlConnector => "MySqlConnector",
            Self::Access => "Access",
            Self::OpenGauss => "OpenGauss",
            Self::QuestDB => "QuestDB",
            Self::HG => "HG",
            Self::ClickHouse => "ClickHouse",
            Self::GBase => "GBase",
            Self::Odbc => "Odbc",
            Self::OceanBaseForOracle => "OceanBaseForOracle",
            Self::TDengine => "TDengine",
            Self::GaussDB => "GaussDB",
            Self::OceanBase => "OceanBase",
            Self::Tidb => "Tidb",
            Self::Vastbase => "Vastbase",
            Self::PolarDB => "PolarDB",
            Self::Doris => "Doris",
            Self::Xugu => "Xugu",
            Self::GoldenDB => "GoldenDB",
            Self::TDSQLForPGODBC => "TDSQLForPGODBC",
            Self::TDSQL => "TDSQL",
            Self::HANA => "HANA",
            Self::DB2 => "DB2",
            Self::GaussDBNative => "GaussDBNative",
            Self::DuckDB => "DuckDB",
            Self::MongoDb => "MongoDb",
            Self::Custom => "Custom",
        }
    }
}

impl std::fmt::Display for DbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
