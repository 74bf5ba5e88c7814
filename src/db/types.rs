//! Database-agnostic type mappings.
//!
//! This module turns driver rows into [`Row`]s of tagged [`SqlValue`]s.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Database-specific decoders handle the actual value extraction
//!
//! This design centralizes type classification logic while allowing
//! database-specific handling where needed.

use crate::models::{DatabaseType, Row, SqlValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueFormat, PgValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row as _, Type, TypeInfo, ValueRef};

const TIME_FORMAT: &str = "%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    DateTime,
    Date,
    Time,
    Binary,
    Json,
    Uuid,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC is actually a float
        if db == DatabaseType::SQLite && lower == "numeric" {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    // Names that contain "int" without being integers
    if lower.starts_with("interval") || lower == "point" {
        return TypeCategory::Unknown;
    }

    if lower.contains("timestamp") || lower.contains("datetime") {
        return TypeCategory::DateTime;
    }
    if lower == "date" {
        return TypeCategory::Date;
    }
    if lower.starts_with("time") {
        return TypeCategory::Time;
    }

    // Integer types
    if lower.contains("int") || lower.contains("serial") || lower.contains("tiny") {
        return TypeCategory::Integer;
    }

    // Boolean
    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    // Float types
    if lower.contains("float")
        || lower.contains("double")
        || lower == "real"
        || lower == "float4"
        || lower == "float8"
    {
        return TypeCategory::Float;
    }

    // JSON types
    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }

    // UUID (PostgreSQL)
    if lower == "uuid" {
        return TypeCategory::Uuid;
    }

    // Binary types
    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    // Default to text for everything else (varchar, text, char, enum, etc.)
    TypeCategory::Unknown
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL/NUMERIC values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

impl Type<sqlx::Postgres> for RawDecimal {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("numeric")
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("numeric") || name.contains("decimal")
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawDecimal {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        match value.format() {
            PgValueFormat::Text => Ok(RawDecimal(value.as_str()?.to_string())),
            PgValueFormat::Binary => pg_numeric_to_string(value.as_bytes()?)
                .map(RawDecimal)
                .ok_or_else(|| "malformed binary NUMERIC value".into()),
        }
    }
}

/// Render a PostgreSQL binary NUMERIC (base-10000 digits) as exact text.
pub fn pg_numeric_to_string(bytes: &[u8]) -> Option<String> {
    let read_u16 = |at: usize| -> Option<u16> {
        bytes
            .get(at..at + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
    };
    let ndigits = read_u16(0)? as usize;
    let weight = read_u16(2)? as i16 as i64;
    let sign = read_u16(4)?;
    let dscale = read_u16(6)? as usize;
    let digits = (0..ndigits)
        .map(|i| read_u16(8 + i * 2))
        .collect::<Option<Vec<u16>>>()?;

    match sign {
        0xC000 => return Some("NaN".to_string()),
        0xD000 => return Some("Infinity".to_string()),
        0xF000 => return Some("-Infinity".to_string()),
        _ => {}
    }
    let digit_at = |i: i64| -> u16 {
        if i >= 0 {
            digits.get(i as usize).copied().unwrap_or(0)
        } else {
            0
        }
    };

    let mut text = String::new();
    if sign == 0x4000 && digits.iter().any(|d| *d != 0) {
        text.push('-');
    }
    if weight < 0 {
        text.push('0');
    } else {
        for i in 0..=weight {
            if i == 0 {
                text.push_str(&digit_at(i).to_string());
            } else {
                text.push_str(&format!("{:04}", digit_at(i)));
            }
        }
    }
    if dscale > 0 {
        let mut frac = String::new();
        let mut group = weight + 1;
        while frac.len() < dscale {
            frac.push_str(&format!("{:04}", digit_at(group)));
            group += 1;
        }
        frac.truncate(dscale);
        text.push('.');
        text.push_str(&frac);
    }
    Some(text)
}

// =============================================================================
// Row Decoding Trait
// =============================================================================

/// Trait for converting database rows to tagged rows.
pub trait RowDecode {
    fn column_names(&self) -> Vec<String>;
    fn decode_row(&self) -> Row;
}

fn decode_with<R>(
    row: &R,
    db: DatabaseType,
    decode: impl Fn(&R, usize, TypeCategory) -> SqlValue,
) -> Row
where
    R: sqlx::Row,
    usize: sqlx::ColumnIndex<R>,
{
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let is_null = row
                .try_get_raw(idx)
                .map(|raw| raw.is_null())
                .unwrap_or(true);
            let value = if is_null {
                SqlValue::Null
            } else {
                decode(row, idx, categorize_type(col.type_info().name(), db))
            };
            (col.name().to_string(), value)
        })
        .collect()
}

impl RowDecode for MySqlRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn decode_row(&self) -> Row {
        decode_with(self, DatabaseType::MySQL, mysql::decode_column)
    }
}

impl RowDecode for PgRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn decode_row(&self) -> Row {
        decode_with(self, DatabaseType::PostgreSQL, postgres::decode_column)
    }
}

impl RowDecode for SqliteRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn decode_row(&self) -> Row {
        decode_with(self, DatabaseType::SQLite, sqlite::decode_column)
    }
}

fn float_value(v: f64) -> SqlValue {
    SqlValue::Float(v)
}

fn undecodable(idx: usize, category: TypeCategory) -> SqlValue {
    tracing::debug!(column = idx, ?category, "Column value could not be decoded");
    SqlValue::Null
}

// =============================================================================
// Database-Specific Decoders
// =============================================================================

mod mysql {
    use super::*;

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> SqlValue {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::DateTime => decode_datetime(row, idx),
            TypeCategory::Date => row
                .try_get::<NaiveDate, _>(idx)
                .map(|d| SqlValue::String(d.format(DATE_FORMAT).to_string()))
                .unwrap_or_else(|_| decode_text(row, idx)),
            TypeCategory::Time => row
                .try_get::<NaiveTime, _>(idx)
                .map(|t| SqlValue::String(t.format(TIME_FORMAT).to_string()))
                .unwrap_or_else(|_| decode_text(row, idx)),
            TypeCategory::Binary => decode_binary(row, idx),
            TypeCategory::Json => row
                .try_get::<serde_json::Value, _>(idx)
                .map(|v| SqlValue::String(v.to_string()))
                .unwrap_or_else(|_| decode_text(row, idx)),
            _ => decode_text(row, idx),
        }
    }

    fn decode_decimal(row: &MySqlRow, idx: usize) -> SqlValue {
        match row.try_get::<RawDecimal, _>(idx) {
            Ok(v) => SqlValue::String(v.0),
            Err(e) => {
                tracing::error!("Failed to decode DECIMAL: {:?}", e);
                SqlValue::Null
            }
        }
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> SqlValue {
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return SqlValue::Int(v);
        }
        if let Ok(v) = row.try_get::<u64, _>(idx) {
            return i64::try_from(v)
                .map(SqlValue::Int)
                .unwrap_or_else(|_| SqlValue::String(v.to_string()));
        }
        if let Ok(v) = row.try_get::<bool, _>(idx) {
            return SqlValue::Int(v as i64);
        }
        decode_text(row, idx)
    }

    fn decode_boolean(row: &MySqlRow, idx: usize) -> SqlValue {
        row.try_get::<bool, _>(idx)
            .map(SqlValue::Bool)
            .unwrap_or_else(|_| decode_integer(row, idx))
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> SqlValue {
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return float_value(v);
        }
        if let Ok(v) = row.try_get::<f32, _>(idx) {
            return float_value(v as f64);
        }
        undecodable(idx, TypeCategory::Float)
    }

    fn decode_datetime(row: &MySqlRow, idx: usize) -> SqlValue {
        if let Ok(v) = row.try_get::<NaiveDateTime, _>(idx) {
            return SqlValue::DateTime(v);
        }
        if let Ok(v) = row.try_get::<DateTime<Utc>, _>(idx) {
            return SqlValue::DateTime(v.naive_utc());
        }
        // Zero dates such as 0000-00-00 00:00:00
        decode_text(row, idx)
    }

    fn decode_binary(row: &MySqlRow, idx: usize) -> SqlValue {
        row.try_get::<Vec<u8>, _>(idx)
            .map(SqlValue::Binary)
            .unwrap_or_else(|_| undecodable(idx, TypeCategory::Binary))
    }

    fn decode_text(row: &MySqlRow, idx: usize) -> SqlValue {
        if let Ok(v) = row.try_get::<String, _>(idx) {
            return SqlValue::String(v);
        }
        // ENUM, SET, YEAR and friends arrive as raw bytes
        match row.try_get_unchecked::<Vec<u8>, _>(idx) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(s) => SqlValue::String(s),
                Err(e) => SqlValue::Binary(e.into_bytes()),
            },
            Err(_) => undecodable(idx, TypeCategory::Unknown),
        }
    }
}

mod postgres {
    use super::*;

    pub fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> SqlValue {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => row
                .try_get::<bool, _>(idx)
                .map(SqlValue::Bool)
                .unwrap_or_else(|_| decode_text(row, idx)),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::DateTime => decode_datetime(row, idx),
            TypeCategory::Date => row
                .try_get::<NaiveDate, _>(idx)
                .map(|d| SqlValue::String(d.format(DATE_FORMAT).to_string()))
                .unwrap_or_else(|_| decode_text(row, idx)),
            TypeCategory::Time => row
                .try_get::<NaiveTime, _>(idx)
                .map(|t| SqlValue::String(t.format(TIME_FORMAT).to_string()))
                .unwrap_or_else(|_| decode_text(row, idx)),
            TypeCategory::Binary => row
                .try_get::<Vec<u8>, _>(idx)
                .map(SqlValue::Binary)
                .unwrap_or_else(|_| undecodable(idx, category)),
            TypeCategory::Json => row
                .try_get::<serde_json::Value, _>(idx)
                .map(|v| SqlValue::String(v.to_string()))
                .unwrap_or_else(|_| decode_text(row, idx)),
            TypeCategory::Uuid => row
                .try_get::<uuid::Uuid, _>(idx)
                .map(|u| SqlValue::String(u.to_string()))
                .unwrap_or_else(|_| decode_text(row, idx)),
            _ => decode_text(row, idx),
        }
    }

    fn decode_decimal(row: &PgRow, idx: usize) -> SqlValue {
        match row.try_get::<RawDecimal, _>(idx) {
            Ok(v) => SqlValue::String(v.0),
            Err(e) => {
                tracing::error!("Failed to decode NUMERIC: {:?}", e);
                SqlValue::Null
            }
        }
    }

    fn decode_integer(row: &PgRow, idx: usize) -> SqlValue {
        if let Ok(v) = row.try_get::<i16, _>(idx) {
            return SqlValue::Int(v.into());
        }
        if let Ok(v) = row.try_get::<i32, _>(idx) {
            return SqlValue::Int(v.into());
        }
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return SqlValue::Int(v);
        }
        decode_text(row, idx)
    }

    fn decode_float(row: &PgRow, idx: usize) -> SqlValue {
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return float_value(v);
        }
        if let Ok(v) = row.try_get::<f32, _>(idx) {
            return float_value(v as f64);
        }
        undecodable(idx, TypeCategory::Float)
    }

    fn decode_datetime(row: &PgRow, idx: usize) -> SqlValue {
        if let Ok(v) = row.try_get::<NaiveDateTime, _>(idx) {
            return SqlValue::DateTime(v);
        }
        if let Ok(v) = row.try_get::<DateTime<Utc>, _>(idx) {
            return SqlValue::DateTime(v.naive_utc());
        }
        decode_text(row, idx)
    }

    fn decode_text(row: &PgRow, idx: usize) -> SqlValue {
        if let Ok(v) = row.try_get::<String, _>(idx) {
            return SqlValue::String(v);
        }
        // Types without a Rust mapping are only readable in text format
        match row.try_get_raw(idx) {
            Ok(raw) if raw.format() == PgValueFormat::Text => raw
                .as_str()
                .map(|s| SqlValue::String(s.to_string()))
                .unwrap_or_else(|_| undecodable(idx, TypeCategory::Unknown)),
            _ => undecodable(idx, TypeCategory::Unknown),
        }
    }
}

mod sqlite {
    use super::*;

    pub fn decode_column(row: &SqliteRow, idx: usize, category: TypeCategory) -> SqlValue {
        match category {
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => row
                .try_get::<bool, _>(idx)
                .map(SqlValue::Bool)
                .unwrap_or_else(|_| decode_text(row, idx)),
            TypeCategory::Float | TypeCategory::Decimal => decode_float(row, idx),
            TypeCategory::DateTime => row
                .try_get::<NaiveDateTime, _>(idx)
                .map(SqlValue::DateTime)
                .unwrap_or_else(|_| decode_text(row, idx)),
            TypeCategory::Binary => row
                .try_get::<Vec<u8>, _>(idx)
                .map(SqlValue::Binary)
                .unwrap_or_else(|_| decode_text(row, idx)),
            _ => decode_text(row, idx),
        }
    }

    fn decode_integer(row: &SqliteRow, idx: usize) -> SqlValue {
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return SqlValue::Int(v);
        }
        // Declared INTEGER but holding another storage class
        decode_text(row, idx)
    }

    fn decode_float(row: &SqliteRow, idx: usize) -> SqlValue {
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return float_value(v);
        }
        decode_text(row, idx)
    }

    fn decode_text(row: &SqliteRow, idx: usize) -> SqlValue {
        if let Ok(v) = row.try_get::<String, _>(idx) {
            return SqlValue::String(v);
        }
        if let Ok(v) = row.try_get_unchecked::<i64, _>(idx) {
            return SqlValue::Int(v);
        }
        if let Ok(v) = row.try_get_unchecked::<f64, _>(idx) {
            return float_value(v);
        }
        row.try_get_unchecked::<Vec<u8>, _>(idx)
            .map(SqlValue::Binary)
            .unwrap_or_else(|_| undecodable(idx, TypeCategory::Unknown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(
            categorize_type("INT", DatabaseType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("BIGINT", DatabaseType::PostgreSQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("TINYINT", DatabaseType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("INTERVAL", DatabaseType::PostgreSQL),
            TypeCategory::Unknown
        );
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(
            categorize_type("DECIMAL", DatabaseType::MySQL),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("NUMERIC", DatabaseType::PostgreSQL),
            TypeCategory::Decimal
        );
        // SQLite NUMERIC is a float
        assert_eq!(
            categorize_type("numeric", DatabaseType::SQLite),
            TypeCategory::Float
        );
    }

    #[test]
    fn test_categorize_type_temporal() {
        assert_eq!(
            categorize_type("DATETIME", DatabaseType::MySQL),
            TypeCategory::DateTime
        );
        assert_eq!(
            categorize_type("TIMESTAMPTZ", DatabaseType::PostgreSQL),
            TypeCategory::DateTime
        );
        assert_eq!(
            categorize_type("DATE", DatabaseType::MySQL),
            TypeCategory::Date
        );
        assert_eq!(
            categorize_type("TIME", DatabaseType::PostgreSQL),
            TypeCategory::Time
        );
    }

    #[test]
    fn test_categorize_type_json_and_binary() {
        assert_eq!(
            categorize_type("jsonb", DatabaseType::PostgreSQL),
            TypeCategory::Json
        );
        assert_eq!(
            categorize_type("BLOB", DatabaseType::SQLite),
            TypeCategory::Binary
        );
        assert_eq!(
            categorize_type("VARCHAR", DatabaseType::MySQL),
            TypeCategory::Unknown
        );
    }

    fn numeric_bytes(weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(digits.len() as u16).to_be_bytes());
        out.extend_from_slice(&weight.to_be_bytes());
        out.extend_from_slice(&sign.to_be_bytes());
        out.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            out.extend_from_slice(&d.to_be_bytes());
        }
        out
    }

    #[test]
    fn test_pg_numeric_to_string() {
        // 12345.67
        let bytes = numeric_bytes(1, 0, 2, &[1, 2345, 6700]);
        assert_eq!(pg_numeric_to_string(&bytes).unwrap(), "12345.67");

        // -0.0012
        let bytes = numeric_bytes(-1, 0x4000, 4, &[12]);
        assert_eq!(pg_numeric_to_string(&bytes).unwrap(), "-0.0012");

        // 0 with scale 2
        let bytes = numeric_bytes(0, 0, 2, &[]);
        assert_eq!(pg_numeric_to_string(&bytes).unwrap(), "0.00");

        // 10000
        let bytes = numeric_bytes(1, 0, 0, &[1]);
        assert_eq!(pg_numeric_to_string(&bytes).unwrap(), "10000");
    }

    #[test]
    fn test_pg_numeric_special_values() {
        let bytes = numeric_bytes(0, 0xC000, 0, &[]);
        assert_eq!(pg_numeric_to_string(&bytes).unwrap(), "NaN");
        assert!(pg_numeric_to_string(&[0, 1]).is_none());
    }
}
