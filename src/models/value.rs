//! Tagged values and rows.
//!
//! Database values, bound parameters and scalar results all share one tagged
//! representation so the JSON contract stays precise regardless of driver.

use crate::error::{DbError, DbResult};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

/// Format used when a date-time is rendered as text.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A single database value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(NaiveDateTime),
    Binary(Vec<u8>),
}

impl SqlValue {
    /// Convert a loosely-typed JSON value into a bindable value.
    ///
    /// Arrays and objects are passed through as their compact JSON text.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Self::String(s.clone()),
            other => Self::String(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Type tag used in logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::DateTime(_) => "datetime",
            Self::Binary(_) => "binary",
        }
    }

    /// Text rendering, `None` for NULL.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::DateTime(dt) => Some(dt.format(DATETIME_FORMAT).to_string()),
            Self::Binary(bytes) => Some(STANDARD.encode(bytes)),
        }
    }

    /// Truthiness used by catalog queries that return 0/1 flags.
    pub fn as_flag(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => matches!(s.to_lowercase().as_str(), "1" | "t" | "true" | "yes"),
            _ => false,
        }
    }

    /// Coerce a scalar into the requested primitive type.
    pub fn coerce(&self, target: ScalarType) -> DbResult<JsonValue> {
        if self.is_null() {
            return Ok(JsonValue::Null);
        }
        let fail = || {
            DbError::invalid_parameters(format!(
                "Cannot convert {} value '{}' to {}",
                self.type_name(),
                self.as_text().unwrap_or_default(),
                target.name()
            ))
        };

        match target {
            ScalarType::Any => serde_json::to_value(self).map_err(DbError::from),
            ScalarType::String => Ok(JsonValue::String(self.as_text().unwrap_or_default())),
            ScalarType::Int => {
                let value = self.to_i64().ok_or_else(fail)?;
                let value = i32::try_from(value).map_err(|_| fail())?;
                Ok(JsonValue::from(value))
            }
            ScalarType::Long => Ok(JsonValue::from(self.to_i64().ok_or_else(fail)?)),
            ScalarType::Double => {
                let value = self.to_f64().ok_or_else(fail)?;
                serde_json::Number::from_f64(value)
                    .map(JsonValue::Number)
                    .ok_or_else(fail)
            }
            ScalarType::Decimal => {
                // Exact text; a float would lose precision
                let text = match self {
                    Self::String(s) => {
                        let trimmed = s.trim();
                        trimmed
                            .parse::<f64>()
                            .ok()
                            .filter(|f| f.is_finite())
                            .ok_or_else(fail)?;
                        trimmed.to_string()
                    }
                    Self::Int(i) => i.to_string(),
                    Self::Float(f) if f.is_finite() => f.to_string(),
                    Self::Bool(b) => (*b as i64).to_string(),
                    _ => return Err(fail()),
                };
                Ok(JsonValue::String(text))
            }
            ScalarType::DateTime => {
                let dt = self.to_datetime().ok_or_else(fail)?;
                Ok(JsonValue::String(dt.format(DATETIME_FORMAT).to_string()))
            }
        }
    }

    fn to_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(*b as i64),
            Self::Float(f) => whole_i64(*f),
            Self::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole_i64))
            }
            _ => None,
        }
    }

    fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(b) => Some(*b as i64 as f64),
            Self::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn to_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::String(s) => parse_datetime(s.trim()),
            _ => None,
        }
    }
}

/// Parse the date-time spellings databases commonly return as text.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Self::Float(f) => serializer.serialize_str(&f.to_string()),
            Self::String(s) => serializer.serialize_str(s),
            Self::DateTime(dt) => {
                serializer.serialize_str(&dt.format(DATETIME_FORMAT).to_string())
            }
            Self::Binary(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
        }
    }
}

/// Primitive type requested from a scalar query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// The value as the database returned it
    #[default]
    Any,
    String,
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    Double,
    /// Exact decimal, returned as text
    Decimal,
    /// ISO-8601 date-time
    #[serde(alias = "date_time")]
    DateTime,
}

impl ScalarType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::DateTime => "datetime",
        }
    }
}

/// A result row: column names in select order mapped to tagged values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.columns.push((column.into(), value));
    }

    /// Look up a column by name (case-insensitive).
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    /// Text of a column, `None` when missing or NULL.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(SqlValue::as_text)
    }

    /// Value of the first column.
    pub fn first(&self) -> Option<&SqlValue> {
        self.columns.first().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A float with no fractional part that fits in `i64`.
fn whole_i64(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(SqlValue::from_json(&json!(null)), SqlValue::Null);
        assert_eq!(SqlValue::from_json(&json!(true)), SqlValue::Bool(true));
        assert_eq!(SqlValue::from_json(&json!(5)), SqlValue::Int(5));
        assert_eq!(SqlValue::from_json(&json!(1.5)), SqlValue::Float(1.5));
        assert_eq!(
            SqlValue::from_json(&json!("a")),
            SqlValue::String("a".to_string())
        );
    }

    #[test]
    fn test_from_json_nested_becomes_text() {
        assert_eq!(
            SqlValue::from_json(&json!({"k": [1, 2]})),
            SqlValue::String(r#"{"k":[1,2]}"#.to_string())
        );
    }

    #[test]
    fn test_from_json_large_unsigned_becomes_float() {
        assert!(matches!(
            SqlValue::from_json(&json!(u64::MAX)),
            SqlValue::Float(_)
        ));
    }

    #[test]
    fn test_row_preserves_column_order() {
        let mut row = Row::new();
        row.push("zeta", SqlValue::Int(1));
        row.push("alpha", SqlValue::Null);
        row.push("名前", SqlValue::String("張三".to_string()));
        let text = serde_json::to_string(&row).unwrap();
        assert_eq!(text, r#"{"zeta":1,"alpha":null,"名前":"張三"}"#);
    }

    #[test]
    fn test_row_lookup_is_case_insensitive() {
        let mut row = Row::new();
        row.push("TABLE_NAME", SqlValue::String("users".to_string()));
        assert_eq!(row.text("table_name").as_deref(), Some("users"));
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_serialize_datetime_and_binary() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(
            serde_json::to_value(SqlValue::DateTime(dt)).unwrap(),
            json!("2024-03-01T08:30:00")
        );
        assert_eq!(
            serde_json::to_value(SqlValue::Binary(b"hi".to_vec())).unwrap(),
            json!("aGk=")
        );
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(SqlValue::Int(42).coerce(ScalarType::Int).unwrap(), json!(42));
        assert_eq!(
            SqlValue::String(" 7 ".to_string())
                .coerce(ScalarType::Int)
                .unwrap(),
            json!(7)
        );
        assert!(SqlValue::Int(i64::MAX).coerce(ScalarType::Int).is_err());
        assert!(
            SqlValue::String("abc".to_string())
                .coerce(ScalarType::Int)
                .is_err()
        );
    }

    #[test]
    fn test_coerce_long_and_double() {
        assert_eq!(
            SqlValue::Int(i64::MAX).coerce(ScalarType::Long).unwrap(),
            json!(i64::MAX)
        );
        assert_eq!(
            SqlValue::String("2.5".to_string())
                .coerce(ScalarType::Double)
                .unwrap(),
            json!(2.5)
        );
    }

    #[test]
    fn test_coerce_decimal_keeps_text() {
        assert_eq!(
            SqlValue::String("12345678901234567890.12".to_string())
                .coerce(ScalarType::Decimal)
                .unwrap(),
            json!("12345678901234567890.12")
        );
    }

    #[test]
    fn test_coerce_long_rejects_out_of_range_float() {
        assert!(SqlValue::Float(1e30).coerce(ScalarType::Long).is_err());
        assert!(SqlValue::Float(-1e30).coerce(ScalarType::Long).is_err());
        assert!(SqlValue::Float(9.3e18).coerce(ScalarType::Long).is_err());
        assert!(
            SqlValue::String("1e30".to_string())
                .coerce(ScalarType::Long)
                .is_err()
        );
        assert_eq!(
            SqlValue::Float(-4096.0).coerce(ScalarType::Long).unwrap(),
            json!(-4096)
        );
    }

    #[test]
    fn test_coerce_decimal_rejects_non_finite() {
        for text in ["NaN", "inf", "-infinity"] {
            assert!(
                SqlValue::String(text.to_string())
                    .coerce(ScalarType::Decimal)
                    .is_err(),
                "{} accepted",
                text
            );
        }
        assert!(SqlValue::Float(f64::NAN).coerce(ScalarType::Decimal).is_err());
    }

    #[test]
    fn test_coerce_datetime_from_text() {
        assert_eq!(
            SqlValue::String("2024-01-02 03:04:05".to_string())
                .coerce(ScalarType::DateTime)
                .unwrap(),
            json!("2024-01-02T03:04:05")
        );
        assert!(SqlValue::Int(5).coerce(ScalarType::DateTime).is_err());
    }

    #[test]
    fn test_coerce_null_is_null() {
        assert_eq!(SqlValue::Null.coerce(ScalarType::Int).unwrap(), json!(null));
    }

    #[test]
    fn test_as_flag() {
        assert!(SqlValue::Int(1).as_flag());
        assert!(!SqlValue::Int(0).as_flag());
        assert!(SqlValue::String("t".to_string()).as_flag());
        assert!(!SqlValue::Null.as_flag());
    }
}
