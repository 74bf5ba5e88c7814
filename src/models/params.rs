//! Named parameter sets.
//!
//! Tool arguments carry parameters as a JSON object text; this module turns
//! that text into an ordered list of `(name, value)` pairs.

use crate::error::{DbError, DbResult};
use crate::models::SqlValue;
use serde_json::Value as JsonValue;

/// Ordered named parameters for one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: Vec<(String, SqlValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter. A leading `@` or `:` on the name is dropped.
    pub fn push(&mut self, name: impl AsRef<str>, value: SqlValue) {
        self.params
            .push((normalize_name(name.as_ref()).to_string(), value));
    }

    pub fn with(mut self, name: impl AsRef<str>, value: SqlValue) -> Self {
        self.push(name, value);
        self
    }

    /// Append every parameter of `other`.
    pub fn extend(&mut self, other: ParameterSet) {
        self.params.extend(other.params);
    }

    /// Look up a parameter by name, ignoring prefix and case.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        let name = normalize_name(name);
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.params.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Values in insertion order, for positional binding.
    pub fn values(&self) -> Vec<SqlValue> {
        self.params.iter().map(|(_, value)| value.clone()).collect()
    }

    /// Back to a JSON object (names without prefix).
    pub fn to_json(&self) -> JsonValue {
        let map = self
            .params
            .iter()
            .map(|(name, value)| {
                let json = serde_json::to_value(value).unwrap_or(JsonValue::Null);
                (name.clone(), json)
            })
            .collect();
        JsonValue::Object(map)
    }
}

/// Strip a leading `@` or `:` marker from a parameter name.
pub fn normalize_name(name: &str) -> &str {
    name.trim()
        .strip_prefix('@')
        .or_else(|| name.trim().strip_prefix(':'))
        .unwrap_or(name.trim())
}

/// Parse a JSON object text into named parameters.
///
/// `None`, empty and whitespace-only input mean "no parameters".
pub fn parse_parameters(json: Option<&str>) -> DbResult<Option<ParameterSet>> {
    let Some(text) = json.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let value: JsonValue = serde_json::from_str(text)?;
    parameters_from_value(&value).map(Some)
}

/// Build a parameter set from an already-parsed JSON value.
pub fn parameters_from_value(value: &JsonValue) -> DbResult<ParameterSet> {
    match value {
        JsonValue::Object(map) => Ok(map
            .iter()
            .fold(ParameterSet::new(), |set, (name, value)| {
                set.with(name, SqlValue::from_json(value))
            })),
        JsonValue::Null => Ok(ParameterSet::new()),
        other => Err(DbError::invalid_parameters(format!(
            "Parameters must be a JSON object of name/value pairs, got: {}",
            other
        ))),
    }
}
