//! Schema-related data models.
//!
//! This module defines types for database schema introspection and the
//! column definitions accepted by the column mutation tools.

use serde::{Deserialize, Serialize};

/// A table or view with its description, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbObjectInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DbObjectInfo {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description: description.filter(|d| !d.is_empty()),
        }
    }
}

/// Column metadata as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub table_name: String,
    pub db_column_name: String,
    pub data_type: String,
    /// Character length or numeric precision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_digits: Option<i64>,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_identity: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_description: Option<String>,
}

/// Everything `get_table_schema` reports for one table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
    pub primary_keys: Vec<String>,
    pub identity_columns: Vec<String>,
    pub indexes: Vec<String>,
}

/// Column definition for `add_column` / `update_column`.
///
/// Accepts PascalCase keys (`DbColumnName`) as well as camelCase and
/// snake_case spellings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnSpec {
    #[serde(
        rename = "DbColumnName",
        alias = "dbColumnName",
        alias = "db_column_name",
        alias = "name"
    )]
    pub name: String,
    #[serde(
        rename = "DataType",
        alias = "dataType",
        alias = "data_type",
        default = "default_data_type"
    )]
    pub data_type: String,
    #[serde(rename = "Length", alias = "length", default = "default_length")]
    pub length: u32,
    #[serde(
        rename = "DecimalDigits",
        alias = "decimalDigits",
        alias = "decimal_digits",
        default
    )]
    pub decimal_digits: Option<u32>,
    #[serde(
        rename = "IsNullable",
        alias = "isNullable",
        alias = "is_nullable",
        default = "default_nullable"
    )]
    pub is_nullable: bool,
    #[serde(
        rename = "DefaultValue",
        alias = "defaultValue",
        alias = "default_value",
        default
    )]
    pub default_value: Option<String>,
    #[serde(
        rename = "ColumnDescription",
        alias = "columnDescription",
        alias = "column_description",
        default
    )]
    pub column_description: Option<String>,
}

fn default_data_type() -> String {
    "varchar".to_string()
}

fn default_length() -> u32 {
    255
}

fn default_nullable() -> bool {
    true
}

impl ColumnSpec {
    /// Column type with length/scale applied where the type takes them.
    pub fn type_sql(&self) -> String {
        let base = self.data_type.trim();
        if base.contains('(') {
            return base.to_string();
        }
        let lower = base.to_lowercase();
        let takes_length = matches!(
            lower.as_str(),
            "varchar" | "char" | "nvarchar" | "nchar" | "varbinary" | "binary" | "character varying"
        );
        let takes_scale = matches!(lower.as_str(), "decimal" | "numeric");
        if takes_scale {
            format!(
                "{}({},{})",
                base,
                self.length,
                self.decimal_digits.unwrap_or(0)
            )
        } else if takes_length && self.length > 0 {
            format!("{}({})", base, self.length)
        } else {
            base.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_spec_defaults() {
        let spec: ColumnSpec = serde_json::from_str(r#"{"DbColumnName": "email"}"#).unwrap();
        assert_eq!(spec.name, "email");
        assert_eq!(spec.data_type, "varchar");
        assert_eq!(spec.length, 255);
        assert!(spec.is_nullable);
        assert_eq!(spec.type_sql(), "varchar(255)");
    }

    #[test]
    fn test_column_spec_camel_case() {
        let spec: ColumnSpec = serde_json::from_str(
            r#"{"dbColumnName": "price", "dataType": "decimal", "length": 10, "decimalDigits": 2, "isNullable": false}"#,
        )
        .unwrap();
        assert_eq!(spec.type_sql(), "decimal(10,2)");
        assert!(!spec.is_nullable);
    }

    #[test]
    fn test_type_sql_without_length() {
        let spec: ColumnSpec =
            serde_json::from_str(r#"{"DbColumnName": "n", "DataType": "int"}"#).unwrap();
        assert_eq!(spec.type_sql(), "int");

        let spec: ColumnSpec =
            serde_json::from_str(r#"{"DbColumnName": "n", "DataType": "varchar(20)"}"#).unwrap();
        assert_eq!(spec.type_sql(), "varchar(20)");
    }

    #[test]
    fn test_column_spec_requires_name() {
        assert!(serde_json::from_str::<ColumnSpec>(r#"{"DataType": "int"}"#).is_err());
    }

    #[test]
    fn test_object_info_drops_empty_description() {
        let info = DbObjectInfo::new("users", Some(String::new()));
        assert_eq!(info.description, None);
    }
}
