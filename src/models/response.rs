//! The response envelope returned by every tool.

use crate::error::DbError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

/// `{ success, <payload fields>, error?, errorCode?, timestamp }`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub success: bool,
    #[serde(flatten)]
    pub payload: Map<String, JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    #[serde(serialize_with = "iso_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl ToolResponse {
    /// Successful response. Object payloads are merged into the envelope,
    /// anything else lands under `data`.
    pub fn ok(payload: JsonValue) -> Self {
        let payload = match payload {
            JsonValue::Object(map) => map,
            JsonValue::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        Self {
            success: true,
            payload,
            error: None,
            error_code: None,
            timestamp: Utc::now(),
        }
    }

    /// Failure response for a classified error.
    pub fn from_error(err: &DbError) -> Self {
        Self {
            success: false,
            payload: Map::new(),
            error: Some(err.envelope_message()),
            error_code: Some(err.code().as_i32()),
            timestamp: Utc::now(),
        }
    }

    /// Pretty JSON text of the envelope.
    pub fn to_json(&self) -> String {
        serialize_result(self)
    }
}

fn iso_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Serialize any result to indented JSON.
///
/// Non-ASCII text is written as-is rather than as `\u` escapes.
pub fn serialize_result<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        format!(
            "{{\n  \"success\": false,\n  \"error\": {},\n  \"errorCode\": 9999\n}}",
            JsonValue::String(format!("Failed to serialize result: {}", e))
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(text: &str) -> JsonValue {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_success_envelope_merges_payload() {
        let text = ToolResponse::ok(json!({"rowCount": 1, "data": [{"id": 1}]})).to_json();
        let value = parse(&text);
        assert_eq!(value["success"], true);
        assert_eq!(value["rowCount"], 1);
        assert_eq!(value["data"][0]["id"], 1);
        assert!(value.get("error").is_none());
        assert!(value.get("errorCode").is_none());
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_scalar_payload_goes_under_data() {
        let value = parse(&ToolResponse::ok(json!([1, 2])).to_json());
        assert_eq!(value["data"], json!([1, 2]));
    }

    #[test]
    fn test_error_envelope() {
        let err = DbError::dangerous_operation("DROP TABLE");
        let value = parse(&ToolResponse::from_error(&err).to_json());
        assert_eq!(value["success"], false);
        assert_eq!(value["errorCode"], 1003);
        assert!(value["error"].as_str().unwrap().contains("DROP TABLE"));
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_output_is_indented_and_unescaped() {
        let text = ToolResponse::ok(json!({"message": "连接成功"})).to_json();
        assert!(text.contains("\n  \"message\": \"连接成功\""));
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let value = parse(&ToolResponse::ok(JsonValue::Null).to_json());
        let ts = value["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
