//! Invocation event, context and response types

use fnshim_core::RequestId;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Event delivered to the function
///
/// Shaped like a Netlify / API Gateway proxy event. The handler never
/// inspects it; fields it does not know about are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl InvocationEvent {
    /// Parse an event from JSON; empty input is an empty event
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(input)
    }
}

// Proxy events send `null` for absent maps
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Context passed to the function alongside the event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    pub aws_request_id: String,
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoked_function_arn: Option<String>,
    pub deadline_ms: i64,
}

impl InvocationContext {
    /// Context for a locally hosted invocation
    pub fn local(function_name: &str, request_id: &RequestId, timeout_ms: i64) -> Self {
        Self {
            aws_request_id: request_id.to_string(),
            function_name: function_name.to_string(),
            invoked_function_arn: None,
            deadline_ms: chrono::Utc::now().timestamp_millis() + timeout_ms,
        }
    }

    /// Get remaining time in milliseconds
    pub fn get_remaining_time_in_millis(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        (self.deadline_ms - now).max(0)
    }
}

/// Response returned by the handler: `{"statusCode": 200, "body": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn ok(body: String) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    /// Readiness marker never appeared
    pub fn gateway_timeout(body: String) -> Self {
        Self {
            status_code: 504,
            body,
        }
    }
}
