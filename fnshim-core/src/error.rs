//! Host error types and formatting
//!
//! The function handler itself never fails; these errors belong to the
//! surfaces hosting it (HTTP function host, one-shot invoke).

use serde::Serialize;
use thiserror::Error;

/// Error codes reported by the hosting surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// No function is registered under the requested name
    ResourceNotFound,
    /// The invocation event could not be parsed
    InvalidRequestContent,
    /// The host failed while invoking the function
    ServiceException,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceNotFound => "ResourceNotFound",
            Self::InvalidRequestContent => "InvalidRequestContentException",
            Self::ServiceException => "ServiceException",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::ResourceNotFound => 404,
            Self::InvalidRequestContent => 400,
            Self::ServiceException => 500,
        }
    }
}

/// Error surfaced by a function host to its caller
#[derive(Debug, Error)]
#[error("{}: {}", .code.as_str(), .message)]
pub struct HostError {
    pub code: ErrorCode,
    pub message: String,
    pub request_id: String,
}

impl HostError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn function_not_found(name: &str) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("Function not found: {name}"),
        )
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Format as a Lambda-style JSON error body
    pub fn to_json(&self) -> String {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct JsonError<'a> {
            error_type: &'a str,
            error_message: &'a str,
            request_id: &'a str,
        }

        let error = JsonError {
            error_type: self.code.as_str(),
            error_message: &self.message,
            request_id: &self.request_id,
        };

        serde_json::to_string(&error).unwrap_or_else(|_| {
            format!(
                r#"{{"errorType":"{}","errorMessage":"{}"}}"#,
                self.code.as_str(),
                self.message
            )
        })
    }
}
