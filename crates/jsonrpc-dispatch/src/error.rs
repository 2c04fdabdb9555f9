use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The reserved JSON-RPC 2.0 error catalog.
///
/// Anything a handler wants to report as a domain error uses a code
/// outside this range, via [`ErrorObject::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => -32700,
            JsonRpcErrorCode::InvalidRequest => -32600,
            JsonRpcErrorCode::MethodNotFound => -32601,
            JsonRpcErrorCode::InvalidParams => -32602,
            JsonRpcErrorCode::InternalError => -32603,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Wire representation of an error code: the standard codes are numeric,
/// but handler-defined codes may be strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    String(String),
}

impl From<i64> for ErrorCode {
    fn from(n: i64) -> Self {
        ErrorCode::Number(n)
    }
}

impl From<&str> for ErrorCode {
    fn from(s: &str) -> Self {
        ErrorCode::String(s.to_string())
    }
}

impl From<JsonRpcErrorCode> for ErrorCode {
    fn from(code: JsonRpcErrorCode) -> Self {
        ErrorCode::Number(code.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(n) => write!(f, "{}", n),
            ErrorCode::String(s) => write!(f, "{}", s),
        }
    }
}

/// JSON-RPC error payload: `{"code": .., "message": .., "data": ..?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data,
        }
    }

    fn reserved(code: JsonRpcErrorCode) -> Self {
        Self::new(code, code.message(), None)
    }

    pub fn parse_error() -> Self {
        Self::reserved(JsonRpcErrorCode::ParseError)
    }

    pub fn invalid_request() -> Self {
        Self::reserved(JsonRpcErrorCode::InvalidRequest)
    }

    pub fn method_not_found() -> Self {
        Self::reserved(JsonRpcErrorCode::MethodNotFound)
    }

    pub fn invalid_params() -> Self {
        Self::reserved(JsonRpcErrorCode::InvalidParams)
    }

    pub fn internal_error() -> Self {
        Self::reserved(JsonRpcErrorCode::InternalError)
    }

    /// Attach an opaque `data` payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// Local (non-wire) failures raised while driving a dispatch.
///
/// Every variant has already been recovered into a well-formed error
/// response on the context by the time it is returned; the error value
/// itself only reports what happened to the caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid request envelope")]
    InvalidRequest,

    #[error("invalid params for method `{method}`: {source}")]
    InvalidParams {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode result of method `{method}`: {source}")]
    ResultEncode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize response: {0}")]
    ResponseSerialize(#[source] serde_json::Error),

    #[error("failed to serialize request: {0}")]
    RequestSerialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_codes() {
        assert_eq!(JsonRpcErrorCode::ParseError.code(), -32700);
        assert_eq!(JsonRpcErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(JsonRpcErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(JsonRpcErrorCode::InvalidParams.code(), -32602);
        assert_eq!(JsonRpcErrorCode::InternalError.code(), -32603);
    }

    #[test]
    fn error_object_serialization() {
        let error = ErrorObject::method_not_found();
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"code":-32601,"message":"Method not found"}"#
        );
    }

    #[test]
    fn domain_error_with_string_code() {
        let error = ErrorObject::new("E_TEAPOT", "short and stout", None);
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"code":"E_TEAPOT","message":"short and stout"}"#
        );
    }

    #[test]
    fn data_payload_round_trip() {
        let error = ErrorObject::new(666, "error", None).with_data(serde_json::json!({"hint": 1}));
        let json = serde_json::to_string(&error).unwrap();
        let parsed: ErrorObject = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, error);
    }
}
