use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorObject;
use crate::types::{JsonRpcVersion, RequestId};

/// A JSON-RPC response envelope.
///
/// `result` and `error` are mutually exclusive once the response is
/// finalized; both are omitted from the wire form while a dispatch is
/// still in flight. `id` mirrors the originating request and is omitted
/// when that request never parsed far enough to yield one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl JsonRpcResponse {
    pub fn success(id: impl Into<RequestId>, result: Value) -> Self {
        Self {
            id: Some(id.into()),
            result: Some(result),
            ..Self::default()
        }
    }

    pub fn failure(id: Option<RequestId>, error: ErrorObject) -> Self {
        Self {
            id,
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_some() && self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_wire_shape() {
        let response = JsonRpcResponse::success("test", json!({"value": "lol"}));
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"jsonrpc":"2.0","id":"test","result":{"value":"lol"}}"#
        );
        assert!(response.is_success());
    }

    #[test]
    fn failure_without_id_omits_it() {
        let response = JsonRpcResponse::failure(None, ErrorObject::parse_error());
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"jsonrpc":"2.0","error":{"code":-32700,"message":"Parse error"}}"#
        );
        assert!(response.is_error());
    }

    #[test]
    fn empty_shell_carries_neither_result_nor_error() {
        let shell = JsonRpcResponse::default();
        assert!(!shell.is_success());
        assert!(!shell.is_error());
        assert_eq!(serde_json::to_string(&shell).unwrap(), r#"{"jsonrpc":"2.0"}"#);
    }
}
