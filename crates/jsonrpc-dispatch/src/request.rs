use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorObject;
use crate::response::JsonRpcResponse;
use crate::types::RequestId;

/// A JSON-RPC request envelope.
///
/// The version tag is kept as the raw wire string so a structurally
/// valid envelope with the wrong version is reported as Invalid Request
/// rather than a parse failure; [`JsonRpcRequest::is_valid`] performs
/// that check. `params` stays an opaque [`Value`] until the bound
/// operation's typed decoder consumes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc", default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            version: crate::JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// Protocol-level validity: correct version and a non-empty method name.
    pub fn is_valid(&self) -> bool {
        self.version == crate::JSONRPC_VERSION && !self.method.is_empty()
    }

    /// Build a response carrying this request's id. A provided `error`
    /// forces the result absent; result and error never coexist.
    pub fn make_response(
        &self,
        result: Option<Value>,
        error: Option<ErrorObject>,
    ) -> JsonRpcResponse {
        JsonRpcResponse {
            id: self.id.clone(),
            result: if error.is_some() { None } else { result },
            error,
            ..JsonRpcResponse::default()
        }
    }

    /// Build a response to this request carrying only the given error.
    pub fn make_error_response(&self, error: ErrorObject) -> JsonRpcResponse {
        self.make_response(None, Some(error))
    }
}
