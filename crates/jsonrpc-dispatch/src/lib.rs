//! # JSON-RPC 2.0 Dispatch Engine
//!
//! A pure, transport-agnostic JSON-RPC 2.0 server-side dispatch engine:
//! raw bytes in, raw bytes out. The engine classifies the input as a
//! single request or a batch, routes each request to a registered
//! operation, validates the protocol envelope, and applies ordered
//! pre/post pipeline stages around every invocation.
//!
//! ## Features
//! - Full JSON-RPC 2.0 envelope validation with the standard error catalog
//! - Batch processing with per-element isolation and order-preserving output
//! - Typed method registration: the params/result shapes of an operation
//!   are checked at compile time, no runtime introspection
//! - Pre/post pipelines for cross-cutting concerns (auth, metrics, logging)
//! - Synchronous and `Sync`: a populated server dispatches from any thread
//!
//! ## Example
//!
//! ```
//! use jsonrpc_dispatch::{JsonRpcServer, MethodDescriptor, RequestContext};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! struct EchoParams { name: String }
//!
//! #[derive(Serialize)]
//! struct EchoResult { value: String }
//!
//! let mut server = JsonRpcServer::new();
//! server.register(MethodDescriptor::new("echo", |params: EchoParams| {
//!     Ok(EchoResult { value: params.name })
//! }));
//!
//! let mut ctx = RequestContext::with_raw_request(
//!     r#"{"jsonrpc":"2.0","id":"1","method":"echo","params":{"name":"lol"}}"#,
//! );
//! server.process_raw_input(&mut ctx).unwrap();
//! assert_eq!(
//!     String::from_utf8(ctx.raw_response).unwrap(),
//!     r#"{"jsonrpc":"2.0","id":"1","result":{"value":"lol"}}"#,
//! );
//! ```

pub mod context;
pub mod error;
pub mod invoke;
pub mod method;
pub mod request;
pub mod response;
pub mod server;
pub mod types;

pub use context::{RequestContext, Stage};
pub use error::{DispatchError, ErrorCode, ErrorObject, JsonRpcErrorCode};
pub use invoke::invoke_method;
pub use method::{Handler, MethodDescriptor};
pub use request::JsonRpcRequest;
pub use response::JsonRpcResponse;
pub use server::JsonRpcServer;
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
