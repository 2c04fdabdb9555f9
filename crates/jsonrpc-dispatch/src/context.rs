use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{DispatchError, ErrorObject};
use crate::request::JsonRpcRequest;
use crate::response::JsonRpcResponse;

/// A pipeline stage: a hook run before or after method invocation.
///
/// Stages are applied left-to-right; returning `false` stops the
/// remaining stages in the list. A stage that stops the pipeline is
/// itself responsible for having put an error on the context first --
/// stopping is a signal, not an error.
///
/// Blanket-implemented for closures, so plain functions work:
///
/// ```
/// use jsonrpc_dispatch::{RequestContext, Stage};
///
/// let audit: Box<dyn Stage> = Box::new(|ctx: &mut RequestContext| {
///     ctx.data.insert("seen".into(), serde_json::json!(true));
///     true
/// });
///
/// let mut ctx = RequestContext::new();
/// assert!(audit.apply(&mut ctx));
/// assert_eq!(ctx.data.get("seen"), Some(&serde_json::json!(true)));
/// ```
pub trait Stage: Send + Sync {
    fn apply(&self, context: &mut RequestContext) -> bool;
}

impl<F> Stage for F
where
    F: Fn(&mut RequestContext) -> bool + Send + Sync,
{
    fn apply(&self, context: &mut RequestContext) -> bool {
        self(context)
    }
}

/// Mutable unit of work for one dispatch: the raw bytes in and out, the
/// parsed envelopes, and a side-channel map for pipeline stages.
///
/// Cloning a context is how batch elements get isolated state -- each
/// element runs against a fresh copy, so side-channel writes never leak
/// into sibling elements or the batch-level context.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request: JsonRpcRequest,
    pub response: JsonRpcResponse,
    pub raw_request: Vec<u8>,
    pub raw_response: Vec<u8>,
    /// Free-form tagged-value store for pipeline stages. The engine
    /// itself never reads or writes it.
    pub data: Map<String, Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh context primed with raw input bytes.
    pub fn with_raw_request(raw: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_request: raw.into(),
            ..Self::default()
        }
    }

    /// Decode the raw input bytes into the request envelope.
    ///
    /// Malformed bytes become a Parse Error response; a well-formed
    /// envelope with the wrong version or an empty method becomes an
    /// Invalid Request response. Either way the response is already
    /// populated when this returns `Err`.
    pub fn parse_raw_request(&mut self) -> Result<(), DispatchError> {
        match serde_json::from_slice::<JsonRpcRequest>(&self.raw_request) {
            Ok(request) => {
                self.request = request;
                if self.request.is_valid() {
                    Ok(())
                } else {
                    self.make_error_response(ErrorObject::invalid_request());
                    Err(DispatchError::InvalidRequest)
                }
            }
            Err(source) => {
                self.make_error_response(ErrorObject::parse_error());
                Err(DispatchError::Parse(source))
            }
        }
    }

    /// Reset the response to a version-correct shell carrying the
    /// request's id, with neither result nor error set.
    pub fn make_empty_response(&mut self) {
        self.response = self.request.make_response(None, None);
    }

    /// Overwrite the response with an error built from the current
    /// request's id.
    pub fn make_error_response(&mut self, error: ErrorObject) {
        self.response = self.request.make_error_response(error);
    }

    /// Serialize the response into the raw output bytes.
    ///
    /// On failure the response is replaced with Internal Error and
    /// serialization is retried once, best-effort; a second failure
    /// leaves the raw output as-is and is reported to the caller.
    pub fn rebuild_raw_response(&mut self) -> Result<(), DispatchError> {
        match serde_json::to_vec(&self.response) {
            Ok(raw) => {
                self.raw_response = raw;
                Ok(())
            }
            Err(first) => {
                warn!(error = %first, "failed to serialize response, degrading to internal error");
                self.make_error_response(ErrorObject::internal_error());
                match serde_json::to_vec(&self.response) {
                    Ok(raw) => {
                        self.raw_response = raw;
                        Ok(())
                    }
                    Err(second) => Err(DispatchError::ResponseSerialize(second)),
                }
            }
        }
    }

    /// Re-serialize the parsed request into the raw input bytes; lets a
    /// pipeline stage that rewrote the envelope keep both views in sync.
    pub fn rebuild_raw_request(&mut self) -> Result<(), DispatchError> {
        self.raw_request =
            serde_json::to_vec(&self.request).map_err(DispatchError::RequestSerialize)?;
        Ok(())
    }

    /// Decode the raw output bytes back into the response envelope.
    pub fn parse_raw_response(&mut self) -> Result<(), DispatchError> {
        self.response = serde_json::from_slice(&self.raw_response)?;
        Ok(())
    }

    /// Run stages in order, stopping at the first one that reports
    /// failure. Returns whether all stages ran to completion.
    pub fn apply_pipeline(&mut self, stages: &[Box<dyn Stage>]) -> bool {
        for stage in stages {
            if !stage.apply(self) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestId;
    use serde_json::json;

    #[test]
    fn parse_well_formed_request() {
        let mut ctx = RequestContext::with_raw_request(
            r#"{"jsonrpc":"2.0","id":"test","method":"pass","params":{"name":"lol"}}"#,
        );
        ctx.parse_raw_request().unwrap();
        assert_eq!(ctx.request.method, "pass");
        assert_eq!(ctx.request.id, Some(RequestId::from("test")));
    }

    #[test]
    fn parse_failure_populates_parse_error() {
        let mut ctx = RequestContext::with_raw_request("{.}");
        let err = ctx.parse_raw_request().unwrap_err();
        assert!(matches!(err, DispatchError::Parse(_)));

        ctx.rebuild_raw_response().unwrap();
        assert_eq!(
            String::from_utf8(ctx.raw_response).unwrap(),
            r#"{"jsonrpc":"2.0","error":{"code":-32700,"message":"Parse error"}}"#
        );
    }

    #[test]
    fn protocol_violation_populates_invalid_request() {
        for raw in [
            r#"{"jsonrpc":"1.0","id":"t","method":"pass"}"#,
            r#"{"jsonrpc":"2.0","id":"t"}"#,
            r#"{"ololo":"trololo"}"#,
        ] {
            let mut ctx = RequestContext::with_raw_request(raw);
            let err = ctx.parse_raw_request().unwrap_err();
            assert!(matches!(err, DispatchError::InvalidRequest), "input {}", raw);
            assert_eq!(
                ctx.response.error,
                Some(ErrorObject::invalid_request()),
                "input {}",
                raw
            );
        }
    }

    #[test]
    fn empty_response_carries_request_id() {
        let mut ctx =
            RequestContext::with_raw_request(r#"{"jsonrpc":"2.0","id":"t","method":"m"}"#);
        ctx.parse_raw_request().unwrap();
        ctx.make_empty_response();
        assert_eq!(ctx.response.id, Some(RequestId::from("t")));
        assert!(ctx.response.result.is_none());
        assert!(ctx.response.error.is_none());
    }

    #[test]
    fn raw_response_round_trip() {
        let mut ctx = RequestContext::new();
        ctx.response = crate::response::JsonRpcResponse::success("t", json!({"value": 1}));
        ctx.rebuild_raw_response().unwrap();

        let mut other = RequestContext::new();
        other.raw_response = ctx.raw_response.clone();
        other.parse_raw_response().unwrap();
        assert_eq!(other.response, ctx.response);
    }

    #[test]
    fn pipeline_short_circuits_and_keeps_prior_effects() {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(|ctx: &mut RequestContext| {
                ctx.data.insert("lol".into(), json!("kek"));
                true
            }),
            Box::new(|ctx: &mut RequestContext| {
                ctx.data.insert("lol".into(), json!("cheburek"));
                false
            }),
            Box::new(|ctx: &mut RequestContext| {
                ctx.data.insert("lol".into(), json!("azaza"));
                true
            }),
        ];

        let mut ctx = RequestContext::new();
        assert!(!ctx.apply_pipeline(&stages));
        assert_eq!(ctx.data.get("lol"), Some(&json!("cheburek")));
    }

    #[test]
    fn pipeline_runs_to_completion() {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(|ctx: &mut RequestContext| {
                ctx.data.insert("lol".into(), json!("kek"));
                true
            }),
            Box::new(|ctx: &mut RequestContext| {
                ctx.data.insert("lol".into(), json!("azaza"));
                true
            }),
        ];

        let mut ctx = RequestContext::new();
        assert!(ctx.apply_pipeline(&stages));
        assert_eq!(ctx.data.get("lol"), Some(&json!("azaza")));
    }

    #[test]
    fn clone_isolates_side_channel() {
        let mut outer = RequestContext::new();
        outer.data.insert("shared".into(), json!(1));

        let mut inner = outer.clone();
        inner.data.insert("local".into(), json!(2));

        assert_eq!(inner.data.get("shared"), Some(&json!(1)));
        assert!(outer.data.get("local").is_none());
    }
}
