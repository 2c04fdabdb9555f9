use serde_json::Value;
use tracing::debug;

use crate::context::RequestContext;
use crate::error::{DispatchError, ErrorObject};
use crate::method::{CallError, MethodDescriptor};

/// Drive one bound method against the context's request.
///
/// Resets the response, decodes the params payload through the
/// descriptor's typed decoder, invokes the operation, and encodes the
/// outcome back into the response. A domain error returned by the
/// operation always wins over a result and ends the invocation
/// successfully; local decode/encode failures become Invalid Params or
/// Internal Error responses and are reported through the `Err` channel.
pub fn invoke_method(
    context: &mut RequestContext,
    method: &MethodDescriptor,
) -> Result<(), DispatchError> {
    context.make_empty_response();

    let params = context.request.params.clone().unwrap_or(Value::Null);

    match method.call(params) {
        Ok(Ok(result)) => {
            context.response.result = Some(result);
            context.response.error = None;
            Ok(())
        }
        Ok(Err(domain)) => {
            debug!(method = method.name(), code = %domain.code, "operation reported a domain error");
            context.response.error = Some(domain);
            context.response.result = None;
            Ok(())
        }
        Err(CallError::Params(source)) => {
            debug!(
                method = method.name(),
                expected = method.params_type(),
                error = %source,
                "params payload did not decode"
            );
            context.make_error_response(ErrorObject::invalid_params());
            Err(DispatchError::InvalidParams {
                method: method.name().to_string(),
                source,
            })
        }
        Err(CallError::Encode(source)) => {
            debug!(
                method = method.name(),
                expected = method.result_type(),
                error = %source,
                "result did not encode"
            );
            context.make_error_response(ErrorObject::internal_error());
            Err(DispatchError::ResultEncode {
                method: method.name().to_string(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Deserialize)]
    struct PassParams {
        name: String,
    }

    #[derive(Serialize)]
    struct PassResult {
        value: String,
    }

    fn context_for(raw: &str) -> RequestContext {
        let mut ctx = RequestContext::with_raw_request(raw);
        ctx.parse_raw_request().unwrap();
        ctx
    }

    #[test]
    fn success_fills_result_and_clears_error() {
        let method = MethodDescriptor::new("pass", |params: PassParams| {
            Ok(PassResult { value: params.name })
        });
        let mut ctx =
            context_for(r#"{"jsonrpc":"2.0","id":"t","method":"pass","params":{"name":"lol"}}"#);

        invoke_method(&mut ctx, &method).unwrap();
        assert_eq!(ctx.response.result, Some(json!({"value": "lol"})));
        assert!(ctx.response.error.is_none());
    }

    #[test]
    fn domain_error_wins_over_result() {
        let method = MethodDescriptor::new("error", |_: PassParams| -> Result<PassResult, ErrorObject> {
            Err(ErrorObject::new(666, "error", None))
        });
        let mut ctx =
            context_for(r#"{"jsonrpc":"2.0","id":"t","method":"error","params":{"name":"x"}}"#);

        invoke_method(&mut ctx, &method).unwrap();
        assert!(ctx.response.result.is_none());
        assert_eq!(ctx.response.error, Some(ErrorObject::new(666, "error", None)));
    }

    #[test]
    fn undecodable_params_become_invalid_params() {
        let method = MethodDescriptor::new("pass", |params: PassParams| {
            Ok(PassResult { value: params.name })
        });
        let mut ctx =
            context_for(r#"{"jsonrpc":"2.0","id":"t","method":"pass","params":{"name":[]}}"#);

        let err = invoke_method(&mut ctx, &method).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidParams { .. }));
        assert_eq!(ctx.response.error, Some(ErrorObject::invalid_params()));
        assert!(ctx.response.result.is_none());
    }

    #[test]
    fn unencodable_result_becomes_internal_error() {
        #[derive(Serialize)]
        struct Hostile {
            #[serde(serialize_with = "always_fails")]
            marker: u8,
        }

        fn always_fails<S>(_: &u8, _: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            Err(serde::ser::Error::custom("nope"))
        }

        let method =
            MethodDescriptor::new("hostile", |_: PassParams| Ok(Hostile { marker: 0 }));
        let mut ctx =
            context_for(r#"{"jsonrpc":"2.0","id":"t","method":"hostile","params":{"name":"x"}}"#);

        let err = invoke_method(&mut ctx, &method).unwrap_err();
        assert!(matches!(err, DispatchError::ResultEncode { .. }));
        assert_eq!(ctx.response.error, Some(ErrorObject::internal_error()));
    }

    #[test]
    fn missing_params_decode_as_null() {
        #[derive(Deserialize)]
        struct NoParams {}

        let method = MethodDescriptor::new("empty", |_: Option<NoParams>| Ok(json!({})));
        let mut ctx = context_for(r#"{"jsonrpc":"2.0","id":"t","method":"empty"}"#);

        invoke_method(&mut ctx, &method).unwrap();
        assert_eq!(ctx.response.result, Some(json!({})));
    }
}
