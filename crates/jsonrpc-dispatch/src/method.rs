use std::any::type_name;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ErrorObject;

/// Local failures raised inside the erased call shim. Distinct from the
/// domain-error channel: the handler never sees these.
#[derive(Debug)]
pub(crate) enum CallError {
    /// Params payload did not decode into the operation's params type.
    Params(serde_json::Error),
    /// The operation's result did not encode back to JSON.
    Encode(serde_json::Error),
}

type ErasedCall =
    Box<dyn Fn(Value) -> Result<Result<Value, ErrorObject>, CallError> + Send + Sync>;

/// Registry record binding an RPC method name to a callable operation.
///
/// The dispatch contract -- one typed params input, a serializable
/// result, a domain-error channel -- is checked by the compiler when
/// the descriptor is built, instead of being discovered by runtime
/// introspection. Behind the descriptor sits a type-erased callable
/// with a uniform `Value -> Value`-or-error signature; the typed decode
/// and encode live inside the erasure.
///
/// Descriptors are immutable once registered.
///
/// ```
/// use jsonrpc_dispatch::MethodDescriptor;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Deserialize)]
/// struct EchoParams { name: String }
///
/// #[derive(Serialize)]
/// struct EchoResult { value: String }
///
/// let descriptor = MethodDescriptor::new("echo", |params: EchoParams| {
///     Ok(EchoResult { value: params.name })
/// });
/// assert_eq!(descriptor.name(), "echo");
/// ```
pub struct MethodDescriptor {
    name: String,
    params_type: &'static str,
    result_type: &'static str,
    call: ErasedCall,
}

impl MethodDescriptor {
    /// Bind a typed operation under an RPC method name.
    ///
    /// The operation returns `Ok(result)` on success or `Err(error)` to
    /// surface a domain error to the caller verbatim.
    pub fn new<P, R, F>(name: impl Into<String>, operation: F) -> Self
    where
        P: DeserializeOwned,
        R: Serialize,
        F: Fn(P) -> Result<R, ErrorObject> + Send + Sync + 'static,
    {
        let call: ErasedCall = Box::new(move |raw: Value| {
            let params = serde_json::from_value::<P>(raw).map_err(CallError::Params)?;
            match operation(params) {
                Ok(result) => Ok(Ok(
                    serde_json::to_value(result).map_err(CallError::Encode)?
                )),
                Err(domain) => Ok(Err(domain)),
            }
        });

        Self {
            name: name.into(),
            params_type: type_name::<P>(),
            result_type: type_name::<R>(),
            call,
        }
    }

    /// The RPC-visible method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of the decoded params shape, for diagnostics.
    pub fn params_type(&self) -> &'static str {
        self.params_type
    }

    /// Type name of the decoded result shape, for diagnostics.
    pub fn result_type(&self) -> &'static str {
        self.result_type
    }

    pub(crate) fn with_name(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    pub(crate) fn call(&self, params: Value) -> Result<Result<Value, ErrorObject>, CallError> {
        (self.call)(params)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params_type", &self.params_type)
            .field("result_type", &self.result_type)
            .finish_non_exhaustive()
    }
}

/// A collection of operations exposed as descriptors.
///
/// Implement this to make a business-logic object remotely callable;
/// the server selects descriptors by name prefix at registration time
/// (see `JsonRpcServer::add_handler`), so one object can carry both
/// exposed operations and private helpers.
pub trait Handler {
    fn methods(&self) -> Vec<MethodDescriptor>;
}
