use std::collections::HashMap;

use serde_json::value::RawValue;
use tracing::{debug, warn};

use crate::context::{RequestContext, Stage};
use crate::error::{DispatchError, ErrorObject};
use crate::invoke::invoke_method;
use crate::method::{Handler, MethodDescriptor};

/// The dispatch server: a method registry plus the pre- and
/// post-invocation pipelines.
///
/// Registration is a startup-phase activity; once serving begins the
/// registry is treated as immutable, so a populated server can sit
/// behind an `Arc` and take dispatch calls from many threads -- every
/// entry point below borrows `&self`.
#[derive(Default)]
pub struct JsonRpcServer {
    methods: HashMap<String, MethodDescriptor>,
    pre_stages: Vec<Box<dyn Stage>>,
    post_stages: Vec<Box<dyn Stage>>,
}

impl JsonRpcServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a handler's operations into the registry.
    ///
    /// Only descriptors whose name starts with `name_prefix` are taken;
    /// the prefix is stripped to get the RPC method name. Descriptors
    /// under other prefixes are silently skipped, which lets one object
    /// expose several namespaces. Re-registering a name replaces the
    /// prior descriptor.
    pub fn add_handler<H: Handler>(&mut self, handler: &H, name_prefix: &str) {
        for descriptor in handler.methods() {
            let Some(name) = descriptor.name().strip_prefix(name_prefix) else {
                continue;
            };
            let name = name.to_string();
            debug!(method = %name, params = descriptor.params_type(), "registered method");
            self.methods.insert(name.clone(), descriptor.with_name(name));
        }
    }

    /// Register a single descriptor under its own name, verbatim.
    pub fn register(&mut self, descriptor: MethodDescriptor) {
        debug!(method = descriptor.name(), "registered method");
        self.methods.insert(descriptor.name().to_string(), descriptor);
    }

    /// Exact-match lookup; absence is a normal outcome, not an error.
    pub fn get_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(name)
    }

    /// Names of all registered methods, in no particular order.
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    /// Append a stage to the pre-invocation pipeline.
    pub fn add_pre_stage(&mut self, stage: impl Stage + 'static) {
        self.pre_stages.push(Box::new(stage));
    }

    /// Append a stage to the post-invocation pipeline.
    pub fn add_post_stage(&mut self, stage: impl Stage + 'static) {
        self.post_stages.push(Box::new(stage));
    }

    /// Entry point for a raw byte buffer: classify it as a single
    /// request or a batch by its first significant byte and process
    /// accordingly. Anything that is neither an object nor an array is
    /// an Invalid Request. The context's raw response bytes are always
    /// rebuilt before this returns.
    pub fn process_raw_input(&self, context: &mut RequestContext) -> Result<(), DispatchError> {
        let first = context
            .raw_request
            .iter()
            .copied()
            .find(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'));

        let outcome = match first {
            Some(b'{') => return self.process_raw_request(context),
            Some(b'[') => {
                match serde_json::from_slice::<Vec<&RawValue>>(&context.raw_request) {
                    Ok(raw_elements) => {
                        let elements: Vec<Vec<u8>> = raw_elements
                            .into_iter()
                            .map(|r| r.get().as_bytes().to_vec())
                            .collect();
                        if elements.is_empty() {
                            // An empty array is an outer-level invalid
                            // request, not a zero-length batch.
                            context.make_error_response(ErrorObject::invalid_request());
                            Err(DispatchError::InvalidRequest)
                        } else {
                            self.process_raw_batch(&elements, context);
                            return Ok(());
                        }
                    }
                    Err(source) => {
                        context.make_error_response(ErrorObject::parse_error());
                        Err(DispatchError::Parse(source))
                    }
                }
            }
            _ => {
                context.make_error_response(ErrorObject::invalid_request());
                Err(DispatchError::InvalidRequest)
            }
        };

        if let Err(rebuild) = context.rebuild_raw_response() {
            warn!(error = %rebuild, "could not rebuild raw response");
        }
        outcome
    }

    /// Process one raw request to completion: parse, route, run the
    /// pre-pipeline, invoke, run the post-pipeline, rebuild the raw
    /// response. Both pipelines run around the invocation whenever the
    /// method was found; an unknown method short-circuits to Method Not
    /// Found.
    pub fn process_raw_request(&self, context: &mut RequestContext) -> Result<(), DispatchError> {
        if let Err(parse) = context.parse_raw_request() {
            if let Err(rebuild) = context.rebuild_raw_response() {
                warn!(error = %rebuild, "could not rebuild raw response");
            }
            return Err(parse);
        }

        let outcome = match self.get_method(&context.request.method) {
            Some(method) => {
                context.apply_pipeline(&self.pre_stages);
                let outcome = invoke_method(context, method);
                context.apply_pipeline(&self.post_stages);
                outcome
            }
            None => {
                debug!(method = %context.request.method, "method not found");
                context.make_error_response(ErrorObject::method_not_found());
                Ok(())
            }
        };

        if let Err(rebuild) = context.rebuild_raw_response() {
            warn!(error = %rebuild, "could not rebuild raw response");
        }
        outcome
    }

    /// Process a batch of raw request elements.
    ///
    /// Each element runs against a fresh clone of the outer context, so
    /// elements share the registry and pipelines but never each other's
    /// request/response state or side-channel map. Per-element raw
    /// responses are collected in input order into a JSON array that
    /// becomes the outer raw response; a failing element produces an
    /// error response at its position and never aborts the batch.
    pub fn process_raw_batch(&self, batch: &[Vec<u8>], context: &mut RequestContext) {
        let mut responses = Vec::with_capacity(batch.len());

        for raw_request in batch {
            let mut element = context.clone();
            element.raw_request = raw_request.clone();
            if let Err(error) = self.process_raw_request(&mut element) {
                debug!(error = %error, "batch element failed");
            }
            responses.push(element.raw_response);
        }

        // Each element is serializer output, so splicing them into an
        // array keeps the whole buffer well-formed.
        let total: usize = responses.iter().map(Vec::len).sum();
        let mut raw = Vec::with_capacity(total + responses.len() + 1);
        raw.push(b'[');
        for (i, response) in responses.iter().enumerate() {
            if i > 0 {
                raw.push(b',');
            }
            raw.extend_from_slice(response);
        }
        raw.push(b']');
        context.raw_response = raw;
    }
}
