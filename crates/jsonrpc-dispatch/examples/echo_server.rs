//! Echo JSON-RPC Example
//!
//! Demonstrates method registration through a handler with a name
//! prefix, pipeline stages, and raw-bytes-in/raw-bytes-out dispatch,
//! including a batch.

use jsonrpc_dispatch::{
    ErrorObject, Handler, JsonRpcServer, MethodDescriptor, RequestContext,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Deserialize)]
struct EchoParams {
    name: String,
}

#[derive(Serialize)]
struct EchoResult {
    value: String,
}

struct EchoHandler {
    /// Names longer than this are rejected with a domain error.
    max_len: usize,
}

impl Handler for EchoHandler {
    fn methods(&self) -> Vec<MethodDescriptor> {
        let max_len = self.max_len;
        vec![
            MethodDescriptor::new("rpc_echo", move |params: EchoParams| {
                if params.name.len() > max_len {
                    return Err(ErrorObject::new(-32000, "name too long", None));
                }
                Ok(EchoResult { value: params.name })
            }),
            MethodDescriptor::new("rpc_shout", |params: EchoParams| {
                Ok(EchoResult {
                    value: params.name.to_uppercase(),
                })
            }),
        ]
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let mut server = JsonRpcServer::new();
    server.add_handler(&EchoHandler { max_len: 32 }, "rpc_");

    // A pipeline stage tagging every dispatch; a real deployment would
    // hang auth or metrics here.
    server.add_pre_stage(|ctx: &mut RequestContext| {
        ctx.data.insert("traced".into(), json!(true));
        true
    });

    let inputs = [
        r#"{"jsonrpc":"2.0","id":"1","method":"echo","params":{"name":"lol"}}"#,
        r#"{"jsonrpc":"2.0","id":"2","method":"shout","params":{"name":"quiet"}}"#,
        r#"{"jsonrpc":"2.0","id":"3","method":"missing"}"#,
        r#"[{"jsonrpc":"2.0","id":"4","method":"echo","params":{"name":"batched"}},{"bad"#,
        r#"[{"jsonrpc":"2.0","id":"5","method":"echo","params":{"name":"batched"}},{"fine":1}]"#,
    ];

    for input in inputs {
        let mut ctx = RequestContext::with_raw_request(input);
        let _ = server.process_raw_input(&mut ctx);
        println!("<- {}", input);
        println!("-> {}", String::from_utf8_lossy(&ctx.raw_response));
    }
}
