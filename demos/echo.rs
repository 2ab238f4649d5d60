//! Echo server - simple JSON-RPC 2.0 endpoint over HTTP.
//!
//! This example demonstrates:
//! - Registering typed method handlers, including a variadic one
//! - Grouping methods under a service name
//! - Serving the registry over HTTP
//!
//! # Calling it
//!
//! ```sh
//! curl -s localhost:8080 \
//!     -H 'Content-Type: application/json' \
//!     -d '{"jsonrpc":"2.0","id":1,"method":"multiecho","params":["Hello","world!"]}'
//! # {"jsonrpc":"2.0","id":1,"result":"Hello world!"}
//! ```

use std::sync::Arc;

use jsonwire::handler::ServiceScope;
use jsonwire::{RpcError, Server, Service, Variadic};

/// Methods registered as `Math.*`.
struct Math;

impl Service for Math {
    const NAME: &'static str = "Math";

    fn register(self: Arc<Self>, scope: &mut ServiceScope<'_>) {
        scope.method("add", |a: f64, b: f64| async move { a + b });
        scope.method("div", |a: f64, b: f64| async move {
            if b == 0.0 {
                return Err(RpcError::invalid_params("div: division by zero"));
            }
            Ok(a / b)
        });
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let mut server = Server::new().with_service(Math);

    server.register("echo", |s: String| async move { s });
    server.register("multiecho", |words: Variadic<String>| async move {
        words.join(" ")
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    println!("listening on http://{}", listener.local_addr()?);

    jsonwire::serve(Arc::new(server), listener).await
}
