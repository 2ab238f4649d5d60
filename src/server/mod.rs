//! Server module - the handler surface tying registry, codec, and
//! transports together.
//!
//! A [`Server`] owns a method [`Registry`] and an [`Encoder`]. It serves
//! the same registry over two transports:
//! - [`Server::serve_http`] - one request/response transaction per HTTP
//!   POST (see `http`)
//! - [`Server::serve_conn`] - a long-lived bidirectional stream with
//!   concurrent in-flight calls (see `stream`)
//!
//! # Example
//!
//! ```ignore
//! let mut server = Server::new();
//! server.register("echo", |s: String| async move { s });
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! jsonwire::server::serve(Arc::new(server), listener).await?;
//! ```

mod http;
mod stream;

pub use http::serve;

use std::sync::Arc;

use serde_json::value::RawValue;

use crate::codec::{Encoder, JsonEncoder};
use crate::error::RpcError;
use crate::handler::{CallContext, Handler, Method, Registry, Service};
use crate::protocol::{Request, RequestId, Response, VERSION};

/// A JSON-RPC 2.0 server: a registry of methods plus an encoder.
///
/// Registration is a configuration step; once the server starts serving,
/// the registry is read-only and the server can be shared freely behind an
/// `Arc`.
pub struct Server {
    registry: Registry,
    encoder: Arc<dyn Encoder>,
}

impl Server {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            encoder: Arc::new(JsonEncoder),
        }
    }

    /// Register a handler under the given name. See
    /// [`Registry::register`].
    pub fn register<F, T>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Handler<T>,
        T: 'static,
    {
        self.registry.register(name, handler);
    }

    /// Register a service's methods under `"{Name}.{method}"` names.
    pub fn register_service<S: Service>(&mut self, service: S) {
        self.registry.register_service(service);
    }

    /// Like [`register_service`](Self::register_service) with a
    /// caller-chosen type name.
    pub fn register_service_as<S: Service>(&mut self, name: &str, service: S) {
        self.registry.register_service_as(name, service);
    }

    /// Chaining variant of [`register_service`](Self::register_service)
    /// for construction sites.
    pub fn with_service<S: Service>(mut self, service: S) -> Self {
        self.register_service(service);
        self
    }

    /// Replace the response encoder. The default emits compact JSON, one
    /// line per response.
    pub fn set_encoder<E: Encoder + 'static>(&mut self, encoder: E) {
        self.encoder = Arc::new(encoder);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn encoder(&self) -> &Arc<dyn Encoder> {
        &self.encoder
    }

    /// Classify a decoded request: protocol gate, then method resolution.
    /// The returned call owns everything a worker task needs.
    pub(crate) fn frame(&self, request: Request) -> FramedCall {
        let Request {
            jsonrpc,
            id,
            method,
            params,
        } = request;

        let notification = !id.is_set();
        let outcome = if jsonrpc != VERSION {
            Err(RpcError::invalid_request(
                "Invalid protocol: expected jsonrpc: 2.0",
            ))
        } else {
            match self.registry.get(&method) {
                Some(entry) => Ok((entry.clone(), params)),
                None => Err(RpcError::method_not_found(&method)),
            }
        };

        FramedCall {
            id,
            notification,
            outcome,
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

/// A framed request: id, notification flag, and either the resolved method
/// or the protocol error that will become its response.
pub(crate) struct FramedCall {
    pub(crate) id: RequestId,
    pub(crate) notification: bool,
    outcome: Result<(Arc<dyn Method>, Option<Box<RawValue>>), RpcError>,
}

impl FramedCall {
    /// Execute the call and build its response. Runs the target method
    /// even for notifications; the caller decides whether the response is
    /// dropped or sent.
    pub(crate) async fn run(self, cx: CallContext) -> Response {
        match self.outcome {
            Err(err) => Response::error(self.id, err),
            Ok((method, params)) => match method.call(cx, params).await {
                Ok(value) => Response::result(self.id, value),
                Err(err) => Response::error(self.id, err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{INVALID_REQUEST, METHOD_NOT_FOUND};
    use serde_json::json;

    fn request(text: &str) -> Request {
        serde_json::from_str(text).unwrap()
    }

    fn echo_server() -> Server {
        let mut server = Server::new();
        server.register("echo", |s: String| async move { s });
        server
    }

    #[tokio::test]
    async fn test_frame_and_run() {
        let server = echo_server();
        let framed =
            server.frame(request(r#"{"jsonrpc":"2.0","id":1,"method":"echo","params":"hi"}"#));

        assert!(!framed.notification);
        let response = framed.run(CallContext::new()).await;
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["result"], json!("hi"));
    }

    #[tokio::test]
    async fn test_protocol_gate() {
        let server = echo_server();
        let framed =
            server.frame(request(r#"{"jsonrpc":"1.0","id":1,"method":"echo","params":"hi"}"#));

        let response = framed.run(CallContext::new()).await;
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], json!(INVALID_REQUEST));
        assert_eq!(
            value["error"]["message"],
            json!("Invalid protocol: expected jsonrpc: 2.0")
        );
        // The id is echoed even on protocol errors.
        assert_eq!(value["id"], json!(1));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = echo_server();
        let framed = server.frame(request(r#"{"jsonrpc":"2.0","id":"x","method":"nope"}"#));

        let response = framed.run(CallContext::new()).await;
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], json!(METHOD_NOT_FOUND));
        assert_eq!(value["error"]["message"], json!("No such method: nope"));
    }

    #[test]
    fn test_notification_classification() {
        let server = echo_server();
        assert!(
            server
                .frame(request(r#"{"jsonrpc":"2.0","method":"echo","params":"hi"}"#))
                .notification
        );
        assert!(
            !server
                .frame(request(r#"{"jsonrpc":"2.0","id":null,"method":"echo","params":"hi"}"#))
                .notification
        );
    }
}
