//! # jsonwire
//!
//! A JSON-RPC 2.0 server core: register plain async functions, serve them
//! over HTTP transactions or long-lived bidirectional byte streams.
//!
//! Registered functions need no protocol awareness. The only constraints:
//!
//! - the first parameter may be a [`CallContext`]
//! - the remaining parameters must deserialize from JSON (the last may be
//!   [`Variadic`])
//! - the return value must serialize as JSON, optionally wrapped in a
//!   `Result` whose error becomes (or already is) an [`RpcError`]
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jsonwire::Server;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let mut server = Server::new();
//!     server.register("echo", |s: String| async move { s });
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     jsonwire::server::serve(Arc::new(server), listener).await
//! }
//! ```
//!
//! Calling it follows standard JSON-RPC 2.0 semantics:
//!
//! ```text
//! => {"jsonrpc": "2.0", "id": 1, "method": "echo", "params": ["Hello world!"]}
//! <= {"jsonrpc": "2.0", "id": 1, "result": "Hello world!"}
//! ```
//!
//! Services group related methods under `"Type.method"` names; see
//! [`Service`]. The stream transport ([`Server::serve_conn`]) runs calls
//! concurrently and frames responses in completion order, with clients
//! correlating by id.

pub mod codec;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod server;

pub use codec::{Encoder, JsonEncoder};
pub use error::{BoxError, RpcError};
pub use handler::{CallContext, Registry, Service, ServiceScope, Variadic};
pub use protocol::{Request, RequestId, Response};
pub use server::{serve, Server};
