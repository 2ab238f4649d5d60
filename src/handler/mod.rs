//! Handler module - typed methods, the registry, and the call context.
//!
//! Provides:
//! - [`Registry`] - maps method names to handlers
//! - [`Handler`] / [`Params`] / [`IntoOutcome`] - the shapes a registered
//!   function may take
//! - [`Variadic`] - trailing-parameter marker for variadic methods
//! - [`Service`] - bulk registration under `"Type.method"` names
//! - [`CallContext`] - cancellation and caller data, handed to handlers
//!   that take it as their first parameter
//!
//! # Example
//!
//! ```ignore
//! let mut registry = Registry::new();
//!
//! registry.register("echo", |s: String| async move { s });
//!
//! registry.register("divide", |a: f64, b: f64| async move {
//!     if b == 0.0 {
//!         return Err(RpcError::invalid_params("divide: division by zero"));
//!     }
//!     Ok(a / b)
//! });
//! ```

mod context;
mod method;
mod registry;

pub use context::CallContext;
pub use method::{marker, BoxFuture, Handler, IntoOutcome, Method, Params, TypedMethod, Variadic};
pub use registry::{Registry, Service, ServiceScope};
