//! JSON-RPC 2.0 error values.
//!
//! [`RpcError`] is both the wire payload (`{code, message, data}`) and a
//! regular Rust error: its `Display` output is the `message` field, so a
//! handler can bubble one up with `?` like any other error.
//!
//! Handlers that return `Result<T, E>` may use any error type convertible
//! into [`BoxError`]. An `RpcError` travels to the client verbatim; every
//! other error is wrapped into code [`INTERNAL_ERROR`] with its display
//! text as the message.

use serde_json::Value;
use thiserror::Error;

/// Boxed error type accepted from handler return values.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist / is not available.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameter(s).
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;

/// A JSON-RPC 2.0 error object.
///
/// Returned from a handler, an `RpcError` is sent to the client exactly as
/// constructed, custom codes included. The `data` member is always present
/// on the wire, as `null` when unset.
///
/// Deliberately not `Serialize`: the wire shape lives with the response
/// envelope, and a serializable error would make `Result<T, RpcError>`
/// returns ambiguous at registration sites.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

impl RpcError {
    /// Create an error with the given code and message and no data.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach a `data` member.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("No such method: {method}"))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    /// Convert a boxed handler error into the wire error.
    ///
    /// An `RpcError` passes through verbatim; anything else becomes an
    /// internal error carrying the source's display text.
    pub(crate) fn from_boxed(err: BoxError) -> Self {
        match err.downcast::<RpcError>() {
            Ok(rpc) => *rpc,
            Err(other) => Self::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message() {
        let err = RpcError::new(-32000, "boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_reserved_constructors() {
        assert_eq!(RpcError::parse_error("x").code, PARSE_ERROR);
        assert_eq!(RpcError::invalid_request("x").code, INVALID_REQUEST);
        assert_eq!(RpcError::invalid_params("x").code, INVALID_PARAMS);
        assert_eq!(RpcError::internal("x").code, INTERNAL_ERROR);

        let err = RpcError::method_not_found("frobnicate");
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert_eq!(err.message, "No such method: frobnicate");
    }

    #[test]
    fn test_boxed_rpc_error_passes_through() {
        let original = RpcError::new(42, "custom").with_data(Value::from("ctx"));
        let boxed: BoxError = Box::new(original.clone());

        assert_eq!(RpcError::from_boxed(boxed), original);
    }

    #[test]
    fn test_boxed_other_error_wraps_internal() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let boxed: BoxError = Box::new(io_err);

        let err = RpcError::from_boxed(boxed);
        assert_eq!(err.code, INTERNAL_ERROR);
        assert_eq!(err.message, "disk on fire");
        assert_eq!(err.data, None);
    }

    #[test]
    fn test_question_mark_compatible() {
        fn fails() -> Result<(), BoxError> {
            Err(RpcError::invalid_params("nope"))?
        }
        let err = fails().unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }
}
