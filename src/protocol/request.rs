//! Incoming request envelope.

use serde::Deserialize;
use serde_json::value::RawValue;

use super::id::RequestId;

/// A decoded JSON-RPC 2.0 request.
///
/// `params` stays undecoded here: its expected shape (array, object, or
/// bare value) depends on the target method's arity, which is only known
/// after the registry lookup. Missing members decode to their defaults so
/// protocol validation can report them with the proper error codes instead
/// of failing the decode outright.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: RequestId,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Option<Box<RawValue>>,
}

impl Request {
    /// A request without an `id` member is a notification: it must never
    /// produce a response, not even an error one.
    #[inline]
    pub fn is_notification(&self) -> bool {
        !self.id.is_set()
    }
}
