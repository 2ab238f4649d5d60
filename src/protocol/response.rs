//! Outgoing response envelope.
//!
//! A JSON-RPC 2.0 response carries either a `result` or an `error`, never
//! both. [`ResponsePayload`] encodes that exclusivity in the type: there is
//! no way to construct a response with both members, and the success form
//! always serializes a `result` key (as `null` for void methods).

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use super::id::RequestId;
use super::VERSION;
use crate::error::RpcError;

/// The mutually exclusive body of a response.
#[derive(Debug)]
pub enum ResponsePayload {
    Result(Value),
    Error(RpcError),
}

/// A complete response, ready for the encoder.
#[derive(Debug)]
pub struct Response {
    pub id: RequestId,
    pub payload: ResponsePayload,
}

impl Response {
    /// Build the success form.
    pub fn result(id: RequestId, result: Value) -> Self {
        Self {
            id,
            payload: ResponsePayload::Result(result),
        }
    }

    /// Build the error form.
    pub fn error(id: RequestId, error: RpcError) -> Self {
        Self {
            id,
            payload: ResponsePayload::Error(error),
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self.payload, ResponsePayload::Error(_))
    }
}

/// Wire shape of the `error` member. `data` is always emitted, as `null`
/// when unset.
#[derive(serde::Serialize)]
struct WireError<'a> {
    code: i32,
    message: &'a str,
    data: &'a Option<Value>,
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("jsonrpc", VERSION)?;
        map.serialize_entry("id", &self.id)?;
        match &self.payload {
            ResponsePayload::Result(result) => map.serialize_entry("result", result)?,
            ResponsePayload::Error(error) => map.serialize_entry(
                "error",
                &WireError {
                    code: error.code,
                    message: &error.message,
                    data: &error.data,
                },
            )?,
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(raw: &str) -> RequestId {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_result_form() {
        let res = Response::result(id("1"), json!("hello"));
        let text = serde_json::to_string(&res).unwrap();
        assert_eq!(text, r#"{"jsonrpc":"2.0","id":1,"result":"hello"}"#);
    }

    #[test]
    fn test_void_result_serializes_null() {
        let res = Response::result(id("null"), Value::Null);
        let text = serde_json::to_string(&res).unwrap();
        assert_eq!(text, r#"{"jsonrpc":"2.0","id":null,"result":null}"#);
    }

    #[test]
    fn test_error_form_keeps_null_data() {
        let res = Response::error(id(r#""7""#), RpcError::method_not_found("nope"));
        let text = serde_json::to_string(&res).unwrap();
        assert_eq!(
            text,
            r#"{"jsonrpc":"2.0","id":"7","error":{"code":-32601,"message":"No such method: nope","data":null}}"#
        );
    }

    #[test]
    fn test_result_and_error_are_exclusive() {
        let success = serde_json::to_value(Response::result(id("1"), json!(1))).unwrap();
        assert!(success.get("error").is_none());

        let failure =
            serde_json::to_value(Response::error(id("1"), RpcError::internal("x"))).unwrap();
        assert!(failure.get("result").is_none());
    }

    #[test]
    fn test_unset_id_serializes_null() {
        let res = Response::error(RequestId::default(), RpcError::parse_error("bad"));
        let value = serde_json::to_value(&res).unwrap();
        assert_eq!(value["id"], Value::Null);
    }

    #[test]
    fn test_error_data_round_trips() {
        let res = Response::error(
            id("5"),
            RpcError::invalid_params("m: bad").with_data(json!({"raw": [1, 2]})),
        );
        let value = serde_json::to_value(&res).unwrap();
        assert_eq!(value["error"]["data"], json!({"raw": [1, 2]}));
    }
}
