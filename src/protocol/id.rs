//! Request id carrier.
//!
//! JSON-RPC 2.0 ids may be strings, numbers, or `null`, and the id a client
//! sent must come back byte-identical in the response. [`RequestId`] keeps
//! the undecoded bytes (via [`RawValue`]) instead of normalizing them, so
//! `1e3` stays `1e3` and `"001"` stays `"001"` across the round-trip.
//!
//! The carrier also records whether the `id` member was present at all:
//! a request without one is a notification, while `"id": null` is a call
//! that gets a response with `"id": null`. The two are different protocol
//! states and must not be conflated.

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::value::RawValue;

/// The raw `id` member of a request or response.
///
/// Unset (member absent during decode) serializes as `null`; use
/// [`RequestId::is_set`] to tell a notification apart from an explicit
/// `"id": null`.
#[derive(Debug, Clone, Default)]
pub struct RequestId(Option<Box<RawValue>>);

impl RequestId {
    /// Whether the `id` member was present in the decoded request.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// The raw JSON text of the id, if one was present.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref().map(RawValue::get)
    }
}

impl PartialEq for RequestId {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // None serializes as JSON null, matching an explicit null id.
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let text = raw.get();

        // Only strings, numbers, and null are valid id shapes.
        let valid = match text.as_bytes().first() {
            Some(b'"') => true,
            Some(b'-' | b'0'..=b'9') => true,
            _ => text == "null",
        };
        if !valid {
            return Err(de::Error::custom(format_args!(
                "\"id\" is not a valid type: {text}"
            )));
        }

        Ok(RequestId(Some(raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Result<RequestId, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_accepts_string_number_null() {
        assert_eq!(decode(r#""abc""#).unwrap().as_str(), Some(r#""abc""#));
        assert_eq!(decode("42").unwrap().as_str(), Some("42"));
        assert_eq!(decode("-3.5").unwrap().as_str(), Some("-3.5"));
        assert_eq!(decode("null").unwrap().as_str(), Some("null"));
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(decode("true").is_err());
        assert!(decode("[1]").is_err());
        assert!(decode(r#"{"a":1}"#).is_err());
    }

    #[test]
    fn test_unset_vs_null() {
        let unset = RequestId::default();
        assert!(!unset.is_set());

        let null = decode("null").unwrap();
        assert!(null.is_set());

        // Both serialize as null on the wire.
        assert_eq!(serde_json::to_string(&unset).unwrap(), "null");
        assert_eq!(serde_json::to_string(&null).unwrap(), "null");
    }

    #[test]
    fn test_round_trip_preserves_bytes() {
        for raw in [r#""1""#, "1", "1e3", "0.500", r#""with \"quotes\"""#] {
            let id = decode(raw).unwrap();
            assert_eq!(serde_json::to_string(&id).unwrap(), raw);
        }
    }
}
