//! Protocol module - JSON-RPC 2.0 wire envelopes.
//!
//! This module implements the data model of the protocol:
//! - [`RequestId`] - raw id bytes, with the absent/null distinction
//! - [`Request`] - decoded request with undecoded `params`
//! - [`Response`] / [`ResponsePayload`] - result/error exclusive envelope

mod id;
mod request;
mod response;

pub use id::RequestId;
pub use request::Request;
pub use response::{Response, ResponsePayload};

/// The only protocol version this server speaks.
pub const VERSION: &str = "2.0";
