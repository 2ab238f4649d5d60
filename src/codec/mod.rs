//! Codec module - turning bytes into requests and responses into bytes.
//!
//! This module provides both directions of the wire boundary:
//!
//! - [`FrameDecoder`] - push-based incremental decode of a JSON value
//!   stream, with the syntax/other error split the protocol taxonomy needs
//! - [`Encoder`] / [`JsonEncoder`] - the response encoding plug point and
//!   its standard-library-JSON default

mod decode;
mod encode;

pub use decode::{decode_error, FrameDecoder};
pub use encode::{Encoder, JsonEncoder};
