//! Response encoding plug point.
//!
//! Every response is encoded into an in-memory buffer before it touches a
//! transport, so the encoder's output target is always a byte buffer. The
//! default [`JsonEncoder`] writes compact JSON followed by a newline, which
//! keeps stream output line-delimited for free.
//!
//! Swap the encoder via `Server::set_encoder` to adjust serialization
//! policy, e.g. rendering absent collections as `[]` instead of `null`.

use crate::protocol::Response;

/// Encodes one response into the supplied buffer.
pub trait Encoder: Send + Sync {
    fn encode(&self, response: &Response, buf: &mut Vec<u8>) -> Result<(), serde_json::Error>;
}

/// Default encoder: compact `serde_json` output, one line per response.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode(&self, response: &Response, buf: &mut Vec<u8>) -> Result<(), serde_json::Error> {
        serde_json::to_writer(&mut *buf, response)?;
        buf.push(b'\n');
        Ok(())
    }
}
