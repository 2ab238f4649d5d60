//! Incremental JSON decoding for byte streams.
//!
//! The stream server reads whatever the transport hands it - half a
//! request, three requests back to back, a request split across reads -
//! so decoding is push-based: [`FrameDecoder::extend`] accumulates bytes
//! and [`FrameDecoder::try_next`] peels off one complete JSON value at a
//! time, reporting `Ok(None)` while the tail value is still incomplete.
//!
//! Values are delimited the way `serde_json`'s stream deserializer
//! delimits them: whitespace or token boundaries. No framing header is
//! imposed; callers that need message framing adapt at the stream edge.

use bytes::{Buf, BytesMut};
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use serde_json::Deserializer;

use crate::error::RpcError;

/// Push-based decoder over a growing byte buffer.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the transport.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Try to decode the next complete value.
    ///
    /// Returns `Ok(None)` when the buffered bytes end mid-value (feed more
    /// input and retry). Any other failure is terminal for the stream.
    pub fn try_next<T: DeserializeOwned>(&mut self) -> Result<Option<T>, serde_json::Error> {
        self.next_value(false)
    }

    /// Decode the next value knowing no more input will arrive.
    ///
    /// At end of stream an incomplete trailing value is a hard error
    /// rather than a reason to wait; `Ok(None)` means the remaining bytes
    /// were only whitespace.
    pub fn finish<T: DeserializeOwned>(&mut self) -> Result<Option<T>, serde_json::Error> {
        self.next_value(true)
    }

    fn next_value<T: DeserializeOwned>(
        &mut self,
        at_eof: bool,
    ) -> Result<Option<T>, serde_json::Error> {
        let (item, offset) = {
            let mut values = Deserializer::from_slice(&self.buf).into_iter::<T>();
            (values.next(), values.byte_offset())
        };

        match item {
            None => {
                // Nothing but whitespace.
                self.buf.clear();
                Ok(None)
            }
            Some(Ok(value)) => {
                self.buf.advance(offset);
                Ok(Some(value))
            }
            Some(Err(err)) if err.is_eof() && !at_eof => Ok(None),
            Some(Err(err)) => Err(err),
        }
    }
}

/// Map a decode failure onto the protocol error taxonomy.
///
/// Lexical syntax errors are parse errors (-32700) and carry the
/// deserializer's message; everything else (bad member types, truncated
/// input, I/O) is an invalid request (-32600).
pub fn decode_error(err: &serde_json::Error) -> RpcError {
    match err.classify() {
        Category::Syntax => RpcError::parse_error(err.to_string()),
        _ => RpcError::invalid_request(err.to_string()),
    }
}
