//! Request encoding and reply reassembly.
//!
//! Requests go out as a single ASCII JSON object. Replies come back as one JSON
//! object split over any number of reads, with no length prefix or delimiter,
//! so the assembler decodes the growing buffer until a whole envelope parses.

use crate::error::ProtocolError;
use crate::message::{CommandRequest, ReplyEnvelope};
use crate::MAX_REPLY_SIZE;
use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

/// Encodes requests for the wire.
pub struct Encoder;

impl Encoder {
    /// Encodes a request as ASCII JSON.
    pub fn encode_request(request: &CommandRequest) -> Result<Bytes, ProtocolError> {
        let json = serde_json::to_string(request)?;
        Ok(Bytes::from(escape_non_ascii(&json)))
    }
}

/// Rewrites every non-ASCII character as a `\uXXXX` escape.
///
/// Only valid on serializer output, where non-ASCII text can appear only inside
/// string literals.
fn escape_non_ascii(json: &str) -> String {
    if json.is_ascii() {
        return json.to_string();
    }
    let mut out = String::with_capacity(json.len() + 16);
    let mut units = [0u16; 2];
    for ch in json.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

/// Accumulates reply chunks until they form one complete envelope.
pub struct ReplyAssembler {
    buffer: BytesMut,
    max_size: usize,
}

impl ReplyAssembler {
    pub fn new() -> Self {
        Self::with_max_size(MAX_REPLY_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(1024),
            max_size,
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let size = self.buffer.len() + data.len();
        if size > self.max_size {
            return Err(ProtocolError::ReplyTooLarge {
                size,
                max: self.max_size,
            });
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Attempts to decode an envelope from everything buffered so far.
    ///
    /// Returns `Ok(None)` while the document is still incomplete. A syntax
    /// error, or a complete value that is not an envelope, is an error.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<ReplyEnvelope<T>>, ProtocolError> {
        let mut stream =
            serde_json::Deserializer::from_slice(&self.buffer).into_iter::<ReplyEnvelope<T>>();

        match stream.next() {
            None => Ok(None),
            Some(Ok(envelope)) => {
                let consumed = stream.byte_offset();
                let trailing = &self.buffer[consumed..];
                if !trailing.iter().all(u8::is_ascii_whitespace) {
                    tracing::warn!(
                        "ignoring {} trailing bytes after reply envelope",
                        trailing.len()
                    );
                }
                Ok(Some(envelope))
            }
            Some(Err(e)) if e.classify() == Category::Eof => {
                tracing::trace!("reply incomplete after {} bytes", self.buffer.len());
                Ok(None)
            }
            Some(Err(e)) => Err(ProtocolError::MalformedReply(e.to_string())),
        }
    }

    /// Appends a chunk and attempts to decode.
    pub fn push<T: DeserializeOwned>(
        &mut self,
        chunk: &[u8],
    ) -> Result<Option<ReplyEnvelope<T>>, ProtocolError> {
        self.extend(chunk)?;
        self.decode()
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for ReplyAssembler {
    fn default() -> Self {
        Self::new()
    }
}
