//! Content-Length frame codec.
//!
//! One frame is a header block (`key: value` lines) terminated by a blank
//! line, followed by exactly `Content-Length` bytes of UTF-8 JSON. Frames
//! are atomic: a frame either decodes completely or not at all, no matter
//! how the byte stream is chunked by the transport.

use serde_json::Value;
use thiserror::Error;

/// A header block arrived but cannot be turned into a frame. Once this
/// happens the stream offset is lost, so the session is unusable past this
/// point.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("missing Content-Length header")]
    MissingContentLength,

    #[error("invalid Content-Length value: {0:?}")]
    InvalidContentLength(String),

    #[error("frame header block is not valid UTF-8")]
    HeaderNotUtf8,

    #[error("frame payload is not valid JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Returns the offset just past the earliest blank-line separator.
/// Accepts both `\r\n\r\n` and bare `\n\n`.
fn find_blank_line(buf: &[u8]) -> Option<usize> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n");
    let lf = buf.windows(2).position(|w| w == b"\n\n");
    match (crlf, lf) {
        (Some(c), Some(l)) if l < c => Some(l + 2),
        (Some(c), _) => Some(c + 4),
        (None, Some(l)) => Some(l + 2),
        (None, None) => None,
    }
}

fn parse_content_length(headers: &str) -> Result<usize, FrameError> {
    for raw_line in headers.lines() {
        let line = raw_line.trim_end_matches('\r').trim();
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            let value = value.trim();
            return value
                .parse::<usize>()
                .map_err(|_| FrameError::InvalidContentLength(value.to_string()));
        }
    }
    Err(FrameError::MissingContentLength)
}

/// Incremental frame decoder.
///
/// The unconsumed byte remainder lives here as an explicit value: feed bytes
/// with [`extend`](Self::extend), then drain complete frames with
/// [`next_frame`](Self::next_frame) until it returns `Ok(None)`. Splitting
/// the input at any byte offset yields the same frame sequence as feeding it
/// whole.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pops the next complete frame, or `Ok(None)` when more bytes are
    /// needed. Errors are session-fatal (see [`FrameError`]).
    pub fn next_frame(&mut self) -> Result<Option<Value>, FrameError> {
        let Some(header_end) = find_blank_line(&self.buf) else {
            return Ok(None);
        };
        let header =
            std::str::from_utf8(&self.buf[..header_end]).map_err(|_| FrameError::HeaderNotUtf8)?;
        let len = parse_content_length(header)?;

        if self.buf.len() < header_end + len {
            return Ok(None);
        }

        let message = serde_json::from_slice(&self.buf[header_end..header_end + len])?;
        self.buf.drain(..header_end + len);
        Ok(Some(message))
    }
}

/// Serializes `message` as one Content-Length frame. The length counts
/// payload bytes, not characters, so multi-byte content round-trips.
pub fn encode_frame(message: &Value) -> Result<Vec<u8>, FrameError> {
    let payload = serde_json::to_vec(message)?;
    let mut out = Vec::with_capacity(payload.len() + 32);
    out.extend_from_slice(format!("Content-Length: {}\r\n\r\n", payload.len()).as_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}
