//! Wire framing selection.
//!
//! # Responsibilities
//! - Choose length-delimited or chunked framing from the declared body length
//! - Stamp exactly one of `Content-Length` / `Transfer-Encoding: chunked`
//! - Produce chunk prefixes and the terminal marker for chunked bodies

use http::header::{HeaderValue, CONTENT_LENGTH, TRANSFER_ENCODING};
use serde::Serialize;

use crate::http::Headers;

/// Terminal zero-length chunk (no trailers).
const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Framing mode for a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "length", rename_all = "snake_case")]
pub enum Framing {
    /// Exactly `n` body bytes follow the head; reaching `n` ends the body.
    LengthDelimited(u64),
    /// Each write is wrapped in a sized chunk; a zero-length chunk ends the body.
    Chunked,
}

impl Framing {
    /// Pick framing from a body's known length.
    pub fn select(known_length: Option<u64>) -> Self {
        match known_length {
            Some(n) => Framing::LengthDelimited(n),
            None => Framing::Chunked,
        }
    }

    /// Total body bytes, when known up front.
    pub fn total(&self) -> Option<u64> {
        match self {
            Framing::LengthDelimited(n) => Some(*n),
            Framing::Chunked => None,
        }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self, Framing::Chunked)
    }

    /// Replace any framing headers with the single header this mode requires.
    pub fn stamp(&self, headers: &mut Headers) {
        headers.remove(&CONTENT_LENGTH);
        headers.remove(&TRANSFER_ENCODING);
        match self {
            Framing::LengthDelimited(n) => headers.append(CONTENT_LENGTH, HeaderValue::from(*n)),
            Framing::Chunked => {
                headers.append(TRANSFER_ENCODING, HeaderValue::from_static("chunked"))
            }
        }
    }

    /// Size line written before a chunk's data, e.g. `"1A\r\n"`.
    pub fn chunk_prefix(len: usize) -> String {
        format!("{:X}\r\n", len)
    }

    /// Bytes written after the last data write.
    pub fn terminator(&self) -> &'static [u8] {
        match self {
            Framing::LengthDelimited(_) => b"",
            Framing::Chunked => LAST_CHUNK,
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Framing::LengthDelimited(_) => "length",
            Framing::Chunked => "chunked",
        }
    }
}

impl std::fmt::Display for Framing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Framing::LengthDelimited(n) => write!(f, "content-length {}", n),
            Framing::Chunked => write!(f, "chunked"),
        }
    }
}
