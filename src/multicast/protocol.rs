//! Invalidation wire format.
//!
//! A datagram payload is the prefix itself, as ASCII. Trailing CR, LF and NUL
//! bytes are ignored so that payloads produced by line-oriented tools decode
//! to the intended prefix. An empty payload carries no prefix and is ignored
//! rather than clearing the whole store.

use crate::error::{CacheError, Result};

/// Largest payload read from a single datagram.
pub const MAX_DATAGRAM_SIZE: usize = 8192;

fn is_terminator(byte: u8) -> bool {
    matches!(byte, b'\r' | b'\n' | b'\0')
}

/// Decodes a datagram into the prefix it carries.
///
/// Returns `Ok(None)` for an empty payload and an error for non-ASCII data.
pub fn decode(payload: &[u8]) -> Result<Option<&str>> {
    let end = payload
        .iter()
        .rposition(|&byte| !is_terminator(byte))
        .map_or(0, |last| last + 1);
    let prefix = &payload[..end];

    if !prefix.is_ascii() {
        return Err(CacheError::InvalidRequest(
            "invalidation payload is not ASCII".to_string(),
        ));
    }
    if prefix.is_empty() {
        return Ok(None);
    }

    std::str::from_utf8(prefix)
        .map(Some)
        .map_err(|e| CacheError::InvalidRequest(e.to_string()))
}

/// Encodes a prefix into a datagram payload.
pub fn encode(prefix: &str) -> Result<Vec<u8>> {
    if prefix.is_empty() {
        return Err(CacheError::InvalidRequest(
            "invalidation prefix cannot be empty".to_string(),
        ));
    }
    if !prefix.is_ascii() {
        return Err(CacheError::InvalidRequest(
            "invalidation prefix must be ASCII".to_string(),
        ));
    }
    if prefix.bytes().last().is_some_and(is_terminator) {
        return Err(CacheError::InvalidRequest(
            "invalidation prefix cannot end with CR, LF or NUL".to_string(),
        ));
    }
    if prefix.len() > MAX_DATAGRAM_SIZE {
        return Err(CacheError::InvalidRequest(format!(
            "invalidation prefix exceeds {} bytes",
            MAX_DATAGRAM_SIZE
        )));
    }

    Ok(prefix.as_bytes().to_vec())
}
