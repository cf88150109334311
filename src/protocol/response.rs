//! Inbound response decoding

use crate::error::{BuildClientError, Result};
use crate::types::reply::{ControlToken, Reply};

use super::TAG;
use super::escape::unescape;

/// Strip diagnostic noise and return the raw payload after the tag
///
/// # Errors
/// Returns `Framing` if the tag does not occur anywhere in `response`
pub fn extract_payload(response: &str) -> Result<&str> {
    response
        .find(TAG)
        .map(|start| &response[start + TAG.len()..])
        .ok_or_else(|| BuildClientError::framing(response))
}

/// Decode one response into a typed reply
///
/// Control tokens are matched exactly and returned untouched; anything else
/// has the escape mapping reverted.
///
/// # Errors
/// Returns `Framing` if the tag does not occur anywhere in `response`
pub fn decode_response(response: &str) -> Result<Reply> {
    let raw = extract_payload(response)?;
    Ok(match ControlToken::from_wire(raw) {
        Some(token) => Reply::Control(token),
        None => Reply::Text(unescape(raw)),
    })
}
