//! Client identification utilities
//!
//! Helpers for pulling client-supplied values out of HTTP headers.

use axum::http::{HeaderMap, header};

/// Longest User-Agent kept on a session; anything past it is cut off
pub const MAX_USER_AGENT_LENGTH: usize = 512;

/// Extract the User-Agent header
///
/// Returns `None` if the header is absent, not visible ASCII, or blank.
/// Overlong values are truncated to [`MAX_USER_AGENT_LENGTH`] bytes.
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    let value = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())?
        .trim();

    if value.is_empty() {
        return None;
    }

    // to_str() guarantees visible ASCII, so any byte index is a char boundary
    let end = value.len().min(MAX_USER_AGENT_LENGTH);
    Some(value[..end].to_string())
}

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// The scheme is matched case-insensitively. Returns `None` for a missing
/// header, a different scheme, or an empty token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;

    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}
