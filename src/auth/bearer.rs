//! Bearer token parsing for the `Authorization` header.

use axum::http::{HeaderMap, header};

const BEARER_PREFIX: &str = "bearer ";

/// Extract the token from the `Authorization` header.
///
/// The `Bearer ` scheme prefix is optional and matched case-insensitively.
/// A raw token without a scheme is accepted as is. Empty values yield `None`.
pub fn get_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim_start();

    let token = match value.get(..BEARER_PREFIX.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(BEARER_PREFIX) => {
            value[BEARER_PREFIX.len()..].trim()
        }
        _ => value.trim(),
    };

    if token.is_empty() { None } else { Some(token) }
}
