//! Classification of non-success GitHub responses
//!
//! GitHub reports both primary and secondary rate limits as 403 (sometimes
//! 429). They are told apart from plain permission failures by the
//! `x-ratelimit-remaining` header or the message text.

use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::ApiError;

/// Rate limit phrases in GitHub error messages.
const RATE_LIMIT_PATTERNS: &[&str] = &[
    "api rate limit exceeded",
    "secondary rate limit",
    "abuse detection",
];

/// Human-readable message from a GitHub error body.
///
/// Uses `message`, plus any `errors[].message` entries (422 responses list
/// per-field problems there).
pub fn error_message(data: &Value) -> String {
    let mut message = match data.get("message").and_then(Value::as_str) {
        Some(m) => m.to_string(),
        None => match data {
            Value::String(s) if !s.is_empty() => s.clone(),
            _ => String::from("<no message>"),
        },
    };

    let details: Vec<&str> = data
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    if !details.is_empty() {
        message = format!("{message} ({})", details.join("; "));
    }
    message
}

/// Whether a 403/429 response is a rate limit rather than a permission error.
pub fn is_rate_limited(status: u16, headers: &HeaderMap, message: &str) -> bool {
    if status == 429 {
        return true;
    }
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    if exhausted {
        return true;
    }
    let lower = message.to_lowercase();
    RATE_LIMIT_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Map a non-success response to an `ApiError`.
pub fn error_for_status(status: u16, headers: &HeaderMap, data: &Value) -> ApiError {
    let message = error_message(data);
    match status {
        401 => ApiError::Unauthorized(message),
        403 | 429 if is_rate_limited(status, headers, &message) => ApiError::RateLimited(message),
        403 => ApiError::Forbidden(message),
        404 => ApiError::NotFound(message),
        422 => ApiError::Validation(message),
        _ => ApiError::Status { status, message },
    }
}
