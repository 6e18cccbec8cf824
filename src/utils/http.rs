// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::BackendConfig;

/// Unique constraint violation (PostgreSQL).
pub const CODE_UNIQUE_VIOLATION: &str = "23505";
/// Single-row request matched no rows (PostgREST).
pub const CODE_NO_ROWS: &str = "PGRST116";
/// Insufficient privilege (PostgreSQL).
pub const CODE_PERMISSION_DENIED: &str = "42501";

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &BackendConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Error body returned by the data API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default, alias = "error")]
    message: Option<String>,
}

/// Map a failed response to an `AppError`.
///
/// Unique violations become `AlreadyExists` so callers never match on codes.
pub fn error_from_response(status: StatusCode, body: &[u8]) -> AppError {
    let parsed: Option<ErrorBody> = serde_json::from_slice(body).ok();
    let (code, message) = match parsed {
        Some(b) => (
            b.code.unwrap_or_else(|| status.as_u16().to_string()),
            b.message.unwrap_or_default(),
        ),
        None => (
            status.as_u16().to_string(),
            String::from_utf8_lossy(body).trim().to_string(),
        ),
    };

    match code.as_str() {
        CODE_UNIQUE_VIOLATION => AppError::already_exists(message),
        CODE_NO_ROWS => AppError::not_found(message),
        CODE_PERMISSION_DENIED => AppError::Unauthorized(message),
        _ if status == StatusCode::CONFLICT => AppError::already_exists(message),
        _ if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
            AppError::Unauthorized(message)
        }
        _ => AppError::remote(code, message),
    }
}

/// Total from a `Content-Range` header such as `0-9/42` or `*/0`.
pub fn parse_content_range_total(value: &str) -> Option<usize> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}
