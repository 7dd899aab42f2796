//! Shared HTTP response helpers for the API adapter.
//!
//! Centralizes status-code classification so that a refused credential is
//! always reported as `Unauthorized` and never mistaken for a transport fault.

use practice_diff_core::ports::PortError;
use reqwest::StatusCode;

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **401 / 403** → [`PortError::Unauthorized`].
/// - **Other non-success status** → [`PortError::Transport`] with the status
///   code and response body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, PortError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(PortError::Unauthorized(format!("HTTP {}", status.as_u16())));
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(PortError::Transport(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        )));
    }
    Ok(resp)
}

/// Classify a `reqwest` failure: an unreadable body is a decode problem,
/// anything else means the API could not be reached.
pub fn request_error(e: reqwest::Error) -> PortError {
    if e.is_decode() {
        PortError::Unexpected(format!("Undecodable API response: {}", e))
    } else {
        PortError::Transport(e.to_string())
    }
}
