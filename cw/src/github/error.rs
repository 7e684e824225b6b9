//! Remote API error types

use std::time::Duration;

use reqwest::header::HeaderMap;
use thiserror::Error;
use tracing::debug;

/// Wait used when the remote signals a rate limit without saying for how long
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// Errors that can occur while talking to the hosting API
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Rate limited ({status}), retry after {retry_after:?}")]
    RateLimited { status: u16, retry_after: Duration },

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Build an error from a non-success response
    ///
    /// GitHub reports an exhausted quota as a 403 with `x-ratelimit-remaining: 0`,
    /// and a secondary rate limit as a 403 carrying `retry-after`. A 403 is only
    /// an auth failure when neither is present.
    pub fn from_response(status: u16, headers: &HeaderMap, body: String) -> Self {
        debug!(status, "from_response: called");
        let remaining = header_u64(headers, "x-ratelimit-remaining");
        let throttled = remaining == Some(0) || headers.contains_key("retry-after");

        if status == 429 || (status == 403 && throttled) {
            let retry_after = retry_after_from_headers(headers).unwrap_or(DEFAULT_RATE_LIMIT_WAIT);
            return RemoteError::RateLimited { status, retry_after };
        }

        let message = api_message(&body);
        match status {
            401 | 403 => RemoteError::Unauthorized { status, message },
            _ => RemoteError::Status { status, message },
        }
    }

    /// HTTP status code, when the remote answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Unauthorized { status, .. }
            | RemoteError::RateLimited { status, .. }
            | RemoteError::Status { status, .. } => Some(*status),
            RemoteError::Network(e) => e.status().map(|s| s.as_u16()),
            RemoteError::InvalidResponse(_) => None,
        }
    }

    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, RemoteError::RateLimited { .. })
    }

    /// Check if the credential was rejected
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, RemoteError::Unauthorized { .. })
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RemoteError::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// `retry-after` wins; otherwise derive the wait from the `x-ratelimit-reset` epoch
fn retry_after_from_headers(headers: &HeaderMap) -> Option<Duration> {
    if let Some(secs) = header_u64(headers, "retry-after") {
        return Some(Duration::from_secs(secs));
    }

    let reset = header_u64(headers, "x-ratelimit-reset")?;
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    Some(Duration::from_secs(reset.saturating_sub(now).max(1)))
}

/// GitHub error bodies look like `{"message": "...", "documentation_url": "..."}`
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_404_is_plain_status() {
        let err = RemoteError::from_response(404, &HeaderMap::new(), r#"{"message":"Not Found"}"#.to_string());
        match &err {
            RemoteError::Status { status, message } => {
                assert_eq!(*status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("Expected Status, got {:?}", other),
        }
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_rate_limit());
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_401_is_auth_failure() {
        let err = RemoteError::from_response(401, &HeaderMap::new(), "Bad credentials".to_string());
        assert!(err.is_auth_failure());
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_403_with_quota_left_is_auth_failure() {
        let err = RemoteError::from_response(
            403,
            &headers(&[("x-ratelimit-remaining", "42")]),
            r#"{"message":"Resource not accessible"}"#.to_string(),
        );
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_403_with_exhausted_quota_is_rate_limit() {
        let err = RemoteError::from_response(
            403,
            &headers(&[("x-ratelimit-remaining", "0"), ("retry-after", "17")]),
            String::new(),
        );
        assert!(err.is_rate_limit());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(17)));
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_403_secondary_limit_with_quota_left_is_rate_limit() {
        let err = RemoteError::from_response(
            403,
            &headers(&[("retry-after", "120"), ("x-ratelimit-remaining", "4000")]),
            r#"{"message":"You have exceeded a secondary rate limit"}"#.to_string(),
        );
        assert!(err.is_rate_limit());
        assert!(!err.is_auth_failure());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(120)));
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_429_without_headers_uses_default_wait() {
        let err = RemoteError::from_response(429, &HeaderMap::new(), String::new());
        assert_eq!(err.retry_after(), Some(DEFAULT_RATE_LIMIT_WAIT));
    }

    #[test]
    fn test_rate_limit_reset_epoch() {
        let reset = (chrono::Utc::now().timestamp() + 120).to_string();
        let err = RemoteError::from_response(
            429,
            &headers(&[("x-ratelimit-reset", reset.as_str())]),
            String::new(),
        );
        let wait = err.retry_after().unwrap();
        assert!(wait > Duration::from_secs(100));
        assert!(wait <= Duration::from_secs(120));
    }

    #[test]
    fn test_reset_in_the_past_still_waits() {
        let err = RemoteError::from_response(429, &headers(&[("x-ratelimit-reset", "1")]), String::new());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_invalid_response_has_no_status() {
        let err = RemoteError::InvalidResponse("empty commit history".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.retry_after(), None);
    }
}
