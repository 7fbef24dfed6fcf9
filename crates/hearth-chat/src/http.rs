//! Shared HTTP plumbing for the chat and history clients.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::ChatError;

/// Build a [`reqwest::Client`] with a whole-request timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, ChatError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("hearth/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ChatError::Client(format!("failed to build HTTP client: {e}")))
}

/// Join a base URL and an endpoint path, tolerating a trailing slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Map a transport failure onto the session's error vocabulary.
pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> ChatError {
    if err.is_timeout() {
        ChatError::Timeout(timeout)
    } else if err.is_decode() {
        ChatError::Decode(err.to_string())
    } else {
        ChatError::Network(err.to_string())
    }
}

/// Turn a non-success status into [`ChatError::Server`].
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ChatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), body_len = body.len(), "Service returned an error");
    Err(ChatError::Server {
        status: status.as_u16(),
        body,
    })
}

/// Parse a service timestamp.
///
/// Accepts RFC 3339 and the zone-less ISO form the service emits, which is
/// taken to be UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_endpoint_joins_cleanly() {
        assert_eq!(endpoint("http://h/api", "chat"), "http://h/api/chat");
        assert_eq!(endpoint("http://h/api/", "/chat"), "http://h/api/chat");
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let ts = parse_timestamp("2024-05-01T12:30:00+02:00").unwrap();
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn test_parse_timestamp_naive() {
        let ts = parse_timestamp("2024-05-01T12:30:00.123456").unwrap();
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.minute(), 30);
        assert!(parse_timestamp("2024-05-01T12:30:00").is_some());
    }

    #[test]
    fn test_parse_timestamp_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
