//! Error types for exchange access and refresh cycles

use reqwest::StatusCode;
use thiserror::Error;

/// A failed call against the exchange API.
///
/// `endpoint` is a short label such as `account` or `btceur rate`, never the
/// full URL, which may carry the API key in its query string.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to sign request: {0}")]
    Signing(#[from] hmac::digest::InvalidLength),

    #[error("request error for {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("authentication rejected for {endpoint}: {status}")]
    AuthFailure { endpoint: String, status: StatusCode },

    #[error("HTTP error: {status} for {endpoint}")]
    Status { endpoint: String, status: StatusCode },

    #[error("failed to parse JSON response for {endpoint}: {source}")]
    Malformed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ExchangeError {
    /// Classifies a reqwest failure, stripping the URL from the error.
    pub fn from_request(endpoint: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ExchangeError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            ExchangeError::Transport {
                endpoint: endpoint.to_string(),
                source: error.without_url(),
            }
        }
    }

    /// Maps a non-success HTTP status to an error.
    pub fn from_status(endpoint: &str, status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ExchangeError::AuthFailure {
                endpoint: endpoint.to_string(),
                status,
            },
            _ => ExchangeError::Status {
                endpoint: endpoint.to_string(),
                status,
            },
        }
    }
}

/// Outcome of a refresh cycle that produced no snapshot.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("account balance fetch failed: {0}")]
    FetchFailed(#[source] ExchangeError),

    #[error("refresh cycle aborted: {0}")]
    Aborted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ExchangeError::from_status("account", StatusCode::UNAUTHORIZED),
            ExchangeError::AuthFailure { .. }
        ));
        assert!(matches!(
            ExchangeError::from_status("account", StatusCode::FORBIDDEN),
            ExchangeError::AuthFailure { .. }
        ));

        let err = ExchangeError::from_status("btceur rate", StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "HTTP error: 500 Internal Server Error for btceur rate"
        );
    }
}
