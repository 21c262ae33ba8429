//! HTTP client utilities.
//!
//! Client construction for the token manager and carrier clients, plus
//! transport error classification.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::error::{Result, TrackDayError};

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(format!("tracking-day/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TrackDayError::Other(anyhow::anyhow!("failed to build HTTP client: {e}")))
}

/// How a request failed before any HTTP status was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout,
    Network(String),
}

/// Classify a `reqwest` send error.
///
/// Any URL in the error display is replaced with `<url>`.
#[must_use]
pub fn classify(err: &reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::Timeout
    } else {
        let mut message = err.to_string();
        if let Some(url) = err.url() {
            message = message.replace(url.as_str(), "<url>");
        }
        TransportFailure::Network(message)
    }
}

/// Join a base URL and an absolute path without doubling slashes.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
