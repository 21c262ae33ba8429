//! FedEx tracking client.
//!
//! Talks to two API surfaces that both answer tracking queries:
//! - Track API (`POST /track/v1/trackingnumbers`) for most shipments
//! - Ship API (`POST /ship/v1/trackingnumbers`) for shipments the Track API
//!   reports as not found or unsupported
//!
//! With [`ApiPreference::Auto`] the Track API is tried first and the Ship API
//! only on a not-found/unsupported answer. Transport failures and other
//! carrier errors are never retried against the other surface.
//!
//! A token rejected as expired or invalid is refreshed once and the request
//! repeated once.

pub mod normalize;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use crate::core::carrier::{ApiPreference, Carrier};
use crate::core::http::{TransportFailure, build_client, classify, join_url};
use crate::core::models::{Endpoint, TrackResult};
use crate::core::token::{Token, TokenCache, TokenManager};
use crate::core::tracker::CarrierClient;
use crate::error::{CODE_NETWORK, CODE_PARSE, Result, TrackDayError};
use crate::storage::{CredentialSource, Credentials};

use normalize::{NormalizeOptions, TrackPayload, is_not_found_code};

/// Track API path used when the credentials do not override it.
pub const DEFAULT_TRACK_PATH: &str = "/track/v1/trackingnumbers";
/// Ship API path used when the credentials do not override it.
pub const DEFAULT_SHIP_PATH: &str = "/ship/v1/trackingnumbers";

/// FedEx error codes that mean the bearer token itself was refused.
const TOKEN_REJECTION_CODES: &[&str] = &["NOT.AUTHORIZED", "INVALID.TOKEN", "TOKEN.EXPIRED"];

// =============================================================================
// Client
// =============================================================================

/// FedEx client bound to one set of credentials.
#[derive(Debug)]
pub struct FedexTracker {
    tokens: TokenManager,
    http: Client,
    timeout: Duration,
    stale_after: TimeDelta,
    config_path: Option<PathBuf>,
}

/// One carrier answer before it is turned into a result.
enum Attempt {
    Answered { raw: Value, payload: TrackPayload },
    NotFound(TrackDayError),
}

struct RawResponse {
    status: StatusCode,
    body: String,
}

impl FedexTracker {
    /// Build a client from already-validated credentials.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        credentials: Credentials,
        environment: &str,
        cache: Arc<TokenCache>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = build_client(timeout)?;
        let tokens = TokenManager::new(
            Carrier::Fedex,
            environment,
            credentials,
            http.clone(),
            cache,
            timeout,
        );
        Ok(Self {
            tokens,
            http,
            timeout,
            stale_after: normalize::DEFAULT_STALE_AFTER,
            config_path: None,
        })
    }

    /// Load credentials from `source` and build a client.
    ///
    /// # Errors
    ///
    /// Any configuration error from the source, or an HTTP client build failure.
    pub fn from_source(
        source: &CredentialSource,
        environment: &str,
        cache: Arc<TokenCache>,
        timeout: Duration,
    ) -> Result<Self> {
        let credentials = source.load(Carrier::Fedex, environment)?;
        let mut tracker = Self::new(credentials, environment, cache, timeout)?;
        tracker.config_path = source.path(environment);
        Ok(tracker)
    }

    /// Window after which an undelivered shipment without new events needs attention.
    #[must_use]
    pub const fn with_stale_after(mut self, stale_after: TimeDelta) -> Self {
        self.stale_after = stale_after;
        self
    }

    #[must_use]
    pub fn environment(&self) -> &str {
        self.tokens.environment()
    }

    /// Credential file the client was built from, if any.
    #[must_use]
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Obtain a token without tracking anything.
    ///
    /// # Errors
    ///
    /// `Auth` for any token exchange failure.
    pub async fn check_auth(&self) -> Result<()> {
        self.tokens.get_token().await.map(|_| ())
    }

    /// Track a FedEx number.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty number, `Auth` when no token can be
    /// obtained, `Tracking` when FedEx rejects the request or the request
    /// fails in transit.
    pub async fn track(
        &self,
        tracking_number: &str,
        preference: ApiPreference,
        include_raw: bool,
    ) -> Result<TrackResult> {
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(TrackDayError::InvalidArgument(
                "tracking number must not be empty".to_string(),
            ));
        }

        let (endpoint, attempt) = match preference {
            ApiPreference::Track => (
                Endpoint::Track,
                self.attempt(tracking_number, Endpoint::Track).await?,
            ),
            ApiPreference::Ship => (
                Endpoint::Ship,
                self.attempt(tracking_number, Endpoint::Ship).await?,
            ),
            ApiPreference::Auto => match self.attempt(tracking_number, Endpoint::Track).await? {
                Attempt::NotFound(err) => {
                    tracing::info!(
                        carrier = %Carrier::Fedex,
                        endpoint = %Endpoint::Ship,
                        reason = %err,
                        "Track API has no result, falling back"
                    );
                    (
                        Endpoint::Ship,
                        self.attempt(tracking_number, Endpoint::Ship).await?,
                    )
                }
                answered @ Attempt::Answered { .. } => (Endpoint::Track, answered),
            },
        };

        match attempt {
            Attempt::NotFound(err) => Err(err),
            Attempt::Answered { raw, payload } => {
                let options = NormalizeOptions::at(Utc::now()).with_stale_after(self.stale_after);
                let (status, ops_meta) = normalize::normalize(&payload, &options);
                Ok(TrackResult {
                    carrier: Carrier::Fedex,
                    tracking_number: tracking_number.to_string(),
                    endpoint,
                    status,
                    ops_meta,
                    raw: include_raw.then_some(raw),
                })
            }
        }
    }

    /// One request against one surface, with a single retry after a token refresh.
    async fn attempt(&self, tracking_number: &str, endpoint: Endpoint) -> Result<Attempt> {
        let token = self.tokens.get_token().await?;
        let mut response = self.send(tracking_number, endpoint, &token).await?;

        if is_token_rejection(&response) {
            let token = self.tokens.force_refresh(&token).await?;
            response = self.send(tracking_number, endpoint, &token).await?;
        }

        interpret(endpoint, response)
    }

    async fn send(
        &self,
        tracking_number: &str,
        endpoint: Endpoint,
        token: &Token,
    ) -> Result<RawResponse> {
        let credentials = self.tokens.credentials();
        let path = match endpoint {
            Endpoint::Track => credentials
                .track_path
                .as_deref()
                .unwrap_or(DEFAULT_TRACK_PATH),
            Endpoint::Ship => credentials
                .ship_path
                .as_deref()
                .unwrap_or(DEFAULT_SHIP_PATH),
        };
        let url = join_url(&credentials.api_url, path);

        let body = json!({
            "includeDetailedScans": true,
            "trackingInfo": [
                {"trackingNumberInfo": {"trackingNumber": tracking_number}}
            ]
        });

        tracing::debug!(
            carrier = %Carrier::Fedex,
            environment = %self.environment(),
            endpoint = %endpoint,
            "Sending tracking request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token.value)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;

        tracing::debug!(
            carrier = %Carrier::Fedex,
            endpoint = %endpoint,
            status = status.as_u16(),
            "Tracking response received"
        );
        Ok(RawResponse { status, body })
    }

    fn transport_error(&self, err: &reqwest::Error) -> TrackDayError {
        match classify(err) {
            TransportFailure::Timeout => {
                TrackDayError::tracking_timeout(Carrier::Fedex, self.timeout.as_secs())
            }
            TransportFailure::Network(message) => TrackDayError::Tracking {
                carrier: Carrier::Fedex,
                code: CODE_NETWORK.to_string(),
                carrier_message: message,
                status: None,
            },
        }
    }
}

#[async_trait]
impl CarrierClient for FedexTracker {
    fn carrier(&self) -> Carrier {
        Carrier::Fedex
    }

    async fn track(&self, tracking_number: &str, include_raw: bool) -> Result<TrackResult> {
        Self::track(self, tracking_number, ApiPreference::Auto, include_raw).await
    }
}

// =============================================================================
// Response classification
// =============================================================================

/// First `(code, message)` from a FedEx `errors` array.
fn first_error(body: &Value) -> Option<(String, String)> {
    let error = body.get("errors")?.as_array()?.first()?;
    let code = error.get("code").and_then(Value::as_str).unwrap_or_default();
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some((code.to_string(), message.to_string()))
}

fn is_token_rejection(response: &RawResponse) -> bool {
    if response.status == StatusCode::UNAUTHORIZED {
        return true;
    }
    if response.status.is_success() {
        return false;
    }
    serde_json::from_str::<Value>(&response.body)
        .ok()
        .as_ref()
        .and_then(first_error)
        .is_some_and(|(code, _)| {
            let upper = code.to_ascii_uppercase();
            TOKEN_REJECTION_CODES.iter().any(|c| upper.contains(c))
        })
}

fn tracking_error(
    code: impl Into<String>,
    message: impl Into<String>,
    status: StatusCode,
) -> TrackDayError {
    TrackDayError::Tracking {
        carrier: Carrier::Fedex,
        code: code.into(),
        carrier_message: message.into(),
        status: Some(status.as_u16()),
    }
}

fn interpret(endpoint: Endpoint, response: RawResponse) -> Result<Attempt> {
    let RawResponse { status, body } = response;
    let parsed = serde_json::from_str::<Value>(&body);

    if !status.is_success() {
        let (code, message) = parsed
            .ok()
            .as_ref()
            .and_then(first_error)
            .filter(|(code, _)| !code.is_empty())
            .unwrap_or_else(|| {
                (
                    format!("HTTP.{}", status.as_u16()),
                    format!("{endpoint} API returned HTTP {}", status.as_u16()),
                )
            });
        let err = tracking_error(code.clone(), message, status);
        if status == StatusCode::NOT_FOUND || is_not_found_code(&code) {
            return Ok(Attempt::NotFound(err));
        }
        tracing::warn!(
            carrier = %Carrier::Fedex,
            endpoint = %endpoint,
            status = status.as_u16(),
            code = %code,
            "Tracking request rejected"
        );
        return Err(err);
    }

    let raw = parsed.map_err(|e| {
        tracking_error(
            CODE_PARSE,
            format!("{endpoint} API response is not JSON: {e}"),
            status,
        )
    })?;
    let payload: TrackPayload = serde_json::from_value(raw.clone()).map_err(|e| {
        tracking_error(
            CODE_PARSE,
            format!("unexpected {endpoint} API payload: {e}"),
            status,
        )
    })?;

    if let Some(error) = payload.top_level_error() {
        let code = error
            .code
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| format!("HTTP.{}", status.as_u16()));
        let message = error
            .message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("{endpoint} API returned errors without output"));
        let err = tracking_error(code.clone(), message, status);
        if is_not_found_code(&code) {
            return Ok(Attempt::NotFound(err));
        }
        tracing::warn!(
            carrier = %Carrier::Fedex,
            endpoint = %endpoint,
            status = status.as_u16(),
            code = %code,
            "Tracking request rejected"
        );
        return Err(err);
    }

    if let Some(error) = payload.not_found_error() {
        return Ok(Attempt::NotFound(tracking_error(
            error.code.clone().unwrap_or_default(),
            error.message.clone().unwrap_or_default(),
            status,
        )));
    }

    Ok(Attempt::Answered { raw, payload })
}
