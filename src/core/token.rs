//! OAuth client-credentials token acquisition and caching.
//!
//! A [`TokenManager`] is scoped to one (carrier, environment) pair and
//! shares a process-wide [`TokenCache`] with every other manager. Cached
//! tokens only ever move forward in validity: a token that expires earlier
//! than the cached one is never stored over it.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::carrier::Carrier;
use super::http::{TransportFailure, classify, join_url};
use crate::error::{AuthFailure, Result, TrackDayError};
use crate::storage::Credentials;

/// Token path used when the credentials do not override it.
pub const DEFAULT_TOKEN_PATH: &str = "/oauth/token";

/// Tokens closer than this to expiry are treated as expired.
pub const EXPIRY_MARGIN: TimeDelta = TimeDelta::seconds(30);

// =============================================================================
// Token
// =============================================================================

/// A bearer token and its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    #[must_use]
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Whether the token is usable at `now`, allowing for [`EXPIRY_MARGIN`].
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }

    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// =============================================================================
// Token Cache
// =============================================================================

type CacheKey = (Carrier, String);

/// Process-scoped token cache keyed by (carrier, environment).
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: RwLock<HashMap<CacheKey, Token>>,
}

impl TokenCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached token for the pair, fresh or not.
    #[must_use]
    pub fn get(&self, carrier: Carrier, environment: &str) -> Option<Token> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(carrier, environment.to_string()))
            .cloned()
    }

    /// Store `token` unless the cached one is valid for longer.
    ///
    /// Returns the token that is cached afterwards.
    pub fn store(&self, carrier: Carrier, environment: &str, token: Token) -> Token {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.entry((carrier, environment.to_string())) {
            Entry::Occupied(mut existing) => {
                if token.expires_at >= existing.get().expires_at {
                    existing.insert(token.clone());
                    token
                } else {
                    existing.get().clone()
                }
            }
            Entry::Vacant(empty) => empty.insert(token).clone(),
        }
    }

    /// Drop the cached entry only if it still holds `rejected`.
    ///
    /// Returns whether an entry was removed.
    pub fn invalidate(&self, carrier: Carrier, environment: &str, rejected: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let key = (carrier, environment.to_string());
        if entries.get(&key).is_some_and(|t| t.value == rejected) {
            entries.remove(&key);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Token Manager
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorBody {
    #[serde(default)]
    errors: Vec<TokenErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorEntry {
    #[serde(default)]
    code: Option<String>,
}

/// Obtains bearer tokens for one (carrier, environment) pair.
pub struct TokenManager {
    carrier: Carrier,
    environment: String,
    credentials: Credentials,
    http: Client,
    cache: Arc<TokenCache>,
    timeout: Duration,
    refresh: tokio::sync::Mutex<()>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("carrier", &self.carrier)
            .field("environment", &self.environment)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    #[must_use]
    pub fn new(
        carrier: Carrier,
        environment: impl Into<String>,
        credentials: Credentials,
        http: Client,
        cache: Arc<TokenCache>,
        timeout: Duration,
    ) -> Self {
        Self {
            carrier,
            environment: environment.into(),
            credentials,
            http,
            cache,
            timeout,
            refresh: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn carrier(&self) -> Carrier {
        self.carrier
    }

    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Return a fresh cached token, or exchange credentials for a new one.
    ///
    /// Concurrent callers within this manager share a single exchange.
    ///
    /// # Errors
    ///
    /// `Auth` when the token endpoint rejects the exchange, cannot be
    /// reached, times out, or answers without a usable token.
    pub async fn get_token(&self) -> Result<Token> {
        if let Some(token) = self.cached_fresh() {
            return Ok(token);
        }

        let _guard = self.refresh.lock().await;
        if let Some(token) = self.cached_fresh() {
            return Ok(token);
        }

        let token = self.exchange().await?;
        Ok(self.cache.store(self.carrier, &self.environment, token))
    }

    /// Discard `rejected` and obtain a new token.
    ///
    /// If another caller already replaced `rejected`, that newer token is
    /// returned without another exchange.
    ///
    /// # Errors
    ///
    /// Same as [`get_token`](Self::get_token).
    pub async fn force_refresh(&self, rejected: &Token) -> Result<Token> {
        let removed = self
            .cache
            .invalidate(self.carrier, &self.environment, &rejected.value);
        tracing::debug!(
            carrier = %self.carrier,
            environment = %self.environment,
            removed,
            "Carrier rejected token, refreshing"
        );
        self.get_token().await
    }

    fn cached_fresh(&self) -> Option<Token> {
        self.cache
            .get(self.carrier, &self.environment)
            .filter(Token::is_fresh)
    }

    async fn exchange(&self) -> Result<Token> {
        let path = self
            .credentials
            .token_path
            .as_deref()
            .unwrap_or(DEFAULT_TOKEN_PATH);
        let url = join_url(&self.credentials.api_url, path);

        tracing::debug!(
            carrier = %self.carrier,
            environment = %self.environment,
            client = %self.credentials.fingerprint(),
            "Requesting access token"
        );

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            let code = serde_json::from_str::<TokenErrorBody>(&body)
                .unwrap_or_default()
                .errors
                .into_iter()
                .find_map(|e| e.code);
            tracing::warn!(
                carrier = %self.carrier,
                environment = %self.environment,
                status = status.as_u16(),
                "Token exchange rejected"
            );
            return Err(self.auth_error(
                AuthFailure::Rejected {
                    status: status.as_u16(),
                },
                code.unwrap_or_else(|| "token endpoint refused the client credentials".to_string()),
            ));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|_| {
            self.auth_error(AuthFailure::Malformed, "token response is not valid JSON")
        })?;
        let value = parsed
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                self.auth_error(AuthFailure::Malformed, "token response has no access_token")
            })?;

        let expires_in = parsed.expires_in.unwrap_or(0).max(0);
        tracing::debug!(
            carrier = %self.carrier,
            environment = %self.environment,
            expires_in,
            "Obtained access token"
        );
        Ok(Token::new(
            value,
            Utc::now() + TimeDelta::seconds(expires_in),
        ))
    }

    fn transport_error(&self, err: &reqwest::Error) -> TrackDayError {
        match classify(err) {
            TransportFailure::Timeout => self.auth_error(
                AuthFailure::Timeout,
                format!("no response within {}s", self.timeout.as_secs()),
            ),
            TransportFailure::Network(message) => self.auth_error(AuthFailure::Network, message),
        }
    }

    fn auth_error(&self, kind: AuthFailure, message: impl Into<String>) -> TrackDayError {
        TrackDayError::Auth {
            carrier: self.carrier,
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn freshness_respects_margin() {
        let token = Token::new("t", at(100));
        assert!(token.is_fresh_at(at(0)));
        assert!(token.is_fresh_at(at(69)));
        assert!(!token.is_fresh_at(at(70)));
        assert!(!token.is_fresh_at(at(200)));
    }

    #[test]
    fn store_keeps_longest_lived_token() {
        let cache = TokenCache::new();
        cache.store(Carrier::Fedex, "prod", Token::new("newer", at(200)));
        let kept = cache.store(Carrier::Fedex, "prod", Token::new("older", at(100)));

        assert_eq!(kept.value, "newer");
        assert_eq!(cache.get(Carrier::Fedex, "prod").unwrap().value, "newer");

        let replaced = cache.store(Carrier::Fedex, "prod", Token::new("newest", at(300)));
        assert_eq!(replaced.value, "newest");
    }

    #[test]
    fn entries_are_scoped_by_environment() {
        let cache = TokenCache::new();
        cache.store(Carrier::Fedex, "prod", Token::new("p", at(100)));
        cache.store(Carrier::Fedex, "test", Token::new("t", at(100)));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(Carrier::Fedex, "test").unwrap().value, "t");
        assert!(cache.get(Carrier::Ups, "prod").is_none());
    }

    #[test]
    fn invalidate_only_removes_matching_token() {
        let cache = TokenCache::new();
        cache.store(Carrier::Fedex, "prod", Token::new("current", at(100)));

        assert!(!cache.invalidate(Carrier::Fedex, "prod", "stale"));
        assert!(cache.get(Carrier::Fedex, "prod").is_some());

        assert!(cache.invalidate(Carrier::Fedex, "prod", "current"));
        assert!(cache.is_empty());
    }

    #[test]
    fn debug_redacts_value() {
        let token = Token::new("bearer-abc", at(0));
        assert!(!format!("{token:?}").contains("bearer-abc"));
    }
}
