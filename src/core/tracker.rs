//! Carrier-agnostic tracking dispatch.
//!
//! [`UnifiedTracker`] resolves the carrier first, then builds that carrier's
//! client on first use. Carriers without a client fail with
//! `NotImplemented` before any configuration is read, so a broken UPS setup
//! never blocks FedEx and the other way round.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeDelta;
use tokio::sync::Mutex;

use super::carrier::{Carrier, CarrierSelection, DEFAULT_ENVIRONMENT};
use super::http::DEFAULT_TIMEOUT;
use super::models::{OpsMeta, TrackResult, default_ops_meta};
use super::token::TokenCache;
use crate::carriers::FedexTracker;
use crate::carriers::fedex::normalize::DEFAULT_STALE_AFTER;
use crate::error::{Result, TrackDayError};
use crate::storage::{AppPaths, ConfigValidation, CredentialSource, RawCredentials};

/// A tracking client for a single carrier.
#[async_trait]
pub trait CarrierClient: Send + Sync {
    /// Carrier this client answers for.
    fn carrier(&self) -> Carrier;

    /// Track a number with the carrier's default endpoint selection.
    async fn track(&self, tracking_number: &str, include_raw: bool) -> Result<TrackResult>;
}

// =============================================================================
// Options
// =============================================================================

/// Construction options for [`UnifiedTracker`].
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    /// Credential project name for FedEx.
    pub fedex_project: String,
    pub environment: String,
    /// Inline FedEx credentials; bypass the credential file when set.
    pub fedex_credentials: Option<RawCredentials>,
    pub credentials_root: PathBuf,
    pub timeout: Duration,
    pub stale_after: TimeDelta,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            fedex_project: Carrier::Fedex.cli_name().to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            fedex_credentials: None,
            credentials_root: AppPaths::new().credentials_root,
            timeout: DEFAULT_TIMEOUT,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

impl TrackerOptions {
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    #[must_use]
    pub fn with_fedex_project(mut self, project: impl Into<String>) -> Self {
        self.fedex_project = project.into();
        self
    }

    #[must_use]
    pub fn with_fedex_credentials(mut self, credentials: RawCredentials) -> Self {
        self.fedex_credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn with_credentials_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.credentials_root = root.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_stale_after(mut self, stale_after: TimeDelta) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Where FedEx credentials come from.
    #[must_use]
    pub fn fedex_source(&self) -> CredentialSource {
        self.fedex_credentials.clone().map_or_else(
            || CredentialSource::File {
                root: self.credentials_root.clone(),
                project: self.fedex_project.clone(),
            },
            CredentialSource::Inline,
        )
    }
}

// =============================================================================
// Unified Tracker
// =============================================================================

/// Routes tracking requests to per-carrier clients built on demand.
pub struct UnifiedTracker {
    options: TrackerOptions,
    tokens: Arc<TokenCache>,
    clients: Mutex<HashMap<Carrier, Arc<dyn CarrierClient>>>,
}

impl std::fmt::Debug for UnifiedTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnifiedTracker")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for UnifiedTracker {
    fn default() -> Self {
        Self::new(TrackerOptions::default())
    }
}

impl UnifiedTracker {
    /// Create a tracker. No client or credential is touched until a request needs it.
    #[must_use]
    pub fn new(options: TrackerOptions) -> Self {
        Self::with_token_cache(options, Arc::new(TokenCache::new()))
    }

    /// Create a tracker sharing an existing token cache.
    #[must_use]
    pub fn with_token_cache(options: TrackerOptions, tokens: Arc<TokenCache>) -> Self {
        Self {
            options,
            tokens,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Register a prebuilt client for its carrier.
    pub async fn with_client(self, client: Arc<dyn CarrierClient>) -> Self {
        self.clients.lock().await.insert(client.carrier(), client);
        self
    }

    #[must_use]
    pub const fn options(&self) -> &TrackerOptions {
        &self.options
    }

    #[must_use]
    pub fn token_cache(&self) -> Arc<TokenCache> {
        Arc::clone(&self.tokens)
    }

    /// Track a number, resolving `auto` from the number itself.
    ///
    /// The result's `carrier` is the carrier that answered.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty number, `NotImplemented` for UPS and
    /// USPS, and any configuration, auth, or tracking error from the
    /// carrier's client.
    pub async fn track(
        &self,
        tracking_number: &str,
        selection: CarrierSelection,
        include_raw: bool,
    ) -> Result<TrackResult> {
        if tracking_number.trim().is_empty() {
            return Err(TrackDayError::InvalidArgument(
                "tracking number must not be empty".to_string(),
            ));
        }

        let carrier = selection.resolve(tracking_number);
        tracing::debug!(
            requested = selection.label(),
            carrier = %carrier,
            "Resolved carrier"
        );

        let client = self.client(carrier).await?;
        client.track(tracking_number, include_raw).await
    }

    /// Ops meta for a number; unsupported carriers yield [`default_ops_meta`].
    ///
    /// # Errors
    ///
    /// Every error from [`track`](Self::track) except `NotImplemented`.
    pub async fn track_ops_meta(
        &self,
        tracking_number: &str,
        selection: CarrierSelection,
    ) -> Result<OpsMeta> {
        match self.track(tracking_number, selection, false).await {
            Ok(result) => Ok(result.ops_meta),
            Err(e) if e.is_not_implemented() => {
                tracing::debug!(error = %e, "Carrier unsupported, using default ops meta");
                Ok(default_ops_meta())
            }
            Err(e) => Err(e),
        }
    }

    /// Network-free configuration check for one carrier.
    #[must_use]
    pub fn validate_config(&self, carrier: Carrier) -> ConfigValidation {
        match carrier {
            Carrier::Fedex => self
                .options
                .fedex_source()
                .validate(carrier, &self.options.environment),
            Carrier::Ups | Carrier::Usps => ConfigValidation::invalid(
                TrackDayError::NotImplemented { carrier }.to_string(),
                None,
            ),
        }
    }

    /// Credential file consulted for a carrier, if it reads one.
    #[must_use]
    pub fn credential_path(&self, carrier: Carrier) -> Option<PathBuf> {
        match carrier {
            Carrier::Fedex => self.options.fedex_source().path(&self.options.environment),
            Carrier::Ups | Carrier::Usps => None,
        }
    }

    /// Build a FedEx client from the configured source without caching it.
    ///
    /// # Errors
    ///
    /// Any configuration error for FedEx.
    pub fn fedex(&self) -> Result<FedexTracker> {
        Ok(FedexTracker::from_source(
            &self.options.fedex_source(),
            &self.options.environment,
            Arc::clone(&self.tokens),
            self.options.timeout,
        )?
        .with_stale_after(self.options.stale_after))
    }

    async fn client(&self, carrier: Carrier) -> Result<Arc<dyn CarrierClient>> {
        let mut clients = self.clients.lock().await;
        if let Some(client) = clients.get(&carrier) {
            return Ok(Arc::clone(client));
        }

        let client: Arc<dyn CarrierClient> = match carrier {
            Carrier::Fedex => Arc::new(self.fedex()?),
            Carrier::Ups | Carrier::Usps => {
                return Err(TrackDayError::NotImplemented { carrier });
            }
        };
        tracing::debug!(
            carrier = %carrier,
            environment = %self.options.environment,
            "Built carrier client"
        );
        clients.insert(carrier, Arc::clone(&client));
        Ok(client)
    }
}
