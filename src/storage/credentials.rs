//! Per-carrier, per-environment credential resolution.
//!
//! Credentials come from `<root>/<project>/<project>_<environment>.toml`
//! or are supplied inline. Either way they pass the same shape checks.
//! Nothing here touches the network.
//!
//! ```toml
//! api_url = "https://apis.fedex.com"
//! client_id = "l7xx..."
//! client_secret = "..."
//! # optional endpoint overrides
//! token_path = "/oauth/token"
//! track_path = "/track/v1/trackingnumbers"
//! ship_path = "/ship/v1/trackingnumbers"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::paths::credentials_file_in;
use crate::core::carrier::Carrier;
use crate::error::{Result, TrackDayError};

// =============================================================================
// Credentials
// =============================================================================

/// Validated credentials for one (carrier, environment) pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub token_path: Option<String>,
    pub track_path: Option<String>,
    pub ship_path: Option<String>,
}

impl Credentials {
    /// Short, stable fingerprint of the client id for logs and diagnostics.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.client_id)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_url", &self.api_url)
            .field("client", &self.fingerprint())
            .field("client_secret", &"<redacted>")
            .field("token_path", &self.token_path)
            .field("track_path", &self.track_path)
            .field("ship_path", &self.ship_path)
            .finish()
    }
}

/// SHA-256 of a value, first 12 hex chars.
#[must_use]
pub fn fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(12);
    hex
}

// =============================================================================
// Raw (unvalidated) credentials
// =============================================================================

/// Credential fields as read from a file or passed inline.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCredentials {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub token_path: Option<String>,
    #[serde(default)]
    pub track_path: Option<String>,
    #[serde(default)]
    pub ship_path: Option<String>,
}

impl fmt::Debug for RawCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCredentials")
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id.as_deref().map(fingerprint))
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish_non_exhaustive()
    }
}

impl RawCredentials {
    /// Convenience constructor for the three required fields.
    #[must_use]
    pub fn new(
        api_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_url: Some(api_url.into()),
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            ..Self::default()
        }
    }

    /// Check presence and shape of every field.
    ///
    /// # Errors
    ///
    /// `ConfigMissing` when a required field is absent or blank,
    /// `ConfigInvalid` when a field has the wrong shape.
    pub fn validate(&self, carrier: Carrier, environment: &str) -> Result<Credentials> {
        let present = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let api_url = present(&self.api_url);
        let client_id = present(&self.client_id);
        let client_secret = present(&self.client_secret);

        let missing: Vec<String> = [
            ("api_url", api_url.is_none()),
            ("client_id", client_id.is_none()),
            ("client_secret", client_secret.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name.to_string())
        .collect();

        let (Some(api_url), Some(client_id), Some(client_secret)) =
            (api_url, client_id, client_secret)
        else {
            return Err(TrackDayError::ConfigMissing {
                carrier: carrier.to_string(),
                environment: environment.to_string(),
                fields: missing,
            });
        };

        check_url(&api_url)?;
        check_token_shape("client_id", &client_id)?;
        check_token_shape("client_secret", &client_secret)?;

        for (key, value) in [
            ("token_path", &self.token_path),
            ("track_path", &self.track_path),
            ("ship_path", &self.ship_path),
        ] {
            if let Some(path) = value
                && !path.starts_with('/')
            {
                return Err(TrackDayError::ConfigInvalid {
                    key: key.to_string(),
                    message: format!("must start with '/' (got '{path}')"),
                });
            }
        }

        Ok(Credentials {
            api_url: api_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            token_path: self.token_path.clone(),
            track_path: self.track_path.clone(),
            ship_path: self.ship_path.clone(),
        })
    }
}

fn check_url(api_url: &str) -> Result<()> {
    let url = Url::parse(api_url).map_err(|e| TrackDayError::ConfigInvalid {
        key: "api_url".to_string(),
        message: format!("not an absolute URL: {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(TrackDayError::ConfigInvalid {
            key: "api_url".to_string(),
            message: format!("scheme must be http or https (got '{}')", url.scheme()),
        });
    }
    Ok(())
}

// Message never echoes the value.
fn check_token_shape(key: &str, value: &str) -> Result<()> {
    if value.chars().any(char::is_whitespace) {
        return Err(TrackDayError::ConfigInvalid {
            key: key.to_string(),
            message: "must not contain whitespace".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Validation report
// =============================================================================

/// Outcome of a network-free configuration check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Client-id fingerprint, only when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

impl ConfigValidation {
    #[must_use]
    pub fn ok(credentials: &Credentials, path: Option<&Path>) -> Self {
        Self {
            valid: true,
            reason: None,
            path: path.map(|p| p.display().to_string()),
            client: Some(credentials.fingerprint()),
        }
    }

    #[must_use]
    pub fn invalid(reason: impl Into<String>, path: Option<&Path>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            path: path.map(|p| p.display().to_string()),
            client: None,
        }
    }
}

// =============================================================================
// Credential Store
// =============================================================================

/// Where a carrier's credentials come from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Read `<root>/<project>/<project>_<environment>.toml` on demand.
    File { root: PathBuf, project: String },
    /// Already-supplied fields.
    Inline(RawCredentials),
}

impl CredentialSource {
    /// Path of the backing file, if any.
    #[must_use]
    pub fn path(&self, environment: &str) -> Option<PathBuf> {
        match self {
            Self::File { root, project } => Some(credentials_file_in(root, project, environment)),
            Self::Inline(_) => None,
        }
    }

    /// Load and validate credentials.
    ///
    /// # Errors
    ///
    /// `ConfigNotFound` when the file is absent, `ConfigParse` when it is
    /// unreadable or not TOML, `ConfigMissing`/`ConfigInvalid` for bad fields.
    pub fn load(&self, carrier: Carrier, environment: &str) -> Result<Credentials> {
        match self {
            Self::Inline(raw) => raw.validate(carrier, environment),
            Self::File { root, project } => {
                let path = credentials_file_in(root, project, environment);
                let raw = read_credentials_file(&path)?;
                tracing::debug!(carrier = %carrier, environment, ?path, "Loaded credentials file");
                raw.validate(carrier, environment)
            }
        }
    }

    /// Network-free presence/shape check.
    #[must_use]
    pub fn validate(&self, carrier: Carrier, environment: &str) -> ConfigValidation {
        let path = self.path(environment);
        match self.load(carrier, environment) {
            Ok(credentials) => ConfigValidation::ok(&credentials, path.as_deref()),
            Err(e) => ConfigValidation::invalid(e.to_string(), path.as_deref()),
        }
    }
}

fn read_credentials_file(path: &Path) -> Result<RawCredentials> {
    if !path.exists() {
        return Err(TrackDayError::ConfigNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| TrackDayError::ConfigParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    toml::from_str(&content).map_err(|e| TrackDayError::ConfigParse {
        path: path.display().to_string(),
        message: parse_error_position(&content, &e),
    })
}

// Position only: the TOML error text quotes the offending line, which may hold a secret.
fn parse_error_position(content: &str, err: &toml::de::Error) -> String {
    let Some(before) = err.span().and_then(|span| content.get(..span.start)) else {
        return "invalid TOML".to_string();
    };
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    format!("invalid TOML at line {line}, column {column}")
}
