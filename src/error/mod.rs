//! Error types for tracking-day.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! - **Configuration**: credential source absent, unreadable, or missing fields
//! - **Authentication**: the carrier token exchange was rejected or unreachable
//! - **Carrier**: the carrier rejected or failed a tracking request
//! - **Unsupported**: the carrier is recognized but has no client yet
//! - **Usage**: the caller passed an unknown carrier tag or bad argument
//! - **Internal**: I/O, JSON, and anything unclassified
//!
//! Each error has a stable error code (e.g., `TRKD-A001`) for programmatic handling.
//!
//! No variant ever carries a client secret or a bearer token value.

pub mod suggestions;

use serde::Serialize;
use thiserror::Error;

use crate::core::carrier::Carrier;

pub use suggestions::FixSuggestion;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or malformed credentials and settings.
    Configuration,
    /// Token exchange failures.
    Authentication,
    /// Tracking request failures reported by (or on the way to) the carrier.
    Carrier,
    /// Carrier recognized but not implemented.
    Unsupported,
    /// Programming errors: unknown carrier tag, invalid argument.
    Usage,
    /// Internal errors (I/O, serialization, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Configuration error",
            Self::Authentication => "Authentication error",
            Self::Carrier => "Carrier error",
            Self::Unsupported => "Unsupported carrier",
            Self::Usage => "Usage error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Configuration => "C",
            Self::Authentication => "A",
            Self::Carrier => "T",
            Self::Unsupported => "N",
            Self::Usage => "U",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Not implemented, configuration, or invalid-argument errors the user can resolve
    UserError = 2,
    /// The carrier or its token endpoint rejected the request
    CarrierFailure = 3,
    /// Outbound request timed out
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for u8 {
    fn from(code: ExitCode) -> Self {
        code as u8
    }
}

// =============================================================================
// Auth failure kinds
// =============================================================================

/// Why a token exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// The token endpoint answered with a non-2xx status.
    Rejected { status: u16 },
    /// The token endpoint could not be reached.
    Network,
    /// The exchange did not complete within the client timeout.
    Timeout,
    /// The token endpoint answered 2xx but the body had no usable token.
    Malformed,
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { status } => write!(f, "rejected (HTTP {status})"),
            Self::Network => write!(f, "unreachable"),
            Self::Timeout => write!(f, "timeout"),
            Self::Malformed => write!(f, "malformed response"),
        }
    }
}

/// Reserved tracking error code for local timeouts.
pub const CODE_TIMEOUT: &str = "TIMEOUT";
/// Reserved tracking error code for transport failures.
pub const CODE_NETWORK: &str = "NETWORK";
/// Reserved tracking error code for unparseable carrier payloads.
pub const CODE_PARSE: &str = "PARSE";

/// Main error type for tracking-day operations.
#[derive(Error, Debug)]
pub enum TrackDayError {
    // ==========================================================================
    // Configuration errors
    // ==========================================================================
    /// Credential or settings file does not exist.
    #[error("config file not found: {path}")]
    ConfigNotFound { path: String },

    /// Credential or settings file exists but cannot be read or parsed.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Required credential fields are absent.
    #[error("missing {} for {carrier} ({environment})", .fields.join(", "))]
    ConfigMissing {
        carrier: String,
        environment: String,
        fields: Vec<String>,
    },

    /// A field is present but has the wrong shape.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid { key: String, message: String },

    // ==========================================================================
    // Authentication errors
    // ==========================================================================
    /// Token exchange failed.
    #[error("authentication failed for {carrier}: {kind}: {message}")]
    Auth {
        carrier: Carrier,
        kind: AuthFailure,
        message: String,
    },

    // ==========================================================================
    // Tracking errors
    // ==========================================================================
    /// The carrier rejected the tracking request, or it never completed.
    #[error("{carrier} tracking error {code}: {carrier_message}")]
    Tracking {
        carrier: Carrier,
        code: String,
        carrier_message: String,
        status: Option<u16>,
    },

    // ==========================================================================
    // Unsupported carriers
    // ==========================================================================
    /// Carrier is recognized but has no client implementation.
    #[error(
        "Carrier '{carrier}' is not implemented yet. Next step: add carrier auth + tracking endpoint wiring and a normalizer."
    )]
    NotImplemented { carrier: Carrier },

    // ==========================================================================
    // Usage errors
    // ==========================================================================
    /// Caller passed an unknown carrier tag.
    #[error("carrier must be one of: auto, fedex, ups, usps (got '{0}')")]
    InvalidCarrier(String),

    /// Caller passed an invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // ==========================================================================
    // Internal errors
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrackDayError {
    /// Build a tracking error for a transport timeout.
    #[must_use]
    pub fn tracking_timeout(carrier: Carrier, seconds: u64) -> Self {
        Self::Tracking {
            carrier,
            code: CODE_TIMEOUT.to_string(),
            carrier_message: format!("request timed out after {seconds}s"),
            status: None,
        }
    }

    /// Map error to process exit code.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::ConfigNotFound { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigMissing { .. }
            | Self::ConfigInvalid { .. }
            | Self::NotImplemented { .. }
            | Self::InvalidCarrier(_)
            | Self::InvalidArgument(_) => ExitCode::UserError,

            Self::Auth {
                kind: AuthFailure::Timeout,
                ..
            } => ExitCode::Timeout,
            Self::Tracking { code, .. } if code == CODE_TIMEOUT => ExitCode::Timeout,

            Self::Auth { .. } | Self::Tracking { .. } => ExitCode::CarrierFailure,

            Self::Io(_) | Self::Json(_) | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigNotFound { .. }
            | Self::ConfigParse { .. }
            | Self::ConfigMissing { .. }
            | Self::ConfigInvalid { .. } => ErrorCategory::Configuration,
            Self::Auth { .. } => ErrorCategory::Authentication,
            Self::Tracking { .. } => ErrorCategory::Carrier,
            Self::NotImplemented { .. } => ErrorCategory::Unsupported,
            Self::InvalidCarrier(_) | Self::InvalidArgument(_) => ErrorCategory::Usage,
            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `TRKD-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigNotFound { .. } => "TRKD-C001",
            Self::ConfigParse { .. } => "TRKD-C002",
            Self::ConfigMissing { .. } => "TRKD-C003",
            Self::ConfigInvalid { .. } => "TRKD-C004",

            Self::Auth {
                kind: AuthFailure::Rejected { .. },
                ..
            } => "TRKD-A001",
            Self::Auth {
                kind: AuthFailure::Network,
                ..
            } => "TRKD-A002",
            Self::Auth {
                kind: AuthFailure::Timeout,
                ..
            } => "TRKD-A003",
            Self::Auth {
                kind: AuthFailure::Malformed,
                ..
            } => "TRKD-A004",

            Self::Tracking { .. } => "TRKD-T001",
            Self::NotImplemented { .. } => "TRKD-N001",
            Self::InvalidCarrier(_) => "TRKD-U001",
            Self::InvalidArgument(_) => "TRKD-U002",

            Self::Io(_) => "TRKD-X001",
            Self::Json(_) => "TRKD-X002",
            Self::Other(_) => "TRKD-X099",
        }
    }

    /// Returns the carrier this error refers to, when it is carrier-specific.
    #[must_use]
    pub fn carrier(&self) -> Option<Carrier> {
        match self {
            Self::Auth { carrier, .. }
            | Self::Tracking { carrier, .. }
            | Self::NotImplemented { carrier } => Some(*carrier),
            Self::ConfigMissing { carrier, .. } => Carrier::from_cli_name(carrier).ok(),
            _ => None,
        }
    }

    /// Whether this is the distinguishable "not implemented" signal.
    #[must_use]
    pub const fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }

    /// Whether the failure was a timeout (auth or tracking).
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.exit_code(), ExitCode::Timeout)
    }

    /// Returns actionable fix suggestions for this error.
    #[must_use]
    pub fn fix_suggestions(&self) -> Vec<FixSuggestion> {
        match self {
            Self::ConfigNotFound { path } => suggestions::config_not_found_suggestions(path),
            Self::ConfigParse { path, message } => {
                suggestions::config_parse_suggestions(path, message)
            }
            Self::ConfigMissing {
                carrier,
                environment,
                fields,
            } => suggestions::config_missing_suggestions(carrier, environment, fields),
            Self::ConfigInvalid { key, message } => {
                suggestions::config_invalid_suggestions(key, message)
            }
            Self::Auth { carrier, kind, .. } => suggestions::auth_suggestions(*carrier, *kind),
            Self::Tracking {
                carrier, code, status, ..
            } => suggestions::tracking_suggestions(*carrier, code, *status),
            Self::NotImplemented { carrier } => suggestions::not_implemented_suggestions(*carrier),
            Self::InvalidCarrier(name) => suggestions::invalid_carrier_suggestions(name),
            Self::InvalidArgument(message) => vec![FixSuggestion::new(
                vec!["tracking_day --help".to_string()],
                format!("Invalid argument: {message}"),
            )],
            Self::Io(err) => vec![FixSuggestion::new(
                vec!["# Check file permissions".to_string()],
                format!("I/O error: {err}. Check file permissions and paths."),
            )],
            Self::Json(err) => vec![FixSuggestion::new(
                vec!["tracking_day doctor".to_string()],
                format!("JSON error: {err}."),
            )],
            Self::Other(err) => vec![FixSuggestion::new(
                vec!["tracking_day doctor".to_string()],
                format!("Unexpected error: {err}. Please report this issue."),
            )],
        }
    }
}

/// Result type alias for tracking-day operations.
pub type Result<T> = std::result::Result<T, TrackDayError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_errors() -> Vec<TrackDayError> {
        vec![
            TrackDayError::ConfigNotFound {
                path: "/etc/fedex/fedex_prod.toml".to_string(),
            },
            TrackDayError::ConfigParse {
                path: "fedex_prod.toml".to_string(),
                message: "expected '='".to_string(),
            },
            TrackDayError::ConfigMissing {
                carrier: "fedex".to_string(),
                environment: "prod".to_string(),
                fields: vec!["client_secret".to_string()],
            },
            TrackDayError::ConfigInvalid {
                key: "api_url".to_string(),
                message: "not a URL".to_string(),
            },
            TrackDayError::Auth {
                carrier: Carrier::Fedex,
                kind: AuthFailure::Rejected { status: 401 },
                message: "invalid client".to_string(),
            },
            TrackDayError::Auth {
                carrier: Carrier::Fedex,
                kind: AuthFailure::Network,
                message: "connection refused".to_string(),
            },
            TrackDayError::Auth {
                carrier: Carrier::Fedex,
                kind: AuthFailure::Timeout,
                message: "30s".to_string(),
            },
            TrackDayError::Auth {
                carrier: Carrier::Fedex,
                kind: AuthFailure::Malformed,
                message: "no access_token".to_string(),
            },
            TrackDayError::Tracking {
                carrier: Carrier::Fedex,
                code: "TRACKING.TRACKINGNUMBER.NOTFOUND".to_string(),
                carrier_message: "not found".to_string(),
                status: Some(404),
            },
            TrackDayError::NotImplemented {
                carrier: Carrier::Ups,
            },
            TrackDayError::InvalidCarrier("dhl".to_string()),
            TrackDayError::InvalidArgument("empty tracking number".to_string()),
        ]
    }

    #[test]
    fn category_prefix_matches_error_code() {
        for err in sample_errors() {
            let code = err.error_code();
            let expected = format!("TRKD-{}", err.category().code_prefix());
            assert!(
                code.starts_with(&expected),
                "{code} should start with {expected}"
            );
        }
    }

    #[test]
    fn error_codes_are_unique() {
        use std::collections::HashSet;

        let codes: Vec<&str> = sample_errors().iter().map(TrackDayError::error_code).collect();
        let unique: HashSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes should be unique");
    }

    #[test]
    fn not_implemented_and_config_errors_exit_2() {
        assert_eq!(
            TrackDayError::NotImplemented {
                carrier: Carrier::Usps
            }
            .exit_code(),
            ExitCode::UserError
        );
        assert_eq!(
            TrackDayError::ConfigNotFound {
                path: "x".to_string()
            }
            .exit_code(),
            ExitCode::UserError
        );
        assert_eq!(i32::from(ExitCode::UserError), 2);
    }

    #[test]
    fn timeouts_are_classified() {
        let err = TrackDayError::tracking_timeout(Carrier::Fedex, 30);
        assert!(err.is_timeout());
        assert_eq!(err.exit_code(), ExitCode::Timeout);

        let auth = TrackDayError::Auth {
            carrier: Carrier::Fedex,
            kind: AuthFailure::Timeout,
            message: "timed out".to_string(),
        };
        assert!(auth.is_timeout());

        let rejected = TrackDayError::Tracking {
            carrier: Carrier::Fedex,
            code: "SYSTEM.UNAVAILABLE.EXCEPTION".to_string(),
            carrier_message: "down".to_string(),
            status: Some(503),
        };
        assert!(!rejected.is_timeout());
        assert_eq!(rejected.exit_code(), ExitCode::CarrierFailure);
    }

    #[test]
    fn not_implemented_message_names_carrier() {
        let err = TrackDayError::NotImplemented {
            carrier: Carrier::Ups,
        };
        let msg = err.to_string();
        assert!(msg.contains("'ups'"));
        assert!(msg.to_lowercase().contains("not implemented"));
        assert!(err.is_not_implemented());
    }

    #[test]
    fn config_missing_lists_fields() {
        let err = TrackDayError::ConfigMissing {
            carrier: "fedex".to_string(),
            environment: "test".to_string(),
            fields: vec!["client_id".to_string(), "client_secret".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "missing client_id, client_secret for fedex (test)"
        );
        assert_eq!(err.carrier(), Some(Carrier::Fedex));
    }

    #[test]
    fn every_error_has_a_suggestion() {
        for err in sample_errors() {
            let suggestions = err.fix_suggestions();
            assert!(!suggestions.is_empty(), "{err:?} should have a suggestion");
            assert!(!suggestions[0].context.is_empty());
        }
    }
}
