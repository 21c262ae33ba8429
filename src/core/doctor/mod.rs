//! Doctor diagnostics.
//!
//! [`diagnose`] never fails: every problem becomes a field of the
//! [`DiagnosticReport`] so the CLI can always print it as JSON.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::core::carrier::{ApiPreference, Carrier, CarrierSelection, detect};
use crate::core::tracker::UnifiedTracker;
use crate::error::{AuthFailure, ExitCode, TrackDayError};
use crate::storage::ConfigValidation;

// =============================================================================
// Check Status
// =============================================================================

/// Result of a single diagnostic check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    Pass { details: Option<String> },
    Fail { reason: String },
    /// Not run; not a failure.
    Skipped { reason: String },
}

impl CheckStatus {
    #[must_use]
    pub const fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass { details: Some(d) } => write!(f, "pass ({d})"),
            Self::Pass { details: None } => write!(f, "pass"),
            Self::Fail { reason } => write!(f, "fail: {reason}"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Requested and resolved carrier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarrierReport {
    pub requested: String,
    pub effective: Option<Carrier>,
}

/// Connectivity checks against the carrier API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkReport {
    pub checked: bool,
    /// `None` when not checked.
    pub reachable: Option<bool>,
    pub auth: CheckStatus,
    pub tracking: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl NetworkReport {
    fn not_checked(reason: &str) -> Self {
        Self {
            checked: false,
            reachable: None,
            auth: CheckStatus::Skipped {
                reason: reason.to_string(),
            },
            tracking: CheckStatus::Skipped {
                reason: reason.to_string(),
            },
            duration_ms: None,
        }
    }
}

/// Complete diagnostic report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub version: String,
    pub carrier: CarrierReport,
    pub environment: String,
    pub tracking_number: Option<String>,
    pub config: Option<ConfigValidation>,
    pub network: NetworkReport,
    pub ok: bool,
    pub error: Option<String>,
    pub exit_code: u8,
}

impl DiagnosticReport {
    /// Exit code the CLI should use.
    #[must_use]
    pub const fn exit(&self) -> ExitCode {
        match self.exit_code {
            0 => ExitCode::Success,
            2 => ExitCode::UserError,
            _ => ExitCode::GeneralError,
        }
    }

    /// Report for a run that stopped before any check, e.g. on a bad settings file.
    #[must_use]
    pub fn aborted(requested: &str, environment: &str, error: &TrackDayError) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            carrier: CarrierReport {
                requested: requested.to_string(),
                effective: None,
            },
            environment: environment.to_string(),
            tracking_number: None,
            config: None,
            network: NetworkReport::not_checked("not checked"),
            ok: true,
            error: None,
            exit_code: ExitCode::Success.into(),
        }
        .fail(error.to_string(), error.exit_code())
    }

    fn fail(mut self, error: impl Into<String>, code: ExitCode) -> Self {
        self.ok = false;
        self.error = Some(error.into());
        self.exit_code = code.into();
        self
    }
}

/// What to diagnose.
#[derive(Debug, Clone, Default)]
pub struct DiagnoseRequest {
    pub selection: CarrierSelection,
    pub tracking_number: Option<String>,
    pub allow_network: bool,
}

// =============================================================================
// Diagnose
// =============================================================================

/// Run diagnostics.
///
/// Config problems and unresolvable selections exit 2; a failed network
/// check exits 1. With `allow_network` off no request is sent.
pub async fn diagnose(tracker: &UnifiedTracker, request: &DiagnoseRequest) -> DiagnosticReport {
    let tracking_number = request
        .tracking_number
        .as_deref()
        .map(str::trim)
        .filter(|tn| !tn.is_empty());

    let effective = match request.selection {
        CarrierSelection::Explicit(carrier) => Some(carrier),
        CarrierSelection::Auto => tracking_number.map(detect),
    };

    tracing::debug!(
        requested = request.selection.label(),
        effective = ?effective,
        allow_network = request.allow_network,
        "Running diagnostics"
    );

    let report = DiagnosticReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        carrier: CarrierReport {
            requested: request.selection.label().to_string(),
            effective,
        },
        environment: tracker.options().environment.clone(),
        tracking_number: tracking_number.map(str::to_string),
        config: None,
        network: NetworkReport::not_checked("not checked"),
        ok: true,
        error: None,
        exit_code: ExitCode::Success.into(),
    };

    let Some(carrier) = effective else {
        return report.fail(
            "carrier=auto requires a tracking number to resolve the effective carrier",
            ExitCode::UserError,
        );
    };

    let config = tracker.validate_config(carrier);
    let report = DiagnosticReport {
        config: Some(config.clone()),
        ..report
    };

    if !carrier.is_implemented() {
        return report.fail(
            TrackDayError::NotImplemented { carrier }.to_string(),
            ExitCode::UserError,
        );
    }
    if !config.valid {
        let reason = config
            .reason
            .unwrap_or_else(|| "configuration invalid".to_string());
        return DiagnosticReport {
            network: NetworkReport::not_checked("configuration invalid"),
            ..report
        }
        .fail(reason, ExitCode::UserError);
    }
    if !request.allow_network {
        return report;
    }

    let network = check_network(tracker, tracking_number).await;
    let failure = [&network.auth, &network.tracking]
        .into_iter()
        .find_map(|status| match status {
            CheckStatus::Fail { reason } => Some(reason.clone()),
            _ => None,
        });
    let report = DiagnosticReport { network, ..report };
    match failure {
        Some(reason) => report.fail(reason, ExitCode::GeneralError),
        None => report,
    }
}

async fn check_network(tracker: &UnifiedTracker, tracking_number: Option<&str>) -> NetworkReport {
    let start = Instant::now();
    let elapsed_ms = |start: Instant| {
        u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
    };

    let fedex = match tracker.fedex() {
        Ok(client) => client,
        Err(e) => {
            return NetworkReport {
                checked: true,
                reachable: Some(false),
                auth: CheckStatus::Fail {
                    reason: e.to_string(),
                },
                tracking: CheckStatus::Skipped {
                    reason: "client unavailable".to_string(),
                },
                duration_ms: Some(elapsed_ms(start)),
            };
        }
    };

    // A rejected or malformed token answer still proves the endpoint is reachable.
    let (auth, reachable) = match fedex.check_auth().await {
        Ok(()) => (
            CheckStatus::Pass {
                details: Some(format!("token issued for {}", fedex.environment())),
            },
            true,
        ),
        Err(e) => {
            let reachable = matches!(
                e,
                TrackDayError::Auth {
                    kind: AuthFailure::Rejected { .. } | AuthFailure::Malformed,
                    ..
                }
            );
            (
                CheckStatus::Fail {
                    reason: e.to_string(),
                },
                reachable,
            )
        }
    };

    let tracking = match (tracking_number, auth.is_fail()) {
        (_, true) => CheckStatus::Skipped {
            reason: "authentication failed".to_string(),
        },
        (None, false) => CheckStatus::Skipped {
            reason: "no tracking number".to_string(),
        },
        (Some(tn), false) => {
            match fedex.track(tn, ApiPreference::Auto, false).await {
                Ok(result) => CheckStatus::Pass {
                    details: Some(format!("answered by {} endpoint", result.endpoint)),
                },
                Err(e) => CheckStatus::Fail {
                    reason: e.to_string(),
                },
            }
        }
    };

    NetworkReport {
        checked: true,
        reachable: Some(reachable),
        auth,
        tracking,
        duration_ms: Some(elapsed_ms(start)),
    }
}
