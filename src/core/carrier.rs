//! Carrier tags, request-time selection, and tracking-number detection.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackDayError};

/// Environment used when none is configured.
pub const DEFAULT_ENVIRONMENT: &str = "prod";

// =============================================================================
// Carrier Enum
// =============================================================================

/// Shipping carriers known to the tracker.
///
/// `auto` is not a carrier; see [`CarrierSelection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Fedex,
    Ups,
    Usps,
}

impl Carrier {
    /// All carriers in display order.
    pub const ALL: &'static [Self] = &[Self::Fedex, Self::Ups, Self::Usps];

    /// CLI name for this carrier.
    #[must_use]
    pub const fn cli_name(self) -> &'static str {
        match self {
            Self::Fedex => "fedex",
            Self::Ups => "ups",
            Self::Usps => "usps",
        }
    }

    /// Display name for human output.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Fedex => "FedEx",
            Self::Ups => "UPS",
            Self::Usps => "USPS",
        }
    }

    /// Parse from CLI argument (case-insensitive).
    pub fn from_cli_name(name: &str) -> Result<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|c| c.cli_name() == lower)
            .copied()
            .ok_or_else(|| TrackDayError::InvalidCarrier(name.to_string()))
    }

    /// Whether a tracking client exists for this carrier.
    #[must_use]
    pub const fn is_implemented(self) -> bool {
        matches!(self, Self::Fedex)
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

// =============================================================================
// Carrier Selection
// =============================================================================

/// Carrier selection as requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarrierSelection {
    /// Resolve from the tracking number before any request is issued.
    #[default]
    Auto,
    /// Explicit carrier.
    Explicit(Carrier),
}

impl CarrierSelection {
    /// Parse from CLI argument: `auto` or a carrier name. Empty means `auto`.
    pub fn from_arg(arg: &str) -> Result<Self> {
        let lower = arg.trim().to_lowercase();
        match lower.as_str() {
            "" | "auto" => Ok(Self::Auto),
            _ => Carrier::from_cli_name(&lower).map(Self::Explicit),
        }
    }

    /// Resolve to a concrete carrier, detecting from the tracking number for `auto`.
    #[must_use]
    pub fn resolve(self, tracking_number: &str) -> Carrier {
        match self {
            Self::Auto => detect(tracking_number),
            Self::Explicit(carrier) => carrier,
        }
    }

    /// Label as it was requested.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Explicit(carrier) => carrier.cli_name(),
        }
    }
}

impl From<Carrier> for CarrierSelection {
    fn from(carrier: Carrier) -> Self {
        Self::Explicit(carrier)
    }
}

// =============================================================================
// Detection
// =============================================================================

static FEDEX_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9]{12}|[0-9]{15}|[0-9]{20,22})$").expect("static regex")
});

static USPS_INTERNATIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[0-9]{9}[A-Z]{2}$").expect("static regex"));

/// Best-effort carrier guess from a tracking number.
///
/// Numeric-only formats are ambiguous between FedEx and USPS; they resolve to
/// FedEx, as does anything unrecognized. Never fails.
#[must_use]
pub fn detect(tracking_number: &str) -> Carrier {
    let tn = tracking_number.trim().to_uppercase();

    if tn.starts_with("1Z") {
        return Carrier::Ups;
    }
    if FEDEX_NUMERIC.is_match(&tn) {
        return Carrier::Fedex;
    }
    if USPS_INTERNATIONAL.is_match(&tn) {
        return Carrier::Usps;
    }
    Carrier::Fedex
}

// =============================================================================
// API Preference
// =============================================================================

/// Which FedEx API surface to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiPreference {
    /// Track-style first, ship-style only on a not-found/unsupported answer.
    #[default]
    Auto,
    /// Track-style endpoint only.
    Track,
    /// Ship-style endpoint only.
    Ship,
}

impl ApiPreference {
    /// Parse from CLI argument.
    pub fn from_arg(arg: &str) -> Result<Self> {
        match arg.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "track" => Ok(Self::Track),
            "ship" => Ok(Self::Ship),
            other => Err(TrackDayError::InvalidArgument(format!(
                "api preference must be one of: auto, track, ship (got '{other}')"
            ))),
        }
    }
}
