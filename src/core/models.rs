//! Carrier-agnostic tracking result models.
//!
//! Every carrier client produces these types; the CLI serializes them as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::carrier::Carrier;

// =============================================================================
// Events
// =============================================================================

/// A single scan or status event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackingEvent {
    /// When the event happened, if the carrier gave a parseable timestamp.
    pub timestamp: Option<DateTime<Utc>>,
    pub description: String,
    pub location: Option<String>,
    /// Carrier event code (e.g. `DL`, `PU`), when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

// =============================================================================
// Status Fields
// =============================================================================

/// Normalized status of a shipment.
///
/// `events` is ordered newest first; events without a timestamp sort last.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusFields {
    pub delivered: bool,
    pub status_code: Option<String>,
    pub status_description: Option<String>,
    pub current_location: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub events: Vec<TrackingEvent>,
}

// =============================================================================
// Ops Meta
// =============================================================================

/// Compact operational summary consumed by downstream automation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpsMeta {
    pub is_delivered: bool,
    pub has_exception: bool,
    pub last_event_at: Option<DateTime<Utc>>,
    pub needs_attention: bool,
}

/// Zero value for "unknown/unavailable" ops meta.
#[must_use]
pub const fn default_ops_meta() -> OpsMeta {
    OpsMeta {
        is_delivered: false,
        has_exception: false,
        last_event_at: None,
        needs_attention: false,
    }
}

// =============================================================================
// Endpoint
// =============================================================================

/// Which carrier API surface answered a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Track,
    Ship,
}

impl Endpoint {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Ship => "ship",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Track Result
// =============================================================================

/// Result of one tracking request.
///
/// `carrier` is the carrier that answered, never the requested `auto`.
/// `raw` is absent from the serialized form unless it was requested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackResult {
    pub carrier: Carrier,
    pub tracking_number: String,
    pub endpoint: Endpoint,
    #[serde(flatten)]
    pub status: StatusFields,
    pub ops_meta: OpsMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl TrackResult {
    /// Convert to a JSON mapping for the CLI.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> crate::error::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(raw: Option<serde_json::Value>) -> TrackResult {
        TrackResult {
            carrier: Carrier::Fedex,
            tracking_number: "123456789012".to_string(),
            endpoint: Endpoint::Track,
            status: StatusFields::default(),
            ops_meta: default_ops_meta(),
            raw,
        }
    }

    #[test]
    fn default_ops_meta_is_zero_value() {
        assert_eq!(default_ops_meta(), OpsMeta::default());
        let json = serde_json::to_value(default_ops_meta()).unwrap();
        assert_eq!(json["is_delivered"], false);
        assert_eq!(json["has_exception"], false);
        assert!(json["last_event_at"].is_null());
        assert_eq!(json["needs_attention"], false);
    }

    #[test]
    fn raw_key_absent_when_not_requested() {
        let json = result(None).to_json().unwrap();
        assert!(json.as_object().unwrap().get("raw").is_none());
    }

    #[test]
    fn raw_key_present_when_requested() {
        let json = result(Some(serde_json::json!({"output": {}}))).to_json().unwrap();
        assert!(json.get("raw").is_some());
    }

    #[test]
    fn status_fields_are_flattened() {
        let json = result(None).to_json().unwrap();
        assert_eq!(json["carrier"], "fedex");
        assert_eq!(json["endpoint"], "track");
        assert_eq!(json["delivered"], false);
        assert!(json["events"].as_array().unwrap().is_empty());
        assert!(json.get("ops_meta").is_some());
    }
}
