//! Fix suggestion database for tracking-day errors.
//!
//! Provides actionable fix suggestions mapped to specific error types,
//! including commands, context explanations, and prevention tips.

use crate::core::carrier::Carrier;
use crate::error::AuthFailure;

// =============================================================================
// Fix Suggestion Types
// =============================================================================

/// A fix suggestion for an error.
#[derive(Debug, Clone)]
pub struct FixSuggestion {
    /// Fix commands in order of preference, copy-paste ready.
    pub commands: Vec<String>,

    /// Explanation of why this error occurred.
    pub context: String,

    /// Tips to prevent this error in the future.
    pub prevention: Option<String>,
}

impl FixSuggestion {
    /// Creates a new fix suggestion with required fields.
    #[must_use]
    pub fn new(commands: Vec<String>, context: impl Into<String>) -> Self {
        Self {
            commands,
            context: context.into(),
            prevention: None,
        }
    }

    /// Builder: adds prevention tips.
    #[must_use]
    pub fn with_prevention(mut self, prevention: impl Into<String>) -> Self {
        self.prevention = Some(prevention.into());
        self
    }
}

// =============================================================================
// Configuration
// =============================================================================

#[must_use]
pub fn config_not_found_suggestions(path: &str) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec![
                format!("mkdir -p \"$(dirname {path})\""),
                format!("$EDITOR {path}"),
            ],
            format!("No configuration file exists at {path}."),
        )
        .with_prevention("Set TRACKING_DAY_CONFIG_DIR to keep credentials in a known location."),
    ]
}

#[must_use]
pub fn config_parse_suggestions(path: &str, message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("$EDITOR {path}")],
        format!("The file at {path} is not valid TOML: {message}"),
    )]
}

#[must_use]
pub fn config_missing_suggestions(
    carrier: &str,
    environment: &str,
    fields: &[String],
) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!(
            "tracking_day doctor --carrier {carrier} --env {environment}"
        )],
        format!(
            "The {carrier} configuration for '{environment}' lacks: {}.",
            fields.join(", ")
        ),
    )
    .with_prevention("Required keys are api_url, client_id and client_secret.")]
}

#[must_use]
pub fn config_invalid_suggestions(key: &str, message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["tracking_day doctor".to_string()],
        format!("The value for '{key}' is invalid: {message}"),
    )]
}

// =============================================================================
// Authentication
// =============================================================================

#[must_use]
pub fn auth_suggestions(carrier: Carrier, kind: AuthFailure) -> Vec<FixSuggestion> {
    let doctor = format!("tracking_day doctor --carrier {carrier} --network");
    let context = match kind {
        AuthFailure::Rejected { status } => format!(
            "The {carrier} token endpoint rejected the client credentials (HTTP {status})."
        ),
        AuthFailure::Network => format!("The {carrier} token endpoint could not be reached."),
        AuthFailure::Timeout => format!("The {carrier} token exchange timed out."),
        AuthFailure::Malformed => {
            format!("The {carrier} token endpoint answered without a usable access token.")
        }
    };

    let suggestion = FixSuggestion::new(vec![doctor], context);
    match kind {
        AuthFailure::Rejected { .. } => vec![suggestion.with_prevention(
            "Check that client_id and client_secret belong to the configured environment.",
        )],
        AuthFailure::Timeout => vec![suggestion.with_prevention("Raise --timeout if the network is slow.")],
        _ => vec![suggestion],
    }
}

// =============================================================================
// Tracking
// =============================================================================

#[must_use]
pub fn tracking_suggestions(carrier: Carrier, code: &str, status: Option<u16>) -> Vec<FixSuggestion> {
    let status = status.map_or_else(String::new, |s| format!(" (HTTP {s})"));
    let mut commands = Vec::new();
    if carrier == Carrier::Fedex {
        commands.push("tracking_day fedex <tracking_number> --api-preference ship".to_string());
    }
    commands.push(format!("tracking_day doctor --carrier {carrier} --network"));

    vec![FixSuggestion::new(
        commands,
        format!("{carrier} rejected the tracking request with code {code}{status}."),
    )]
}

// =============================================================================
// Unsupported / usage
// =============================================================================

#[must_use]
pub fn not_implemented_suggestions(carrier: Carrier) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["tracking_day track <tracking_number> --carrier fedex".to_string()],
        format!("Tracking for {carrier} is not available yet; only FedEx is implemented."),
    )]
}

#[must_use]
pub fn invalid_carrier_suggestions(name: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["tracking_day track <tracking_number> --carrier auto".to_string()],
        format!("'{name}' is not a known carrier. Valid carriers: auto, fedex, ups, usps."),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_rejected_has_prevention() {
        let suggestions = auth_suggestions(Carrier::Fedex, AuthFailure::Rejected { status: 401 });
        assert!(suggestions[0].prevention.is_some());
        assert!(suggestions[0].context.contains("401"));
    }

    #[test]
    fn tracking_suggests_ship_endpoint_for_fedex() {
        let suggestions = tracking_suggestions(Carrier::Fedex, "NOT.FOUND", Some(404));
        assert!(
            suggestions[0]
                .commands
                .iter()
                .any(|c| c.contains("--api-preference ship"))
        );
    }
}
