//! Command-line interface.

pub mod args;
pub mod doctor;
pub mod track;

pub use args::{Cli, Commands};

use chrono::TimeDelta;

use crate::carriers::fedex::normalize::DEFAULT_STALE_AFTER;
use crate::core::tracker::{TrackerOptions, UnifiedTracker};
use crate::storage::ResolvedSettings;

/// Build the tracker for one CLI invocation.
#[must_use]
pub fn build_tracker(settings: &ResolvedSettings) -> UnifiedTracker {
    let stale_after = TimeDelta::from_std(settings.stale_after).unwrap_or(DEFAULT_STALE_AFTER);
    UnifiedTracker::new(
        TrackerOptions::default()
            .with_environment(settings.environment.clone())
            .with_credentials_root(settings.credentials_root.clone())
            .with_timeout(settings.timeout)
            .with_stale_after(stale_after),
    )
}
