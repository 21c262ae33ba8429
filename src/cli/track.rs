//! Tracking commands: `fedex`, `track`, `ups`, `usps`, `ops-meta`.
//!
//! Each prints exactly one JSON document to stdout on success.

use crate::cli::args::{CarrierArgs, FedexArgs, OpsMetaArgs, TrackArgs};
use crate::cli::build_tracker;
use crate::core::carrier::{ApiPreference, Carrier, CarrierSelection};
use crate::error::Result;
use crate::render::render_json;
use crate::storage::ResolvedSettings;

/// Execute the `fedex` command.
///
/// # Errors
///
/// Returns the tracking error unchanged.
pub async fn execute_fedex(args: &FedexArgs, settings: &ResolvedSettings) -> Result<()> {
    let preference = ApiPreference::from_arg(&args.api_preference)?;
    tracing::debug!(?preference, environment = %settings.environment, "Tracking via FedEx");

    let fedex = build_tracker(settings).fedex()?;
    let result = fedex
        .track(&args.tracking_number, preference, !args.no_raw)
        .await?;
    println!("{}", render_json(&result, settings.pretty)?);
    Ok(())
}

/// Execute the `track` command.
///
/// # Errors
///
/// Returns the tracking error unchanged.
pub async fn execute_track(args: &TrackArgs, settings: &ResolvedSettings) -> Result<()> {
    let selection = CarrierSelection::from_arg(&args.carrier)?;
    track_with(&args.tracking_number, selection, !args.no_raw, settings).await
}

/// Execute `ups` or `usps`.
///
/// # Errors
///
/// `NotImplemented` for carriers without a client.
pub async fn execute_carrier(
    carrier: Carrier,
    args: &CarrierArgs,
    settings: &ResolvedSettings,
) -> Result<()> {
    track_with(&args.tracking_number, carrier.into(), !args.no_raw, settings).await
}

/// Execute the `ops-meta` command.
///
/// # Errors
///
/// Any tracking error other than `NotImplemented`.
pub async fn execute_ops_meta(args: &OpsMetaArgs, settings: &ResolvedSettings) -> Result<()> {
    let selection = CarrierSelection::from_arg(&args.carrier)?;
    let meta = build_tracker(settings)
        .track_ops_meta(&args.tracking_number, selection)
        .await?;
    println!("{}", render_json(&meta, settings.pretty)?);
    Ok(())
}

async fn track_with(
    tracking_number: &str,
    selection: CarrierSelection,
    include_raw: bool,
    settings: &ResolvedSettings,
) -> Result<()> {
    let result = build_tracker(settings)
        .track(tracking_number, selection, include_raw)
        .await?;
    println!("{}", render_json(&result, settings.pretty)?);
    Ok(())
}
