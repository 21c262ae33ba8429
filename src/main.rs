//! tracking-day - multi-carrier package tracking
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use tracking_day::cli::{Cli, Commands};
use tracking_day::core::carrier::Carrier;
use tracking_day::core::logging::{self, LogConfig};
use tracking_day::render::render_error;
use tracking_day::storage::{CliOverrides, ResolvedSettings};
use tracking_day::util::env::stderr_is_tty;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(&LogConfig::resolve(
        cli.log_level.as_deref(),
        cli.json_output,
        cli.verbose,
    ));

    match run(cli).await {
        Ok(code) => ExitCode::from(u8::from(code)),
        Err(e) => {
            tracing::debug!(code = e.error_code(), "Command failed");
            eprintln!("{}", render_error(&e, stderr_is_tty()));
            ExitCode::from(u8::from(e.exit_code()))
        }
    }
}

async fn run(cli: Cli) -> tracking_day::Result<tracking_day::ExitCode> {
    let overrides = cli.overrides();

    match &cli.command {
        // Doctor reports settings problems in its JSON instead of failing.
        Commands::Doctor(args) => return tracking_day::cli::doctor::execute(args, &overrides).await,
        Commands::Fedex(args) => {
            tracking_day::cli::track::execute_fedex(args, &settings(&overrides)?).await?;
        }
        Commands::Track(args) => {
            tracking_day::cli::track::execute_track(args, &settings(&overrides)?).await?;
        }
        Commands::Ups(args) => {
            let settings = settings(&overrides)?;
            tracking_day::cli::track::execute_carrier(Carrier::Ups, args, &settings).await?;
        }
        Commands::Usps(args) => {
            let settings = settings(&overrides)?;
            tracking_day::cli::track::execute_carrier(Carrier::Usps, args, &settings).await?;
        }
        Commands::OpsMeta(args) => {
            tracking_day::cli::track::execute_ops_meta(args, &settings(&overrides)?).await?;
        }
    }
    Ok(tracking_day::ExitCode::Success)
}

fn settings(overrides: &CliOverrides) -> tracking_day::Result<ResolvedSettings> {
    let settings = ResolvedSettings::resolve(overrides)?;
    tracing::debug!(
        environment = %settings.environment,
        environment_source = %settings.environment_source,
        timeout_secs = settings.timeout.as_secs(),
        timeout_source = %settings.timeout_source,
        "Resolved settings"
    );
    Ok(settings)
}
