//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::storage::CliOverrides;
use crate::storage::paths::ENV_CONFIG_DIR;

/// Multi-carrier tracking (FedEx implemented; UPS/USPS pending).
#[derive(Parser, Debug)]
#[command(name = "tracking_day")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Pretty-print JSON (indented, sorted keys)
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Credential environment (default: prod)
    #[arg(long = "env", value_name = "NAME", global = true)]
    pub environment: Option<String>,

    /// Root directory holding <project>/<project>_<env>.toml credential files
    #[arg(long, value_name = "DIR", env = ENV_CONFIG_DIR, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Request timeout in seconds (1-300)
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSON logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Settings overrides given on the command line.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            environment: self.environment.clone(),
            timeout_seconds: self.timeout,
            pretty: self.pretty,
            config_dir: self.config_dir.clone(),
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track a FedEx tracking number
    Fedex(FedexArgs),

    /// Track with carrier routing
    Track(TrackArgs),

    /// Track a UPS tracking number (not implemented)
    Ups(CarrierArgs),

    /// Track a USPS tracking number (not implemented)
    Usps(CarrierArgs),

    /// Print only the ops meta summary
    OpsMeta(OpsMetaArgs),

    /// Check configuration and, optionally, connectivity
    Doctor(DoctorArgs),
}

/// Arguments for the `fedex` command.
#[derive(Args, Debug)]
pub struct FedexArgs {
    pub tracking_number: String,

    /// Route to track/ship endpoint
    #[arg(long, default_value = "auto", value_parser = ["auto", "track", "ship"])]
    pub api_preference: String,

    /// Omit raw response
    #[arg(long)]
    pub no_raw: bool,
}

/// Arguments for the `track` command.
#[derive(Args, Debug)]
pub struct TrackArgs {
    pub tracking_number: String,

    /// Carrier selection
    #[arg(long, default_value = "auto", value_parser = ["auto", "fedex", "ups", "usps"])]
    pub carrier: String,

    /// Omit raw response
    #[arg(long)]
    pub no_raw: bool,
}

/// Arguments for the fixed-carrier commands.
#[derive(Args, Debug)]
pub struct CarrierArgs {
    pub tracking_number: String,

    /// Omit raw response
    #[arg(long)]
    pub no_raw: bool,
}

/// Arguments for the `ops-meta` command.
#[derive(Args, Debug)]
pub struct OpsMetaArgs {
    pub tracking_number: String,

    /// Carrier selection
    #[arg(long, default_value = "auto", value_parser = ["auto", "fedex", "ups", "usps"])]
    pub carrier: String,
}

/// Arguments for the `doctor` command.
#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Carrier to diagnose
    #[arg(long, default_value = "auto", value_parser = ["auto", "fedex", "ups", "usps"])]
    pub carrier: String,

    /// Tracking number used to resolve `auto` and, with --network, to test tracking
    #[arg(long, value_name = "TRACKING_NUMBER")]
    pub tracking_number: Option<String>,

    /// Allow token and tracking requests
    #[arg(long)]
    pub network: bool,
}
