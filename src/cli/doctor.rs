//! Doctor command implementation.

use crate::cli::args::DoctorArgs;
use crate::cli::build_tracker;
use crate::core::carrier::{CarrierSelection, DEFAULT_ENVIRONMENT};
use crate::core::doctor::{DiagnoseRequest, DiagnosticReport, diagnose};
use crate::error::{ExitCode, Result};
use crate::render::render_json;
use crate::storage::{CliOverrides, ResolvedSettings};

/// Execute the doctor command.
///
/// The report is printed even when settings cannot be resolved; its
/// `exit_code` becomes the process exit code.
///
/// # Errors
///
/// Only when the report cannot be serialized.
pub async fn execute(args: &DoctorArgs, overrides: &CliOverrides) -> Result<ExitCode> {
    let report = match ResolvedSettings::resolve(overrides) {
        Ok(settings) => {
            let request = DiagnoseRequest {
                selection: CarrierSelection::from_arg(&args.carrier)?,
                tracking_number: args.tracking_number.clone(),
                allow_network: args.network,
            };
            let report = diagnose(&build_tracker(&settings), &request).await;
            println!("{}", render_json(&report, settings.pretty)?);
            report
        }
        Err(e) => {
            tracing::warn!(error = %e, "Settings could not be resolved");
            let environment = overrides
                .environment
                .as_deref()
                .unwrap_or(DEFAULT_ENVIRONMENT);
            let report = DiagnosticReport::aborted(&args.carrier, environment, &e);
            println!("{}", render_json(&report, overrides.pretty)?);
            report
        }
    };

    tracing::debug!(ok = report.ok, exit_code = report.exit_code, "Doctor finished");
    Ok(report.exit())
}
