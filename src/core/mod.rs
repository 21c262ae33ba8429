//! Core data models, carrier dispatch, and infrastructure.

pub mod carrier;
pub mod doctor;
pub mod http;
pub mod logging;
pub mod models;
pub mod token;
pub mod tracker;

pub use carrier::{ApiPreference, Carrier, CarrierSelection, DEFAULT_ENVIRONMENT, detect};
pub use doctor::{CheckStatus, DiagnoseRequest, DiagnosticReport, diagnose};
pub use models::{
    Endpoint, OpsMeta, StatusFields, TrackResult, TrackingEvent, default_ops_meta,
};
pub use token::{Token, TokenCache, TokenManager};
pub use tracker::{CarrierClient, TrackerOptions, UnifiedTracker};
