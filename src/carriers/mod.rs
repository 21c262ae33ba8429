//! Carrier-specific tracking clients.
//!
//! Each implemented carrier has its own submodule with a client and a
//! normalizer for its payloads.

pub mod fedex;

pub use crate::core::carrier::{ApiPreference, Carrier};
pub use crate::core::tracker::CarrierClient;
pub use fedex::FedexTracker;
