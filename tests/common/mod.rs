//! Common test utilities and fixtures for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: FedEx payload fixtures and mock-server helpers
//! - `logger`: Structured test logging infrastructure

pub mod fixtures;
pub mod logger;
