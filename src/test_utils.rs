//! Test utilities for tracking-day.
//!
//! Provides canned FedEx payloads, a temp-dir credential layout, and
//! assertion macros for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tracking_day::test_utils::*;
//!
//! let dir = TestDir::new();
//! dir.write_credentials("fedex", "prod", "https://apis.fedex.test", "id", "secret");
//! let body = make_fedex_in_transit_payload("123456789012");
//! ```

use chrono::{TimeDelta, Utc};
use serde_json::{Value, json};
use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use crate::storage::paths::credentials_file_in;

// =============================================================================
// FedEx Payload Factories
// =============================================================================

/// A successful token response.
#[must_use]
pub fn make_token_response(access_token: &str, expires_in: u64) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": expires_in,
        "scope": "CXS",
    })
}

/// An in-transit shipment with a scan one hour ago.
#[must_use]
pub fn make_fedex_in_transit_payload(tracking_number: &str) -> Value {
    let scanned = (Utc::now() - TimeDelta::hours(1)).to_rfc3339();
    let earlier = (Utc::now() - TimeDelta::hours(20)).to_rfc3339();
    json!({
        "transactionId": "t-in-transit",
        "output": {
            "completeTrackResults": [{
                "trackingNumber": tracking_number,
                "trackResults": [{
                    "latestStatusDetail": {
                        "code": "IT",
                        "derivedCode": "IT",
                        "description": "In transit",
                        "scanLocation": {
                            "city": "MEMPHIS",
                            "stateOrProvinceCode": "TN",
                            "countryCode": "US"
                        }
                    },
                    "dateAndTimes": [
                        { "type": "ESTIMATED_DELIVERY", "dateTime": "2030-01-02T17:00:00-06:00" }
                    ],
                    "scanEvents": [
                        {
                            "date": earlier,
                            "eventType": "PU",
                            "eventDescription": "Picked up",
                            "scanLocation": { "city": "AUSTIN", "stateOrProvinceCode": "TX" }
                        },
                        {
                            "date": scanned,
                            "eventType": "IT",
                            "eventDescription": "In transit",
                            "scanLocation": { "city": "MEMPHIS", "stateOrProvinceCode": "TN" }
                        }
                    ]
                }]
            }]
        }
    })
}

/// A delivered shipment.
#[must_use]
pub fn make_fedex_delivered_payload(tracking_number: &str) -> Value {
    json!({
        "output": {
            "completeTrackResults": [{
                "trackingNumber": tracking_number,
                "trackResults": [{
                    "latestStatusDetail": {
                        "code": "DL",
                        "derivedCode": "DL",
                        "description": "Delivered"
                    },
                    "dateAndTimes": [
                        { "type": "ACTUAL_DELIVERY", "dateTime": "2024-03-01T10:15:00-05:00" }
                    ],
                    "scanEvents": [{
                        "date": "2024-03-01T10:15:00-05:00",
                        "eventType": "DL",
                        "eventDescription": "Delivered",
                        "derivedStatusCode": "DL"
                    }]
                }]
            }]
        }
    })
}

/// A shipment with a delivery exception.
#[must_use]
pub fn make_fedex_exception_payload(tracking_number: &str) -> Value {
    let scanned = (Utc::now() - TimeDelta::hours(2)).to_rfc3339();
    json!({
        "output": {
            "completeTrackResults": [{
                "trackingNumber": tracking_number,
                "trackResults": [{
                    "latestStatusDetail": {
                        "code": "DE",
                        "description": "Delivery exception"
                    },
                    "scanEvents": [{
                        "date": scanned,
                        "eventType": "DE",
                        "eventDescription": "Delivery exception",
                        "exceptionCode": "08",
                        "exceptionDescription": "Recipient not in"
                    }]
                }]
            }]
        }
    })
}

/// A 200 answer that means "unknown to this endpoint".
#[must_use]
pub fn make_fedex_not_found_payload(tracking_number: &str) -> Value {
    json!({
        "output": {
            "completeTrackResults": [{
                "trackingNumber": tracking_number,
                "trackResults": [{
                    "error": {
                        "code": "TRACKING.TRACKINGNUMBER.NOTFOUND",
                        "message": "Tracking number cannot be found. Please correct the tracking number and try again."
                    }
                }]
            }]
        }
    })
}

/// A non-2xx error body.
#[must_use]
pub fn make_fedex_error_body(code: &str, message: &str) -> Value {
    json!({
        "transactionId": "t-error",
        "errors": [{ "code": code, "message": message }]
    })
}

/// Credential TOML with the three required fields.
#[must_use]
pub fn make_credentials_toml(api_url: &str, client_id: &str, client_secret: &str) -> String {
    format!(
        "api_url = \"{api_url}\"\nclient_id = \"{client_id}\"\nclient_secret = \"{client_secret}\"\n"
    )
}

/// A settings file with every section.
#[must_use]
pub fn make_settings_toml() -> String {
    r#"[general]
environment = "test"
timeout_seconds = 15
stale_after_hours = 48

[output]
pretty = true
"#
    .to_string()
}

// =============================================================================
// Test Directory
// =============================================================================

/// Temporary directory that is cleaned up on drop.
///
/// Doubles as a credentials root: [`TestDir::write_credentials`] lays files
/// out as `<project>/<project>_<env>.toml`.
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file in the temporary directory with the given content.
    ///
    /// Creates parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        write_all(&self.inner.path().join(name), content)
    }

    /// Write a credential file for `project` and `environment`.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_credentials(
        &self,
        project: &str,
        environment: &str,
        api_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> PathBuf {
        let path = credentials_file_in(self.inner.path(), project, environment);
        write_all(
            &path,
            &make_credentials_toml(api_url, client_id, client_secret),
        )
    }

    /// Read a file from the temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    /// Get the full path to a file in the temporary directory.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

fn write_all(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    let mut file = fs::File::create(path).expect("Failed to create test file");
    file.write_all(content.as_bytes())
        .expect("Failed to write test file");
    path.to_path_buf()
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string does not contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string parses as JSON and return the parsed value.
#[macro_export]
macro_rules! assert_json_valid {
    ($json:expr) => {{
        let json = $json;
        match serde_json::from_str::<serde_json::Value>(json) {
            Ok(value) => value,
            Err(e) => panic!(
                "Expected valid JSON, but parsing failed: {}\n\nJSON string:\n{}",
                e, json
            ),
        }
    }};
}
