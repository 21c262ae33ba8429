//! FedEx Track API payload types and normalization.
//!
//! Every field is optional; a payload that deserializes at all can be
//! normalized.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer};

use crate::core::models::{OpsMeta, StatusFields, TrackingEvent};

/// Status codes that mark a shipment exception.
pub const EXCEPTION_STATUS_CODES: &[&str] = &["DE", "SE", "CA", "RS", "DY"];

/// Status code for a delivered shipment.
pub const DELIVERED_STATUS_CODE: &str = "DL";

/// Default staleness window for `needs_attention`.
pub const DEFAULT_STALE_AFTER: TimeDelta = TimeDelta::hours(72);

// =============================================================================
// Payload
// =============================================================================

// `null` lists read as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackPayload {
    pub output: Option<TrackOutput>,
    #[serde(deserialize_with = "null_as_empty")]
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackOutput {
    #[serde(deserialize_with = "null_as_empty")]
    pub complete_track_results: Vec<CompleteTrackResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompleteTrackResult {
    pub tracking_number: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub track_results: Vec<TrackResultEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackResultEntry {
    pub latest_status_detail: Option<StatusDetail>,
    #[serde(deserialize_with = "null_as_empty")]
    pub date_and_times: Vec<DateAndTime>,
    #[serde(deserialize_with = "null_as_empty")]
    pub scan_events: Vec<ScanEvent>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusDetail {
    pub code: Option<String>,
    pub derived_code: Option<String>,
    pub description: Option<String>,
    pub scan_location: Option<Address>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub city: Option<String>,
    pub state_or_province_code: Option<String>,
    pub country_code: Option<String>,
}

impl Address {
    /// `City, ST, CC` with blank parts skipped; `None` when all are blank.
    #[must_use]
    pub fn display(&self) -> Option<String> {
        let parts: Vec<&str> = [
            &self.city,
            &self.state_or_province_code,
            &self.country_code,
        ]
        .into_iter()
        .filter_map(|p| p.as_deref().map(str::trim))
        .filter(|p| !p.is_empty())
        .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateAndTime {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanEvent {
    pub date: Option<String>,
    pub event_type: Option<String>,
    pub event_description: Option<String>,
    pub exception_code: Option<String>,
    pub exception_description: Option<String>,
    pub derived_status_code: Option<String>,
    pub scan_location: Option<Address>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiError {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl TrackPayload {
    /// The first track result, which is the one for the requested number.
    #[must_use]
    pub fn primary(&self) -> Option<&TrackResultEntry> {
        self.output
            .as_ref()?
            .complete_track_results
            .iter()
            .flat_map(|c| c.track_results.iter())
            .next()
    }

    /// The not-found error when every track result carries one.
    ///
    /// A 200 response can still mean "unknown to this endpoint".
    #[must_use]
    pub fn not_found_error(&self) -> Option<&ApiError> {
        let mut results = self
            .output
            .as_ref()?
            .complete_track_results
            .iter()
            .flat_map(|c| c.track_results.iter())
            .peekable();
        results.peek()?;

        let mut first = None;
        for result in results {
            let error = result
                .error
                .as_ref()
                .filter(|e| e.code.as_deref().is_some_and(is_not_found_code))?;
            first.get_or_insert(error);
        }
        first
    }

    /// The first top-level error of a payload that has no output.
    #[must_use]
    pub fn top_level_error(&self) -> Option<&ApiError> {
        if self.output.is_some() {
            return None;
        }
        self.errors.first()
    }
}

/// Whether a FedEx error code belongs to the not-found/unsupported class.
#[must_use]
pub fn is_not_found_code(code: &str) -> bool {
    let upper = code.to_ascii_uppercase();
    upper.contains("NOTFOUND") || upper.contains("NOT.FOUND") || upper.contains("UNSUPPORTED")
}

// =============================================================================
// Normalization
// =============================================================================

/// Clock and staleness window used to derive `needs_attention`.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub now: DateTime<Utc>,
    pub stale_after: TimeDelta,
}

impl NormalizeOptions {
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    #[must_use]
    pub const fn with_stale_after(mut self, stale_after: TimeDelta) -> Self {
        self.stale_after = stale_after;
        self
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

/// Map a FedEx payload to status fields and ops meta.
#[must_use]
pub fn normalize(payload: &TrackPayload, options: &NormalizeOptions) -> (StatusFields, OpsMeta) {
    let Some(entry) = payload.primary() else {
        let status = StatusFields::default();
        let ops = derive_ops_meta(&status, false, options);
        return (status, ops);
    };

    let latest = entry.latest_status_detail.clone().unwrap_or_default();
    let status_code = latest.code.clone().or_else(|| latest.derived_code.clone());

    let mut events: Vec<TrackingEvent> = entry.scan_events.iter().map(to_event).collect();
    sort_newest_first(&mut events);

    let delivered_at = find_date(entry, "ACTUAL_DELIVERY");
    let delivered = [&latest.code, &latest.derived_code]
        .into_iter()
        .any(|c| c.as_deref() == Some(DELIVERED_STATUS_CODE))
        || delivered_at.is_some();

    let has_exception = [&latest.code, &latest.derived_code]
        .into_iter()
        .flatten()
        .any(|c| EXCEPTION_STATUS_CODES.contains(&c.as_str()))
        || entry.scan_events.iter().any(|e| {
            e.exception_code
                .as_deref()
                .is_some_and(|c| !c.trim().is_empty())
        });

    let current_location = latest
        .scan_location
        .as_ref()
        .and_then(Address::display)
        .or_else(|| events.iter().find_map(|e| e.location.clone()));

    let status = StatusFields {
        delivered,
        status_code,
        status_description: latest.description.clone(),
        current_location,
        estimated_delivery: find_date(entry, "ESTIMATED_DELIVERY"),
        delivered_at,
        events,
    };
    let ops = derive_ops_meta(&status, has_exception, options);
    (status, ops)
}

fn derive_ops_meta(
    status: &StatusFields,
    has_exception: bool,
    options: &NormalizeOptions,
) -> OpsMeta {
    let last_event_at = status.events.iter().filter_map(|e| e.timestamp).max();
    let stale = last_event_at.is_none_or(|at| options.now - at > options.stale_after);

    OpsMeta {
        is_delivered: status.delivered,
        has_exception,
        last_event_at,
        needs_attention: has_exception || (!status.delivered && stale),
    }
}

fn to_event(scan: &ScanEvent) -> TrackingEvent {
    let description = scan
        .event_description
        .as_deref()
        .or(scan.exception_description.as_deref())
        .unwrap_or_default()
        .to_string();

    TrackingEvent {
        timestamp: scan.date.as_deref().and_then(parse_timestamp),
        description,
        location: scan.scan_location.as_ref().and_then(Address::display),
        code: scan
            .event_type
            .clone()
            .or_else(|| scan.derived_status_code.clone()),
    }
}

// Stable: equal timestamps keep carrier order.
fn sort_newest_first(events: &mut [TrackingEvent]) {
    events.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

fn find_date(entry: &TrackResultEntry, kind: &str) -> Option<DateTime<Utc>> {
    entry
        .date_and_times
        .iter()
        .filter(|d| d.kind.as_deref() == Some(kind))
        .find_map(|d| d.date_time.as_deref().and_then(parse_timestamp))
}

/// Parse an RFC 3339 timestamp, or a naive one taken as UTC.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> TrackPayload {
        serde_json::from_value(value).unwrap()
    }

    fn now() -> DateTime<Utc> {
        parse_timestamp("2024-03-10T12:00:00Z").unwrap()
    }

    fn in_transit() -> serde_json::Value {
        json!({
            "output": {"completeTrackResults": [{
                "trackingNumber": "123456789012",
                "trackResults": [{
                    "latestStatusDetail": {
                        "code": "IT",
                        "description": "In transit",
                        "scanLocation": {"city": "MEMPHIS", "stateOrProvinceCode": "TN", "countryCode": "US"}
                    },
                    "dateAndTimes": [
                        {"type": "ESTIMATED_DELIVERY", "dateTime": "2024-03-11T17:00:00-05:00"}
                    ],
                    "scanEvents": [
                        {"date": "2024-03-09T08:00:00-06:00", "eventType": "PU", "eventDescription": "Picked up",
                         "scanLocation": {"city": "AUSTIN", "stateOrProvinceCode": "TX"}},
                        {"date": "2024-03-10T02:00:00-06:00", "eventType": "AR", "eventDescription": "Arrived at hub",
                         "scanLocation": {"city": "MEMPHIS", "stateOrProvinceCode": "TN"}}
                    ]
                }]
            }]}
        })
    }

    #[test]
    fn maps_in_transit_payload() {
        let (status, ops) = normalize(&payload(in_transit()), &NormalizeOptions::at(now()));

        assert!(!status.delivered);
        assert_eq!(status.status_code.as_deref(), Some("IT"));
        assert_eq!(status.current_location.as_deref(), Some("MEMPHIS, TN, US"));
        assert_eq!(
            status.estimated_delivery,
            parse_timestamp("2024-03-11T22:00:00Z")
        );
        assert_eq!(status.events.len(), 2);
        assert_eq!(status.events[0].description, "Arrived at hub");
        assert_eq!(status.events[0].code.as_deref(), Some("AR"));

        assert!(!ops.is_delivered);
        assert!(!ops.has_exception);
        assert_eq!(ops.last_event_at, parse_timestamp("2024-03-10T08:00:00Z"));
        assert!(!ops.needs_attention);
    }

    #[test]
    fn delivered_from_actual_delivery_date() {
        let raw = json!({"output": {"completeTrackResults": [{"trackResults": [{
            "latestStatusDetail": {"code": "OD"},
            "dateAndTimes": [{"type": "ACTUAL_DELIVERY", "dateTime": "2024-03-10T09:00:00Z"}]
        }]}]}});
        let (status, ops) = normalize(&payload(raw), &NormalizeOptions::at(now()));
        assert!(status.delivered);
        assert_eq!(status.delivered_at, parse_timestamp("2024-03-10T09:00:00Z"));
        assert!(ops.is_delivered);
        assert!(!ops.needs_attention);
    }

    #[test]
    fn exception_code_on_event_flags_attention() {
        let raw = json!({"output": {"completeTrackResults": [{"trackResults": [{
            "latestStatusDetail": {"code": "IT"},
            "scanEvents": [{"date": "2024-03-10T11:00:00Z", "eventDescription": "Delay",
                            "exceptionCode": "08"}]
        }]}]}});
        let (_, ops) = normalize(&payload(raw), &NormalizeOptions::at(now()));
        assert!(ops.has_exception);
        assert!(ops.needs_attention);
    }

    #[test]
    fn exception_status_code_flags_attention() {
        for code in EXCEPTION_STATUS_CODES {
            let raw = json!({"output": {"completeTrackResults": [{"trackResults": [{
                "latestStatusDetail": {"code": code}
            }]}]}});
            let (_, ops) = normalize(&payload(raw), &NormalizeOptions::at(now()));
            assert!(ops.has_exception, "{code} should be an exception");
        }
    }

    #[test]
    fn stale_shipment_needs_attention() {
        let options = NormalizeOptions::at(now()).with_stale_after(TimeDelta::hours(1));
        let (_, ops) = normalize(&payload(in_transit()), &options);
        assert!(!ops.has_exception);
        assert!(ops.needs_attention);
    }

    #[test]
    fn empty_payload_is_tolerated() {
        let (status, ops) = normalize(&TrackPayload::default(), &NormalizeOptions::at(now()));
        assert!(!status.delivered);
        assert!(status.events.is_empty());
        assert!(ops.needs_attention);
        assert!(ops.last_event_at.is_none());
    }

    #[test]
    fn missing_events_produce_empty_sequence() {
        let raw = json!({"output": {"completeTrackResults": [{"trackResults": [{}]}]}});
        let (status, _) = normalize(&payload(raw), &NormalizeOptions::at(now()));
        assert!(status.events.is_empty());
        assert!(status.status_code.is_none());
    }

    #[test]
    fn null_lists_read_as_empty() {
        let raw = json!({
            "errors": null,
            "output": {"completeTrackResults": [{"trackResults": [{
                "latestStatusDetail": {"code": "IT"},
                "scanEvents": null,
                "dateAndTimes": null
            }]}]}
        });
        let parsed = payload(raw);
        assert!(parsed.errors.is_empty());

        let (status, ops) = normalize(&parsed, &NormalizeOptions::at(now()));
        assert_eq!(status.status_code.as_deref(), Some("IT"));
        assert!(status.events.is_empty());
        assert!(status.estimated_delivery.is_none());
        assert!(ops.needs_attention);

        let outer = payload(json!({"output": {"completeTrackResults": null}}));
        assert!(outer.primary().is_none());
        let inner = payload(json!({"output": {"completeTrackResults": [{"trackResults": null}]}}));
        assert!(inner.primary().is_none());
        assert!(inner.not_found_error().is_none());
    }

    #[test]
    fn events_without_latest_status() {
        let raw = json!({"output": {"completeTrackResults": [{"trackResults": [{
            "scanEvents": [
                {"date": "2024-03-10T10:00:00Z", "eventType": "AR", "eventDescription": "Arrived",
                 "scanLocation": {"city": "MEMPHIS", "stateOrProvinceCode": "TN"}}
            ]
        }]}]}});
        let (status, ops) = normalize(&payload(raw), &NormalizeOptions::at(now()));
        assert!(status.status_code.is_none());
        assert!(status.status_description.is_none());
        assert!(!status.delivered);
        assert_eq!(status.events.len(), 1);
        assert_eq!(status.current_location.as_deref(), Some("MEMPHIS, TN"));
        assert_eq!(ops.last_event_at, parse_timestamp("2024-03-10T10:00:00Z"));
        assert!(!ops.needs_attention);
    }

    #[test]
    fn top_level_error_only_without_output() {
        let rejected = payload(json!({"errors": [
            {"code": "SYSTEM.UNEXPECTED.ERROR", "message": "try later"},
            {"code": "OTHER"}
        ]}));
        assert_eq!(
            rejected.top_level_error().and_then(|e| e.code.as_deref()),
            Some("SYSTEM.UNEXPECTED.ERROR")
        );
        assert!(rejected.primary().is_none());

        let mut answered = payload(in_transit());
        answered.errors.push(ApiError {
            code: Some("WARNING".into()),
            message: None,
        });
        assert!(answered.top_level_error().is_none());
        assert!(TrackPayload::default().top_level_error().is_none());
    }

    #[test]
    fn unparseable_timestamps_sort_last() {
        let raw = json!({"output": {"completeTrackResults": [{"trackResults": [{
            "scanEvents": [
                {"date": "garbage", "eventDescription": "first"},
                {"date": "2024-03-09T00:00:00Z", "eventDescription": "older"},
                {"date": "2024-03-10T00:00:00", "eventDescription": "newer"}
            ]
        }]}]}});
        let (status, _) = normalize(&payload(raw), &NormalizeOptions::at(now()));
        let order: Vec<&str> = status.events.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(order, vec!["newer", "older", "first"]);
        assert!(status.events[2].timestamp.is_none());
    }

    #[test]
    fn normalize_is_idempotent() {
        let parsed = payload(in_transit());
        let options = NormalizeOptions::at(now());
        assert_eq!(normalize(&parsed, &options), normalize(&parsed, &options));
    }

    #[test]
    fn not_found_requires_every_result_to_fail() {
        let missing = payload(json!({"output": {"completeTrackResults": [{"trackResults": [{
            "error": {"code": "TRACKING.TRACKINGNUMBER.NOTFOUND", "message": "not found"}
        }]}]}}));
        assert_eq!(
            missing.not_found_error().and_then(|e| e.code.as_deref()),
            Some("TRACKING.TRACKINGNUMBER.NOTFOUND")
        );

        assert!(payload(in_transit()).not_found_error().is_none());
        assert!(TrackPayload::default().not_found_error().is_none());
    }

    #[test]
    fn not_found_class_codes() {
        assert!(is_not_found_code("TRACKING.TRACKINGNUMBER.NOTFOUND"));
        assert!(is_not_found_code("SHIPMENT.NOT.FOUND"));
        assert!(is_not_found_code("TRACKING.REFERENCETYPE.UNSUPPORTED"));
        assert!(!is_not_found_code("NOT.AUTHORIZED.ERROR"));
    }
}
