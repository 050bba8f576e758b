//! Activity payload adapters
//!
//! This module provides adapters that parse activity payloads from the
//! backends the coach has been wired to, and map them to the canonical
//! [`StravaActivity`] record. The core only depends on [`ActivitySource`];
//! which backend feeds it is the caller's choice.

mod proxy;
mod strava;

pub use proxy::ProxyRowAdapter;
pub use strava::StravaApiAdapter;

use crate::error::ComputeError;
use crate::types::{lenient_samples, ActivityId, StravaActivity, StravaStream};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

/// Trait for activity payload adapters
pub trait ActivityPayloadAdapter {
    /// Parse raw JSON into canonical activities, newest first
    fn parse(&self, raw_json: &str) -> Result<Vec<StravaActivity>, ComputeError>;
}

/// Backend payload shapes understood by the coach
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Strava REST API objects
    #[default]
    Strava,
    /// Activity database proxy rows
    Proxy,
}

impl PayloadFormat {
    pub fn adapter(&self) -> &'static dyn ActivityPayloadAdapter {
        match self {
            PayloadFormat::Strava => &StravaApiAdapter,
            PayloadFormat::Proxy => &ProxyRowAdapter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadFormat::Strava => "strava",
            PayloadFormat::Proxy => "proxy",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadFormat {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strava" => Ok(PayloadFormat::Strava),
            "proxy" => Ok(PayloadFormat::Proxy),
            other => Err(ComputeError::ParseError(format!(
                "unknown payload format: {other}"
            ))),
        }
    }
}

/// Canonical data-access contract for activity data
pub trait ActivitySource {
    /// Most recent activity, if any
    fn latest_activity(&self) -> Result<Option<StravaActivity>, ComputeError>;

    /// A specific activity by id
    fn activity(&self, id: &ActivityId) -> Result<Option<StravaActivity>, ComputeError>;
}

/// In-memory activity source backed by an already-fetched payload
#[derive(Debug, Clone, Default)]
pub struct JsonActivitySource {
    activities: Vec<StravaActivity>,
}

impl JsonActivitySource {
    pub fn new(mut activities: Vec<StravaActivity>) -> Self {
        sort_newest_first(&mut activities);
        Self { activities }
    }

    /// Parse a payload with the given adapter
    pub fn from_payload(
        adapter: &dyn ActivityPayloadAdapter,
        raw_json: &str,
    ) -> Result<Self, ComputeError> {
        let activities = adapter.parse(raw_json)?;
        debug!("Loaded {} activities from payload", activities.len());
        Ok(Self::new(activities))
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

impl ActivitySource for JsonActivitySource {
    fn latest_activity(&self) -> Result<Option<StravaActivity>, ComputeError> {
        Ok(self.activities.first().cloned())
    }

    fn activity(&self, id: &ActivityId) -> Result<Option<StravaActivity>, ComputeError> {
        Ok(self.activities.iter().find(|a| &a.id == id).cloned())
    }
}

/// Sort by `start_date` descending.
///
/// Dates are compared as instants, so mixed offsets order correctly. Dates
/// that do not parse sort after every parsed one, by their raw text.
pub(crate) fn sort_newest_first(activities: &mut [StravaActivity]) {
    activities.sort_by_cached_key(|a| {
        Reverse((parse_start_date(&a.start_date), a.start_date.clone()))
    });
}

/// RFC 3339, or the Postgres text form (`2024-04-02 06:00:00+00`)
fn parse_start_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .map(|date| date.with_timezone(&Utc))
        .ok()
}

/// Activity fields shared by every backend; every field may be null or absent
#[derive(Debug, Deserialize)]
pub(crate) struct RawActivity {
    id: Option<ActivityId>,
    name: Option<String>,
    distance: Option<f64>,
    moving_time: Option<f64>,
    elapsed_time: Option<f64>,
    total_elevation_gain: Option<f64>,
    #[serde(rename = "type")]
    activity_type: Option<String>,
    sport_type: Option<String>,
    start_date: Option<String>,
    start_date_local: Option<String>,
    average_watts: Option<f64>,
    weighted_average_watts: Option<f64>,
    suffer_score: Option<f64>,
    kilojoules: Option<f64>,
    average_heartrate: Option<f64>,
    max_heartrate: Option<f64>,
    streams: Option<serde_json::Value>,
}

impl RawActivity {
    pub(crate) fn into_canonical(self) -> StravaActivity {
        StravaActivity {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            distance: self.distance.unwrap_or(0.0),
            moving_time: seconds(self.moving_time),
            elapsed_time: seconds(self.elapsed_time),
            total_elevation_gain: self.total_elevation_gain.unwrap_or(0.0),
            activity_type: self.activity_type.or(self.sport_type).unwrap_or_default(),
            start_date: self.start_date.unwrap_or_default(),
            start_date_local: self.start_date_local.unwrap_or_default(),
            average_watts: self.average_watts,
            weighted_average_watts: self.weighted_average_watts,
            suffer_score: self.suffer_score,
            kilojoules: self.kilojoules,
            average_heartrate: self.average_heartrate,
            max_heartrate: self.max_heartrate,
            streams: self.streams.map(streams_from_value),
        }
    }
}

fn seconds(value: Option<f64>) -> u32 {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.round() as u32)
        .unwrap_or(0)
}

#[derive(Debug, Deserialize)]
struct RawKeyedStream {
    #[serde(default, deserialize_with = "lenient_samples")]
    data: Vec<serde_json::Value>,
    series_type: Option<String>,
    original_size: Option<usize>,
    resolution: Option<String>,
}

/// Convert a `streams` value, either a list of typed objects or an object
/// keyed by type, into canonical streams.
///
/// Entries that cannot be read are dropped with a warning; a broken stream
/// never fails the activity it belongs to.
pub(crate) fn streams_from_value(value: serde_json::Value) -> Vec<StravaStream> {
    match value {
        serde_json::Value::Array(entries) => entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<StravaStream>(entry) {
                Ok(stream) => Some(stream),
                Err(e) => {
                    warn!("Dropping unreadable stream entry: {e}");
                    None
                }
            })
            .collect(),
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter_map(|(stream_type, entry)| {
                match serde_json::from_value::<RawKeyedStream>(entry) {
                    Ok(raw) => Some(StravaStream {
                        original_size: raw.original_size.unwrap_or(raw.data.len()),
                        data: raw.data,
                        stream_type,
                        series_type: raw.series_type.unwrap_or_default(),
                        resolution: raw.resolution.unwrap_or_default(),
                    }),
                    Err(e) => {
                        warn!("Dropping unreadable '{stream_type}' stream: {e}");
                        None
                    }
                }
            })
            .collect(),
        serde_json::Value::Null => Vec::new(),
        other => {
            warn!("Ignoring streams field of unexpected shape: {other}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: i64, start: &str) -> StravaActivity {
        StravaActivity {
            id: ActivityId::Numeric(id),
            start_date: start.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_source_orders_newest_first() {
        let source = JsonActivitySource::new(vec![
            activity(1, "2024-03-01T07:00:00Z"),
            activity(3, "2024-03-03T07:00:00Z"),
            activity(2, "2024-03-02T07:00:00Z"),
        ]);
        let latest = source.latest_activity().unwrap().unwrap();
        assert_eq!(latest.id, ActivityId::Numeric(3));
        assert_eq!(source.len(), 3);
    }

    #[test]
    fn test_ordering_compares_instants_across_offsets() {
        let source = JsonActivitySource::new(vec![
            // 2024-04-01T23:00:00Z
            activity(1, "2024-04-02T07:00:00+08:00"),
            activity(2, "2024-04-02 06:00:00+00"),
            activity(3, "2024-04-02T05:30:00Z"),
            activity(4, ""),
        ]);
        let order: Vec<ActivityId> = source.activities.iter().map(|a| a.id.clone()).collect();
        assert_eq!(
            order,
            vec![
                ActivityId::Numeric(2),
                ActivityId::Numeric(3),
                ActivityId::Numeric(1),
                ActivityId::Numeric(4),
            ]
        );
    }

    #[test]
    fn test_source_lookup_by_id() {
        let source = JsonActivitySource::new(vec![activity(7, "2024-03-01T07:00:00Z")]);
        assert!(source.activity(&ActivityId::Numeric(7)).unwrap().is_some());
        assert!(source.activity(&ActivityId::Numeric(8)).unwrap().is_none());
    }

    #[test]
    fn test_empty_source() {
        let source = JsonActivitySource::default();
        assert!(source.is_empty());
        assert!(source.latest_activity().unwrap().is_none());
    }

    #[test]
    fn test_payload_format_selects_adapter() {
        let raw = r#"[{"id": 1, "strava_id": 55, "start_date": "2024-03-01T07:00:00Z"}]"#;
        let proxy = PayloadFormat::Proxy.adapter().parse(raw).unwrap();
        assert_eq!(proxy[0].id, ActivityId::Numeric(55));
        let strava = PayloadFormat::Strava.adapter().parse(raw).unwrap();
        assert_eq!(strava[0].id, ActivityId::Numeric(1));

        assert_eq!("Proxy".parse::<PayloadFormat>().unwrap(), PayloadFormat::Proxy);
        assert!("garmin".parse::<PayloadFormat>().is_err());
    }

    #[test]
    fn test_keyed_streams_take_type_from_key() {
        let value = serde_json::json!({
            "watts": {"data": [100, 200], "series_type": "time"},
            "time": {"data": [0, 1]}
        });
        let streams = streams_from_value(value);
        assert_eq!(streams.len(), 2);
        let watts = streams.iter().find(|s| s.stream_type == "watts").unwrap();
        assert_eq!(watts.original_size, 2);
        assert_eq!(watts.series_type, "time");
    }

    #[test]
    fn test_broken_streams_are_dropped_or_emptied() {
        let value = serde_json::json!([
            {"type": "watts", "data": null},
            {"type": "heartrate", "data": "corrupt"},
            {"data": [1, 2, 3]},
            42,
            {"type": "time", "data": [0, 1, 2]}
        ]);
        let streams = streams_from_value(value);
        let types: Vec<&str> = streams.iter().map(|s| s.stream_type.as_str()).collect();
        assert_eq!(types, vec!["watts", "heartrate", "time"]);
        assert!(streams[0].is_empty());
        assert!(streams[1].is_empty());
        assert_eq!(streams[2].len(), 3);

        let keyed = streams_from_value(serde_json::json!({"watts": "corrupt", "time": {"data": {}}}));
        assert_eq!(keyed.len(), 1);
        assert_eq!(keyed[0].stream_type, "time");
        assert!(keyed[0].is_empty());

        assert!(streams_from_value(serde_json::json!("corrupt")).is_empty());
    }
}
