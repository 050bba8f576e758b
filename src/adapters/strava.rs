//! Strava REST adapter
//!
//! Parses `/athlete/activities` and `/activities/{id}` payloads. Streams may
//! be embedded as a `streams` array, or come from a separate
//! `/activities/{id}/streams` call and be attached with
//! [`StravaApiAdapter::attach_streams`].

use crate::error::ComputeError;
use crate::types::StravaActivity;
use log::debug;
use serde::Deserialize;

use super::{sort_newest_first, streams_from_value, ActivityPayloadAdapter, RawActivity};

/// Strava API payload adapter
pub struct StravaApiAdapter;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StravaPayload {
    List(Vec<RawActivity>),
    Single(Box<RawActivity>),
}

impl ActivityPayloadAdapter for StravaApiAdapter {
    fn parse(&self, raw_json: &str) -> Result<Vec<StravaActivity>, ComputeError> {
        let payload: StravaPayload = serde_json::from_str(raw_json)?;
        let raw = match payload {
            StravaPayload::List(list) => list,
            StravaPayload::Single(one) => vec![*one],
        };

        let mut activities = Vec::with_capacity(raw.len());
        for activity in raw {
            // The API always carries an id; a missing one means a wrong endpoint
            if activity.id.is_none() {
                return Err(ComputeError::MissingField("id".to_string()));
            }
            activities.push(activity.into_canonical());
        }

        sort_newest_first(&mut activities);
        Ok(activities)
    }
}

impl StravaApiAdapter {
    /// Attach a streams response (array or `key_by_type` form) to an activity
    pub fn attach_streams(
        &self,
        activity: &mut StravaActivity,
        raw_json: &str,
    ) -> Result<(), ComputeError> {
        let value: serde_json::Value = serde_json::from_str(raw_json)?;
        let streams = streams_from_value(value);
        debug!("Attached {} streams to activity {}", streams.len(), activity.id);
        activity.streams = Some(streams);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityId;

    const SAMPLE_LIST: &str = r#"[
        {
            "id": 1001,
            "name": "Morning Ride",
            "distance": 40210.5,
            "moving_time": 5400,
            "elapsed_time": 6000,
            "total_elevation_gain": 320.0,
            "type": "Ride",
            "sport_type": "Ride",
            "start_date": "2024-03-01T06:30:00Z",
            "start_date_local": "2024-03-01T14:30:00Z",
            "average_watts": 180.2,
            "weighted_average_watts": 205,
            "kilojoules": 973.1,
            "average_heartrate": 141.0,
            "max_heartrate": 178.0,
            "suffer_score": 88
        },
        {
            "id": 1002,
            "name": "Recovery Spin",
            "moving_time": 1800,
            "sport_type": "VirtualRide",
            "start_date": "2024-03-02T06:30:00Z",
            "average_watts": null
        }
    ]"#;

    #[test]
    fn test_parse_list_newest_first() {
        let activities = StravaApiAdapter.parse(SAMPLE_LIST).unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].id, ActivityId::Numeric(1002));
        assert_eq!(activities[0].activity_type, "VirtualRide");
        assert_eq!(activities[0].average_watts, None);

        let ride = &activities[1];
        assert_eq!(ride.moving_time, 5400);
        assert_eq!(ride.weighted_average_watts, Some(205.0));
        assert_eq!(ride.suffer_score, Some(88.0));
        assert!(ride.streams.is_none());
    }

    #[test]
    fn test_parse_single_activity() {
        let activities = StravaApiAdapter
            .parse(r#"{"id": 7, "name": "Solo", "start_date": "2024-03-05T07:00:00Z"}"#)
            .unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].name, "Solo");
    }

    #[test]
    fn test_missing_id_rejected() {
        let result = StravaApiAdapter.parse(r#"[{"name": "No id"}]"#);
        assert!(matches!(result, Err(ComputeError::MissingField(f)) if f == "id"));
    }

    #[test]
    fn test_invalid_json() {
        assert!(StravaApiAdapter.parse("not json").is_err());
    }

    #[test]
    fn test_attach_keyed_streams() {
        let mut activity = StravaApiAdapter
            .parse(r#"{"id": 7, "start_date": "2024-03-05T07:00:00Z"}"#)
            .unwrap()
            .remove(0);
        let streams = r#"{
            "time": {"data": [0, 1, 2], "series_type": "time", "original_size": 3, "resolution": "high"},
            "watts": {"data": [150, 210, null], "series_type": "time", "original_size": 3, "resolution": "high"}
        }"#;
        StravaApiAdapter.attach_streams(&mut activity, streams).unwrap();
        let attached = activity.streams.unwrap();
        assert_eq!(attached.len(), 2);
        assert!(attached.iter().any(|s| s.stream_type == "watts" && s.len() == 3));
    }

    #[test]
    fn test_attach_array_streams() {
        let mut activity = StravaActivity::default();
        let streams = r#"[{"type": "heartrate", "data": [120, 130], "series_type": "time", "original_size": 2, "resolution": "high"}]"#;
        StravaApiAdapter.attach_streams(&mut activity, streams).unwrap();
        assert_eq!(activity.streams.unwrap()[0].stream_type, "heartrate");
    }
}
