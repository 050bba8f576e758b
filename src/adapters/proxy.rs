//! Database proxy adapter
//!
//! Parses rows served by the activity database proxy
//! (`/db/activities`, `/db/activities/latest`, `/db/activities/{id}/analysis`).
//! Rows carry the Strava id next to the row id, streams may be keyed by type,
//! and any numeric column may be null.

use crate::error::ComputeError;
use crate::types::{ActivityId, StravaActivity};
use log::debug;
use serde::Deserialize;

use super::{sort_newest_first, ActivityPayloadAdapter, RawActivity};

/// Database proxy payload adapter
pub struct ProxyRowAdapter;

#[derive(Debug, Deserialize)]
struct ProxyRow {
    strava_id: Option<ActivityId>,
    bike_name: Option<String>,
    #[serde(flatten)]
    activity: RawActivity,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProxyPayload {
    Wrapped { data: Vec<ProxyRow> },
    Rows(Vec<ProxyRow>),
    Row(Box<ProxyRow>),
}

impl ActivityPayloadAdapter for ProxyRowAdapter {
    fn parse(&self, raw_json: &str) -> Result<Vec<StravaActivity>, ComputeError> {
        // `latest` answers null when the athlete has no activities
        let payload: Option<ProxyPayload> = serde_json::from_str(raw_json)?;
        let rows = match payload {
            None => Vec::new(),
            Some(ProxyPayload::Wrapped { data }) => data,
            Some(ProxyPayload::Rows(rows)) => rows,
            Some(ProxyPayload::Row(row)) => vec![*row],
        };

        let mut activities: Vec<StravaActivity> = rows.into_iter().map(convert_row).collect();
        sort_newest_first(&mut activities);
        Ok(activities)
    }
}

fn convert_row(row: ProxyRow) -> StravaActivity {
    let mut activity = row.activity.into_canonical();
    if let Some(strava_id) = row.strava_id {
        activity.id = strava_id;
    }
    if let Some(bike) = row.bike_name {
        debug!("Activity {} ridden on {}", activity.id, bike);
    }
    activity
}
