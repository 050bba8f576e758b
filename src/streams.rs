//! Stream analysis
//!
//! This module turns the raw, co-indexed time-series of one activity into:
//! - Aggregate power statistics (mean, max)
//! - Time in each power zone
//! - Zone distribution percentages
//! - Per-instant data points for charting collaborators
//!
//! Every power sample is assumed to represent one second. Gaps and
//! non-uniform sampling are not accounted for.

use crate::error::ComputeError;
use crate::types::{ActivityDataPoint, StravaStream, StreamAnalysis};
use crate::zones;
use log::{debug, warn};
use std::collections::BTreeMap;

pub const WATTS: &str = "watts";
pub const HEARTRATE: &str = "heartrate";
pub const TIME: &str = "time";
pub const DISTANCE: &str = "distance";
pub const ALTITUDE: &str = "altitude";
pub const CADENCE: &str = "cadence";
pub const VELOCITY_SMOOTH: &str = "velocity_smooth";
pub const LATLNG: &str = "latlng";
pub const GRADE_SMOOTH: &str = "grade_smooth";
pub const TEMP: &str = "temp";
pub const MOVING: &str = "moving";

/// Borrowed view over the streams of a single activity, looked up by type tag
pub struct StreamSet<'a> {
    streams: &'a [StravaStream],
}

impl<'a> StreamSet<'a> {
    pub fn new(streams: &'a [StravaStream]) -> Self {
        Self { streams }
    }

    /// First stream with the given type tag
    pub fn get(&self, stream_type: &str) -> Option<&'a StravaStream> {
        self.streams.iter().find(|s| s.stream_type == stream_type)
    }

    pub fn has(&self, stream_type: &str) -> bool {
        self.get(stream_type).is_some()
    }

    /// Numeric sample at `index`, if the stream exists and the sample is a number
    fn number_at(&self, stream_type: &str, index: usize) -> Option<f64> {
        self.get(stream_type)
            .and_then(|s| s.data.get(index))
            .and_then(|v| v.as_f64())
    }
}

/// Analyze the streams of one activity against an FTP.
///
/// A missing or malformed `watts` stream is not an error: the result simply
/// reports `has_power = false` with zeroed aggregates.
pub fn analyze_streams(streams: &[StravaStream], ftp: f64) -> Result<StreamAnalysis, ComputeError> {
    if !ftp.is_finite() || ftp <= 0.0 {
        return Err(ComputeError::InvalidFtp(ftp));
    }

    let set = StreamSet::new(streams);
    let mut analysis = StreamAnalysis {
        has_power: false,
        has_heart_rate: set.has(HEARTRATE),
        average_watts: 0.0,
        max_watts: 0.0,
        time_in_zones: (1..=6).map(|z| (z, 0)).collect(),
        variability_index: 1.0,
    };

    let Some(power_stream) = set.get(WATTS) else {
        debug!("No power stream present; reporting has_power=false");
        return Ok(analysis);
    };

    let samples = usable_power_samples(power_stream);
    if samples.is_empty() {
        if !power_stream.is_empty() {
            warn!(
                "Power stream has {} samples but none are usable watt values",
                power_stream.len()
            );
        }
        return Ok(analysis);
    }

    let total: f64 = samples.iter().sum();
    analysis.has_power = true;
    analysis.average_watts = total / samples.len() as f64;
    analysis.max_watts = samples.iter().copied().fold(0.0, f64::max);

    for watts in &samples {
        let zone = zones::zone_index(watts / ftp * 100.0);
        *analysis.time_in_zones.entry(zone).or_insert(0) += 1;
    }

    debug!(
        "Analyzed {} power samples: avg {:.1} W, max {:.0} W",
        samples.len(),
        analysis.average_watts,
        analysis.max_watts
    );

    Ok(analysis)
}

/// Numeric, finite, non-negative samples of a power stream
fn usable_power_samples(stream: &StravaStream) -> Vec<f64> {
    let samples: Vec<f64> = stream
        .data
        .iter()
        .filter_map(|v| v.as_f64())
        .filter(|w| w.is_finite() && *w >= 0.0)
        .collect();

    let skipped = stream.len() - samples.len();
    if skipped > 0 && !samples.is_empty() {
        warn!("Skipped {skipped} malformed power samples");
    }
    samples
}

/// Percentage of classified time in each zone, rounded to the nearest integer.
///
/// Returns an empty map when no time has been classified.
pub fn zone_distribution(analysis: &StreamAnalysis) -> BTreeMap<u8, u32> {
    let total: u32 = analysis.time_in_zones.values().sum();
    if total == 0 {
        return BTreeMap::new();
    }

    analysis
        .time_in_zones
        .iter()
        .map(|(&zone, &secs)| {
            let pct = (secs as f64 / total as f64 * 100.0).round() as u32;
            (zone, pct)
        })
        .collect()
}

/// Summed percentage for an inclusive range of zones (e.g. zones 1-2)
pub fn zone_band_percent(distribution: &BTreeMap<u8, u32>, from: u8, to: u8) -> u32 {
    distribution
        .range(from..=to)
        .map(|(_, pct)| *pct)
        .sum()
}

/// Flatten co-indexed streams into one data point per instant.
///
/// The `time` stream is the master index; without it the result is empty.
pub fn to_data_points(streams: &[StravaStream]) -> Vec<ActivityDataPoint> {
    let set = StreamSet::new(streams);
    let Some(time) = set.get(TIME) else {
        warn!("Streams are missing 'time' data");
        return Vec::new();
    };

    let latlng = set.get(LATLNG);
    let moving = set.get(MOVING);

    (0..time.len())
        .map(|i| {
            let (lat, lng) = latlng
                .and_then(|s| s.data.get(i))
                .and_then(|v| v.as_array())
                .map(|pair| {
                    (
                        pair.first().and_then(|v| v.as_f64()),
                        pair.get(1).and_then(|v| v.as_f64()),
                    )
                })
                .unwrap_or((None, None));

            ActivityDataPoint {
                index: i,
                time: set.number_at(TIME, i).unwrap_or(0.0),
                distance: set.number_at(DISTANCE, i).unwrap_or(0.0),
                altitude: set.number_at(ALTITUDE, i),
                lat,
                lng,
                speed: set.number_at(VELOCITY_SMOOTH, i).map(|ms| ms * 3.6),
                heartrate: set.number_at(HEARTRATE, i),
                cadence: set.number_at(CADENCE, i),
                watts: set.number_at(WATTS, i),
                grade: set.number_at(GRADE_SMOOTH, i),
                temp: set.number_at(TEMP, i),
                moving: moving
                    .and_then(|s| s.data.get(i))
                    .and_then(|v| v.as_bool()),
            }
        })
        .collect()
}
