//! Core types for the TCU coach engine
//!
//! This module defines the records that flow through each stage of a coaching
//! cycle: raw activity data and streams, the objective and subjective athlete
//! snapshots, the readiness decision and the generated workout.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the six standardized power-intensity bands relative to FTP
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerZone {
    /// Zone index (1-6)
    pub zone: u8,
    pub name: &'static str,
    /// Inclusive lower bound (% FTP), descriptive only
    pub min_pct: u32,
    /// Inclusive upper bound (% FTP); `None` for the open-ended top zone
    pub max_pct: Option<u32>,
    pub description: &'static str,
}

/// A named time-series recorded during an activity.
///
/// Streams belonging to the same activity are co-indexed: sample `i` of every
/// stream type refers to the same instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StravaStream {
    /// Stream type tag ("watts", "heartrate", "time", "latlng", ...)
    #[serde(rename = "type")]
    pub stream_type: String,
    /// Samples; numbers for most types, `[lat, lng]` pairs and booleans for others.
    /// A null or non-array `data` field reads as an empty stream.
    #[serde(default, deserialize_with = "lenient_samples")]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub series_type: String,
    #[serde(default)]
    pub original_size: usize,
    #[serde(default)]
    pub resolution: String,
}

impl StravaStream {
    /// Build a numeric stream (used by adapters and tests)
    pub fn numeric(stream_type: &str, samples: &[f64]) -> Self {
        Self {
            stream_type: stream_type.to_string(),
            data: samples.iter().map(|v| serde_json::json!(v)).collect(),
            series_type: "time".to_string(),
            original_size: samples.len(),
            resolution: "high".to_string(),
        }
    }

    /// Sample count
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

pub(crate) fn lenient_samples<'de, D>(deserializer: D) -> Result<Vec<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Array(samples)) => Ok(samples),
        _ => Ok(Vec::new()),
    }
}

/// Aggregate power statistics for one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamAnalysis {
    pub has_power: bool,
    pub has_heart_rate: bool,
    pub average_watts: f64,
    pub max_watts: f64,
    /// Seconds spent in each power zone (keys 1-6, one sample = one second)
    pub time_in_zones: BTreeMap<u8, u32>,
    /// NP / average power. Not computed; always 1.0
    pub variability_index: f64,
}

/// A single co-indexed instant across every stream of an activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityDataPoint {
    pub index: usize,
    /// Seconds since activity start
    pub time: f64,
    /// Meters
    pub distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    /// km/h (converted from m/s)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartrate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watts: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moving: Option<bool>,
}

/// Activity identifier; Strava uses integers, proxies sometimes return strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivityId {
    Numeric(i64),
    Text(String),
}

impl Default for ActivityId {
    fn default() -> Self {
        ActivityId::Numeric(0)
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityId::Numeric(id) => write!(f, "{id}"),
            ActivityId::Text(id) => f.write_str(id),
        }
    }
}

/// Activity summary record as supplied by the activity source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StravaActivity {
    #[serde(default)]
    pub id: ActivityId,
    #[serde(default)]
    pub name: String,
    /// Meters
    #[serde(default)]
    pub distance: f64,
    /// Seconds
    #[serde(default)]
    pub moving_time: u32,
    /// Seconds
    #[serde(default)]
    pub elapsed_time: u32,
    #[serde(default)]
    pub total_elevation_gain: f64,
    #[serde(rename = "type", default)]
    pub activity_type: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub start_date_local: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_watts: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_average_watts: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffer_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kilojoules: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_heartrate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_heartrate: Option<f64>,
    /// Raw streams attached by the source, when fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streams: Option<Vec<StravaStream>>,
}

/// The athlete's objective-load snapshot for a coaching cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserHardData {
    /// Functional threshold power (W)
    pub ftp: u32,
    pub yesterday_tss: u32,
    pub yesterday_if: f64,
    /// Training Stress Balance; more negative = more fatigued
    pub tsb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_activities: Option<Vec<StravaActivity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffer_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kilojoules: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heart_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<f64>,
}

/// Self-reported sleep quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Poor,
    Average,
    Good,
}

/// Self-reported overall feeling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feeling {
    Tired,
    Ok,
    Fresh,
}

/// The athlete's self-report for the current cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSubjectiveData {
    /// Rate of perceived exertion, 1-10
    pub rpe: u8,
    pub soreness: bool,
    pub sleep_quality: SleepQuality,
    pub feeling: Feeling,
}

impl UserSubjectiveData {
    /// Reject reports the survey form could never produce
    pub fn validate(&self) -> Result<(), ComputeError> {
        if !(1..=10).contains(&self.rpe) {
            return Err(ComputeError::InvalidSubjectiveData(format!(
                "rpe must be between 1 and 10, got {}",
                self.rpe
            )));
        }
        Ok(())
    }
}

/// Readiness category produced by the decision engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionType {
    Recovery,
    AdaptiveCap,
    Technic,
    Target,
}

impl DecisionType {
    pub const ALL: [DecisionType; 4] = [
        DecisionType::Recovery,
        DecisionType::AdaptiveCap,
        DecisionType::Technic,
        DecisionType::Target,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::Recovery => "RECOVERY",
            DecisionType::AdaptiveCap => "ADAPTIVE_CAP",
            DecisionType::Technic => "TECHNIC",
            DecisionType::Target => "TARGET",
        }
    }
}

impl FromStr for DecisionType {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DecisionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ComputeError::UnrecognizedDecisionType(s.to_string()))
    }
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the decision engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    #[serde(rename = "type")]
    pub decision_type: DecisionType,
    pub reason: String,
    pub recommended_focus: String,
}

/// Zone-name focus of a generated workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkoutFocus {
    Recovery,
    Endurance,
    Tempo,
    Threshold,
    #[serde(rename = "VO2Max")]
    Vo2Max,
    Anaerobic,
}

impl WorkoutFocus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutFocus::Recovery => "Recovery",
            WorkoutFocus::Endurance => "Endurance",
            WorkoutFocus::Tempo => "Tempo",
            WorkoutFocus::Threshold => "Threshold",
            WorkoutFocus::Vo2Max => "VO2Max",
            WorkoutFocus::Anaerobic => "Anaerobic",
        }
    }
}

/// Phase of a workout step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPhase {
    Warmup,
    Active,
    Rest,
    Cooldown,
}

impl StepPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepPhase::Warmup => "warmup",
            StepPhase::Active => "active",
            StepPhase::Rest => "rest",
            StepPhase::Cooldown => "cooldown",
        }
    }
}

/// One segment of a workout, in prescribed execution order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutStep {
    #[serde(rename = "type")]
    pub phase: StepPhase,
    pub duration_seconds: u32,
    /// Target power as % FTP
    pub power_pct: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<u32>,
    pub description: String,
}

/// Fueling guidance attached to a workout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionStrategy {
    pub pre: String,
    pub during: String,
    pub post: String,
}

/// A generated single-day workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWorkout {
    pub title: String,
    pub focus: WorkoutFocus,
    /// Justification carried over from the decision
    pub decision_reason: String,
    pub steps: Vec<WorkoutStep>,
    pub total_tss: u32,
    pub total_duration_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition_strategy: Option<NutritionStrategy>,
}

/// Result of ingesting one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityAnalysis {
    /// The analyzed activity, streams removed
    pub activity: StravaActivity,
    pub hard_data: UserHardData,
    /// Present only when the activity carried streams
    pub streams: Option<StreamAnalysis>,
}

/// Decision and the workout generated from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub decision: DecisionResult,
    pub workout: DailyWorkout,
}
