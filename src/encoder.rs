//! Coaching report encoding
//!
//! Serializes one coaching cycle (activity analysis, subjective report,
//! decision and workout) into a JSON report with producer and provenance
//! metadata, so downstream consumers can tell which engine build produced it.

use crate::decision::{tsb_status, TsbStatus};
use crate::error::ComputeError;
use crate::streams::zone_distribution;
use crate::types::{
    ActivityAnalysis, DailyWorkout, DecisionResult, Prescription, StreamAnalysis, UserHardData,
    UserSubjectiveData,
};
use crate::{COACH_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProvenance {
    pub activity_id: String,
    pub activity_name: String,
    /// Start of the analyzed activity as reported by the source
    pub activity_start_utc: String,
    pub computed_at_utc: String,
}

/// A complete coaching cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub hard_data: UserHardData,
    /// Form band of `hard_data.tsb`
    pub tsb_status: TsbStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_analysis: Option<StreamAnalysis>,
    /// Zone percentages, present when the activity had power data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_distribution: Option<BTreeMap<u8, u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjective: Option<UserSubjectiveData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<DecisionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout: Option<DailyWorkout>,
}

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build a report. The prescription and subjective report are optional so
    /// an analysis-only cycle can be reported too.
    pub fn encode(
        &self,
        analysis: &ActivityAnalysis,
        subjective: Option<&UserSubjectiveData>,
        prescription: Option<&Prescription>,
    ) -> CoachReport {
        let activity = &analysis.activity;

        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: COACH_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = ReportProvenance {
            activity_id: activity.id.to_string(),
            activity_name: activity.name.clone(),
            activity_start_utc: activity.start_date.clone(),
            computed_at_utc: Utc::now().to_rfc3339(),
        };

        let distribution = analysis
            .streams
            .as_ref()
            .filter(|s| s.has_power)
            .map(zone_distribution);

        CoachReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            provenance,
            hard_data: analysis.hard_data.clone(),
            tsb_status: tsb_status(analysis.hard_data.tsb),
            stream_analysis: analysis.streams.clone(),
            zone_distribution: distribution,
            subjective: subjective.cloned(),
            decision: prescription.map(|p| p.decision.clone()),
            workout: prescription.map(|p| p.workout.clone()),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        analysis: &ActivityAnalysis,
        subjective: Option<&UserSubjectiveData>,
        prescription: Option<&Prescription>,
    ) -> Result<String, ComputeError> {
        let report = self.encode(analysis, subjective, prescription);
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoachConfig;
    use crate::pipeline::{analyze_activity, prescribe};
    use crate::streams::WATTS;
    use crate::types::{ActivityId, Feeling, SleepQuality, StravaActivity, StravaStream};

    fn sample_activity(with_streams: bool) -> StravaActivity {
        StravaActivity {
            id: ActivityId::Numeric(4242),
            name: "Hill Repeats".to_string(),
            moving_time: 3600,
            start_date: "2024-05-01T06:00:00Z".to_string(),
            weighted_average_watts: Some(200.0),
            streams: with_streams
                .then(|| vec![StravaStream::numeric(WATTS, &[100.0, 150.0, 190.0, 250.0])]),
            ..Default::default()
        }
    }

    fn subjective() -> UserSubjectiveData {
        UserSubjectiveData {
            rpe: 3,
            soreness: false,
            sleep_quality: SleepQuality::Good,
            feeling: Feeling::Fresh,
        }
    }

    #[test]
    fn test_full_report_shape() {
        let analysis = analyze_activity(&sample_activity(true), None, &CoachConfig::default()).unwrap();
        let report_subjective = subjective();
        let prescription = prescribe(&analysis.hard_data, &report_subjective).unwrap();

        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let json = encoder
            .encode_to_json(&analysis, Some(&report_subjective), Some(&prescription))
            .unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["report_version"], "1.0.0");
        assert_eq!(payload["producer"]["name"], "tcu-coach");
        assert_eq!(payload["producer"]["instance_id"], "test-instance");
        assert_eq!(payload["provenance"]["activity_id"], "4242");
        assert_eq!(payload["hard_data"]["ftp"], 200);
        assert_eq!(payload["hard_data"]["yesterday_tss"], 100);
        // TSB placeholder of -15 is fatigued; a fresh report caps intensity
        assert_eq!(payload["decision"]["type"], "ADAPTIVE_CAP");
        assert_eq!(payload["workout"]["focus"], "Endurance");
        assert_eq!(payload["zone_distribution"]["1"], 25);
        assert_eq!(payload["tsb_status"], "OPTIMAL");
    }

    #[test]
    fn test_analysis_only_report() {
        let analysis = analyze_activity(&sample_activity(false), None, &CoachConfig::default()).unwrap();
        let report = ReportEncoder::new().encode(&analysis, None, None);

        assert!(report.stream_analysis.is_none());
        assert!(report.zone_distribution.is_none());
        assert!(report.decision.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("workout").is_none());
        assert!(json.get("subjective").is_none());
    }

    #[test]
    fn test_unique_instance_ids() {
        assert_ne!(ReportEncoder::new().instance_id(), ReportEncoder::new().instance_id());
    }
}
