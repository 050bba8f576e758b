//! Pipeline orchestration
//!
//! This module provides the public API for the coach. It runs a coaching cycle
//! from an activity payload to a prescribed workout:
//! activity adaptation → stream analysis + load → decision → workout.

use crate::adapters::{ActivitySource, JsonActivitySource, PayloadFormat};
use crate::config::CoachConfig;
use crate::decision::decide;
use crate::encoder::{CoachReport, ReportEncoder};
use crate::error::ComputeError;
use crate::load::{build_hard_data, resolve_ftp, validate_ftp_override};
use crate::streams::analyze_streams;
use crate::types::{
    ActivityAnalysis, ActivityId, DailyWorkout, DecisionResult, Prescription, StravaActivity,
    UserHardData, UserSubjectiveData,
};
use crate::workout::generate;
use log::{debug, info, warn};

/// Analyze one activity: resolve FTP, build hard data, analyze streams.
///
/// # Arguments
/// * `activity` - Activity summary, optionally carrying raw streams
/// * `profile_ftp` - FTP from the athlete profile, if known
/// * `config` - Coach configuration (fallbacks, FTP override)
pub fn analyze_activity(
    activity: &StravaActivity,
    profile_ftp: Option<u32>,
    config: &CoachConfig,
) -> Result<ActivityAnalysis, ComputeError> {
    let ftp = resolve_ftp(profile_ftp, None, config);
    let hard_data = build_hard_data(activity, ftp, config)?;

    let streams = match activity.streams.as_deref() {
        Some(streams) if !streams.is_empty() => Some(analyze_streams(streams, ftp as f64)?),
        _ => None,
    };

    let mut summary = activity.clone();
    summary.streams = None;

    Ok(ActivityAnalysis {
        activity: summary,
        hard_data,
        streams,
    })
}

/// Decide and generate today's workout
pub fn prescribe(
    hard: &UserHardData,
    subjective: &UserSubjectiveData,
) -> Result<Prescription, ComputeError> {
    subjective.validate()?;
    let decision = decide(hard, subjective);
    let workout = generate(&decision);
    Ok(Prescription { decision, workout })
}

/// Parse a payload and analyze the requested activity (latest when `id` is
/// `None`). Returns `Ok(None)` when the payload holds no such activity.
pub fn analyze_json(
    format: PayloadFormat,
    raw_json: &str,
    id: Option<&ActivityId>,
    profile_ftp: Option<u32>,
    config: &CoachConfig,
) -> Result<Option<ActivityAnalysis>, ComputeError> {
    let source = JsonActivitySource::from_payload(format.adapter(), raw_json)?;
    let activity = match id {
        Some(id) => source.activity(id)?,
        None => source.latest_activity()?,
    };

    match activity {
        Some(activity) => analyze_activity(&activity, profile_ftp, config).map(Some),
        None => {
            debug!("No matching activity in {format} payload");
            Ok(None)
        }
    }
}

/// Run a full coaching cycle from raw JSON and return the report as JSON.
///
/// # Arguments
/// * `format` - Shape of the activity payload
/// * `activity_json` - Activity payload; the latest activity is coached
/// * `subjective_json` - Subjective report (`UserSubjectiveData`)
/// * `config` - Coach configuration
///
/// # Example
/// ```ignore
/// let report = coach_from_json(PayloadFormat::Strava, activities, survey, &CoachConfig::default())?;
/// ```
pub fn coach_from_json(
    format: PayloadFormat,
    activity_json: &str,
    subjective_json: &str,
    config: &CoachConfig,
) -> Result<String, ComputeError> {
    let subjective: UserSubjectiveData = serde_json::from_str(subjective_json)?;
    let analysis = analyze_json(format, activity_json, None, None, config)?
        .ok_or_else(|| ComputeError::MissingField("activity".to_string()))?;
    let prescription = prescribe(&analysis.hard_data, &subjective)?;

    ReportEncoder::new().encode_to_json(&analysis, Some(&subjective), Some(&prescription))
}

/// Stage of a coaching session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Waiting for activity data
    Ingestion,
    /// Hard data available, waiting for the subjective report
    Diagnostic,
    /// Workout prescribed
    Prescription,
}

/// Stateful coaching session.
///
/// Holds the hard data for the current cycle, replaces it wholesale whenever a
/// new activity is ingested or the FTP changes, and accepts the subjective
/// report at most once.
pub struct CoachSession {
    config: CoachConfig,
    profile_ftp: Option<u32>,
    state: FlowState,
    in_flight: bool,
    activity: Option<StravaActivity>,
    analysis: Option<ActivityAnalysis>,
    subjective: Option<UserSubjectiveData>,
    prescription: Option<Prescription>,
    encoder: ReportEncoder,
}

impl Default for CoachSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CoachSession {
    /// Create a new session with default settings
    pub fn new() -> Self {
        Self::with_config(CoachConfig::default())
    }

    /// Create a session with a specific configuration
    pub fn with_config(config: CoachConfig) -> Self {
        Self {
            config,
            profile_ftp: None,
            state: FlowState::Ingestion,
            in_flight: false,
            activity: None,
            analysis: None,
            subjective: None,
            prescription: None,
            encoder: ReportEncoder::new(),
        }
    }

    /// Set the FTP from the athlete profile
    pub fn with_profile_ftp(mut self, ftp: u32) -> Self {
        self.profile_ftp = Some(ftp);
        self
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// FTP the next analysis will use
    pub fn ftp(&self) -> u32 {
        resolve_ftp(self.profile_ftp, None, &self.config)
    }

    pub fn analysis(&self) -> Option<&ActivityAnalysis> {
        self.analysis.as_ref()
    }

    pub fn hard_data(&self) -> Option<&UserHardData> {
        self.analysis.as_ref().map(|a| &a.hard_data)
    }

    pub fn decision(&self) -> Option<&DecisionResult> {
        self.prescription.as_ref().map(|p| &p.decision)
    }

    pub fn workout(&self) -> Option<&DailyWorkout> {
        self.prescription.as_ref().map(|p| &p.workout)
    }

    pub fn diagnostic_submitted(&self) -> bool {
        self.subjective.is_some()
    }

    /// Claim the analysis slot before fetching activity data.
    ///
    /// Returns `false` when an analysis is already in flight; the caller must
    /// not start another fetch.
    pub fn begin_ingestion(&mut self) -> bool {
        if self.in_flight {
            debug!("Activity analysis already in flight");
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Release the analysis slot after a failed fetch
    pub fn abort_ingestion(&mut self) {
        self.in_flight = false;
    }

    /// Analyze a fetched activity and start a new cycle on it.
    ///
    /// Replacing the hard data discards any earlier diagnostic and
    /// prescription; the session returns to the diagnostic step.
    pub fn ingest_activity(
        &mut self,
        activity: StravaActivity,
    ) -> Result<&ActivityAnalysis, ComputeError> {
        self.in_flight = false;
        let analysis = analyze_activity(&activity, self.profile_ftp, &self.config)?;
        info!(
            "Ingested activity {}: TSS {}, IF {}",
            activity.id, analysis.hard_data.yesterday_tss, analysis.hard_data.yesterday_if
        );

        if self.prescription.take().is_some() {
            debug!("Discarding prescription made on the previous activity");
        }
        self.subjective = None;
        self.activity = Some(activity);
        self.state = FlowState::Diagnostic;
        Ok(&*self.analysis.insert(analysis))
    }

    /// Fetch and ingest from a source.
    ///
    /// Returns `Ok(None)` when another analysis is in flight or the source has
    /// no matching activity.
    pub fn ingest_from(
        &mut self,
        source: &dyn ActivitySource,
        id: Option<&ActivityId>,
    ) -> Result<Option<&ActivityAnalysis>, ComputeError> {
        if !self.begin_ingestion() {
            return Ok(None);
        }

        let fetched = match id {
            Some(id) => source.activity(id),
            None => source.latest_activity(),
        };
        let activity = match fetched {
            Ok(Some(activity)) => activity,
            Ok(None) => {
                self.abort_ingestion();
                return Ok(None);
            }
            Err(e) => {
                self.abort_ingestion();
                return Err(e);
            }
        };

        self.ingest_activity(activity).map(Some)
    }

    /// Set a user-entered FTP (50-600 W). Hard data is rebuilt from the
    /// current activity.
    pub fn set_ftp_override(&mut self, ftp: f64) -> Result<(), ComputeError> {
        validate_ftp_override(ftp)?;
        self.config.ftp_override = Some(ftp.round() as u32);

        if let Some(activity) = &self.activity {
            self.analysis = Some(analyze_activity(activity, self.profile_ftp, &self.config)?);
        }
        Ok(())
    }

    /// Submit the subjective report and prescribe today's workout.
    ///
    /// Only the first valid submission per ingested activity is accepted;
    /// later calls return `Ok(None)` and leave the prescription untouched.
    pub fn submit_diagnostic(
        &mut self,
        subjective: UserSubjectiveData,
    ) -> Result<Option<&Prescription>, ComputeError> {
        if self.subjective.is_some() {
            warn!("Diagnostic already submitted; ignoring resubmission");
            return Ok(None);
        }

        let hard = self
            .hard_data()
            .ok_or_else(|| ComputeError::MissingField("hard_data".to_string()))?;
        let prescription = prescribe(hard, &subjective)?;

        info!(
            "Prescribed {} ({})",
            prescription.decision.decision_type, prescription.workout.title
        );

        self.subjective = Some(subjective);
        self.state = FlowState::Prescription;
        Ok(Some(&*self.prescription.insert(prescription)))
    }

    /// Report for the current cycle, if an activity has been analyzed
    pub fn report(&self) -> Option<CoachReport> {
        self.analysis.as_ref().map(|analysis| {
            self.encoder
                .encode(analysis, self.subjective.as_ref(), self.prescription.as_ref())
        })
    }
}
