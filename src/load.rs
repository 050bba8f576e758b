//! Training-load calculation
//!
//! This module derives load metrics from activity summary fields:
//! - Intensity Factor (IF = power / FTP)
//! - Training Stress Score, using average power as a stand-in for normalized power
//! - FTP resolution (user override, athlete profile, default)
//! - Assembly of the objective hard-data snapshot for a coaching cycle

use crate::config::CoachConfig;
use crate::error::ComputeError;
use crate::types::{StravaActivity, UserHardData};
use log::debug;
use serde::{Deserialize, Serialize};

/// Lowest FTP a user may enter manually (W)
pub const MIN_FTP_OVERRIDE: f64 = 50.0;

/// Highest FTP a user may enter manually (W)
pub const MAX_FTP_OVERRIDE: f64 = 600.0;

/// IF and TSS for one activity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadMetrics {
    /// Unrounded intensity factor
    pub intensity_factor: f64,
    /// Intensity factor rounded to two decimals for display
    pub intensity_factor_display: f64,
    pub tss: u32,
}

fn check_ftp(ftp: f64) -> Result<(), ComputeError> {
    if !ftp.is_finite() || ftp <= 0.0 {
        return Err(ComputeError::InvalidFtp(ftp));
    }
    Ok(())
}

/// Intensity Factor: power / FTP
pub fn intensity_factor(power: f64, ftp: f64) -> Result<f64, ComputeError> {
    check_ftp(ftp)?;
    Ok(power / ftp)
}

/// Activity TSS: `round(moving_time * power * IF / (FTP * 3600) * 100)`.
///
/// One hour at FTP is 100. This is the score of a ridden activity; the
/// estimate for a generated workout is [`crate::workout::template_tss`].
pub fn activity_tss(power: f64, ftp: f64, moving_time_seconds: u32) -> Result<u32, ComputeError> {
    let intensity = intensity_factor(power, ftp)?;
    let tss = moving_time_seconds as f64 * power * intensity / (ftp * 3600.0) * 100.0;
    Ok(tss.max(0.0).round() as u32)
}

/// Compute IF and TSS together
pub fn compute_load(power: f64, ftp: f64, moving_time_seconds: u32) -> Result<LoadMetrics, ComputeError> {
    let intensity = intensity_factor(power, ftp)?;
    Ok(LoadMetrics {
        intensity_factor: intensity,
        intensity_factor_display: round_to(intensity, 2),
        tss: activity_tss(power, ftp, moving_time_seconds)?,
    })
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Check a manually entered FTP against the accepted 50-600 W range
pub fn validate_ftp_override(ftp: f64) -> Result<(), ComputeError> {
    if ftp.is_nan() || !(MIN_FTP_OVERRIDE..=MAX_FTP_OVERRIDE).contains(&ftp) {
        return Err(ComputeError::InvalidFtpOverride(ftp));
    }
    Ok(())
}

/// Resolve the FTP for a coaching cycle.
///
/// Precedence: explicit override argument, then the override stored in the
/// config, then the athlete profile, then `config.default_ftp`. Zero values
/// are treated as absent.
pub fn resolve_ftp(profile_ftp: Option<u32>, override_ftp: Option<u32>, config: &CoachConfig) -> u32 {
    override_ftp
        .or(config.ftp_override)
        .filter(|ftp| *ftp > 0)
        .or(profile_ftp.filter(|ftp| *ftp > 0))
        .unwrap_or(config.default_ftp)
}

/// Power used for load: weighted average, then average, then the config fallback
pub fn effective_power(activity: &StravaActivity, config: &CoachConfig) -> f64 {
    activity
        .weighted_average_watts
        .filter(|w| *w > 0.0)
        .or(activity.average_watts.filter(|w| *w > 0.0))
        .unwrap_or(config.fallback_power)
}

/// Build the hard-data snapshot from an analyzed activity.
///
/// TSB is the configured placeholder; there is no rolling load history.
pub fn build_hard_data(
    activity: &StravaActivity,
    ftp: u32,
    config: &CoachConfig,
) -> Result<UserHardData, ComputeError> {
    let power = effective_power(activity, config);
    let moving_time = if activity.moving_time > 0 {
        activity.moving_time
    } else {
        config.fallback_moving_time
    };

    let load = compute_load(power, ftp as f64, moving_time)?;
    debug!(
        "Activity '{}': power {:.0} W, FTP {} W, IF {:.2}, TSS {}",
        activity.name, power, ftp, load.intensity_factor, load.tss
    );

    let mut recent = activity.clone();
    recent.streams = None;

    Ok(UserHardData {
        ftp,
        yesterday_tss: load.tss,
        yesterday_if: load.intensity_factor_display,
        tsb: config.placeholder_tsb,
        recent_activities: Some(vec![recent]),
        suffer_score: Some(activity.suffer_score.unwrap_or(0.0)),
        kilojoules: Some(activity.kilojoules.unwrap_or(0.0)),
        max_heart_rate: Some(activity.max_heartrate.unwrap_or(0.0)),
        avg_heart_rate: Some(activity.average_heartrate.unwrap_or(0.0)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hour_at_ftp_is_100() {
        let load = compute_load(200.0, 200.0, 3600).unwrap();
        assert_eq!(load.intensity_factor_display, 1.0);
        assert_eq!(load.tss, 100);
    }

    #[test]
    fn test_tss_formula() {
        // 2 h at 180 W with FTP 250: IF 0.72, TSS = 7200*180*0.72/(250*3600)*100 = 103.68
        assert_eq!(activity_tss(180.0, 250.0, 7200).unwrap(), 104);
        let load = compute_load(180.0, 250.0, 7200).unwrap();
        assert_eq!(load.intensity_factor_display, 0.72);
    }

    #[test]
    fn test_tss_monotonic_in_power() {
        let mut last = 0;
        for power in (50..=400).step_by(10) {
            let tss = activity_tss(power as f64, 230.0, 5400).unwrap();
            assert!(tss >= last);
            last = tss;
        }
        assert!(activity_tss(100.0, 230.0, 5400).unwrap() < activity_tss(300.0, 230.0, 5400).unwrap());
    }

    #[test]
    fn test_invalid_ftp_rejected() {
        assert!(matches!(intensity_factor(200.0, 0.0), Err(ComputeError::InvalidFtp(_))));
        assert!(activity_tss(200.0, -5.0, 3600).is_err());
        assert!(compute_load(200.0, f64::NAN, 3600).is_err());
    }

    #[test]
    fn test_validate_ftp_override() {
        assert!(validate_ftp_override(50.0).is_ok());
        assert!(validate_ftp_override(600.0).is_ok());
        assert!(validate_ftp_override(49.0).is_err());
        assert!(validate_ftp_override(601.0).is_err());
        assert!(validate_ftp_override(f64::NAN).is_err());
    }

    #[test]
    fn test_resolve_ftp_precedence() {
        let config = CoachConfig::default();
        assert_eq!(resolve_ftp(None, None, &config), 200);
        assert_eq!(resolve_ftp(Some(240), None, &config), 240);
        assert_eq!(resolve_ftp(Some(240), Some(265), &config), 265);
        assert_eq!(resolve_ftp(Some(0), None, &config), 200);

        let stored = CoachConfig::default().with_ftp_override(280).unwrap();
        assert_eq!(resolve_ftp(Some(240), None, &stored), 280);
        assert_eq!(resolve_ftp(Some(240), Some(300), &stored), 300);
    }

    #[test]
    fn test_build_hard_data_prefers_weighted_power() {
        let activity = StravaActivity {
            name: "Morning Ride".to_string(),
            moving_time: 3600,
            average_watts: Some(150.0),
            weighted_average_watts: Some(200.0),
            suffer_score: Some(87.0),
            max_heartrate: Some(178.0),
            ..Default::default()
        };
        let hard = build_hard_data(&activity, 200, &CoachConfig::default()).unwrap();

        assert_eq!(hard.ftp, 200);
        assert_eq!(hard.yesterday_tss, 100);
        assert_eq!(hard.yesterday_if, 1.0);
        assert_eq!(hard.tsb, -15.0);
        assert_eq!(hard.suffer_score, Some(87.0));
        assert_eq!(hard.kilojoules, Some(0.0));
        assert_eq!(hard.max_heart_rate, Some(178.0));
        assert_eq!(hard.recent_activities.as_ref().map(|a| a.len()), Some(1));
    }

    #[test]
    fn test_build_hard_data_fallbacks() {
        // No power and no moving time: 150 W for 3600 s at FTP 200
        // IF 0.75, TSS = 3600*150*0.75/(200*3600)*100 = 56.25
        let activity = StravaActivity::default();
        let hard = build_hard_data(&activity, 200, &CoachConfig::default()).unwrap();
        assert_eq!(hard.yesterday_tss, 56);
        assert_eq!(hard.yesterday_if, 0.75);
    }

    #[test]
    fn test_build_hard_data_rejects_zero_ftp() {
        let activity = StravaActivity::default();
        assert!(build_hard_data(&activity, 0, &CoachConfig::default()).is_err());
    }
}
