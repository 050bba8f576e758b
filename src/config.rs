//! Engine configuration
//!
//! Values the browser app kept in local storage or hard-coded at call sites
//! (FTP override, default FTP, placeholder TSB) are passed in explicitly here.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

/// FTP used when neither a user override nor an athlete profile value exists
pub const DEFAULT_FTP: u32 = 200;

/// Power assumed when an activity carries no power fields (W)
pub const DEFAULT_FALLBACK_POWER: f64 = 150.0;

/// Moving time assumed when an activity reports zero (seconds)
pub const DEFAULT_FALLBACK_MOVING_TIME: u32 = 3600;

/// TSB used until a rolling load history exists
pub const DEFAULT_PLACEHOLDER_TSB: f64 = -15.0;

/// Author written into exported workout files
pub const DEFAULT_ZWO_AUTHOR: &str = "TCU Coach";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    pub default_ftp: u32,
    /// User-entered FTP; wins over the athlete profile
    pub ftp_override: Option<u32>,
    pub fallback_power: f64,
    pub fallback_moving_time: u32,
    pub placeholder_tsb: f64,
    pub zwo_author: String,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            default_ftp: DEFAULT_FTP,
            ftp_override: None,
            fallback_power: DEFAULT_FALLBACK_POWER,
            fallback_moving_time: DEFAULT_FALLBACK_MOVING_TIME,
            placeholder_tsb: DEFAULT_PLACEHOLDER_TSB,
            zwo_author: DEFAULT_ZWO_AUTHOR.to_string(),
        }
    }
}

impl CoachConfig {
    /// Load configuration from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: CoachConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(ComputeError::JsonError)
    }

    /// Replace the FTP override, validating its range
    pub fn with_ftp_override(mut self, ftp: u32) -> Result<Self, ComputeError> {
        crate::load::validate_ftp_override(ftp as f64)?;
        self.ftp_override = Some(ftp);
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.default_ftp == 0 {
            return Err(ComputeError::InvalidFtp(0.0));
        }
        if let Some(ftp) = self.ftp_override {
            crate::load::validate_ftp_override(ftp as f64)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoachConfig::default();
        assert_eq!(config.default_ftp, 200);
        assert_eq!(config.placeholder_tsb, -15.0);
        assert_eq!(config.zwo_author, "TCU Coach");
        assert!(config.ftp_override.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CoachConfig::from_json(r#"{"ftp_override": 260}"#).unwrap();
        assert_eq!(config.ftp_override, Some(260));
        assert_eq!(config.default_ftp, 200);
    }

    #[test]
    fn test_override_out_of_range_rejected() {
        assert!(CoachConfig::from_json(r#"{"ftp_override": 900}"#).is_err());
        assert!(CoachConfig::default().with_ftp_override(40).is_err());
        assert!(CoachConfig::default().with_ftp_override(250).is_ok());
    }

    #[test]
    fn test_zero_default_ftp_rejected() {
        assert!(matches!(
            CoachConfig::from_json(r#"{"default_ftp": 0}"#),
            Err(ComputeError::InvalidFtp(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = CoachConfig::default().with_ftp_override(275).unwrap();
        let restored = CoachConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(restored, config);
    }
}
