//! Power zone classification
//!
//! Six fixed zones partition `[0, ∞)` % FTP. Classification is an ascending
//! threshold comparison against [`ZONE_UPPER_BOUNDS`]; every caller (stream
//! bucketing, workout views) goes through this module so the thresholds never
//! diverge.

use crate::error::ComputeError;
use crate::types::PowerZone;

/// Inclusive upper bound (% FTP) of zones 1-5. Anything above is zone 6.
pub const ZONE_UPPER_BOUNDS: [f64; 5] = [55.0, 75.0, 90.0, 105.0, 120.0];

/// The six fixed zone records, indexed 0-5 for zones 1-6
pub const ZONES: [PowerZone; 6] = [
    PowerZone {
        zone: 1,
        name: "Active Recovery",
        min_pct: 0,
        max_pct: Some(55),
        description: "<55% FTP. Flushing and active recovery.",
    },
    PowerZone {
        zone: 2,
        name: "Endurance",
        min_pct: 56,
        max_pct: Some(75),
        description: "56-75% FTP. Aerobic base and metabolic efficiency.",
    },
    PowerZone {
        zone: 3,
        name: "Tempo",
        min_pct: 76,
        max_pct: Some(90),
        description: "76-90% FTP. Muscular endurance.",
    },
    PowerZone {
        zone: 4,
        name: "Threshold",
        min_pct: 91,
        max_pct: Some(105),
        description: "91-105% FTP. Functional threshold power.",
    },
    PowerZone {
        zone: 5,
        name: "VO2Max",
        min_pct: 106,
        max_pct: Some(120),
        description: "106-120% FTP. Expands the aerobic engine.",
    },
    PowerZone {
        zone: 6,
        name: "Anaerobic",
        min_pct: 121,
        max_pct: None,
        description: ">120% FTP. Anaerobic bursts.",
    },
];

/// Classify a percentage of FTP into its zone.
///
/// Negative and NaN inputs are rejected rather than folded into zone 1.
pub fn classify(power_pct: f64) -> Result<&'static PowerZone, ComputeError> {
    if power_pct.is_nan() || power_pct < 0.0 {
        return Err(ComputeError::InvalidPowerPercentage(power_pct));
    }
    Ok(&ZONES[(zone_index(power_pct) - 1) as usize])
}

/// Zone index (1-6) for a percentage of FTP.
///
/// Infallible variant for sanitized samples; anything at or below 55 lands in
/// zone 1.
pub fn zone_index(power_pct: f64) -> u8 {
    ZONE_UPPER_BOUNDS
        .iter()
        .position(|&upper| power_pct <= upper)
        .map(|i| (i + 1) as u8)
        .unwrap_or(6)
}

/// Look up a zone record by index (1-6)
pub fn zone(index: u8) -> Option<&'static PowerZone> {
    match index {
        1..=6 => Some(&ZONES[(index - 1) as usize]),
        _ => None,
    }
}

/// Format a step duration as `"{m}m"` or `"{m}m {s}s"`
pub fn format_duration(seconds: u32) -> String {
    let m = seconds / 60;
    let s = seconds % 60;
    if s > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{m}m")
    }
}
