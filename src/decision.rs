//! Readiness decision engine
//!
//! Combines the objective fatigue signal (TSB) with the athlete's subjective
//! report into one of four categories. Both the matrix and the per-category
//! texts are plain tables so a new category only needs a new row.

use crate::types::{
    DecisionResult, DecisionType, Feeling, SleepQuality, UserHardData, UserSubjectiveData,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// TSB strictly below this value counts as fatigued
pub const FATIGUE_TSB_THRESHOLD: f64 = -10.0;

/// RPE at or above this value counts as feeling bad
pub const HIGH_RPE: u8 = 7;

/// Form band of a TSB value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TsbStatus {
    Resting,
    Fresh,
    Optimal,
    HighRisk,
}

impl TsbStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TsbStatus::Resting => "Resting",
            TsbStatus::Fresh => "Fresh",
            TsbStatus::Optimal => "Optimal",
            TsbStatus::HighRisk => "High Risk",
        }
    }
}

impl fmt::Display for TsbStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Exclusive lower bounds, checked top down. Anything at or below the last
/// bound is `HighRisk`.
const TSB_BANDS: [(f64, TsbStatus); 3] = [
    (20.0, TsbStatus::Resting),
    (-10.0, TsbStatus::Fresh),
    (-30.0, TsbStatus::Optimal),
];

/// Classify a TSB value into its form band
pub fn tsb_status(tsb: f64) -> TsbStatus {
    TSB_BANDS
        .iter()
        .find(|(floor, _)| tsb > *floor)
        .map(|(_, status)| *status)
        .unwrap_or(TsbStatus::HighRisk)
}

/// Fixed justification and focus for a decision category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionRule {
    pub decision_type: DecisionType,
    pub reason: &'static str,
    pub recommended_focus: &'static str,
}

pub const DECISION_RULES: [DecisionRule; 4] = [
    DecisionRule {
        decision_type: DecisionType::Recovery,
        reason: "Accumulated fatigue is high (low TSB) and you report feeling tired or sore. \
                 To prevent overtraining, today is rest or active recovery.",
        recommended_focus: "Active Recovery (Zone 1)",
    },
    DecisionRule {
        decision_type: DecisionType::AdaptiveCap,
        reason: "Accumulated fatigue is high. You feel fine, but to avoid a physiological \
                 breakdown today's intensity is capped at Zone 2 (aerobic riding).",
        recommended_focus: "Endurance (Zone 2)",
    },
    DecisionRule {
        decision_type: DecisionType::Technic,
        reason: "Your form is fresh (high TSB) but you report feeling flat. Do technique or \
                 neuromuscular activation work and avoid heavy loads.",
        recommended_focus: "Neuromuscular / Cadence",
    },
    DecisionRule {
        decision_type: DecisionType::Target,
        reason: "Both the data and how you feel say you are in good shape. You can execute \
                 the target session.",
        recommended_focus: "SST / VO2Max / Threshold",
    },
];

/// Decision by `[is_fatigued][feels_bad]`.
///
/// Under either fatigue state only `feels_bad` is consulted; a non-bad report
/// is treated as good.
const READINESS_MATRIX: [[DecisionType; 2]; 2] = [
    // fresh
    [DecisionType::Target, DecisionType::Technic],
    // fatigued
    [DecisionType::AdaptiveCap, DecisionType::Recovery],
];

/// Intermediate classification signals.
///
/// `feels_bad` and `feels_good` are not complements: an otherwise fine report
/// with poor sleep satisfies both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessSignals {
    pub is_fatigued: bool,
    pub feels_bad: bool,
    pub feels_good: bool,
}

impl ReadinessSignals {
    pub fn evaluate(hard: &UserHardData, subjective: &UserSubjectiveData) -> Self {
        let tired = subjective.feeling == Feeling::Tired;
        Self {
            is_fatigued: hard.tsb < FATIGUE_TSB_THRESHOLD,
            feels_bad: tired
                || subjective.soreness
                || subjective.sleep_quality == SleepQuality::Poor
                || subjective.rpe >= HIGH_RPE,
            feels_good: !tired && !subjective.soreness && subjective.rpe < HIGH_RPE,
        }
    }

    pub fn is_fresh(&self) -> bool {
        !self.is_fatigued
    }

    /// Matrix lookup
    pub fn decision_type(&self) -> DecisionType {
        READINESS_MATRIX[self.is_fatigued as usize][self.feels_bad as usize]
    }
}

/// Rule for a decision category
pub fn rule_for(decision_type: DecisionType) -> &'static DecisionRule {
    match decision_type {
        DecisionType::Recovery => &DECISION_RULES[0],
        DecisionType::AdaptiveCap => &DECISION_RULES[1],
        DecisionType::Technic => &DECISION_RULES[2],
        DecisionType::Target => &DECISION_RULES[3],
    }
}

/// Decide today's training category. Pure and total.
pub fn decide(hard: &UserHardData, subjective: &UserSubjectiveData) -> DecisionResult {
    let signals = ReadinessSignals::evaluate(hard, subjective);
    let rule = rule_for(signals.decision_type());

    debug!(
        "TSB {:.1}, RPE {}: fatigued={} bad={} good={} -> {}",
        hard.tsb,
        subjective.rpe,
        signals.is_fatigued,
        signals.feels_bad,
        signals.feels_good,
        rule.decision_type
    );

    DecisionResult {
        decision_type: rule.decision_type,
        reason: rule.reason.to_string(),
        recommended_focus: rule.recommended_focus.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hard(tsb: f64) -> UserHardData {
        UserHardData {
            ftp: 250,
            yesterday_tss: 150,
            yesterday_if: 0.9,
            tsb,
            recent_activities: None,
            suffer_score: None,
            kilojoules: None,
            max_heart_rate: None,
            avg_heart_rate: None,
        }
    }

    fn report(feeling: Feeling, soreness: bool, sleep: SleepQuality, rpe: u8) -> UserSubjectiveData {
        UserSubjectiveData {
            rpe,
            soreness,
            sleep_quality: sleep,
            feeling,
        }
    }

    #[test]
    fn test_fatigued_and_bad_is_recovery() {
        let result = decide(&hard(-25.0), &report(Feeling::Tired, true, SleepQuality::Poor, 8));
        assert_eq!(result.decision_type, DecisionType::Recovery);
        assert_eq!(result.recommended_focus, "Active Recovery (Zone 1)");
    }

    #[test]
    fn test_fatigued_and_good_is_adaptive_cap() {
        let result = decide(&hard(-15.0), &report(Feeling::Fresh, false, SleepQuality::Good, 3));
        assert_eq!(result.decision_type, DecisionType::AdaptiveCap);
    }

    #[test]
    fn test_fresh_and_tired_is_technic() {
        let result = decide(&hard(5.0), &report(Feeling::Tired, false, SleepQuality::Average, 4));
        assert_eq!(result.decision_type, DecisionType::Technic);
    }

    #[test]
    fn test_fresh_and_good_is_target() {
        let result = decide(&hard(5.0), &report(Feeling::Fresh, false, SleepQuality::Good, 2));
        assert_eq!(result.decision_type, DecisionType::Target);
        assert_eq!(result.recommended_focus, "SST / VO2Max / Threshold");
    }

    #[test]
    fn test_tsb_boundary_is_not_fatigued() {
        let ok = report(Feeling::Ok, false, SleepQuality::Good, 3);
        assert_eq!(decide(&hard(-10.0), &ok).decision_type, DecisionType::Target);
        assert_eq!(decide(&hard(-10.01), &ok).decision_type, DecisionType::AdaptiveCap);
    }

    #[test]
    fn test_poor_sleep_alone_feels_bad() {
        let r = report(Feeling::Ok, false, SleepQuality::Poor, 3);
        let signals = ReadinessSignals::evaluate(&hard(0.0), &r);
        // Both signals hold at once
        assert!(signals.feels_bad);
        assert!(signals.feels_good);
        assert_eq!(decide(&hard(0.0), &r).decision_type, DecisionType::Technic);
        assert_eq!(decide(&hard(-20.0), &r).decision_type, DecisionType::Recovery);
    }

    #[test]
    fn test_rpe_threshold() {
        let r6 = report(Feeling::Ok, false, SleepQuality::Good, 6);
        let r7 = report(Feeling::Ok, false, SleepQuality::Good, 7);
        assert_eq!(decide(&hard(0.0), &r6).decision_type, DecisionType::Target);
        assert_eq!(decide(&hard(0.0), &r7).decision_type, DecisionType::Technic);
    }

    #[test]
    fn test_every_combination_yields_a_category() {
        let feelings = [Feeling::Tired, Feeling::Ok, Feeling::Fresh];
        let sleeps = [SleepQuality::Poor, SleepQuality::Average, SleepQuality::Good];
        for tsb in [-30.0, -10.0, 0.0, 20.0] {
            for feeling in feelings {
                for sleep in sleeps {
                    for soreness in [false, true] {
                        for rpe in 1..=10 {
                            let r = report(feeling, soreness, sleep, rpe);
                            let signals = ReadinessSignals::evaluate(&hard(tsb), &r);
                            let result = decide(&hard(tsb), &r);
                            let expected = match (signals.is_fatigued, signals.feels_bad) {
                                (true, true) => DecisionType::Recovery,
                                (true, false) => DecisionType::AdaptiveCap,
                                (false, true) => DecisionType::Technic,
                                (false, false) => DecisionType::Target,
                            };
                            assert_eq!(result.decision_type, expected);
                            assert!(!result.reason.is_empty());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_rules_cover_each_type_once() {
        for t in DecisionType::ALL {
            assert_eq!(rule_for(t).decision_type, t);
        }
    }

    #[test]
    fn test_tsb_status_bands() {
        assert_eq!(tsb_status(35.0), TsbStatus::Resting);
        assert_eq!(tsb_status(20.5), TsbStatus::Resting);
        assert_eq!(tsb_status(20.0), TsbStatus::Fresh);
        assert_eq!(tsb_status(0.0), TsbStatus::Fresh);
        assert_eq!(tsb_status(-10.0), TsbStatus::Optimal);
        assert_eq!(tsb_status(-15.0), TsbStatus::Optimal);
        assert_eq!(tsb_status(-30.0), TsbStatus::HighRisk);
        assert_eq!(tsb_status(-45.0), TsbStatus::HighRisk);
        assert_eq!(tsb_status(f64::NAN), TsbStatus::HighRisk);
        assert_eq!(TsbStatus::HighRisk.to_string(), "High Risk");
        assert_eq!(serde_json::to_value(TsbStatus::HighRisk).unwrap(), "HIGH_RISK");
    }
}
