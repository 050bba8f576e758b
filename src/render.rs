//! Text views of coaching results
//!
//! Markdown renderings consumed by chat and result-card collaborators: the
//! narrative and table views of a workout, and the activity analysis summary.

use crate::decision::tsb_status;
use crate::streams::{zone_band_percent, zone_distribution};
use crate::types::{DailyWorkout, StravaActivity, StreamAnalysis, UserHardData};
use crate::zones::format_duration;

/// Narrative view: one line per step with its instruction, then fueling and
/// the coach's justification.
pub fn narrative(workout: &DailyWorkout) -> String {
    let mut out = format!(
        "### {} [{}]\nTSS: {} | Time: {}m\n\n",
        workout.title,
        workout.focus.as_str().to_uppercase(),
        workout.total_tss,
        workout.total_duration_seconds / 60
    );

    for step in &workout.steps {
        out.push_str(&format!(
            "- {} @ {}% FTP\n  {}\n",
            format_duration(step.duration_seconds),
            step.power_pct,
            step.description
        ));
    }

    if let Some(nutrition) = &workout.nutrition_strategy {
        out.push_str("\n#### Fueling\n");
        out.push_str(&format!("- Pre: {}\n", nutrition.pre));
        out.push_str(&format!("- During: {}\n", nutrition.during));
        out.push_str(&format!("- Post: {}\n", nutrition.post));
    }

    out.push_str(&format!("\n> \"TCU Coach: {}\"\n", workout.decision_reason));
    out
}

/// Table view: Phase | Time | %FTP | Inst.
pub fn table(workout: &DailyWorkout) -> String {
    let mut out = String::from("| Phase | Time | %FTP | Inst. |\n| :--- | :--- | :--- | :--- |\n");
    for step in &workout.steps {
        out.push_str(&format!(
            "| {} | {} | {}% | {} |\n",
            step.phase.as_str(),
            format_duration(step.duration_seconds),
            step.power_pct,
            step.description
        ));
    }
    out
}

/// Activity analysis report with load estimate and, when power was recorded,
/// a three-band intensity profile.
pub fn activity_summary(
    activity: &StravaActivity,
    hard: &UserHardData,
    analysis: Option<&StreamAnalysis>,
) -> String {
    let mut out = String::from("### Activity Analysis Report\n\n| Item | Detail |\n| :--- | :--- |\n");
    out.push_str(&format!("| **Activity** | {} |\n", activity.name));
    out.push_str(&format!(
        "| **Estimated load** | TSS {} (IF: {}) |\n",
        hard.yesterday_tss, hard.yesterday_if
    ));
    out.push_str(&format!("| **FTP** | {} W |\n", hard.ftp));
    out.push_str(&format!("| **Form** | TSB {} ({}) |\n", hard.tsb, tsb_status(hard.tsb)));

    if let Some(analysis) = analysis.filter(|a| a.has_power) {
        let dist = zone_distribution(analysis);
        out.push_str("\n#### Power Profile\n");
        out.push_str("| Zones | Share | Character |\n| :--- | :--- | :--- |\n");
        out.push_str(&format!("| Zone 1-2 | {}% | Aerobic base |\n", zone_band_percent(&dist, 1, 2)));
        out.push_str(&format!("| Zone 3-4 | {}% | Training load |\n", zone_band_percent(&dist, 3, 4)));
        out.push_str(&format!("| Zone 5-6 | {}% | High-intensity anaerobic |\n", zone_band_percent(&dist, 5, 6)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::rule_for;
    use crate::streams::{analyze_streams, WATTS};
    use crate::types::{DecisionResult, DecisionType, StravaStream};
    use crate::workout::generate;

    fn workout(t: DecisionType) -> DailyWorkout {
        let rule = rule_for(t);
        generate(&DecisionResult {
            decision_type: t,
            reason: "Go ride".to_string(),
            recommended_focus: rule.recommended_focus.to_string(),
        })
    }

    fn hard() -> UserHardData {
        UserHardData {
            ftp: 200,
            yesterday_tss: 100,
            yesterday_if: 1.0,
            tsb: -15.0,
            recent_activities: None,
            suffer_score: None,
            kilojoules: None,
            max_heart_rate: None,
            avg_heart_rate: None,
        }
    }

    #[test]
    fn test_narrative_lists_steps_in_order() {
        let text = narrative(&workout(DecisionType::Technic));
        assert!(text.starts_with("### Cadence Drills & Neuromuscular [ANAEROBIC]"));
        let warmup = text.find("15m @ 60% FTP").unwrap();
        let burst = text.find("0m 30s @ 110% FTP").unwrap();
        assert!(warmup < burst);
        assert!(text.contains("#### Fueling"));
        assert!(text.ends_with("> \"TCU Coach: Go ride\"\n"));
    }

    #[test]
    fn test_table_has_row_per_step() {
        let w = workout(DecisionType::Target);
        let text = table(&w);
        assert_eq!(text.lines().count(), 2 + w.steps.len());
        assert!(text.contains("| active | 20m | 90% | SST Block 1 (90% FTP) |"));
    }

    #[test]
    fn test_summary_without_power() {
        let activity = StravaActivity {
            name: "Commute".to_string(),
            ..Default::default()
        };
        let text = activity_summary(&activity, &hard(), None);
        assert!(text.contains("| **Activity** | Commute |"));
        assert!(text.contains("TSS 100 (IF: 1)"));
        assert!(text.contains("| **Form** | TSB -15 (Optimal) |"));
        assert!(!text.contains("Power Profile"));
    }

    #[test]
    fn test_summary_with_power_profile() {
        // FTP 200: two Z1 samples, one Z4, one Z6
        let streams = vec![StravaStream::numeric(WATTS, &[80.0, 90.0, 200.0, 260.0])];
        let analysis = analyze_streams(&streams, 200.0).unwrap();
        let text = activity_summary(&StravaActivity::default(), &hard(), Some(&analysis));
        assert!(text.contains("| Zone 1-2 | 50% |"));
        assert!(text.contains("| Zone 3-4 | 25% |"));
        assert!(text.contains("| Zone 5-6 | 25% |"));
    }
}
