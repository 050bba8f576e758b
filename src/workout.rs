//! Workout generation
//!
//! Each decision category maps to one fixed, hand-authored template. The
//! templates are static data; generation copies the steps and computes the
//! aggregate duration and an estimated TSS.

use crate::error::ComputeError;
use crate::types::{
    DailyWorkout, DecisionResult, DecisionType, NutritionStrategy, StepPhase, WorkoutFocus,
    WorkoutStep,
};
use crate::types::StepPhase::{Active, Cooldown, Rest, Warmup};
use log::debug;

/// Static step definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSpec {
    pub phase: StepPhase,
    pub duration_seconds: u32,
    pub power_pct: u32,
    pub cadence: Option<u32>,
    pub description: &'static str,
}

impl StepSpec {
    const fn new(phase: StepPhase, duration_seconds: u32, power_pct: u32, description: &'static str) -> Self {
        Self {
            phase,
            duration_seconds,
            power_pct,
            cadence: None,
            description,
        }
    }

    const fn with_cadence(mut self, cadence: u32) -> Self {
        self.cadence = Some(cadence);
        self
    }

    fn to_step(self) -> WorkoutStep {
        WorkoutStep {
            phase: self.phase,
            duration_seconds: self.duration_seconds,
            power_pct: self.power_pct,
            cadence: self.cadence,
            description: self.description.to_string(),
        }
    }
}

/// A fixed workout template for one decision category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkoutTemplate {
    pub decision_type: DecisionType,
    pub title: &'static str,
    pub focus: WorkoutFocus,
    pub steps: &'static [StepSpec],
    pub nutrition: [&'static str; 3],
}

const RECOVERY_STEPS: [StepSpec; 3] = [
    StepSpec::new(Warmup, 600, 50, "Easy spinning to wake the legs up"),
    StepSpec::new(Active, 1200, 55, "Stay in Zone 1, focus on breathing and relaxing"),
    StepSpec::new(Cooldown, 300, 45, "Very light gear to cool down"),
];

const ADAPTIVE_CAP_STEPS: [StepSpec; 3] = [
    StepSpec::new(Warmup, 600, 55, "Gradual warm-up"),
    StepSpec::new(Active, 2400, 70, "Steady Zone 2 output, do not enter Zone 3"),
    StepSpec::new(Cooldown, 600, 50, "Cool down"),
];

const TECHNIC_STEPS: [StepSpec; 7] = [
    StepSpec::new(Warmup, 900, 60, "Warm up, raising cadence progressively"),
    StepSpec::new(Active, 30, 110, "High-cadence burst (focus on smoothness)").with_cadence(110),
    StepSpec::new(Rest, 270, 50, "Full recovery"),
    StepSpec::new(Active, 30, 110, "High-cadence burst").with_cadence(120),
    StepSpec::new(Rest, 270, 50, "Full recovery"),
    StepSpec::new(Active, 30, 110, "High-cadence burst (top speed)").with_cadence(130),
    StepSpec::new(Cooldown, 600, 50, "Cool down"),
];

const TARGET_STEPS: [StepSpec; 7] = [
    StepSpec::new(Warmup, 600, 60, "Warm up"),
    StepSpec::new(Active, 300, 80, "Tempo primer"),
    StepSpec::new(Rest, 180, 55, "Recover"),
    StepSpec::new(Active, 1200, 90, "SST Block 1 (90% FTP)"),
    StepSpec::new(Rest, 300, 55, "Recover"),
    StepSpec::new(Active, 1200, 90, "SST Block 2 (90% FTP)"),
    StepSpec::new(Cooldown, 600, 50, "Cool down"),
];

pub const WORKOUT_TEMPLATES: [WorkoutTemplate; 4] = [
    WorkoutTemplate {
        decision_type: DecisionType::Recovery,
        title: "Active Recovery Spin",
        focus: WorkoutFocus::Recovery,
        steps: &RECOVERY_STEPS,
        nutrition: [
            "Normal meal 2-3 hours before; no extra carbohydrate loading needed.",
            "Water or electrolytes only.",
            "Protein-rich meal to support repair; prioritise sleep.",
        ],
    },
    WorkoutTemplate {
        decision_type: DecisionType::AdaptiveCap,
        title: "Strict Zone 2 Endurance",
        focus: WorkoutFocus::Endurance,
        steps: &ADAPTIVE_CAP_STEPS,
        nutrition: [
            "Light carbohydrate snack 60-90 minutes before.",
            "30-40 g carbohydrate per hour with electrolytes.",
            "Carbohydrate and protein within an hour to restock glycogen.",
        ],
    },
    WorkoutTemplate {
        decision_type: DecisionType::Technic,
        title: "Cadence Drills & Neuromuscular",
        // Short bursts sit in the anaerobic band
        focus: WorkoutFocus::Anaerobic,
        steps: &TECHNIC_STEPS,
        nutrition: [
            "Small carbohydrate snack 60 minutes before.",
            "Water with electrolytes.",
            "Balanced meal; no special recovery fueling needed.",
        ],
    },
    WorkoutTemplate {
        decision_type: DecisionType::Target,
        title: "Sweet Spot Training (SST)",
        focus: WorkoutFocus::Threshold,
        steps: &TARGET_STEPS,
        nutrition: [
            "Carbohydrate-rich meal 2-3 hours before, or a gel 15 minutes before.",
            "60 g carbohydrate per hour from drink mix or gels.",
            "Carbohydrate and 20-30 g protein within 30 minutes.",
        ],
    },
];

/// Template for a decision category
pub fn template_for(decision_type: DecisionType) -> &'static WorkoutTemplate {
    match decision_type {
        DecisionType::Recovery => &WORKOUT_TEMPLATES[0],
        DecisionType::AdaptiveCap => &WORKOUT_TEMPLATES[1],
        DecisionType::Technic => &WORKOUT_TEMPLATES[2],
        DecisionType::Target => &WORKOUT_TEMPLATES[3],
    }
}

/// Estimated TSS of a step list: `round(Σ duration * (pct/100)^2 / 36)`.
///
/// This intentionally differs from [`crate::load::activity_tss`], which scores
/// a ridden activity against FTP.
pub fn template_tss(steps: &[WorkoutStep]) -> u32 {
    let raw: f64 = steps
        .iter()
        .map(|s| {
            let ratio = s.power_pct as f64 / 100.0;
            s.duration_seconds as f64 * ratio * ratio / 36.0
        })
        .sum();
    raw.round() as u32
}

/// Total prescribed duration in seconds
pub fn total_duration(steps: &[WorkoutStep]) -> u32 {
    steps.iter().map(|s| s.duration_seconds).sum()
}

/// Generate the workout for a decision. Pure and deterministic.
pub fn generate(decision: &DecisionResult) -> DailyWorkout {
    let template = template_for(decision.decision_type);
    let steps: Vec<WorkoutStep> = template.steps.iter().map(|s| s.to_step()).collect();
    let [pre, during, post] = template.nutrition;

    let workout = DailyWorkout {
        title: template.title.to_string(),
        focus: template.focus,
        decision_reason: decision.reason.clone(),
        total_tss: template_tss(&steps),
        total_duration_seconds: total_duration(&steps),
        steps,
        nutrition_strategy: Some(NutritionStrategy {
            pre: pre.to_string(),
            during: during.to_string(),
            post: post.to_string(),
        }),
    };

    debug!(
        "Generated '{}' ({} steps, {} s, TSS {})",
        workout.title,
        workout.steps.len(),
        workout.total_duration_seconds,
        workout.total_tss
    );

    workout
}

/// Generate from an external decision tag; unknown tags are an error
pub fn generate_from_tag(tag: &str, reason: &str) -> Result<DailyWorkout, ComputeError> {
    let decision_type: DecisionType = tag.parse()?;
    let rule = crate::decision::rule_for(decision_type);
    Ok(generate(&DecisionResult {
        decision_type,
        reason: reason.to_string(),
        recommended_focus: rule.recommended_focus.to_string(),
    }))
}
