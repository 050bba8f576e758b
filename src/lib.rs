//! TCU Coach - Training-load and decision engine for a cycling coach
//!
//! The coach turns a cyclist's latest activity into training-load metrics,
//! combines them with a short wellness report into a readiness decision, and
//! generates the day's structured workout:
//! activity adaptation → stream analysis + load → decision → workout → export.
//!
//! ## Modules
//!
//! - **Analysis**: power zones, stream statistics and TSS/IF (`zones`, `streams`, `load`)
//! - **Coaching**: readiness decision and workout generation (`decision`, `workout`)
//! - **Export**: ZWO files, Markdown views and JSON reports (`zwo`, `render`, `encoder`)

pub mod adapters;
pub mod config;
pub mod decision;
pub mod encoder;
pub mod error;
pub mod load;
pub mod pipeline;
pub mod render;
pub mod streams;
pub mod types;
pub mod workout;
pub mod zones;
pub mod zwo;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapters::{ActivitySource, JsonActivitySource, PayloadFormat};
pub use config::CoachConfig;
pub use encoder::{CoachReport, ReportEncoder};
pub use error::ComputeError;
pub use pipeline::{analyze_activity, analyze_json, coach_from_json, prescribe, CoachSession, FlowState};

/// Coach version embedded in every report
pub const COACH_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for coaching reports
pub const PRODUCER_NAME: &str = "tcu-coach";
