//! Structured workout export
//!
//! Encodes a [`DailyWorkout`] as a ZWO workout file. Power values are written
//! as FTP fractions (`power_pct / 100`). Warmups ramp up from 0.25, cooldowns
//! ramp down to 0.25, active and rest steps are steady-state segments.

use crate::config::DEFAULT_ZWO_AUTHOR;
use crate::error::ComputeError;
use crate::types::{DailyWorkout, StepPhase, WorkoutStep};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// Tag attached to every exported workout
pub const ZWO_TAG: &str = "TCUCoach";

/// Ramp floor for warmup start and cooldown end
const RAMP_FLOOR: &str = "0.25";

const CDATA_END: &str = "]]>";

/// ZWO encoder
pub struct ZwoEncoder {
    author: String,
}

impl Default for ZwoEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_ZWO_AUTHOR)
    }
}

impl ZwoEncoder {
    pub fn new(author: &str) -> Self {
        Self {
            author: author.to_string(),
        }
    }

    /// Encode a workout.
    ///
    /// Step descriptions are embedded verbatim in CDATA blocks, so a
    /// description containing `]]>` is rejected.
    pub fn encode(&self, workout: &DailyWorkout) -> Result<String, ComputeError> {
        if let Some(step) = workout.steps.iter().find(|s| s.description.contains(CDATA_END)) {
            return Err(ComputeError::ExportError(format!(
                "step description contains CDATA terminator: {:?}",
                step.description
            )));
        }

        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        write_event(&mut writer, Event::Start(BytesStart::new("workout_file")))?;
        write_text_element(&mut writer, "author", &self.author)?;
        write_text_element(&mut writer, "name", &workout.title)?;
        write_text_element(&mut writer, "description", &workout.decision_reason)?;

        write_event(&mut writer, Event::Start(BytesStart::new("tags")))?;
        let mut tag = BytesStart::new("tag");
        tag.push_attribute(("name", ZWO_TAG));
        write_event(&mut writer, Event::Empty(tag))?;
        write_event(&mut writer, Event::End(BytesEnd::new("tags")))?;

        write_event(&mut writer, Event::Start(BytesStart::new("workout")))?;
        for step in &workout.steps {
            write_step(&mut writer, step)?;
        }
        write_event(&mut writer, Event::End(BytesEnd::new("workout")))?;
        write_event(&mut writer, Event::End(BytesEnd::new("workout_file")))?;

        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|e| ComputeError::ExportError(e.to_string()))
    }
}

fn write_step<W: std::io::Write>(
    writer: &mut Writer<W>,
    step: &WorkoutStep,
) -> Result<(), ComputeError> {
    let duration = step.duration_seconds.to_string();
    let power = (step.power_pct as f64 / 100.0).to_string();

    let name = match step.phase {
        StepPhase::Warmup => "Warmup",
        StepPhase::Cooldown => "Cooldown",
        StepPhase::Active | StepPhase::Rest => "SteadyState",
    };

    let mut element = BytesStart::new(name);
    element.push_attribute(("Duration", duration.as_str()));
    match step.phase {
        StepPhase::Warmup => {
            element.push_attribute(("PowerLow", RAMP_FLOOR));
            element.push_attribute(("PowerHigh", power.as_str()));
        }
        StepPhase::Cooldown => {
            element.push_attribute(("PowerLow", power.as_str()));
            element.push_attribute(("PowerHigh", RAMP_FLOOR));
        }
        StepPhase::Active | StepPhase::Rest => {
            element.push_attribute(("Power", power.as_str()));
            if let Some(cadence) = step.cadence {
                element.push_attribute(("Cadence", cadence.to_string().as_str()));
            }
        }
    }

    write_event(writer, Event::Start(element))?;
    write_event(writer, Event::CData(BytesCData::new(step.description.as_str())))?;
    write_event(writer, Event::End(BytesEnd::new(name)))
}

/// Element with escaped text content
fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), ComputeError> {
    write_event(writer, Event::Start(BytesStart::new(name)))?;
    write_event(writer, Event::Text(BytesText::new(value)))?;
    write_event(writer, Event::End(BytesEnd::new(name)))
}

fn write_event<W: std::io::Write>(
    writer: &mut Writer<W>,
    event: Event<'_>,
) -> Result<(), ComputeError> {
    writer
        .write_event(event)
        .map_err(|e| ComputeError::ExportError(e.to_string()))
}

/// Encode with the default author
pub fn to_zwo(workout: &DailyWorkout) -> Result<String, ComputeError> {
    ZwoEncoder::default().encode(workout)
}
