use shared::{domain::HeatingProgramDefinition, protocol::NewProgram};

use crate::{
    error::HeatingError,
    session::{self, MANUAL_MARKER},
};

pub const MIN_TIME: i64 = 1;
pub const MAX_TIME: i64 = 120;
pub const MIN_POWER: i64 = 1;
pub const MAX_POWER: i64 = 10;
pub const DEFAULT_POWER: i64 = session::DEFAULT_POWER as i64;
pub const QUICK_START_TIME: i64 = 30;

/// Accepted manual input, ready to build a session from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    pub time: u32,
    pub power: u8,
    pub message: String,
    /// Set for 80 < time < 100, where the `M:SS` display reads differently
    /// from the number that was typed.
    pub conversion_note: Option<String>,
}

pub fn validate_heating_input(
    time: Option<i64>,
    power: Option<i64>,
    quick_start: bool,
) -> Result<ValidatedInput, HeatingError> {
    if quick_start {
        return Ok(ValidatedInput {
            time: QUICK_START_TIME as u32,
            power: DEFAULT_POWER as u8,
            message: format!("Quick start: {QUICK_START_TIME}s at power {DEFAULT_POWER}."),
            conversion_note: None,
        });
    }

    let power = match power {
        Some(power) if !(MIN_POWER..=MAX_POWER).contains(&power) => {
            return Err(HeatingError::validation(format!(
                "Invalid power. Must be between {MIN_POWER} and {MAX_POWER}."
            )));
        }
        Some(power) => power,
        None => DEFAULT_POWER,
    };

    let Some(time) = time else {
        return Err(HeatingError::validation(
            "Time is mandatory for manual heating.",
        ));
    };
    if !(MIN_TIME..=MAX_TIME).contains(&time) {
        return Err(HeatingError::validation(format!(
            "Invalid time. Must be between {MIN_TIME} and {MAX_TIME} seconds (1 second to 2 minutes)."
        )));
    }

    let conversion_note = (time > 80 && time < 100).then(|| {
        format!(
            "{time} seconds display as {} minute(s) {} second(s).",
            time / 60,
            time % 60
        )
    });

    Ok(ValidatedInput {
        time: time as u32,
        power: power as u8,
        message: format!("Heating started: {time}s at power {power}."),
        conversion_note,
    })
}

/// Turns a user submission into a catalog definition. Catalog uniqueness is
/// checked separately against the live catalog.
pub fn validate_new_program(
    program: &NewProgram,
) -> Result<HeatingProgramDefinition, HeatingError> {
    let name = program.name.trim();
    if name.is_empty() {
        return Err(HeatingError::validation("Program name is required."));
    }
    let food = program.food.trim();
    if food.is_empty() {
        return Err(HeatingError::validation("Food is required."));
    }

    let time_in_seconds = u32::try_from(program.time_in_seconds)
        .ok()
        .filter(|time| *time > 0)
        .ok_or_else(|| HeatingError::validation("Time must be greater than zero."))?;
    let power = u8::try_from(program.power)
        .ok()
        .filter(|power| (MIN_POWER..=MAX_POWER).contains(&i64::from(*power)))
        .ok_or_else(|| {
            HeatingError::validation(format!(
                "Invalid power. Must be between {MIN_POWER} and {MAX_POWER}."
            ))
        })?;

    let definition = HeatingProgramDefinition {
        name: name.to_string(),
        food: food.to_string(),
        time_in_seconds,
        power,
        heating_char: program.heating_char,
        instructions: program
            .instructions
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        is_predefined: false,
    };
    check_definition(&definition)?;
    Ok(definition)
}

/// Shape rules every catalog implementation enforces on insert.
pub fn check_definition(program: &HeatingProgramDefinition) -> Result<(), HeatingError> {
    if program.name.trim().is_empty() {
        return Err(HeatingError::validation("Program name is required."));
    }
    if program.time_in_seconds == 0 {
        return Err(HeatingError::validation("Time must be greater than zero."));
    }
    if !(MIN_POWER..=MAX_POWER).contains(&i64::from(program.power)) {
        return Err(HeatingError::validation(format!(
            "Invalid power. Must be between {MIN_POWER} and {MAX_POWER}."
        )));
    }
    if program.heating_char == MANUAL_MARKER {
        return Err(HeatingError::validation(format!(
            "The character '{MANUAL_MARKER}' is reserved for manual heating."
        )));
    }
    if program.heating_char.is_whitespace() {
        return Err(HeatingError::validation(
            "The heating character cannot be whitespace.",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/validator_tests.rs"]
mod tests;
