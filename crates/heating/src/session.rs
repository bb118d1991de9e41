use shared::domain::{HeatingProgramDefinition, HeatingStatus, SessionSnapshot};

/// Marker used for manual and quick-start sessions. Catalog programs may not
/// claim it.
pub const MANUAL_MARKER: char = '*';
pub const DEFAULT_POWER: u8 = 10;
/// Upper bound on the trace, in characters, before the completion suffix.
pub const MAX_TRACE_CHARS: usize = 40;
pub const COMPLETION_SUFFIX: &str = " Heating complete.";

/// The one live heating attempt.
///
/// Sessions are replaced wholesale when a new program starts, when the
/// controller is cancelled and one tick after completion; only the countdown,
/// the status and the trace change in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatingSession {
    total_time: u32,
    power: u8,
    time_remaining: u32,
    status: HeatingStatus,
    processing_trace: String,
    display_time: String,
    heating_char: char,
    is_predefined: bool,
}

impl HeatingSession {
    pub fn new(total_time: u32, power: u8, heating_char: char, is_predefined: bool) -> Self {
        Self {
            total_time,
            power,
            time_remaining: total_time,
            status: HeatingStatus::Stopped,
            processing_trace: String::new(),
            display_time: format_display_time(total_time),
            heating_char,
            is_predefined,
        }
    }

    pub fn manual(total_time: u32, power: u8) -> Self {
        Self::new(total_time, power, MANUAL_MARKER, false)
    }

    pub fn from_program(program: &HeatingProgramDefinition) -> Self {
        Self::new(
            program.time_in_seconds,
            program.power,
            program.heating_char,
            true,
        )
    }

    /// Idle zero-time session occupying the slot whenever nothing runs.
    pub fn placeholder() -> Self {
        Self::manual(0, DEFAULT_POWER)
    }

    pub fn total_time(&self) -> u32 {
        self.total_time
    }

    pub fn power(&self) -> u8 {
        self.power
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn status(&self) -> HeatingStatus {
        self.status
    }

    pub fn processing_trace(&self) -> &str {
        &self.processing_trace
    }

    pub fn display_time(&self) -> &str {
        &self.display_time
    }

    pub fn heating_char(&self) -> char {
        self.heating_char
    }

    pub fn is_predefined(&self) -> bool {
        self.is_predefined
    }

    pub fn start(&mut self) {
        self.status = HeatingStatus::InProgress;
    }

    /// Returns `false` when the session was not running.
    pub fn pause(&mut self) -> bool {
        if self.status != HeatingStatus::InProgress {
            return false;
        }
        self.status = HeatingStatus::Paused;
        true
    }

    /// Adds up to `seconds` to a running manual session and returns how many
    /// were actually added.
    ///
    /// With `cap` set the result never exceeds `cap`, though time already
    /// above the cap is left alone. Predefined or idle sessions get nothing.
    pub fn add_time(&mut self, seconds: u32, cap: Option<u32>) -> u32 {
        if self.is_predefined || self.status != HeatingStatus::InProgress {
            return 0;
        }

        let previous = self.time_remaining;
        let mut next = previous.saturating_add(seconds);
        if let Some(cap) = cap {
            next = next.min(cap.max(previous));
        }
        self.time_remaining = next;
        self.refresh_display();
        next - previous
    }

    /// One second of heating. Returns `false` if nothing happened.
    pub fn tick(&mut self) -> bool {
        if self.status != HeatingStatus::InProgress || self.time_remaining == 0 {
            return false;
        }

        self.time_remaining -= 1;
        self.refresh_display();
        self.append_trace_block();

        if self.time_remaining == 0 {
            self.status = HeatingStatus::Completed;
            self.processing_trace.push_str(COMPLETION_SUFFIX);
        }
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            display_time: self.display_time.clone(),
            time_remaining: self.time_remaining,
            power: self.power,
            processing_trace: self.processing_trace.clone(),
            is_predefined_program: self.is_predefined,
        }
    }

    fn append_trace_block(&mut self) {
        let used = self.processing_trace.chars().count();
        if used >= MAX_TRACE_CHARS {
            return;
        }

        let room = MAX_TRACE_CHARS - used;
        let block = usize::from(self.power).min(room);
        self.processing_trace
            .extend(std::iter::repeat(self.heating_char).take(block));
    }

    fn refresh_display(&mut self) {
        self.display_time = format_display_time(self.time_remaining);
    }
}

impl Default for HeatingSession {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// `M:SS` from one minute up, plain seconds (`"42s"`) below.
pub fn format_display_time(seconds: u32) -> String {
    if seconds >= 60 {
        format!("{}:{:02}", seconds / 60, seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
