use serde::{Deserialize, Serialize};

/// Lifecycle of the single heating session. Serialized by variant name
/// (`"InProgress"`), which is what observers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HeatingStatus {
    #[default]
    Stopped,
    InProgress,
    Paused,
    Completed,
}

impl HeatingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HeatingStatus::Stopped => "Stopped",
            HeatingStatus::InProgress => "InProgress",
            HeatingStatus::Paused => "Paused",
            HeatingStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for HeatingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named catalog entry the oven can run without manual input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatingProgramDefinition {
    pub name: String,
    pub food: String,
    pub time_in_seconds: u32,
    pub power: u8,
    pub heating_char: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub is_predefined: bool,
}

/// Point-in-time copy of the heating session as pushed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: HeatingStatus,
    pub display_time: String,
    pub time_remaining: u32,
    pub power: u8,
    pub processing_trace: String,
    pub is_predefined_program: bool,
}
