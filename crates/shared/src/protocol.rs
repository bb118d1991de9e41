use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{HeatingProgramDefinition, SessionSnapshot},
    error::ApiError,
};

/// Manual start, or "+30s" when a manual session is already running.
///
/// Both fields are optional on the wire: power falls back to the default and
/// a missing time is reported back as a validation failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualHeatingRequest {
    #[serde(default)]
    pub time_in_seconds: Option<i64>,
    #[serde(default)]
    pub power: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredefinedHeatingRequest {
    pub name: String,
}

/// User submission for a new catalog entry. Numbers stay signed so that
/// negative input is reported as out of range rather than as a decode error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProgram {
    pub name: String,
    pub food: String,
    pub time_in_seconds: i64,
    pub power: i64,
    pub heating_char: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub status: SessionSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    StatusUpdated {
        status: SessionSnapshot,
        sent_at: DateTime<Utc>,
    },
    ProgramAdded {
        program: HeatingProgramDefinition,
    },
    Error(ApiError),
}

impl ServerEvent {
    pub fn status(status: SessionSnapshot) -> Self {
        Self::StatusUpdated {
            status,
            sent_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
