use std::{future::Future, sync::Arc, time::Duration};

use anyhow::anyhow;
use shared::{
    domain::{HeatingProgramDefinition, HeatingStatus, SessionSnapshot},
    protocol::NewProgram,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    catalog::{register_program, ProgramCatalog},
    error::HeatingError,
    session::HeatingSession,
    validator::validate_heating_input,
};

/// Seconds added by a repeated manual start while a manual session runs.
pub const ADD_TIME_SECONDS: u32 = 30;

/// Behaviours that earlier revisions of the oven disagreed on.
///
/// The defaults are the permissive ones: "+30s" is unbounded and a paused
/// session may be replaced by a catalog program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerPolicy {
    /// Clamp for "+30s". `Some(120)` restores the two-minute ceiling.
    pub increment_cap_seconds: Option<u32>,
    /// When set, a paused session blocks a predefined start as well.
    pub block_predefined_while_paused: bool,
    /// Upper bound on a catalog call made while the session is locked.
    pub catalog_timeout: Duration,
}

impl Default for ControllerPolicy {
    fn default() -> Self {
        Self {
            increment_cap_seconds: None,
            block_predefined_while_paused: false,
            catalog_timeout: Duration::from_secs(2),
        }
    }
}

/// Result of a command together with the session as the command left it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied<T> {
    pub outcome: T,
    pub status: SessionSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualStart {
    Started {
        time: u32,
        power: u8,
        message: String,
        conversion_note: Option<String>,
    },
    Resumed,
    TimeAdded {
        added: u32,
        time_remaining: u32,
    },
}

impl ManualStart {
    pub fn message(&self) -> String {
        match self {
            ManualStart::Started { message, .. } => message.clone(),
            ManualStart::Resumed => "Heating resumed.".to_string(),
            ManualStart::TimeAdded { added: 0, .. } => {
                "Maximum time reached; no time added.".to_string()
            }
            ManualStart::TimeAdded { added, .. } => format!("+{added} seconds added."),
        }
    }

    pub fn conversion_note(&self) -> Option<&str> {
        match self {
            ManualStart::Started {
                conversion_note, ..
            } => conversion_note.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredefinedStart {
    pub program: HeatingProgramDefinition,
}

impl PredefinedStart {
    pub fn message(&self) -> String {
        format!(
            "Heating started: {} at power {}.",
            self.program.name, self.program.power
        )
    }

    pub fn instructions(&self) -> Option<&str> {
        self.program.instructions.as_deref()
    }
}

/// Owner of the single heating session.
///
/// Every session operation holds the mutex for its whole duration, so a
/// command from a request handler and a tick from the ticker never observe
/// each other half-way.
pub struct HeatingController {
    session: Mutex<HeatingSession>,
    catalog: Arc<dyn ProgramCatalog>,
    policy: ControllerPolicy,
}

impl HeatingController {
    pub fn new(catalog: Arc<dyn ProgramCatalog>) -> Self {
        Self::with_policy(catalog, ControllerPolicy::default())
    }

    pub fn with_policy(catalog: Arc<dyn ProgramCatalog>, policy: ControllerPolicy) -> Self {
        Self {
            session: Mutex::new(HeatingSession::placeholder()),
            catalog,
            policy,
        }
    }

    pub fn policy(&self) -> &ControllerPolicy {
        &self.policy
    }

    pub async fn current_status(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    /// Manual start button.
    ///
    /// Resumes a paused session, adds time to a running manual session, and
    /// otherwise validates the input and starts a fresh manual session.
    pub async fn start_manual(
        &self,
        time: Option<i64>,
        power: Option<i64>,
        quick_start: bool,
    ) -> Result<Applied<ManualStart>, HeatingError> {
        let mut session = self.session.lock().await;

        let outcome = match session.status() {
            HeatingStatus::Paused => {
                session.start();
                info!("heating resumed");
                ManualStart::Resumed
            }
            HeatingStatus::InProgress => {
                if session.is_predefined() {
                    return Err(HeatingError::conflict(
                        "Adding time is not allowed for predefined programs.",
                    ));
                }
                let added =
                    session.add_time(ADD_TIME_SECONDS, self.policy.increment_cap_seconds);
                info!(
                    added,
                    time_remaining = session.time_remaining(),
                    "heating time increased"
                );
                ManualStart::TimeAdded {
                    added,
                    time_remaining: session.time_remaining(),
                }
            }
            HeatingStatus::Stopped | HeatingStatus::Completed => {
                let input = validate_heating_input(time, power, quick_start)?;
                *session = HeatingSession::manual(input.time, input.power);
                session.start();
                info!(
                    time = input.time,
                    power = input.power,
                    quick_start,
                    "manual heating started"
                );
                ManualStart::Started {
                    time: input.time,
                    power: input.power,
                    message: input.message,
                    conversion_note: input.conversion_note,
                }
            }
        };

        Ok(Applied {
            outcome,
            status: session.snapshot(),
        })
    }

    pub async fn quick_start(&self) -> Result<Applied<ManualStart>, HeatingError> {
        self.start_manual(None, None, true).await
    }

    /// Continues a paused session. Unlike [`Self::start_manual`] this never
    /// starts or extends anything.
    pub async fn resume(&self) -> Result<SessionSnapshot, HeatingError> {
        let mut session = self.session.lock().await;
        if session.status() != HeatingStatus::Paused {
            return Err(HeatingError::conflict("There is no paused heating to resume."));
        }
        session.start();
        info!("heating resumed");
        Ok(session.snapshot())
    }

    /// Starts a catalog program, replacing whatever idle or paused session
    /// occupies the slot.
    pub async fn start_predefined(
        &self,
        name: &str,
    ) -> Result<Applied<PredefinedStart>, HeatingError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HeatingError::validation("Select a predefined program."));
        }

        let mut session = self.session.lock().await;
        let blocked = match session.status() {
            HeatingStatus::InProgress => true,
            HeatingStatus::Paused => self.policy.block_predefined_while_paused,
            HeatingStatus::Stopped | HeatingStatus::Completed => false,
        };
        if blocked {
            return Err(HeatingError::conflict("Heating is already in progress."));
        }

        let program = self
            .bounded(self.catalog.find_by_name(name))
            .await?
            .ok_or_else(|| {
                HeatingError::NotFound(format!("Predefined program '{name}' not found."))
            })?;

        *session = HeatingSession::from_program(&program);
        session.start();
        info!(
            program = %program.name,
            time = program.time_in_seconds,
            power = program.power,
            "predefined heating started"
        );

        Ok(Applied {
            outcome: PredefinedStart { program },
            status: session.snapshot(),
        })
    }

    /// Returns whether a running session was paused.
    pub async fn pause(&self) -> Applied<bool> {
        let mut session = self.session.lock().await;
        let paused = session.pause();
        if paused {
            info!(time_remaining = session.time_remaining(), "heating paused");
        }
        Applied {
            outcome: paused,
            status: session.snapshot(),
        }
    }

    /// Discards the current session whatever its state.
    pub async fn cancel(&self) -> SessionSnapshot {
        let mut session = self.session.lock().await;
        let previous = session.status();
        *session = HeatingSession::placeholder();
        info!(%previous, "heating cancelled");
        session.snapshot()
    }

    /// One scheduler tick.
    ///
    /// A session that completed on the previous tick is replaced by the idle
    /// placeholder here, so `Completed` is visible for exactly one tick.
    pub async fn advance_one_second(&self) -> SessionSnapshot {
        let mut session = self.session.lock().await;
        match session.status() {
            HeatingStatus::Completed => {
                *session = HeatingSession::placeholder();
                debug!("completed session cleared");
            }
            HeatingStatus::InProgress => {
                session.tick();
                if session.status() == HeatingStatus::Completed {
                    info!(total_time = session.total_time(), "heating completed");
                } else {
                    debug!(time_remaining = session.time_remaining(), "tick");
                }
            }
            HeatingStatus::Stopped | HeatingStatus::Paused => {}
        }
        session.snapshot()
    }

    pub async fn list_programs(&self) -> Result<Vec<HeatingProgramDefinition>, HeatingError> {
        self.bounded(self.catalog.list_all()).await
    }

    /// Registers a user program. The session is not touched.
    pub async fn add_program(
        &self,
        program: NewProgram,
    ) -> Result<HeatingProgramDefinition, HeatingError> {
        self.bounded(register_program(self.catalog.as_ref(), program))
            .await
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, HeatingError>>,
    ) -> Result<T, HeatingError> {
        let timeout = self.policy.catalog_timeout;
        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| HeatingError::Store(anyhow!("catalog call timed out after {timeout:?}")))?
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
