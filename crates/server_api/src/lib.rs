use std::sync::Arc;

use heating::{HeatingController, HeatingError};
use shared::{
    domain::{HeatingProgramDefinition, SessionSnapshot},
    error::ApiError,
    protocol::{CommandResponse, ManualHeatingRequest, NewProgram, PredefinedHeatingRequest},
};
use storage::Storage;
use tracing::warn;

#[derive(Clone)]
pub struct ApiContext {
    pub controller: Arc<HeatingController>,
    pub storage: Storage,
}

impl ApiContext {
    /// Controller backed by the given store, with the given policy.
    pub fn new(storage: Storage, policy: heating::ControllerPolicy) -> Self {
        let controller = HeatingController::with_policy(Arc::new(storage.clone()), policy);
        Self {
            controller: Arc::new(controller),
            storage,
        }
    }
}

pub async fn health(ctx: &ApiContext) -> Result<(), ApiError> {
    ctx.storage.health_check().await.map_err(internal)
}

pub async fn current_status(ctx: &ApiContext) -> SessionSnapshot {
    ctx.controller.current_status().await
}

pub async fn list_programs(ctx: &ApiContext) -> Result<Vec<HeatingProgramDefinition>, ApiError> {
    ctx.controller.list_programs().await.map_err(reject)
}

pub async fn add_program(
    ctx: &ApiContext,
    program: NewProgram,
) -> Result<HeatingProgramDefinition, ApiError> {
    ctx.controller.add_program(program).await.map_err(reject)
}

pub async fn start_manual(
    ctx: &ApiContext,
    req: ManualHeatingRequest,
) -> Result<CommandResponse, ApiError> {
    let applied = ctx
        .controller
        .start_manual(req.time_in_seconds, req.power, false)
        .await
        .map_err(reject)?;
    Ok(CommandResponse {
        message: applied.outcome.message(),
        conversion_note: applied.outcome.conversion_note().map(str::to_string),
        instructions: None,
        status: applied.status,
    })
}

pub async fn quick_start(ctx: &ApiContext) -> Result<CommandResponse, ApiError> {
    let applied = ctx.controller.quick_start().await.map_err(reject)?;
    Ok(CommandResponse {
        message: applied.outcome.message(),
        conversion_note: None,
        instructions: None,
        status: applied.status,
    })
}

pub async fn start_predefined(
    ctx: &ApiContext,
    req: PredefinedHeatingRequest,
) -> Result<CommandResponse, ApiError> {
    let applied = ctx
        .controller
        .start_predefined(&req.name)
        .await
        .map_err(reject)?;
    Ok(CommandResponse {
        message: applied.outcome.message(),
        conversion_note: None,
        instructions: applied.outcome.instructions().map(str::to_string),
        status: applied.status,
    })
}

pub async fn pause(ctx: &ApiContext) -> CommandResponse {
    let applied = ctx.controller.pause().await;
    let message = if applied.outcome {
        "Heating paused."
    } else {
        "Nothing is heating; pause ignored."
    };
    CommandResponse {
        message: message.to_string(),
        conversion_note: None,
        instructions: None,
        status: applied.status,
    }
}

pub async fn resume(ctx: &ApiContext) -> Result<CommandResponse, ApiError> {
    let status = ctx.controller.resume().await.map_err(reject)?;
    Ok(CommandResponse {
        message: "Heating resumed.".to_string(),
        conversion_note: None,
        instructions: None,
        status,
    })
}

pub async fn cancel(ctx: &ApiContext) -> CommandResponse {
    CommandResponse {
        message: "Heating cancelled.".to_string(),
        conversion_note: None,
        instructions: None,
        status: ctx.controller.cancel().await,
    }
}

fn reject(err: HeatingError) -> ApiError {
    if let HeatingError::Store(cause) = &err {
        warn!(error = %format!("{cause:#}"), "program catalog call failed");
    }
    err.into()
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::internal(format!("{err:#}"))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
