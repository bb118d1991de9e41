use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use server_api::ApiContext;
use shared::{
    domain::{HeatingProgramDefinition, SessionSnapshot},
    error::{ApiError, ErrorCode},
    protocol::{
        CommandResponse, ManualHeatingRequest, NewProgram, PredefinedHeatingRequest, ServerEvent,
    },
};
use storage::Storage;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info, warn};

mod app_state;
mod config;
mod ticker;

use app_state::AppState;
use config::{load_settings, normalize_database_url};
use ticker::spawn_ticker;

const MAX_REQUEST_BYTES: usize = 16 * 1024;

type Rejection = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify the path is writable"
        );
        error
    })?;

    let api = ApiContext::new(storage, settings.policy());
    let (events, _) = broadcast::channel(settings.event_buffer.max(1));
    let ticker = spawn_ticker(
        api.controller.clone(),
        events.clone(),
        settings.tick_period(),
    );

    let state = AppState { api, events };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, tick_ms = settings.tick_millis, "server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ticker.abort();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(http_status))
        .route("/programs", get(http_list_programs).post(http_add_program))
        .route("/heating/manual", post(http_start_manual))
        .route("/heating/quick", post(http_quick_start))
        .route("/heating/predefined", post(http_start_predefined))
        .route("/heating/pause", post(http_pause))
        .route("/heating/resume", post(http_resume))
        .route("/heating/cancel", post(http_cancel))
        .route("/ws", get(ws_handler))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .with_state(state)
}

fn rejection(err: ApiError) -> Rejection {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

/// Pushes the outcome of a heating command to observers and shapes the reply.
fn settle(
    state: &AppState,
    result: Result<CommandResponse, ApiError>,
) -> Result<Json<CommandResponse>, Rejection> {
    match result {
        Ok(response) => {
            state.publish(ServerEvent::status(response.status.clone()));
            Ok(Json(response))
        }
        Err(err) => {
            debug!(code = ?err.code, message = %err.message, "heating command rejected");
            state.publish(ServerEvent::Error(err.clone()));
            Err(rejection(err))
        }
    }
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, Rejection> {
    server_api::health(&state.api).await.map_err(rejection)?;
    Ok("ok")
}

async fn http_status(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(server_api::current_status(&state.api).await)
}

async fn http_list_programs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HeatingProgramDefinition>>, Rejection> {
    let programs = server_api::list_programs(&state.api)
        .await
        .map_err(rejection)?;
    Ok(Json(programs))
}

async fn http_add_program(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewProgram>,
) -> Result<(StatusCode, Json<HeatingProgramDefinition>), Rejection> {
    let program = match server_api::add_program(&state.api, req).await {
        Ok(program) => program,
        Err(err) => {
            debug!(code = ?err.code, message = %err.message, "program registration rejected");
            state.publish(ServerEvent::Error(err.clone()));
            return Err(rejection(err));
        }
    };
    state.publish(ServerEvent::ProgramAdded {
        program: program.clone(),
    });
    Ok((StatusCode::CREATED, Json(program)))
}

async fn http_start_manual(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ManualHeatingRequest>,
) -> Result<Json<CommandResponse>, Rejection> {
    let result = server_api::start_manual(&state.api, req).await;
    settle(&state, result)
}

async fn http_quick_start(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CommandResponse>, Rejection> {
    let result = server_api::quick_start(&state.api).await;
    settle(&state, result)
}

async fn http_start_predefined(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredefinedHeatingRequest>,
) -> Result<Json<CommandResponse>, Rejection> {
    let result = server_api::start_predefined(&state.api, req).await;
    settle(&state, result)
}

async fn http_pause(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CommandResponse>, Rejection> {
    let response = server_api::pause(&state.api).await;
    settle(&state, Ok(response))
}

async fn http_resume(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CommandResponse>, Rejection> {
    let result = server_api::resume(&state.api).await;
    settle(&state, result)
}

async fn http_cancel(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CommandResponse>, Rejection> {
    let response = server_api::cancel(&state.api).await;
    settle(&state, Ok(response))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    // Subscribe before reading the snapshot so no update falls in between.
    let mut events = BroadcastStream::new(state.events.subscribe());
    let current = ServerEvent::status(server_api::current_status(&state.api).await);

    let send_task = tokio::spawn(async move {
        if send_event(&mut sender, &current).await.is_err() {
            return;
        }
        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket observer lagged, skipped events");
                    continue;
                }
            };
            if send_event(&mut sender, &event).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
    debug!("websocket observer disconnected");
}

async fn send_event<S>(sender: &mut S, event: &ServerEvent) -> Result<(), axum::Error>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(error) => {
            warn!(%error, "failed to encode server event");
            return Ok(());
        }
    };
    sender.send(Message::Text(text)).await
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
