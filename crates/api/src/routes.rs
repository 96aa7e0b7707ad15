use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use eabridge_core::{resolve_ea_id, validate_and_normalize, Command, OrderRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Health
        .route("/health", get(health_check))
        // Submitters
        .route("/position/open", post(open_position))
        // EAs
        .route("/commands", get(list_commands))
        .route("/commands/ack", post(acknowledge_commands))
        // Introspection
        .route("/queues", get(list_queues))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "pending": state.store.total_pending(),
    }))
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

async fn open_position(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<Json<Command>, ApiError> {
    let Json(request) = payload?;
    let new_command = validate_and_normalize(request, &state.default_ea_id)?;
    let command = state.store.enqueue(new_command);

    tracing::info!(
        ea_id = %command.ea_id,
        command_id = %command.id,
        symbol = %command.symbol,
        order_type = %command.order_type,
        volume = %command.volume,
        "Order queued"
    );
    Ok(Json(command))
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CommandsQuery {
    pub ea_id: Option<String>,
    /// Remove the returned commands instead of leaving them pending.
    #[serde(default)]
    pub consume: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandsResponse {
    pub ea_id: String,
    pub commands: Vec<Command>,
}

async fn list_commands(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CommandsQuery>, QueryRejection>,
) -> Result<Json<CommandsResponse>, ApiError> {
    let Query(query) = query?;
    let ea_id = resolve_ea_id(query.ea_id.as_deref(), &state.default_ea_id);

    let commands = if query.consume {
        state.store.drain(&ea_id)
    } else {
        state.store.peek(&ea_id)
    };

    tracing::debug!(
        ea_id = %ea_id,
        count = commands.len(),
        consume = query.consume,
        "Commands polled"
    );
    Ok(Json(CommandsResponse { ea_id, commands }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckRequest {
    #[serde(default)]
    pub ea_id: Option<String>,
    pub command_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub ea_id: String,
    pub acknowledged: Vec<Uuid>,
}

async fn acknowledge_commands(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AckRequest>, JsonRejection>,
) -> Result<Json<AckResponse>, ApiError> {
    let Json(request) = payload?;
    let ea_id = resolve_ea_id(request.ea_id.as_deref(), &state.default_ea_id);
    let acknowledged = state.store.acknowledge(&ea_id, &request.command_ids);

    Ok(Json(AckResponse {
        ea_id,
        acknowledged,
    }))
}

// ---------------------------------------------------------------------------
// Introspection
// ---------------------------------------------------------------------------

async fn list_queues(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let queues = state.store.snapshot();
    let total_pending: usize = queues.iter().map(|q| q.pending).sum();

    Json(serde_json::json!({
        "queues": queues,
        "total_pending": total_pending,
    }))
}
