//! REST API handlers: snapshot query and command endpoints.
//!
//! Command bodies are validated here. Only well-formed, in-range commands
//! reach the mailbox.

use crate::metrics::ClockMetrics;
use crate::state::{SharedState, StateUpdate};
use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use clock_common::mailbox::CommandMailbox;
use clock_common::snapshot::{ClockSnapshot, Command, CommandKind};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub published: bool,
}

/// Health check endpoint.
///
/// GET /health
pub async fn health_check(Extension(state): Extension<Arc<SharedState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        published: state.has_published(),
    })
}

/// Latest snapshot, or the all-zero default before the first tick.
///
/// GET /clock_data.json, GET /api/state
pub async fn get_snapshot(Extension(state): Extension<Arc<SharedState>>) -> Json<ClockSnapshot> {
    Json(state.snapshot())
}

/// Command endpoint response body.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Rejected command, answered with `400 {"status": "error", "message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub message: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = CommandResponse {
            status: "error",
            message: Some(self.message.to_string()),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Handles shared by the command endpoints.
#[derive(Clone)]
pub struct CommandSink {
    pub mailbox: Arc<CommandMailbox>,
    pub broadcast_tx: broadcast::Sender<StateUpdate>,
    pub metrics: Arc<ClockMetrics>,
}

impl CommandSink {
    /// Queue a validated command for the next tick.
    pub fn accept(&self, command: Command) {
        let kind = command.kind();
        info!(%command, "Command queued");
        self.mailbox.post(command);
        let _ = self.broadcast_tx.send(StateUpdate::CommandQueued {
            kind: kind.as_str().to_string(),
        });
    }

    fn reject(&self, kind: CommandKind, message: &'static str) -> ApiError {
        debug!(%kind, message, "Command rejected at endpoint");
        self.metrics.record_command(kind, false);
        ApiError { message }
    }

    fn accepted(&self, command: Command) -> Json<CommandResponse> {
        self.accept(command);
        Json(CommandResponse {
            status: "success",
            message: None,
        })
    }
}

const INVALID_JSON: &str = "Invalid JSON";

/// Parse and validate a command body, mapping failures to the endpoint's message.
fn parse_command(
    sink: &CommandSink,
    kind: CommandKind,
    body: &[u8],
    invalid_fields: &'static str,
) -> Result<Command, ApiError> {
    let body: Value =
        serde_json::from_slice(body).map_err(|_| sink.reject(kind, INVALID_JSON))?;
    Command::from_payload(kind, &body).map_err(|e| {
        debug!(error = %e, "Invalid command fields");
        sink.reject(kind, invalid_fields)
    })
}

/// Arm the alarm.
///
/// POST /set_alarm `{"hour": 0..23, "minute": 0..59}`
pub async fn set_alarm(
    Extension(sink): Extension<CommandSink>,
    body: Bytes,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = parse_command(&sink, CommandKind::SetAlarm, &body, "Invalid hour or minute")?;
    Ok(sink.accepted(command))
}

/// Set the displayed time. The hour is 24-hour and reduced mod 12 on apply.
///
/// POST /set_time `{"hour": 0..23, "minute": 0..59, "second": 0..59}`
pub async fn set_time(
    Extension(sink): Extension<CommandSink>,
    body: Bytes,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = parse_command(&sink, CommandKind::SetTime, &body, "Invalid time values")?;
    Ok(sink.accepted(command))
}

/// Request resynchronization with the wall clock. Any body is ignored.
///
/// POST /sync_time
pub async fn sync_time(Extension(sink): Extension<CommandSink>) -> Json<CommandResponse> {
    sink.accepted(Command::Resync)
}

/// Disarm the alarm. Any body is ignored.
///
/// POST /clear_alarm
pub async fn clear_alarm(Extension(sink): Extension<CommandSink>) -> Json<CommandResponse> {
    sink.accepted(Command::ClearAlarm)
}

/// Fallback for unknown routes.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
