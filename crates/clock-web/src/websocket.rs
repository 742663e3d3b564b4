//! WebSocket handler for streaming published snapshots.
//!
//! Clients receive the latest snapshot on connect and every publish after
//! that. Text frames carrying a tagged [`Command`] are validated and queued.

use crate::api::CommandSink;
use crate::state::{SharedState, StateUpdate};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension,
    },
    response::IntoResponse,
};
use clock_common::snapshot::Command;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// WebSocket upgrade handler.
///
/// GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(state): Extension<Arc<SharedState>>,
    Extension(sink): Extension<CommandSink>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, sink))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<SharedState>, sink: CommandSink) {
    info!("WebSocket client connected");
    sink.metrics.websocket_clients.inc();

    let (mut sender, mut receiver) = socket.split();

    // Subscribe before sending the initial snapshot so no publish is missed
    let mut broadcast_rx = sink.broadcast_tx.subscribe();

    let initial_msg = StateUpdate::Snapshot(state.snapshot());
    if let Ok(json) = serde_json::to_string(&initial_msg) {
        if sender.send(Message::Text(json)).await.is_err() {
            warn!("Failed to send initial snapshot to WebSocket client");
            sink.metrics.websocket_clients.dec();
            return;
        }
    }

    let send_task = tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(update) => {
                    if let Ok(json) = serde_json::to_string(&update) {
                        if sender.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Snapshots supersede each other; the next one catches the client up
                    warn!(dropped = n, "WebSocket client lagged, dropped updates");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    });

    let recv_sink = sink.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match Command::from_json(&text) {
                    Ok(command) => recv_sink.accept(command),
                    Err(e) => {
                        debug!(error = %e, "Ignoring invalid WebSocket command");
                    }
                },
                Ok(Message::Close(_)) => {
                    debug!("WebSocket client sent close");
                    break;
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Ok(Message::Binary(_)) => {
                    debug!("Received unexpected binary WebSocket message");
                }
                Err(e) => {
                    warn!(error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = send_task => {
            debug!("WebSocket send task ended");
        }
        _ = recv_task => {
            debug!("WebSocket receive task ended");
        }
    }

    sink.metrics.websocket_clients.dec();
    info!("WebSocket client disconnected");
}
