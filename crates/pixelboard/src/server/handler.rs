//! WebSocket Connection Handler
//!
//! Every text frame is one command line; the reply goes back as one text
//! frame. Commands from a single connection are executed in order.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::state::AppState;

/// Handle a WebSocket connection
pub async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Replies are queued so a slow client never blocks command execution
    let (tx, mut rx) = mpsc::channel::<String>(64);

    let session_id = state.register_client().await;

    let send_task = tokio::spawn(async move {
        while let Some(reply) = rx.recv().await {
            if ws_sender.send(Message::Text(reply.into())).await.is_err() {
                break;
            }
        }
    });

    let state_clone = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let reply = handle_command(&state_clone, &text).await;
                    if tx.send(reply).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => {
                    break;
                }
                Message::Ping(_data) => {
                    // Pong is handled automatically by axum
                    tracing::trace!(%session_id, "Received ping");
                }
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.remove_client(session_id).await;
}

/// Execute one command line and render the reply
pub async fn handle_command(state: &AppState, line: &str) -> String {
    let line = line.trim();
    let response = state.processor().execute(line).await;
    if !response.is_ack() {
        tracing::debug!(line, reply = %response, "Command rejected");
    }
    response.to_string()
}
