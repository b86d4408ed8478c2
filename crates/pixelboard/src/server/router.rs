//! HTTP Router
//!
//! Sets up the axum router with the WebSocket endpoint and the REST API.

use axum::{
    Json, Router,
    extract::{State, WebSocketUpgrade},
    response::Response,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use display_runtime::{PluginInfo, SlotInfo};

use super::handler::{handle_command, handle_websocket};
use super::state::AppState;
use crate::render::Frame;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // WebSocket endpoint - command lines in, replies out
        .route("/ws", get(ws_upgrade))
        .route("/rest/api/v1/command", post(command))
        .route("/rest/api/v1/display/slots", get(slots))
        .route("/rest/api/v1/display/fb", get(frame_buffer))
        .route("/rest/api/v1/plugins", get(plugins))
        // Health check for monitoring
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// WebSocket upgrade handler
async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Execute one command line sent as the request body
async fn command(State(state): State<AppState>, body: String) -> String {
    handle_command(&state, &body).await
}

async fn slots(State(state): State<AppState>) -> Json<Vec<SlotInfo>> {
    Json(state.plugins().display().slots())
}

async fn frame_buffer(State(state): State<AppState>) -> Json<Frame> {
    Json(state.frame().as_ref().clone())
}

#[derive(Debug, Serialize)]
struct PluginsResponse {
    /// Installable type names
    types: Vec<String>,
    /// Installed instances
    installed: Vec<PluginInfo>,
}

async fn plugins(State(state): State<AppState>) -> Json<PluginsResponse> {
    let plugins = state.plugins();
    Json(PluginsResponse {
        types: plugins.registry().type_names(),
        installed: plugins.plugins(),
    })
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    clients: usize,
    active_slot: Option<usize>,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        clients: state.client_count().await,
        active_slot: state.plugins().display().active_slot(),
    })
}
