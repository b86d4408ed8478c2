//! Server Application State
//!
//! Shared state accessible by all HTTP and WebSocket handlers.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use display_runtime::{CommandProcessor, PluginMgr};

use crate::render::Frame;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Lifecycle and slot operations
    plugins: Arc<PluginMgr>,

    /// Command line interpreter on top of `plugins`
    processor: CommandProcessor,

    /// Latest rendered frame
    frames: watch::Receiver<Arc<Frame>>,

    /// Connected WebSocket sessions
    clients: RwLock<HashSet<Uuid>>,
}

impl AppState {
    pub fn new(plugins: Arc<PluginMgr>, frames: watch::Receiver<Arc<Frame>>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                processor: CommandProcessor::new(plugins.clone()),
                plugins,
                frames,
                clients: RwLock::new(HashSet::new()),
            }),
        }
    }

    pub fn plugins(&self) -> &Arc<PluginMgr> {
        &self.inner.plugins
    }

    pub fn processor(&self) -> &CommandProcessor {
        &self.inner.processor
    }

    /// Most recently published frame
    pub fn frame(&self) -> Arc<Frame> {
        self.inner.frames.borrow().clone()
    }

    /// Register a new client connection
    pub async fn register_client(&self) -> Uuid {
        let session_id = Uuid::new_v4();
        self.inner.clients.write().await.insert(session_id);
        tracing::info!(%session_id, "Client connected");
        session_id
    }

    /// Remove a client connection
    pub async fn remove_client(&self, session_id: Uuid) {
        self.inner.clients.write().await.remove(&session_id);
        tracing::info!(%session_id, "Client disconnected");
    }

    /// Get the number of connected clients
    pub async fn client_count(&self) -> usize {
        self.inner.clients.read().await.len()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("plugins", &self.inner.plugins)
            .finish_non_exhaustive()
    }
}
