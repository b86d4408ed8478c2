//! Plugin Contract and Lifecycle
//!
//! A plugin is a unit of display content. The scheduler only ever talks to
//! plugins through the [`Plugin`] trait; concrete content modules live outside
//! this crate and are made available through the [`PluginRegistry`].
//!
//! # Lifecycle
//!
//! - `start`: once, when the instance is placed into a slot
//! - `active` / `inactive`: when its slot gains or loses the display
//! - `render`: every tick while its slot is active
//! - `stop`: once, when the instance is uninstalled

mod arrangement;
mod manager;
mod registry;
mod rotation;

pub use arrangement::*;
pub use manager::*;
pub use registry::*;
pub use rotation::*;

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::canvas::Canvas;

/// Process-unique plugin instance identifier
pub type Uid = u32;

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors reported by plugin implementations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("Invalid value for topic {topic}: {reason}")]
    InvalidValue { topic: String, reason: String },

    #[error("Render failed: {0}")]
    Render(String),
}

impl PluginError {
    /// Shorthand for an invalid topic value
    pub fn invalid(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            topic: topic.into(),
            reason: reason.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Uniform contract implemented by every content module
///
/// `render` is called with the scheduler lock held and must never block on
/// I/O. Plugins that fetch data do so on their own tasks and only copy the
/// latest result while rendering.
pub trait Plugin: Send {
    /// Called once when the instance is placed into a slot
    fn start(&mut self, _width: u32, _height: u32) {}

    /// Called once when the instance is uninstalled
    fn stop(&mut self) {}

    /// The plugin's slot became the active slot
    fn active(&mut self) {}

    /// The plugin's slot is no longer the active slot
    fn inactive(&mut self) {}

    /// How long the slot will be shown (`None` means until something else happens)
    fn set_view_duration(&mut self, _duration: Option<Duration>) {}

    /// Draw the current content; the canvas is already cleared
    fn render(&mut self, canvas: &mut Canvas) -> Result<(), PluginError>;

    /// Topics that can be read or written from outside
    fn topics(&self) -> Vec<String> {
        Vec::new()
    }

    /// Read a topic value
    fn get_topic(&self, _topic: &str) -> Option<Value> {
        None
    }

    /// Write a topic value
    fn set_topic(&mut self, topic: &str, _value: &Value) -> Result<(), PluginError> {
        Err(PluginError::UnknownTopic(topic.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Instance
// ─────────────────────────────────────────────────────────────────────────────

/// A plugin together with the scheduler-side state the slot table needs
pub struct PluginInstance {
    uid: Uid,
    type_name: String,
    alias: String,
    enabled: bool,
    locked: bool,
    duration_override: Option<Duration>,
    render_failures: u32,
    plugin: Box<dyn Plugin>,
}

impl PluginInstance {
    /// Wrap a freshly created plugin (disabled, unlocked, default duration)
    pub fn new(uid: Uid, type_name: impl Into<String>, plugin: Box<dyn Plugin>) -> Self {
        Self {
            uid,
            type_name: type_name.into(),
            alias: String::new(),
            enabled: false,
            locked: false,
            duration_override: None,
            render_failures: 0,
            plugin,
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = alias.into();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn duration_override(&self) -> Option<Duration> {
        self.duration_override
    }

    pub fn set_duration_override(&mut self, duration: Option<Duration>) {
        self.duration_override = duration;
    }

    /// Consecutive failed renders
    pub fn render_failures(&self) -> u32 {
        self.render_failures
    }

    pub(crate) fn record_render_failure(&mut self) -> u32 {
        self.render_failures = self.render_failures.saturating_add(1);
        self.render_failures
    }

    pub(crate) fn reset_render_failures(&mut self) {
        self.render_failures = 0;
    }

    /// The wrapped plugin
    pub fn plugin(&self) -> &dyn Plugin {
        self.plugin.as_ref()
    }

    pub fn plugin_mut(&mut self) -> &mut dyn Plugin {
        self.plugin.as_mut()
    }

    /// Snapshot for callers outside the scheduler lock
    pub fn info(&self, slot: usize) -> PluginInfo {
        PluginInfo {
            uid: self.uid,
            type_name: self.type_name.clone(),
            alias: self.alias.clone(),
            slot,
            enabled: self.enabled,
            locked: self.locked,
            duration_ms: self.duration_override.map(|d| d.as_millis() as u64),
        }
    }
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("uid", &self.uid)
            .field("type_name", &self.type_name)
            .field("alias", &self.alias)
            .field("enabled", &self.enabled)
            .field("locked", &self.locked)
            .field("duration_override", &self.duration_override)
            .finish_non_exhaustive()
    }
}

/// Owned view of an installed plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub uid: Uid,
    #[serde(rename = "type")]
    pub type_name: String,
    pub alias: String,
    pub slot: usize,
    pub enabled: bool,
    pub locked: bool,
    /// Duration override in milliseconds (`None` = system default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}
