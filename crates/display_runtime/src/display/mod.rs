//! Display slots and the rotation state machine
//!
//! The display is split into a fixed number of slots. Each slot holds at most
//! one plugin. One slot at a time is active; it is rendered every tick until
//! its duration runs out, then the cursor moves on to the next eligible slot.

mod manager;
mod slot;

pub use manager::DisplayMgr;
pub use slot::Slot;

use std::time::Duration;

use serde::Serialize;

use crate::plugin::PluginInfo;

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed display parameters, set once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Number of slots
    pub slots: usize,
    /// Slot duration when a plugin has no override; zero means infinite
    pub default_duration: Duration,
    /// Consecutive render failures before the scheduler moves on
    pub max_render_failures: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            width: 32,
            height: 8,
            slots: 8,
            default_duration: Duration::from_secs(30),
            max_render_failures: 3,
        }
    }
}

impl DisplaySettings {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    pub fn with_default_duration(mut self, duration: Duration) -> Self {
        self.default_duration = duration;
        self
    }

    pub fn with_max_render_failures(mut self, failures: u32) -> Self {
        self.max_render_failures = failures;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Slot State
// ─────────────────────────────────────────────────────────────────────────────

/// Scheduler view of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    /// No plugin installed
    Empty,
    /// Plugin installed but disabled
    Disabled,
    /// Plugin enabled, waiting for its turn
    Waiting,
    /// Plugin currently shown
    Active,
}

/// Snapshot of one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotInfo {
    pub index: usize,
    pub state: SlotState,
    /// Effective view duration in milliseconds, 0 when infinite or empty
    pub view_duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<PluginInfo>,
}
