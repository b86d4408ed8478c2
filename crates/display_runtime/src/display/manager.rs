//! Display Manager
//!
//! Owns the slot table, the plugin instances and the rotation cursor behind a
//! single lock. The plugin manager shares the same lock, so a command and a
//! render tick never observe a half-applied change.
//!
//! Public methods lock once and delegate to [`DisplayState`], whose methods
//! take `&mut self` and never lock again.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use parking_lot::{Mutex, MutexGuard};

use super::{DisplaySettings, Slot, SlotInfo, SlotState};
use crate::canvas::Canvas;
use crate::error::{Error, Result};
use crate::plugin::{PluginInstance, Uid};

// ─────────────────────────────────────────────────────────────────────────────
// Display State
// ─────────────────────────────────────────────────────────────────────────────

/// Everything guarded by the scheduler lock
pub(crate) struct DisplayState {
    settings: DisplaySettings,
    slots: Vec<Slot>,
    plugins: HashMap<Uid, PluginInstance>,
    cursor: Option<usize>,
    /// Where the search for the next active slot starts when the cursor is unset
    resume_from: usize,
}

impl DisplayState {
    pub(crate) fn new(settings: DisplaySettings) -> Self {
        let slots = (0..settings.slots).map(|_| Slot::new()).collect();
        Self {
            settings,
            slots,
            plugins: HashMap::new(),
            cursor: None,
            resume_from: 0,
        }
    }

    pub(crate) fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub(crate) fn contains(&self, uid: Uid) -> bool {
        self.plugins.contains_key(&uid)
    }

    pub(crate) fn plugin(&self, uid: Uid) -> Option<&PluginInstance> {
        self.plugins.get(&uid)
    }

    pub(crate) fn plugin_mut(&mut self, uid: Uid) -> Result<&mut PluginInstance> {
        self.plugins.get_mut(&uid).ok_or(Error::NotFound(uid))
    }

    pub(crate) fn slot_of(&self, uid: Uid) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.occupant() == Some(uid))
    }

    pub(crate) fn occupant(&self, index: usize) -> Option<&PluginInstance> {
        let uid = self.slots.get(index)?.occupant()?;
        self.plugins.get(&uid)
    }

    fn occupant_mut(&mut self, index: usize) -> Option<&mut PluginInstance> {
        let uid = self.slots.get(index)?.occupant()?;
        self.plugins.get_mut(&uid)
    }

    pub(crate) fn first_empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(Slot::is_empty)
    }

    /// Installed plugins with their slot index, in slot order
    pub(crate) fn occupied(&self) -> impl Iterator<Item = (usize, &PluginInstance)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.occupant()
                .and_then(|uid| self.plugins.get(&uid))
                .map(|instance| (index, instance))
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Occupancy
    // ─────────────────────────────────────────────────────────────────────────

    /// Place a plugin into an empty slot
    pub(crate) fn insert(&mut self, index: usize, instance: PluginInstance) -> Result<()> {
        let slot = self.slots.get(index).ok_or(Error::InvalidSlot(index))?;
        if !slot.is_empty() {
            return Err(Error::SlotOccupied(index));
        }
        if self.plugins.contains_key(&instance.uid()) {
            return Err(Error::DuplicateUid(instance.uid()));
        }

        self.slots[index].set_occupant(instance.uid());
        self.plugins.insert(instance.uid(), instance);
        Ok(())
    }

    /// Take a plugin out of its slot
    ///
    /// If it was active the cursor is unset; the next tick resumes the search
    /// after the freed slot.
    pub(crate) fn remove(&mut self, uid: Uid) -> Result<(usize, PluginInstance)> {
        let index = self.slot_of(uid).ok_or(Error::NotFound(uid))?;
        if self.cursor == Some(index) {
            self.deactivate(index);
            self.resume_from = index + 1;
        }

        self.slots[index].clear();
        let instance = self.plugins.remove(&uid).ok_or(Error::NotFound(uid))?;
        Ok((index, instance))
    }

    /// Move a plugin to another slot, optionally swapping with its occupant
    pub(crate) fn move_plugin(&mut self, uid: Uid, target: usize, swap: bool) -> Result<usize> {
        let source = self.slot_of(uid).ok_or(Error::NotFound(uid))?;
        if target >= self.slots.len() {
            return Err(Error::InvalidSlot(target));
        }
        if source == target {
            return Ok(target);
        }
        if !self.slots[target].is_empty() && !swap {
            return Err(Error::SlotOccupied(target));
        }

        self.slots.swap(source, target);
        let remap = |index: usize| match index {
            i if i == source => target,
            i if i == target => source,
            i => i,
        };
        self.cursor = self.cursor.map(remap);
        self.resume_from = remap(self.resume_from);

        tracing::debug!(uid, from = source, to = target, swap, "Plugin moved");
        Ok(target)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Flags
    // ─────────────────────────────────────────────────────────────────────────

    /// Enable or disable a plugin; disabling the active slot advances at once
    pub(crate) fn set_enabled(&mut self, uid: Uid, enabled: bool) -> Result<()> {
        let instance = self.plugin_mut(uid)?;
        if instance.is_enabled() == enabled {
            return Ok(());
        }
        instance.set_enabled(enabled);

        if !enabled {
            if let Some(index) = self.slot_of(uid).filter(|i| self.cursor == Some(*i)) {
                self.deactivate(index);
                self.select_from(index + 1);
            }
        }
        Ok(())
    }

    pub(crate) fn set_locked(&mut self, uid: Uid, locked: bool) -> Result<()> {
        self.plugin_mut(uid)?.set_locked(locked);
        Ok(())
    }

    /// Change a plugin's duration override; an active slot is re-armed
    pub(crate) fn set_duration(&mut self, uid: Uid, duration: Option<Duration>) -> Result<()> {
        self.plugin_mut(uid)?.set_duration_override(duration);

        if let Some(index) = self.slot_of(uid).filter(|i| self.cursor == Some(*i)) {
            let effective = self.effective_duration(uid);
            self.arm(index, effective);
            if let Some(instance) = self.plugins.get_mut(&uid) {
                instance.plugin_mut().set_view_duration(effective);
            }
        }
        Ok(())
    }

    /// Duration the plugin is shown for, `None` when infinite
    pub(crate) fn effective_duration(&self, uid: Uid) -> Option<Duration> {
        let duration = self
            .plugins
            .get(&uid)
            .and_then(|instance| instance.duration_override())
            .unwrap_or(self.settings.default_duration);
        (!duration.is_zero()).then_some(duration)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rotation
    // ─────────────────────────────────────────────────────────────────────────

    /// Jump the cursor to a slot; a locked slot becomes pinned
    pub(crate) fn activate_slot(&mut self, index: usize) -> Result<()> {
        if index >= self.slots.len() {
            return Err(Error::InvalidSlot(index));
        }
        if !self.can_be_active(index) {
            return Err(Error::SlotUnavailable(index));
        }

        if let Some(current) = self.cursor {
            self.deactivate(current);
        }
        self.activate(index);
        Ok(())
    }

    /// Run one tick: rotate, clear the canvas, render the active plugin
    pub(crate) fn update(&mut self, canvas: &mut Canvas) {
        self.rotate();
        canvas.fill(Rgb888::BLACK);
        self.render_active(canvas);
    }

    fn rotate(&mut self) {
        if let Some(index) = self.cursor {
            if !self.can_be_active(index) {
                self.deactivate(index);
                self.resume_from = index + 1;
            }
        }

        match self.cursor {
            None => self.select_from(self.resume_from),
            Some(index) => {
                let locked = self.occupant(index).is_some_and(PluginInstance::is_locked);
                if !locked && self.slots[index].timer().is_timeout() {
                    self.advance_from(index);
                }
            }
        }
    }

    fn render_active(&mut self, canvas: &mut Canvas) {
        let Some(index) = self.cursor else {
            return;
        };
        let max_failures = self.settings.max_render_failures;
        let Some(instance) = self.occupant_mut(index) else {
            return;
        };
        let uid = instance.uid();

        let outcome = catch_unwind(AssertUnwindSafe(|| instance.plugin_mut().render(canvas)));
        let error = match outcome {
            Ok(Ok(())) => {
                instance.reset_render_failures();
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        let failures = instance.record_render_failure();
        tracing::warn!(slot = index, uid, failures, error = %error, "Plugin render failed");
        canvas.fill(Rgb888::BLACK);

        if max_failures > 0 && failures >= max_failures {
            instance.reset_render_failures();
            tracing::error!(slot = index, uid, "Plugin keeps failing, skipping slot");
            self.advance_from(index);
        }
    }

    /// Move past `index` to the next eligible slot, or re-arm if there is none
    fn advance_from(&mut self, index: usize) {
        match self.next_eligible(index + 1) {
            Some(next) if next != index => {
                self.deactivate(index);
                self.activate(next);
            }
            _ => {
                let effective = self
                    .slots[index]
                    .occupant()
                    .and_then(|uid| self.effective_duration(uid));
                self.arm(index, effective);
            }
        }
    }

    fn select_from(&mut self, from: usize) {
        match self.next_eligible(from) {
            Some(next) => self.activate(next),
            None => self.resume_from = from,
        }
    }

    fn next_eligible(&self, from: usize) -> Option<usize> {
        let count = self.slots.len();
        (0..count)
            .map(|step| (from + step) % count)
            .find(|&index| self.is_eligible(index))
    }

    /// Enabled and unlocked: may be picked by automatic rotation
    fn is_eligible(&self, index: usize) -> bool {
        self.occupant(index)
            .is_some_and(|instance| instance.is_enabled() && !instance.is_locked())
    }

    /// Enabled: may stay active (a locked slot is pinned)
    fn can_be_active(&self, index: usize) -> bool {
        self.occupant(index).is_some_and(PluginInstance::is_enabled)
    }

    fn activate(&mut self, index: usize) {
        let Some(uid) = self.slots[index].occupant() else {
            return;
        };
        let duration = self.effective_duration(uid);

        self.cursor = Some(index);
        self.resume_from = index + 1;
        self.arm(index, duration);

        if let Some(instance) = self.plugins.get_mut(&uid) {
            instance.reset_render_failures();
            let plugin = instance.plugin_mut();
            plugin.set_view_duration(duration);
            plugin.active();
        }
        tracing::debug!(slot = index, uid, ?duration, "Slot activated");
    }

    fn deactivate(&mut self, index: usize) {
        self.cursor = None;
        self.slots[index].timer_mut().stop();
        if let Some(instance) = self.occupant_mut(index) {
            instance.plugin_mut().inactive();
        }
    }

    fn arm(&mut self, index: usize, duration: Option<Duration>) {
        let timer = self.slots[index].timer_mut();
        match duration {
            Some(duration) => timer.start(duration),
            None => timer.stop(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Snapshots
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn slot_state(&self, index: usize) -> Option<SlotState> {
        let slot = self.slots.get(index)?;
        let state = match slot.occupant().and_then(|uid| self.plugins.get(&uid)) {
            None => SlotState::Empty,
            Some(instance) if !instance.is_enabled() => SlotState::Disabled,
            Some(_) if self.cursor == Some(index) => SlotState::Active,
            Some(_) => SlotState::Waiting,
        };
        Some(state)
    }

    pub(crate) fn slot_infos(&self) -> Vec<SlotInfo> {
        (0..self.slots.len())
            .filter_map(|index| {
                let plugin = self.occupant(index);
                let view_duration = plugin.and_then(|instance| self.effective_duration(instance.uid()));
                Some(SlotInfo {
                    index,
                    state: self.slot_state(index)?,
                    view_duration_ms: view_duration.map_or(0, |d| d.as_millis() as u64),
                    plugin: plugin.map(|instance| instance.info(index)),
                })
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "plugin panicked".to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Display Manager
// ─────────────────────────────────────────────────────────────────────────────

/// Cloneable handle to the slot table and rotation cursor
#[derive(Clone)]
pub struct DisplayMgr {
    state: Arc<Mutex<DisplayState>>,
}

impl DisplayMgr {
    /// Create a display with all slots empty
    pub fn new(settings: DisplaySettings) -> Self {
        Self {
            state: Arc::new(Mutex::new(DisplayState::new(settings))),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, DisplayState> {
        self.state.lock()
    }

    pub fn settings(&self) -> DisplaySettings {
        self.lock().settings().clone()
    }

    /// Advance the rotation if due and render the active plugin into `canvas`
    ///
    /// The canvas is cleared first; at most one plugin renders per tick.
    pub fn update(&self, canvas: &mut Canvas) {
        self.lock().update(canvas);
    }

    /// Index of the active slot
    pub fn active_slot(&self) -> Option<usize> {
        self.lock().cursor()
    }

    /// State of one slot, `None` if the index is out of range
    pub fn slot_state(&self, index: usize) -> Option<SlotState> {
        self.lock().slot_state(index)
    }

    /// Snapshot of every slot
    pub fn slots(&self) -> Vec<SlotInfo> {
        self.lock().slot_infos()
    }

    pub fn slot_count(&self) -> usize {
        self.lock().slot_count()
    }

    /// Slot holding the given plugin
    pub fn get_slot_id_by_uid(&self, uid: Uid) -> Option<usize> {
        self.lock().slot_of(uid)
    }

    /// Make a slot active right away
    pub fn activate_slot(&self, index: usize) -> Result<()> {
        self.lock().activate_slot(index)
    }
}

impl std::fmt::Debug for DisplayMgr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("DisplayMgr")
            .field("slots", &state.slot_count())
            .field("active", &state.cursor())
            .finish()
    }
}
