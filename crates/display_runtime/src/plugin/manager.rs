//! Plugin Manager
//!
//! Lifecycle of plugin instances: install, uninstall, enable, disable, lock,
//! move and per-plugin settings. It is the only writer of slot occupancy and
//! owns persistence of the resulting arrangement.
//!
//! Mutations are synchronous and take the display lock once. `save` and
//! `load` snapshot or rebuild the table under the lock and do store I/O
//! outside of it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::Value;

use super::{
    ARRANGEMENT_KEY, Arrangement, PluginError, PluginInfo, PluginInstance, PluginRegistry,
    SlotRecord, Uid,
};
use crate::display::DisplayMgr;
use crate::error::{Error, Result};
use crate::store::{Store, StoreError};

/// Central manager for installed plugins
pub struct PluginMgr {
    display: DisplayMgr,
    registry: Arc<PluginRegistry>,
    store: Arc<dyn Store>,
    next_uid: AtomicU32,
    /// Held from snapshot to write so saves land in order
    save_lock: tokio::sync::Mutex<()>,
}

impl PluginMgr {
    /// Create a manager working on the given display
    pub fn new(display: DisplayMgr, registry: Arc<PluginRegistry>, store: Arc<dyn Store>) -> Self {
        Self {
            display,
            registry,
            store,
            next_uid: AtomicU32::new(1),
            save_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Handle to the display this manager fills
    pub fn display(&self) -> &DisplayMgr {
        &self.display
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Hand out the next uid; `Uid::MAX` is never assigned
    fn allocate_uid(&self) -> Result<Uid> {
        self.next_uid
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |uid| uid.checked_add(1))
            .map_err(|_| Error::UidExhausted)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Install a plugin into the first empty slot
    ///
    /// The plugin is started but left disabled. Nothing is persisted.
    pub fn install(&self, type_name: &str) -> Result<PluginInfo> {
        self.install_with(type_name, false)
    }

    /// Install a plugin and enable it in the same step
    pub fn install_enabled(&self, type_name: &str) -> Result<PluginInfo> {
        self.install_with(type_name, true)
    }

    fn install_with(&self, type_name: &str, enabled: bool) -> Result<PluginInfo> {
        if !self.registry.contains(type_name) {
            return Err(Error::UnknownType(type_name.to_string()));
        }

        let mut state = self.display.lock();
        let slot = state.first_empty_slot().ok_or(Error::NoFreeSlot)?;
        let uid = self.allocate_uid()?;

        let mut plugin = self.registry.create(type_name, uid)?;
        plugin.start(state.settings().width, state.settings().height);

        let mut instance = PluginInstance::new(uid, type_name, plugin);
        instance.set_enabled(enabled);
        let info = instance.info(slot);
        state.insert(slot, instance)?;

        tracing::info!(uid, slot, enabled, plugin_type = %type_name, "Plugin installed");
        Ok(info)
    }

    /// Stop a plugin and free its slot; returns the freed slot index
    pub fn uninstall(&self, uid: Uid) -> Result<usize> {
        let (slot, mut instance) = self.display.lock().remove(uid)?;
        instance.plugin_mut().stop();

        tracing::info!(uid, slot, plugin_type = %instance.type_name(), "Plugin uninstalled");
        Ok(slot)
    }

    pub fn enable(&self, uid: Uid) -> Result<()> {
        self.display.lock().set_enabled(uid, true)?;
        tracing::info!(uid, "Plugin enabled");
        Ok(())
    }

    /// Disable a plugin; if it is shown the display moves on immediately
    pub fn disable(&self, uid: Uid) -> Result<()> {
        self.display.lock().set_enabled(uid, false)?;
        tracing::info!(uid, "Plugin disabled");
        Ok(())
    }

    /// Exclude a plugin from rotation, or pin it if it is shown
    pub fn lock(&self, uid: Uid) -> Result<()> {
        self.display.lock().set_locked(uid, true)?;
        tracing::info!(uid, "Plugin locked");
        Ok(())
    }

    pub fn unlock(&self, uid: Uid) -> Result<()> {
        self.display.lock().set_locked(uid, false)?;
        tracing::info!(uid, "Plugin unlocked");
        Ok(())
    }

    /// Move a plugin to `target`; with `swap` an occupied target trades places
    pub fn move_plugin(&self, uid: Uid, target: usize, swap: bool) -> Result<usize> {
        self.display.lock().move_plugin(uid, target, swap)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings
    // ─────────────────────────────────────────────────────────────────────────

    /// Set or clear (`None`) the duration override
    ///
    /// Returns the effective duration, `None` meaning infinite.
    pub fn set_duration(&self, uid: Uid, duration: Option<Duration>) -> Result<Option<Duration>> {
        let mut state = self.display.lock();
        state.set_duration(uid, duration)?;
        Ok(state.effective_duration(uid))
    }

    /// Effective duration, `None` meaning infinite
    pub fn duration(&self, uid: Uid) -> Result<Option<Duration>> {
        let state = self.display.lock();
        if !state.contains(uid) {
            return Err(Error::NotFound(uid));
        }
        Ok(state.effective_duration(uid))
    }

    pub fn set_alias(&self, uid: Uid, alias: &str) -> Result<()> {
        self.display.lock().plugin_mut(uid)?.set_alias(alias);
        Ok(())
    }

    pub fn alias(&self, uid: Uid) -> Result<String> {
        self.display
            .lock()
            .plugin(uid)
            .map(|instance| instance.alias().to_string())
            .ok_or(Error::NotFound(uid))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_slot_id_by_uid(&self, uid: Uid) -> Option<usize> {
        self.display.lock().slot_of(uid)
    }

    /// First installed plugin of the given type, in slot order
    pub fn find_by_name(&self, type_name: &str) -> Option<PluginInfo> {
        self.display
            .lock()
            .occupied()
            .find(|(_, instance)| instance.type_name() == type_name)
            .map(|(slot, instance)| instance.info(slot))
    }

    pub fn plugin(&self, uid: Uid) -> Option<PluginInfo> {
        let state = self.display.lock();
        let slot = state.slot_of(uid)?;
        state.plugin(uid).map(|instance| instance.info(slot))
    }

    /// All installed plugins, in slot order
    pub fn plugins(&self) -> Vec<PluginInfo> {
        self.display
            .lock()
            .occupied()
            .map(|(slot, instance)| instance.info(slot))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Topics
    // ─────────────────────────────────────────────────────────────────────────

    pub fn topics(&self, uid: Uid) -> Result<Vec<String>> {
        let state = self.display.lock();
        let instance = state.plugin(uid).ok_or(Error::NotFound(uid))?;
        Ok(instance.plugin().topics())
    }

    pub fn get_topic(&self, uid: Uid, topic: &str) -> Result<Value> {
        let state = self.display.lock();
        let instance = state.plugin(uid).ok_or(Error::NotFound(uid))?;
        instance
            .plugin()
            .get_topic(topic)
            .ok_or_else(|| PluginError::UnknownTopic(topic.to_string()).into())
    }

    pub fn set_topic(&self, uid: Uid, topic: &str, value: &Value) -> Result<()> {
        self.display
            .lock()
            .plugin_mut(uid)?
            .plugin_mut()
            .set_topic(topic, value)?;
        tracing::debug!(uid, topic, "Topic updated");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot of the slot table in its persisted form
    pub fn arrangement(&self) -> Arrangement {
        let state = self.display.lock();
        let slots = state
            .occupied()
            .map(|(slot, instance)| SlotRecord {
                slot,
                type_name: instance.type_name().to_string(),
                uid: instance.uid(),
                alias: instance.alias().to_string(),
                enabled: instance.is_enabled(),
                locked: instance.is_locked(),
                duration_ms: instance.duration_override().map(|d| d.as_millis() as u64),
            })
            .collect();
        Arrangement { slots }
    }

    /// Write the current arrangement to the store
    pub async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        let arrangement = self.arrangement();
        let data = arrangement.to_bytes().map_err(StoreError::from)?;
        self.store.save(ARRANGEMENT_KEY, &data).await?;

        tracing::debug!(plugins = arrangement.slots.len(), "Arrangement saved");
        Ok(())
    }

    /// Rebuild the slot table from the store; returns the number of plugins restored
    ///
    /// A missing, unreadable or malformed arrangement leaves the display empty.
    pub async fn load(&self) -> usize {
        let data = match self.store.load(ARRANGEMENT_KEY).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!("No saved arrangement, starting empty");
                return 0;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read arrangement, starting empty");
                return 0;
            }
        };

        match Arrangement::from_bytes(&data) {
            Ok(arrangement) => self.restore(arrangement),
            Err(e) => {
                tracing::warn!(error = %e, "Saved arrangement is malformed, starting empty");
                0
            }
        }
    }

    /// Install the plugins of an arrangement into their recorded slots
    ///
    /// Records with unknown types, invalid or duplicate slots are skipped.
    /// Uids are kept unless they collide, in which case a fresh one is used.
    pub fn restore(&self, arrangement: Arrangement) -> usize {
        let highest = arrangement
            .slots
            .iter()
            .map(|r| r.uid)
            .filter(|uid| *uid < Uid::MAX)
            .max()
            .unwrap_or(0);
        self.next_uid.fetch_max(highest + 1, Ordering::SeqCst);

        let mut state = self.display.lock();
        let (width, height) = (state.settings().width, state.settings().height);
        let mut restored = 0;

        for record in arrangement.slots {
            if !self.registry.contains(&record.type_name) {
                tracing::warn!(
                    slot = record.slot,
                    plugin_type = %record.type_name,
                    "Unknown plugin type in arrangement, skipping"
                );
                continue;
            }
            if record.slot >= state.slot_count() {
                tracing::warn!(slot = record.slot, "Slot out of range in arrangement, skipping");
                continue;
            }
            if state.occupant(record.slot).is_some() {
                tracing::warn!(slot = record.slot, "Slot listed twice in arrangement, skipping");
                continue;
            }

            let uid = if record.uid == 0 || record.uid == Uid::MAX || state.contains(record.uid) {
                match self.allocate_uid() {
                    Ok(fresh) => {
                        tracing::warn!(old_uid = record.uid, new_uid = fresh, "Unusable uid, reassigned");
                        fresh
                    }
                    Err(e) => {
                        tracing::warn!(slot = record.slot, error = %e, "Cannot assign uid, skipping");
                        continue;
                    }
                }
            } else {
                record.uid
            };

            let mut plugin = match self.registry.create(&record.type_name, uid) {
                Ok(plugin) => plugin,
                Err(e) => {
                    tracing::warn!(slot = record.slot, error = %e, "Failed to create plugin");
                    continue;
                }
            };
            plugin.start(width, height);

            let mut instance = PluginInstance::new(uid, record.type_name, plugin);
            instance.set_alias(record.alias);
            instance.set_enabled(record.enabled);
            instance.set_locked(record.locked);
            instance.set_duration_override(record.duration_ms.map(Duration::from_millis));

            if let Err(e) = state.insert(record.slot, instance) {
                tracing::warn!(slot = record.slot, error = %e, "Failed to place plugin");
                continue;
            }
            restored += 1;
        }

        tracing::info!(restored, "Arrangement loaded");
        restored
    }
}

impl std::fmt::Debug for PluginMgr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginMgr")
            .field("display", &self.display)
            .field("registry", &self.registry)
            .field("next_uid", &self.next_uid.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::display::{DisplaySettings, SlotState};
    use crate::store::{FileStore, MemoryStore};
    use crate::testing::{self, FailingStore, StaticPlugin};

    fn manager_with(slots: usize, registry: PluginRegistry) -> (PluginMgr, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let display = DisplayMgr::new(DisplaySettings::default().with_slots(slots));
        let manager = PluginMgr::new(display, Arc::new(registry), store.clone());
        (manager, store)
    }

    fn manager(slots: usize) -> (PluginMgr, Arc<MemoryStore>) {
        manager_with(slots, testing::registry())
    }

    #[test]
    fn test_install_uses_first_empty_slot() {
        let (manager, _) = manager(3);

        let first = manager.install("static").unwrap();
        let second = manager.install("red").unwrap();
        assert_eq!((first.slot, first.uid), (0, 1));
        assert_eq!((second.slot, second.uid), (1, 2));
        assert!(!first.enabled);

        manager.uninstall(first.uid).unwrap();
        let third = manager.install("static").unwrap();
        assert_eq!((third.slot, third.uid), (0, 3));
        assert_eq!(manager.display().slot_state(0), Some(SlotState::Disabled));
    }

    #[test]
    fn test_install_starts_and_uninstall_stops() {
        let probe = StaticPlugin::default();
        let mut registry = PluginRegistry::new();
        let template = probe.clone();
        registry
            .register_type("probe", move |_uid| Box::new(template.clone()))
            .unwrap();
        let (manager, _) = manager_with(2, registry);

        let info = manager.install("probe").unwrap();
        assert_eq!(probe.starts.load(Ordering::SeqCst), 1);
        assert_eq!(probe.stops.load(Ordering::SeqCst), 0);

        assert_eq!(manager.uninstall(info.uid).unwrap(), 0);
        assert_eq!(probe.stops.load(Ordering::SeqCst), 1);
        assert!(matches!(manager.uninstall(info.uid), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_install_unknown_type() {
        let (manager, _) = manager(2);
        assert!(matches!(manager.install("weather"), Err(Error::UnknownType(_))));
        assert!(manager.plugins().is_empty());
    }

    #[test]
    fn test_install_into_full_table() {
        let mut registry = testing::registry();
        registry
            .register_type("clock", |_uid| Box::new(StaticPlugin::default()))
            .unwrap();
        let (manager, _) = manager_with(2, registry);
        manager.install("static").unwrap();
        manager.install("red").unwrap();
        manager.enable(2).unwrap();

        let before = manager.plugins();
        assert!(matches!(manager.install("clock"), Err(Error::NoFreeSlot)));
        assert_eq!(manager.plugins(), before);
        assert_eq!(manager.display().slot_count(), 2);
    }

    #[test]
    fn test_flags() {
        let (manager, _) = manager(2);
        let uid = manager.install("static").unwrap().uid;

        manager.enable(uid).unwrap();
        manager.enable(uid).unwrap();
        manager.lock(uid).unwrap();
        let info = manager.plugin(uid).unwrap();
        assert!(info.enabled && info.locked);

        manager.unlock(uid).unwrap();
        manager.disable(uid).unwrap();
        let info = manager.plugin(uid).unwrap();
        assert!(!info.enabled && !info.locked);

        assert!(matches!(manager.enable(42), Err(Error::NotFound(42))));
        assert!(matches!(manager.lock(42), Err(Error::NotFound(42))));
    }

    #[test]
    fn test_duration_and_alias() {
        let (manager, _) = manager(2);
        let uid = manager.install("static").unwrap().uid;

        assert_eq!(manager.duration(uid).unwrap(), Some(Duration::from_secs(30)));
        let effective = manager
            .set_duration(uid, Some(Duration::from_millis(2500)))
            .unwrap();
        assert_eq!(effective, Some(Duration::from_millis(2500)));
        assert_eq!(manager.set_duration(uid, Some(Duration::ZERO)).unwrap(), None);
        assert_eq!(
            manager.set_duration(uid, None).unwrap(),
            Some(Duration::from_secs(30))
        );

        manager.set_alias(uid, "kitchen").unwrap();
        assert_eq!(manager.alias(uid).unwrap(), "kitchen");
        assert!(matches!(manager.duration(9), Err(Error::NotFound(9))));
    }

    #[test]
    fn test_lookups() {
        let (manager, _) = manager(3);
        manager.install("static").unwrap();
        let red = manager.install("red").unwrap();

        assert_eq!(manager.get_slot_id_by_uid(red.uid), Some(1));
        assert_eq!(manager.get_slot_id_by_uid(77), None);
        assert_eq!(manager.find_by_name("red").unwrap().uid, red.uid);
        assert!(manager.find_by_name("clock").is_none());

        manager.move_plugin(red.uid, 2, false).unwrap();
        assert_eq!(manager.get_slot_id_by_uid(red.uid), Some(2));
        assert_eq!(manager.plugins().len(), 2);
    }

    #[test]
    fn test_topics() {
        let (manager, _) = manager(2);
        let uid = manager.install("static").unwrap().uid;

        assert_eq!(manager.topics(uid).unwrap(), vec!["/color"]);
        manager
            .set_topic(uid, "/color", &json!({ "r": 1, "g": 2, "b": 3 }))
            .unwrap();
        assert_eq!(
            manager.get_topic(uid, "/color").unwrap(),
            json!({ "r": 1, "g": 2, "b": 3 })
        );

        assert!(matches!(
            manager.get_topic(uid, "/nope"),
            Err(Error::Plugin(PluginError::UnknownTopic(_)))
        ));
        assert!(matches!(
            manager.set_topic(uid, "/color", &json!({ "r": 300 })),
            Err(Error::Plugin(PluginError::InvalidValue { .. }))
        ));
        assert!(matches!(manager.topics(5), Err(Error::NotFound(5))));
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let (manager, store) = manager(4);
        let a = manager.install("static").unwrap().uid;
        let b = manager.install("red").unwrap().uid;
        let c = manager.install("static").unwrap().uid;
        manager.enable(a).unwrap();
        manager.enable(c).unwrap();
        manager.lock(c).unwrap();
        manager.set_duration(b, Some(Duration::from_millis(1200))).unwrap();
        manager.set_alias(a, "hello").unwrap();
        manager.move_plugin(b, 3, false).unwrap();
        manager.uninstall(a).unwrap();
        manager.save().await.unwrap();
        assert_eq!(store.write_count(), 1);

        let display = DisplayMgr::new(DisplaySettings::default().with_slots(4));
        let reloaded = PluginMgr::new(display, Arc::new(testing::registry()), store.clone());
        assert_eq!(reloaded.load().await, 2);

        assert_eq!(reloaded.arrangement(), manager.arrangement());
        assert_eq!(reloaded.plugins(), manager.plugins());
        assert_eq!(reloaded.get_slot_id_by_uid(b), Some(3));

        // Fresh uids continue after the restored ones
        assert_eq!(reloaded.install("static").unwrap().uid, c + 1);
    }

    #[tokio::test]
    async fn test_load_missing_or_malformed() {
        let (manager, _) = manager(2);
        assert_eq!(manager.load().await, 0);

        let store = Arc::new(MemoryStore::with_entry(ARRANGEMENT_KEY, "{ slots: oops"));
        let manager = PluginMgr::new(
            DisplayMgr::new(DisplaySettings::default()),
            Arc::new(testing::registry()),
            store,
        );
        assert_eq!(manager.load().await, 0);
        assert!(manager.plugins().is_empty());
    }

    #[tokio::test]
    async fn test_load_skips_bad_records() {
        let data = json!({
            "slots": [
                { "slot": 0, "type": "weather", "uid": 1, "enabled": true },
                { "slot": 1, "type": "static", "uid": 2, "enabled": true },
                { "slot": 1, "type": "red", "uid": 3, "enabled": true },
                { "slot": 9, "type": "red", "uid": 4, "enabled": true },
                { "slot": 2, "type": "red", "uid": 5, "enabled": false, "duration_ms": 0 }
            ]
        });
        let store = Arc::new(MemoryStore::with_entry(
            ARRANGEMENT_KEY,
            serde_json::to_vec(&data).unwrap(),
        ));
        let manager = PluginMgr::new(
            DisplayMgr::new(DisplaySettings::default().with_slots(3)),
            Arc::new(testing::registry()),
            store,
        );

        assert_eq!(manager.load().await, 2);
        assert_eq!(manager.get_slot_id_by_uid(2), Some(1));
        assert_eq!(manager.get_slot_id_by_uid(5), Some(2));
        assert_eq!(manager.duration(5).unwrap(), None);
        assert_eq!(manager.display().slot_state(0), Some(SlotState::Empty));
    }

    #[tokio::test]
    async fn test_load_reassigns_duplicate_uid() {
        let data = json!({
            "slots": [
                { "slot": 0, "type": "static", "uid": 7, "enabled": true },
                { "slot": 1, "type": "red", "uid": 7, "enabled": true }
            ]
        });
        let store = Arc::new(MemoryStore::with_entry(
            ARRANGEMENT_KEY,
            serde_json::to_vec(&data).unwrap(),
        ));
        let manager = PluginMgr::new(
            DisplayMgr::new(DisplaySettings::default().with_slots(2)),
            Arc::new(testing::registry()),
            store,
        );

        assert_eq!(manager.load().await, 2);
        assert_eq!(manager.get_slot_id_by_uid(7), Some(0));
        assert_eq!(manager.get_slot_id_by_uid(8), Some(1));
    }

    #[tokio::test]
    async fn test_load_never_reuses_max_uid() {
        let data = json!({
            "slots": [
                { "slot": 0, "type": "static", "uid": u32::MAX, "enabled": true },
                { "slot": 1, "type": "red", "uid": 4, "enabled": true }
            ]
        });
        let store = Arc::new(MemoryStore::with_entry(
            ARRANGEMENT_KEY,
            serde_json::to_vec(&data).unwrap(),
        ));
        let manager = PluginMgr::new(
            DisplayMgr::new(DisplaySettings::default().with_slots(3)),
            Arc::new(testing::registry()),
            store,
        );

        assert_eq!(manager.load().await, 2);
        assert_eq!(manager.get_slot_id_by_uid(u32::MAX), None);
        assert_eq!(manager.get_slot_id_by_uid(5), Some(0));
        assert_eq!(manager.get_slot_id_by_uid(4), Some(1));

        let fresh = manager.install("static").unwrap();
        assert_eq!((fresh.slot, fresh.uid), (2, 6));
        assert_eq!(manager.plugins().len(), 3);
    }

    #[test]
    fn test_install_fails_when_uids_run_out() {
        let (manager, _) = manager(3);
        manager.next_uid.store(u32::MAX - 1, Ordering::SeqCst);

        assert_eq!(manager.install("static").unwrap().uid, u32::MAX - 1);
        assert!(matches!(manager.install("static"), Err(Error::UidExhausted)));
        assert!(matches!(manager.install("red"), Err(Error::UidExhausted)));
        assert_eq!(manager.plugins().len(), 1);
        assert_eq!(manager.display().slot_state(1), Some(SlotState::Empty));
    }

    #[test]
    fn test_install_enabled() {
        let (manager, _) = manager(2);
        let info = manager.install_enabled("static").unwrap();
        assert!(info.enabled);
        assert!(manager.plugin(info.uid).unwrap().enabled);
        assert!(!manager.install("red").unwrap().enabled);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_keep_latest_arrangement() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path()));
        let manager = Arc::new(PluginMgr::new(
            DisplayMgr::new(DisplaySettings::default().with_slots(8)),
            Arc::new(testing::registry()),
            store.clone(),
        ));

        let mut handles = Vec::new();
        for n in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                let uid = manager.install("static").unwrap().uid;
                manager.set_alias(uid, &format!("plugin-{n}")).unwrap();
                manager.save().await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let data = store.load(ARRANGEMENT_KEY).await.unwrap().unwrap();
        let saved = Arrangement::from_bytes(&data).unwrap();
        assert_eq!(saved, manager.arrangement());
        assert_eq!(saved.slots.len(), 8);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_memory_state() {
        let display = DisplayMgr::new(DisplaySettings::default());
        let manager = PluginMgr::new(display, Arc::new(testing::registry()), Arc::new(FailingStore));
        let uid = manager.install("static").unwrap().uid;

        assert!(matches!(manager.save().await, Err(Error::Persistence(_))));
        assert!(manager.plugin(uid).is_some());
    }
}
