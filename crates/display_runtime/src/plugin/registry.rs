// Plugin Registry - Maps plugin type names to factories
//
// Filled once at startup, then shared read-only (`Arc<PluginRegistry>`) by
// the plugin manager and the command layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Plugin, Uid};
use crate::error::{Error, Result};

/// Constructs a plugin instance for a given uid
pub type PluginFactory = Arc<dyn Fn(Uid) -> Box<dyn Plugin> + Send + Sync>;

/// Registry of all installable plugin types
#[derive(Default)]
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin type
    pub fn register_type<F>(&mut self, type_name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(Uid) -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        if self.factories.contains_key(&type_name) {
            return Err(Error::DuplicateType(type_name));
        }

        tracing::debug!(plugin_type = %type_name, "Registered plugin type");
        self.factories.insert(type_name, Arc::new(factory));
        Ok(())
    }

    /// Construct a new instance of a registered type
    pub fn create(&self, type_name: &str, uid: Uid) -> Result<Box<dyn Plugin>> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.to_string()))?;
        Ok(factory(uid))
    }

    /// Check if a type is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// All registered type names, sorted
    pub fn type_names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticPlugin;

    #[test]
    fn test_empty_registry() {
        let registry = PluginRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = PluginRegistry::new();
        registry
            .register_type("static", |_uid| Box::new(StaticPlugin::default()))
            .unwrap();

        assert!(registry.contains("static"));
        assert!(registry.create("static", 1).is_ok());
    }

    #[test]
    fn test_duplicate_type() {
        let mut registry = PluginRegistry::new();
        registry
            .register_type("static", |_uid| Box::new(StaticPlugin::default()))
            .unwrap();

        let result = registry.register_type("static", |_uid| Box::new(StaticPlugin::default()));
        assert!(matches!(result, Err(Error::DuplicateType(name)) if name == "static"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_type() {
        let registry = PluginRegistry::new();
        assert!(matches!(
            registry.create("clock", 1),
            Err(Error::UnknownType(name)) if name == "clock"
        ));
    }

    #[test]
    fn test_type_names_sorted() {
        let mut registry = PluginRegistry::new();
        for name in ["text", "clock", "lamp"] {
            registry
                .register_type(name, |_uid| Box::new(StaticPlugin::default()))
                .unwrap();
        }
        assert_eq!(registry.type_names(), vec!["clock", "lamp", "text"]);
    }
}
