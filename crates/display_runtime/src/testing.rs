//! Test plugins and stores shared by the unit tests of this crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use serde_json::{Value, json};

use crate::canvas::Canvas;
use crate::plugin::{Plugin, PluginError, PluginRegistry};
use crate::store::{Store, StoreError};

/// Fills the canvas with one color and counts lifecycle calls
#[derive(Debug, Clone)]
pub struct StaticPlugin {
    pub color: Rgb888,
    pub renders: Arc<AtomicUsize>,
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
}

impl Default for StaticPlugin {
    fn default() -> Self {
        Self {
            color: Rgb888::WHITE,
            renders: Arc::new(AtomicUsize::new(0)),
            starts: Arc::new(AtomicUsize::new(0)),
            stops: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Plugin for StaticPlugin {
    fn start(&mut self, _width: u32, _height: u32) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn render(&mut self, canvas: &mut Canvas) -> Result<(), PluginError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        canvas.fill(self.color);
        Ok(())
    }

    fn topics(&self) -> Vec<String> {
        vec!["/color".to_string()]
    }

    fn get_topic(&self, topic: &str) -> Option<Value> {
        (topic == "/color").then(|| json!({ "r": self.color.r(), "g": self.color.g(), "b": self.color.b() }))
    }

    fn set_topic(&mut self, topic: &str, value: &Value) -> Result<(), PluginError> {
        if topic != "/color" {
            return Err(PluginError::UnknownTopic(topic.to_string()));
        }
        let channel = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_u64)
                .filter(|v| *v <= 255)
                .map(|v| v as u8)
                .ok_or_else(|| PluginError::invalid(topic, format!("missing channel {}", name)))
        };
        self.color = Rgb888::new(channel("r")?, channel("g")?, channel("b")?);
        Ok(())
    }
}

/// Always fails to render
#[derive(Debug, Default)]
pub struct FailingPlugin;

impl Plugin for FailingPlugin {
    fn render(&mut self, _canvas: &mut Canvas) -> Result<(), PluginError> {
        Err(PluginError::Render("no data".to_string()))
    }
}

/// Panics while rendering
#[derive(Debug, Default)]
pub struct PanickingPlugin;

impl Plugin for PanickingPlugin {
    fn render(&mut self, _canvas: &mut Canvas) -> Result<(), PluginError> {
        panic!("plugin bug");
    }
}

/// Registry with `static`, `red`, `failing` and `panic` types
pub fn registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry
        .register_type("static", |_uid| Box::new(StaticPlugin::default()))
        .unwrap();
    registry
        .register_type("red", |_uid| {
            Box::new(StaticPlugin {
                color: Rgb888::RED,
                ..StaticPlugin::default()
            })
        })
        .unwrap();
    registry
        .register_type("failing", |_uid| Box::new(FailingPlugin))
        .unwrap();
    registry
        .register_type("panic", |_uid| Box::new(PanickingPlugin))
        .unwrap();
    registry
}

/// Store whose writes always fail
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl Store for FailingStore {
    async fn load(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(None)
    }

    async fn save(&self, _key: &str, _data: &[u8]) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk full")))
    }
}
