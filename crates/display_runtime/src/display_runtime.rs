//! Display Runtime - Slot scheduler and plugin lifecycle for pixel displays
//!
//! This crate decides which plugin owns the display at any instant:
//! - `timer`: monotonic countdown used for every rotation duration
//! - `plugin`: the plugin contract, type registry and lifecycle manager
//! - `display`: slots, the rotation state machine and the render tick
//! - `store`: byte-level persistence of the slot arrangement
//! - `command`: the textual remote-control protocol
//!
//! Rendering goes through [`Canvas`], an `embedded-graphics` draw target, so
//! plugins can use any `embedded-graphics` primitive.

pub mod canvas;
pub mod command;
pub mod display;
pub mod error;
pub mod plugin;
pub mod store;
pub mod timer;

#[cfg(test)]
pub(crate) mod testing;

pub use canvas::Canvas;
pub use command::{Command, CommandProcessor, ParseError, Response};
pub use display::{DisplayMgr, DisplaySettings, SlotInfo, SlotState};
pub use error::{Error, Result};
pub use plugin::{
    Arrangement, Plugin, PluginError, PluginFactory, PluginInfo, PluginMgr, PluginRegistry,
    SlotRecord, SubItemRotation, Uid,
};
pub use store::{FileStore, MemoryStore, Store, StoreError};
pub use timer::Timer;
