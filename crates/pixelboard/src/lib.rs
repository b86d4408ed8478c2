//! Pixelboard - Slot scheduler service for pixel displays
//!
//! This crate wires the `display_runtime` scheduler into a running service:
//! - `config`: the `pixelboard.toml` configuration file
//! - `plugins`: the built-in content plugins
//! - `render`: the fixed-rate render loop publishing frames
//! - `server`: WebSocket command channel and REST API

// Re-export the scheduler core
pub use display_runtime;

pub mod config;
pub mod plugins;
pub mod render;
pub mod server;
