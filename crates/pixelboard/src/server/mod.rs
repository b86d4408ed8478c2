//! HTTP and WebSocket Server
//!
//! Remote control surface of the display. WebSocket text frames carry command
//! lines and receive `ACK`/`NACK` replies; a small REST API exposes read-only
//! views of the slots, plugins and the current frame.

mod handler;
mod router;
mod state;

pub use handler::*;
pub use router::*;
pub use state::*;
