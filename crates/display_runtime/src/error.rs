//! Error types for scheduler and lifecycle operations.
//!
//! Every variant is recoverable: the command path turns them into a negative
//! acknowledgement, the render path logs them and keeps ticking.

use crate::command::ParseError;
use crate::plugin::{PluginError, Uid};
use crate::store::StoreError;

/// Result type for display runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while managing slots and plugins
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Plugin type not found: {0}")]
    UnknownType(String),

    #[error("Plugin type already registered: {0}")]
    DuplicateType(String),

    #[error("No free slot available")]
    NoFreeSlot,

    #[error("Plugin {0} not found")]
    NotFound(Uid),

    #[error("Uid {0} is already in use")]
    DuplicateUid(Uid),

    #[error("No uid left to assign")]
    UidExhausted,

    #[error("Slot {0} is occupied")]
    SlotOccupied(usize),

    #[error("Slot {0} does not exist")]
    InvalidSlot(usize),

    #[error("Slot {0} has no enabled plugin")]
    SlotUnavailable(usize),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Parameter invalid: {0}")]
    Parse(#[from] ParseError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}
