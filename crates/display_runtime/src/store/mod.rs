//! Persistence Store
//!
//! Opaque key-value storage for the slot arrangement. The scheduler only ever
//! hands it bytes; absence of a key is a normal first-boot condition.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

/// Errors raised by a store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid stored data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Byte-oriented load/save keyed by a fixed identifier
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the value stored under `key`, `None` if it was never written
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the value stored under `key`
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;
}
