//! Client-side key-value storage media.
//!
//! This module provides the `Storage` trait and two media:
//! - `MemoryStorage`: process-local map, nothing survives a restart
//! - `FileStorage`: one JSON file per key in a data directory
//!
//! Values are opaque strings; callers own the serialization.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize value for key {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// A persistent key-value medium scoped to this client.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a key that was never stored is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
