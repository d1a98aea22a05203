//! Persistent store adapter.
//!
//! The only point of contact with durable storage. Engines see a synchronous
//! string key/value store; adapters report failures through `read`/`write`,
//! while the provided `get`/`set` log and swallow them so callers never have
//! to handle a storage failure. Values are opaque strings; encoding is the
//! caller's business.

use std::sync::Arc;

use crate::config::{StorageConfig, StoreBackend};
use crate::error::{log_storage_error, StorageError};

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Synchronous string key/value store.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Infallible read: failures are logged and reported as absent.
    fn get(&self, key: &str) -> Option<String> {
        self.read(key).unwrap_or_else(|err| {
            log_storage_error(&err, "get");
            None
        })
    }

    /// Infallible write: failures are logged and dropped.
    fn set(&self, key: &str, value: &str) {
        if let Err(err) = self.write(key, value) {
            log_storage_error(&err, "set");
        }
    }
}

/// Build the store adapter selected by configuration.
pub fn open_store(config: &StorageConfig) -> Arc<dyn KeyValueStore> {
    match config.backend {
        StoreBackend::File => Arc::new(FileStore::new(&config.data_dir)),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    }
}
