// Persistent store error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Storage error code constants
///
/// Error code range: 3001-3003
pub struct StorageErrorCodes {}

impl StorageErrorCodes {
    /// Reading or writing the backing medium failed
    pub const IO: i32 = 3001;

    /// A value could not be encoded to JSON
    pub const SERIALIZATION: i32 = 3002;

    /// In-memory store lock was poisoned
    pub const LOCK_POISONED: i32 = 3003;
}

/// Log a storage error with structured context
///
/// Store adapters never surface failures to engines; `get`/`set` call this
/// and carry on with "absent" / "not written".
pub fn log_storage_error(err: &StorageError, context: &str) {
    error!(
        "Storage error in {}: code={}, component=KeyValueStore, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Storage-related errors
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Reading or writing the backing medium failed
    Io { key: String, reason: String },

    /// A value could not be encoded to JSON
    Serialization { key: String, reason: String },

    /// In-memory store lock was poisoned
    LockPoisoned,
}

impl ErrorCode for StorageError {
    fn code(&self) -> i32 {
        match self {
            StorageError::Io { .. } => StorageErrorCodes::IO,
            StorageError::Serialization { .. } => StorageErrorCodes::SERIALIZATION,
            StorageError::LockPoisoned => StorageErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            StorageError::Io { key, reason } => {
                format!("I/O failure for key '{}': {}", key, reason)
            }
            StorageError::Serialization { key, reason } => {
                format!("Failed to encode value for key '{}': {}", key, reason)
            }
            StorageError::LockPoisoned => "Store lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StorageError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for StorageError {}
