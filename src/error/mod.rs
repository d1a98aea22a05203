// Error types for the focus timer core
//
// This module defines custom error types for the sound engine, the timer
// engine and the persistent store, each carrying a stable numeric code.

mod sound;
mod storage;
mod timer;

pub use sound::{log_sound_error, SoundError, SoundErrorCodes};
pub use storage::{log_storage_error, StorageError, StorageErrorCodes};
pub use timer::{log_timer_error, TimerError, TimerErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// host boundaries.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
