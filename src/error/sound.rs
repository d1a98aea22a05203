// Sound engine error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Sound error code constants
///
/// Single source of truth for the numeric codes attached to [`SoundError`],
/// so hosts can match on a stable number rather than on message text.
///
/// Error code range: 1001-1006
pub struct SoundErrorCodes {}

impl SoundErrorCodes {
    /// Channel name is not part of the known channel set
    pub const UNKNOWN_CHANNEL: i32 = 1001;

    /// Volume is NaN or infinite
    pub const INVALID_VOLUME: i32 = 1002;

    /// Channel resource could not be created (asset missing, decode failure)
    pub const RESOURCE_LOAD: i32 = 1003;

    /// Channel resource rejected a playback start
    pub const PLAYBACK_FAILED: i32 = 1004;

    /// Failed to open the output stream
    pub const STREAM_OPEN_FAILED: i32 = 1005;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 1006;
}

/// Log a sound error with structured context
///
/// Playback failures never propagate out of the engine's synchronous API;
/// this is where they end up instead.
pub fn log_sound_error(err: &SoundError, context: &str) {
    error!(
        "Sound error in {}: code={}, component=SoundEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Sound-related errors
///
/// These errors cover the background sound engine, its channel registry and
/// the platform backends that produce channel resources.
///
/// Error code ranges: 1001-1006
#[derive(Debug, Clone, PartialEq)]
pub enum SoundError {
    /// Channel name is not part of the known channel set
    UnknownChannel { name: String },

    /// Volume is NaN or infinite
    InvalidVolume { value: f32 },

    /// Channel resource could not be created
    ResourceLoad { channel: String, reason: String },

    /// Channel resource rejected a playback start
    PlaybackFailed { channel: String, reason: String },

    /// Failed to open the output stream
    StreamOpenFailed { reason: String },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for SoundError {
    fn code(&self) -> i32 {
        match self {
            SoundError::UnknownChannel { .. } => SoundErrorCodes::UNKNOWN_CHANNEL,
            SoundError::InvalidVolume { .. } => SoundErrorCodes::INVALID_VOLUME,
            SoundError::ResourceLoad { .. } => SoundErrorCodes::RESOURCE_LOAD,
            SoundError::PlaybackFailed { .. } => SoundErrorCodes::PLAYBACK_FAILED,
            SoundError::StreamOpenFailed { .. } => SoundErrorCodes::STREAM_OPEN_FAILED,
            SoundError::LockPoisoned { .. } => SoundErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            SoundError::UnknownChannel { name } => format!("Unknown sound channel '{}'", name),
            SoundError::InvalidVolume { value } => {
                format!("Volume must be a finite number (got {})", value)
            }
            SoundError::ResourceLoad { channel, reason } => {
                format!("Failed to load channel '{}': {}", channel, reason)
            }
            SoundError::PlaybackFailed { channel, reason } => {
                format!("Playback failed on channel '{}': {}", channel, reason)
            }
            SoundError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            SoundError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
        }
    }
}

impl fmt::Display for SoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SoundError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SoundError {}
