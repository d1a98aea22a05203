//! Backend abstractions producing channel resources.

use std::sync::Arc;

use super::channel::{ChannelName, ChannelResource};
use crate::config::{SoundBackendKind, SoundConfig};
use crate::error::SoundError;

/// Trait implemented by platform-specific sound backends.
///
/// The registry calls [`create`](SoundBackend::create) at most once per
/// channel name for the lifetime of the process.
pub trait SoundBackend: Send + Sync {
    fn create(&self, channel: ChannelName) -> Result<Arc<dyn ChannelResource>, SoundError>;
}

mod simulated;
pub use simulated::{SimulatedBackend, SimulatedChannel};

cfg_if::cfg_if! {
    if #[cfg(not(target_os = "android"))] {
        mod cpal;
        pub use self::cpal::{CpalBackend, CpalChannel};
    }
}

/// Build the backend selected by configuration.
pub fn create_backend(config: &SoundConfig) -> Arc<dyn SoundBackend> {
    match config.backend {
        SoundBackendKind::Simulated => Arc::new(SimulatedBackend::new()),
        SoundBackendKind::Cpal => cpal_backend(config),
    }
}

#[cfg(not(target_os = "android"))]
fn cpal_backend(config: &SoundConfig) -> Arc<dyn SoundBackend> {
    Arc::new(CpalBackend::new(&config.assets_dir))
}

#[cfg(target_os = "android")]
fn cpal_backend(_config: &SoundConfig) -> Arc<dyn SoundBackend> {
    log::warn!("[SoundBackend] cpal output unavailable on this target, using simulated channels");
    Arc::new(SimulatedBackend::new())
}
