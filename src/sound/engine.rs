//! BackgroundSoundEngine: single-active-channel playback with shared volume.
//!
//! Every `play` first pauses whatever is playing, so at most one channel is
//! ever audible. Volume is shared by all channels, applied to every created
//! resource immediately and written through to the store. The persisted
//! volume is read exactly once, when the engine is built.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::{FutureExt, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::channel::{ChannelName, PlaybackFuture};
use super::registry::SoundChannelRegistry;
use crate::config::AppConfig;
use crate::error::{log_sound_error, SoundError};
use crate::managers::{spawn_background, BroadcastChannelManager};
use crate::storage::KeyValueStore;

/// Observable engine state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundEngineState {
    pub active_channel: Option<ChannelName>,
    /// Shared by every channel, always within [0, 1]
    pub volume: f32,
}

/// Process-wide background sound owner.
pub struct BackgroundSoundEngine {
    state: RwLock<SoundEngineState>,
    registry: Arc<SoundChannelRegistry>,
    store: Arc<dyn KeyValueStore>,
    volume_key: String,
    observers: BroadcastChannelManager<SoundEngineState>,
}

impl BackgroundSoundEngine {
    pub fn new(
        registry: Arc<SoundChannelRegistry>,
        store: Arc<dyn KeyValueStore>,
        config: &AppConfig,
    ) -> Self {
        let volume_key = config.storage.volume_key.clone();
        let volume = Self::load_volume(store.as_ref(), &volume_key, config.sound.default_volume);

        log::info!("[SoundEngine] Initialized with volume {:.2}", volume);

        Self {
            state: RwLock::new(SoundEngineState {
                active_channel: None,
                volume,
            }),
            registry,
            store,
            volume_key,
            observers: BroadcastChannelManager::new("SoundEngine", config.observers.sound_buffer),
        }
    }

    /// Persisted volume, or `default` when absent or not a finite number.
    fn load_volume(store: &dyn KeyValueStore, key: &str, default: f32) -> f32 {
        let fallback = if default.is_finite() {
            default.clamp(0.0, 1.0)
        } else {
            0.5
        };

        match store.get(key) {
            Some(raw) => match raw.trim().parse::<f32>() {
                Ok(volume) if volume.is_finite() => volume.clamp(0.0, 1.0),
                _ => {
                    log::warn!("[SoundEngine] Ignoring stored volume {:?}", raw);
                    fallback
                }
            },
            None => fallback,
        }
    }

    // ========================================================================
    // READ ACCESS
    // ========================================================================

    pub fn snapshot(&self) -> Result<SoundEngineState, SoundError> {
        Ok(*self.read_state()?)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SoundEngineState> {
        self.observers.subscribe()
    }

    pub fn state_stream(&self) -> impl Stream<Item = SoundEngineState> + Send + 'static {
        self.observers.stream()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.observer_count()
    }

    pub fn registry(&self) -> &Arc<SoundChannelRegistry> {
        &self.registry
    }

    // ========================================================================
    // PLAYBACK
    // ========================================================================

    /// Play a channel by name, or stop with `None`.
    ///
    /// Whatever is playing is paused first, unconditionally. Requesting the
    /// channel that was already active toggles it off. A name outside the
    /// known set clears the active channel instead of failing.
    pub fn play(&self, name: Option<&str>) -> Result<SoundEngineState, SoundError> {
        let requested = match name {
            None => None,
            Some(raw) => {
                let parsed = ChannelName::parse(raw);
                if parsed.is_none() {
                    log::warn!("[SoundEngine] Unknown channel '{}', stopping playback", raw);
                }
                parsed
            }
        };

        self.switch_to(requested)
    }

    /// Typed variant of [`play`](Self::play).
    pub fn play_channel(&self, channel: ChannelName) -> Result<SoundEngineState, SoundError> {
        self.switch_to(Some(channel))
    }

    /// Pause and rewind every channel and clear the active channel.
    ///
    /// Resources are kept for reuse.
    pub fn stop_all(&self) -> Result<SoundEngineState, SoundError> {
        let mut state = self.write_state()?;

        for channel in self.registry.channels()? {
            channel.resource.pause();
            channel.resource.rewind();
        }
        state.active_channel = None;

        let snapshot = *state;
        drop(state);

        log::debug!("[SoundEngine] Stopped all channels");
        self.observers.publish(snapshot);
        Ok(snapshot)
    }

    /// Set the shared volume.
    ///
    /// NaN and infinities are rejected without touching state; finite values
    /// are clamped to [0, 1].
    pub fn set_volume(&self, volume: f32) -> Result<SoundEngineState, SoundError> {
        if !volume.is_finite() {
            let err = SoundError::InvalidVolume { value: volume };
            log_sound_error(&err, "set_volume");
            return Err(err);
        }
        let volume = volume.clamp(0.0, 1.0);

        let mut state = self.write_state()?;
        let channels = self.registry.channels()?;
        state.volume = volume;
        for channel in channels {
            channel.resource.set_volume(volume);
        }
        self.store.set(&self.volume_key, &volume.to_string());

        let snapshot = *state;
        drop(state);

        self.observers.publish(snapshot);
        Ok(snapshot)
    }

    /// Create every channel resource up front.
    ///
    /// Failures are logged per channel; the rest still load.
    pub fn preload(&self) -> Result<usize, SoundError> {
        let volume = self.read_state()?.volume;
        let mut loaded = 0;
        for name in ChannelName::ALL {
            match self.registry.get_or_create(name, volume) {
                Ok(_) => loaded += 1,
                Err(err) => log_sound_error(&err, "preload"),
            }
        }
        Ok(loaded)
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn switch_to(&self, requested: Option<ChannelName>) -> Result<SoundEngineState, SoundError> {
        let mut state = self.write_state()?;
        let channels = self.registry.channels()?;
        let previous = state.active_channel.take();

        for channel in channels {
            channel.resource.pause();
        }

        let next = requested.filter(|channel| Some(*channel) != previous);
        if let Some(channel) = next {
            state.active_channel = Some(channel);
            self.start_channel(channel, state.volume);
        }

        let snapshot = *state;
        drop(state);

        log::info!(
            "[SoundEngine] Active channel {:?} -> {:?}",
            previous,
            snapshot.active_channel
        );
        self.observers.publish(snapshot);
        Ok(snapshot)
    }

    /// Kick off playback; failures are logged and never roll back state.
    fn start_channel(&self, channel: ChannelName, volume: f32) {
        let entry = match self.registry.get_or_create(channel, volume) {
            Ok(entry) => entry,
            Err(err) => {
                log_sound_error(&err, "play");
                return;
            }
        };

        entry.resource.set_volume(volume);
        Self::observe_start(entry.resource.start());
    }

    fn observe_start(mut start: PlaybackFuture) {
        match (&mut start).now_or_never() {
            Some(Ok(())) => {}
            Some(Err(err)) => log_sound_error(&err, "play"),
            None => spawn_background("sound-start", async move {
                if let Err(err) = start.await {
                    log_sound_error(&err, "play");
                }
            }),
        }
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, SoundEngineState>, SoundError> {
        self.state.read().map_err(|_| SoundError::LockPoisoned {
            component: "sound_engine".to_string(),
        })
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, SoundEngineState>, SoundError> {
        self.state.write().map_err(|_| SoundError::LockPoisoned {
            component: "sound_engine".to_string(),
        })
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
