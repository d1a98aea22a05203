// SoundChannelRegistry: process-wide map of channel name -> resource
//
// Resources are created on first use and then reused for the lifetime of the
// process; nothing here ever destroys one. Creating and tearing down audio
// resources per consumer causes audible restarts, so consumers only ever see
// the shared entries.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::backend::SoundBackend;
use super::channel::{ChannelName, SoundChannel};
use crate::error::SoundError;

/// Lazily populated registry of looping channels.
pub struct SoundChannelRegistry {
    backend: Arc<dyn SoundBackend>,
    channels: Mutex<BTreeMap<ChannelName, SoundChannel>>,
}

impl SoundChannelRegistry {
    pub fn new(backend: Arc<dyn SoundBackend>) -> Self {
        Self {
            backend,
            channels: Mutex::new(BTreeMap::new()),
        }
    }

    /// Channel for `name`, creating its resource on first request.
    ///
    /// `initial_volume` is applied only when the resource is created here.
    pub fn get_or_create(
        &self,
        name: ChannelName,
        initial_volume: f32,
    ) -> Result<SoundChannel, SoundError> {
        let mut channels = self.lock_channels()?;
        if let Some(channel) = channels.get(&name) {
            return Ok(channel.clone());
        }

        let resource = self.backend.create(name)?;
        resource.set_volume(initial_volume);
        let channel = SoundChannel {
            name,
            resource,
            looping: true,
        };
        channels.insert(name, channel.clone());

        log::debug!("[SoundRegistry] Created channel '{}'", name);
        Ok(channel)
    }

    /// Channel for `name` if it has been created.
    pub fn get(&self, name: ChannelName) -> Result<Option<SoundChannel>, SoundError> {
        Ok(self.lock_channels()?.get(&name).cloned())
    }

    /// Every channel created so far.
    pub fn channels(&self) -> Result<Vec<SoundChannel>, SoundError> {
        Ok(self.lock_channels()?.values().cloned().collect())
    }

    /// Names of the channels currently reporting playback.
    pub fn playing(&self) -> Result<Vec<ChannelName>, SoundError> {
        Ok(self
            .lock_channels()?
            .values()
            .filter(|channel| channel.resource.is_playing())
            .map(|channel| channel.name)
            .collect())
    }

    fn lock_channels(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<ChannelName, SoundChannel>>, SoundError> {
        self.channels.lock().map_err(|_| SoundError::LockPoisoned {
            component: "sound_registry".to_string(),
        })
    }
}
