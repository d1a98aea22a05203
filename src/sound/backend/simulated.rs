use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future;

use super::SoundBackend;
use crate::error::SoundError;
use crate::sound::channel::{ChannelName, ChannelResource, PlaybackFuture};

/// Simulated channel used for deterministic testing and headless hosts.
///
/// Produces no audio. Playback position only moves when
/// [`advance`](Self::advance) is called while the channel is playing.
pub struct SimulatedChannel {
    name: ChannelName,
    playing: AtomicBool,
    volume_bits: AtomicU32,
    position_ms: AtomicU64,
    fail_starts: AtomicBool,
    start_calls: AtomicUsize,
}

impl SimulatedChannel {
    pub fn new(name: ChannelName) -> Self {
        Self {
            name,
            playing: AtomicBool::new(false),
            volume_bits: AtomicU32::new(1.0f32.to_bits()),
            position_ms: AtomicU64::new(0),
            fail_starts: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> ChannelName {
        self.name
    }

    /// Let `elapsed` of playback pass.
    pub fn advance(&self, elapsed: Duration) {
        if self.playing.load(Ordering::SeqCst) {
            self.position_ms
                .fetch_add(elapsed.as_millis() as u64, Ordering::SeqCst);
        }
    }

    /// Make subsequent starts reject, like a device refusing playback.
    pub fn set_fail_starts(&self, fail: bool) {
        self.fail_starts.store(fail, Ordering::SeqCst);
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }
}

impl ChannelResource for SimulatedChannel {
    fn start(&self) -> PlaybackFuture {
        self.start_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_starts.load(Ordering::SeqCst) {
            self.playing.store(false, Ordering::SeqCst);
            return Box::pin(future::ready(Err(SoundError::PlaybackFailed {
                channel: self.name.to_string(),
                reason: "simulated start rejection".to_string(),
            })));
        }

        self.playing.store(true, Ordering::SeqCst);
        Box::pin(future::ready(Ok(())))
    }

    fn pause(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    fn rewind(&self) {
        self.position_ms.store(0, Ordering::SeqCst);
    }

    fn set_volume(&self, volume: f32) {
        self.volume_bits.store(volume.to_bits(), Ordering::SeqCst);
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::SeqCst))
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn position(&self) -> Duration {
        Duration::from_millis(self.position_ms.load(Ordering::SeqCst))
    }
}

/// Backend handing out [`SimulatedChannel`]s.
///
/// Keeps a handle to every channel it creates so tests can inspect and
/// drive them.
#[derive(Default)]
pub struct SimulatedBackend {
    channels: Mutex<HashMap<ChannelName, Arc<SimulatedChannel>>>,
    failing_loads: Mutex<HashSet<ChannelName>>,
    creations: AtomicUsize,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel previously created for `name`, if any.
    pub fn channel(&self, name: ChannelName) -> Option<Arc<SimulatedChannel>> {
        self.channels
            .lock()
            .ok()
            .and_then(|channels| channels.get(&name).cloned())
    }

    /// Total number of resources created.
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// Make creating `name` fail, like a missing asset.
    pub fn fail_loads_for(&self, name: ChannelName) {
        if let Ok(mut failing) = self.failing_loads.lock() {
            failing.insert(name);
        }
    }
}

impl SoundBackend for SimulatedBackend {
    fn create(&self, channel: ChannelName) -> Result<Arc<dyn ChannelResource>, SoundError> {
        let failing = self
            .failing_loads
            .lock()
            .map_err(|_| SoundError::LockPoisoned {
                component: "simulated_backend".to_string(),
            })?
            .contains(&channel);
        if failing {
            return Err(SoundError::ResourceLoad {
                channel: channel.to_string(),
                reason: "simulated load failure".to_string(),
            });
        }

        let resource = Arc::new(SimulatedChannel::new(channel));
        self.channels
            .lock()
            .map_err(|_| SoundError::LockPoisoned {
                component: "simulated_backend".to_string(),
            })?
            .insert(channel, Arc::clone(&resource));
        self.creations.fetch_add(1, Ordering::SeqCst);

        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_moves_only_while_playing() {
        let channel = SimulatedChannel::new(ChannelName::Rain);
        channel.advance(Duration::from_secs(1));
        assert_eq!(channel.position(), Duration::ZERO);

        let _ = channel.start();
        channel.advance(Duration::from_secs(2));
        channel.pause();
        channel.advance(Duration::from_secs(5));
        assert_eq!(channel.position(), Duration::from_secs(2));

        channel.rewind();
        assert_eq!(channel.position(), Duration::ZERO);
    }

    #[test]
    fn test_failed_start_reports_error() {
        let channel = SimulatedChannel::new(ChannelName::Cafe);
        channel.set_fail_starts(true);

        let result = futures::executor::block_on(channel.start());
        assert!(matches!(result, Err(SoundError::PlaybackFailed { .. })));
        assert!(!channel.is_playing());
    }

    #[test]
    fn test_backend_tracks_created_channels() {
        let backend = SimulatedBackend::new();
        assert!(backend.channel(ChannelName::Birds).is_none());

        backend.create(ChannelName::Birds).unwrap();
        assert!(backend.channel(ChannelName::Birds).is_some());
        assert_eq!(backend.creations(), 1);
    }

    #[test]
    fn test_injected_load_failure() {
        let backend = SimulatedBackend::new();
        backend.fail_loads_for(ChannelName::Rain);
        assert!(matches!(
            backend.create(ChannelName::Rain),
            Err(SoundError::ResourceLoad { .. })
        ));
        assert_eq!(backend.creations(), 0);
    }
}
