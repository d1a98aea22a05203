//! Consumer handles over the shared engines.
//!
//! Handles are cheap to create and drop. They never own engine state, so any
//! number of them can coexist and all see the same session and sound state.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::context::AppContext;
use crate::error::{log_sound_error, SoundError, TimerError};
use crate::sound::{BackgroundSoundEngine, SoundEngineState};
use crate::timer::{TimerEngine, TimerMode, TimerSession};

/// A timer consumer: current state, change notifications and the setters.
pub struct TimerHandle {
    engine: Arc<TimerEngine>,
    updates: broadcast::Receiver<TimerSession>,
}

impl TimerHandle {
    /// Subscribe to the context's timer engine.
    ///
    /// The first handle also wires up the visibility listener; later ones
    /// reuse it.
    pub fn attach(ctx: &AppContext) -> Self {
        ctx.attach_visibility();
        Self {
            engine: Arc::clone(ctx.timer()),
            updates: ctx.timer().subscribe(),
        }
    }

    pub fn state(&self) -> Result<TimerSession, TimerError> {
        self.engine.snapshot()
    }

    /// Next published session, waiting if none is pending.
    ///
    /// Returns `None` once the engine is gone. Skips over updates missed
    /// while lagging.
    pub async fn changed(&mut self) -> Option<TimerSession> {
        loop {
            match self.updates.recv().await {
                Ok(session) => return Some(session),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("[TimerHandle] Skipped {} updates", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Most recent pending update without waiting.
    pub fn latest(&mut self) -> Option<TimerSession> {
        let mut latest = None;
        loop {
            match self.updates.try_recv() {
                Ok(session) => latest = Some(session),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return latest,
            }
        }
    }

    pub fn set_time_remaining(&self, seconds: u32) -> Result<TimerSession, TimerError> {
        self.engine.set_time_remaining(seconds)
    }

    pub fn set_active(&self, active: bool) -> Result<TimerSession, TimerError> {
        self.engine.set_active(active)
    }

    pub fn set_completed(&self, completed: bool) -> Result<TimerSession, TimerError> {
        self.engine.set_completed(completed)
    }

    pub fn set_mode(&self, mode: TimerMode) -> Result<TimerSession, TimerError> {
        self.engine.set_mode(mode)
    }

    pub fn set_completed_sessions(&self, count: u32) -> Result<TimerSession, TimerError> {
        self.engine.set_completed_sessions(count)
    }
}

/// Owning sound consumer.
///
/// Dropping the scope stops every channel, the way unmounting the sound
/// screen silences the app. Channel resources stay registered.
pub struct SoundScope {
    engine: Arc<BackgroundSoundEngine>,
    updates: broadcast::Receiver<SoundEngineState>,
}

impl SoundScope {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            engine: Arc::clone(ctx.sound()),
            updates: ctx.sound().subscribe(),
        }
    }

    pub fn state(&self) -> Result<SoundEngineState, SoundError> {
        self.engine.snapshot()
    }

    /// Most recent pending update without waiting.
    pub fn latest(&mut self) -> Option<SoundEngineState> {
        let mut latest = None;
        loop {
            match self.updates.try_recv() {
                Ok(state) => latest = Some(state),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return latest,
            }
        }
    }

    pub fn play(&self, name: Option<&str>) -> Result<SoundEngineState, SoundError> {
        self.engine.play(name)
    }

    pub fn stop_all(&self) -> Result<SoundEngineState, SoundError> {
        self.engine.stop_all()
    }

    pub fn set_volume(&self, volume: f32) -> Result<SoundEngineState, SoundError> {
        self.engine.set_volume(volume)
    }
}

impl Drop for SoundScope {
    fn drop(&mut self) {
        if let Err(err) = self.engine.stop_all() {
            log_sound_error(&err, "sound_scope_drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::sound::{ChannelName, ChannelResource, SimulatedBackend, SoundChannelRegistry};
    use crate::storage::MemoryStore;

    fn context_with_backend() -> (Arc<SimulatedBackend>, AppContext) {
        let backend = Arc::new(SimulatedBackend::new());
        let registry = Arc::new(SoundChannelRegistry::new(backend.clone()));
        let ctx = AppContext::with_parts(
            AppConfig::ephemeral(),
            Arc::new(MemoryStore::new()),
            registry,
        );
        (backend, ctx)
    }

    #[test]
    fn test_dropping_scope_stops_sounds() {
        let (backend, ctx) = context_with_backend();
        let scope = SoundScope::new(&ctx);
        scope.play(Some("rain")).unwrap();
        assert!(backend.channel(ChannelName::Rain).unwrap().is_playing());

        drop(scope);

        assert_eq!(ctx.sound_state().unwrap().active_channel, None);
        assert!(ctx.sound().registry().playing().unwrap().is_empty());
    }

    #[test]
    fn test_scopes_share_engine_state() {
        let (_, ctx) = context_with_backend();
        let first = SoundScope::new(&ctx);
        let mut second = SoundScope::new(&ctx);

        first.set_volume(0.2).unwrap();
        assert_eq!(second.state().unwrap().volume, 0.2);
        assert_eq!(second.latest().unwrap().volume, 0.2);
    }

    #[test]
    fn test_timer_handles_see_each_others_writes() {
        let (_, ctx) = context_with_backend();
        let writer = TimerHandle::attach(&ctx);
        let mut reader = TimerHandle::attach(&ctx);

        writer.set_time_remaining(300).unwrap();
        writer.set_active(true).unwrap();

        let latest = reader.latest().unwrap();
        assert_eq!(latest.time_remaining_seconds, 300);
        assert!(latest.is_active);
        assert_eq!(reader.state().unwrap(), latest);
    }

    #[tokio::test]
    async fn test_changed_waits_for_next_update() {
        let (_, ctx) = context_with_backend();
        let mut handle = TimerHandle::attach(&ctx);
        let writer = TimerHandle::attach(&ctx);

        writer.set_mode(TimerMode::Break).unwrap();
        assert_eq!(handle.changed().await.unwrap().mode, TimerMode::Break);
    }
}
