// AppContext: Dependency Injection Container
// Owns the process-wide timer and sound engines plus the store they share

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{SoundError, TimerError};
use crate::sound::{create_backend, BackgroundSoundEngine, SoundChannelRegistry, SoundEngineState};
use crate::storage::{open_store, KeyValueStore};
use crate::timer::{TickDriver, TimerEngine, TimerSession};
use crate::visibility::{Visibility, VisibilitySignal};

/// AppContext: one instance of each engine for the whole process.
///
/// Every consumer reaches the engines through this container, so they all
/// observe the same state and the same sound resources.
pub struct AppContext {
    config: AppConfig,
    store: Arc<dyn KeyValueStore>,
    visibility: VisibilitySignal,
    timer: Arc<TimerEngine>,
    sound: Arc<BackgroundSoundEngine>,
}

impl AppContext {
    /// Build from the configuration file at the default location.
    pub fn new() -> Self {
        Self::from_config(AppConfig::load())
    }

    /// Build store, backend and both engines from `config`.
    pub fn from_config(config: AppConfig) -> Self {
        let store = open_store(&config.storage);
        let registry = Arc::new(SoundChannelRegistry::new(create_backend(&config.sound)));
        Self::with_parts(config, store, registry)
    }

    /// Build around an existing store and registry.
    pub fn with_parts(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        registry: Arc<SoundChannelRegistry>,
    ) -> Self {
        let timer = Arc::new(TimerEngine::new(Arc::clone(&store), &config));
        let sound = Arc::new(BackgroundSoundEngine::new(
            registry,
            Arc::clone(&store),
            &config,
        ));
        let visibility = VisibilitySignal::new();

        log::info!("[AppContext] Engines ready");

        Self {
            config,
            store,
            visibility,
            timer,
            sound,
        }
    }

    /// Wire the visibility signal into the timer engine.
    ///
    /// Returns true when the listener was installed by this call.
    pub fn attach_visibility(&self) -> bool {
        if !self.config.timer.auto_pause_on_hidden {
            return false;
        }
        self.timer.attach_visibility(&self.visibility)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn timer(&self) -> &Arc<TimerEngine> {
        &self.timer
    }

    pub fn sound(&self) -> &Arc<BackgroundSoundEngine> {
        &self.sound
    }

    pub fn visibility(&self) -> &VisibilitySignal {
        &self.visibility
    }

    /// Tick driver over the shared timer engine.
    pub fn driver(&self) -> TickDriver {
        TickDriver::new(Arc::clone(&self.timer), self.config.timer.clone())
    }

    // ========================================================================
    // BUSINESS LOGIC METHODS
    // ========================================================================

    pub fn timer_state(&self) -> Result<TimerSession, TimerError> {
        self.timer.snapshot()
    }

    pub fn sound_state(&self) -> Result<SoundEngineState, SoundError> {
        self.sound.snapshot()
    }

    /// Report a host visibility change.
    ///
    /// Recorded on the signal, then handled synchronously. An attached
    /// listener acts only on the latest recorded visibility, so a hide that
    /// was already followed by a show never pauses the timer again.
    pub fn report_visibility(&self, visibility: Visibility) -> Result<bool, TimerError> {
        self.visibility.emit(visibility);
        self.timer.handle_visibility(visibility)
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}
