// Public API: process-wide entry points for hosts (CLI, UI shells)
// Every function here goes through the single AppContext instance

use futures::Stream;
use once_cell::sync::OnceCell;

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::{SoundError, TimerError};
use crate::sound::SoundEngineState;
use crate::timer::{TimerMode, TimerSession};
use crate::visibility::Visibility;

mod handles;
pub use handles::{SoundScope, TimerHandle};

// Re-export error code constants for hosts mapping failures to codes
pub use crate::error::{SoundErrorCodes, StorageErrorCodes, TimerErrorCodes};

/// Global AppContext instance
///
/// Created on first use, either explicitly through [`init`] or lazily by any
/// other call here with the configuration from [`AppConfig::load`].
static APP_CONTEXT: OnceCell<AppContext> = OnceCell::new();

/// Initialize the global context with `config`.
///
/// Returns false when the context already existed; `config` is then ignored.
pub fn init(config: AppConfig) -> bool {
    let mut created = false;
    APP_CONTEXT.get_or_init(|| {
        created = true;
        AppContext::from_config(config)
    });
    if !created {
        log::debug!("[Api] Context already initialized, ignoring new configuration");
    }
    created
}

/// The global context, creating it from the default configuration if needed.
pub fn context() -> &'static AppContext {
    APP_CONTEXT.get_or_init(AppContext::new)
}

/// Get the version of the focus timer core
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// ============================================================================
// TIMER
// ============================================================================

pub fn timer_state() -> Result<TimerSession, TimerError> {
    context().timer().snapshot()
}

pub fn set_time_remaining(seconds: u32) -> Result<TimerSession, TimerError> {
    context().timer().set_time_remaining(seconds)
}

pub fn set_active(active: bool) -> Result<TimerSession, TimerError> {
    context().timer().set_active(active)
}

pub fn set_completed(completed: bool) -> Result<TimerSession, TimerError> {
    context().timer().set_completed(completed)
}

pub fn set_mode(mode: TimerMode) -> Result<TimerSession, TimerError> {
    context().timer().set_mode(mode)
}

pub fn set_completed_sessions(count: u32) -> Result<TimerSession, TimerError> {
    context().timer().set_completed_sessions(count)
}

/// Stream of timer sessions, one per mutation
pub fn timer_stream() -> impl Stream<Item = TimerSession> + Send + 'static {
    context().timer().state_stream()
}

/// Forward a host visibility change to the timer engine
pub fn report_visibility(visibility: Visibility) -> Result<bool, TimerError> {
    context().report_visibility(visibility)
}

/// Attach a consumer to the shared timer engine
pub fn timer_handle() -> TimerHandle {
    TimerHandle::attach(context())
}

// ============================================================================
// SOUND
// ============================================================================

pub fn sound_state() -> Result<SoundEngineState, SoundError> {
    context().sound().snapshot()
}

/// Play `name`, toggle it off if already active, or stop with `None`
pub fn play_sound(name: Option<&str>) -> Result<SoundEngineState, SoundError> {
    context().sound().play(name)
}

pub fn stop_all_sounds() -> Result<SoundEngineState, SoundError> {
    context().sound().stop_all()
}

pub fn set_sound_volume(volume: f32) -> Result<SoundEngineState, SoundError> {
    context().sound().set_volume(volume)
}

/// Stream of sound engine states, one per change
pub fn sound_stream() -> impl Stream<Item = SoundEngineState> + Send + 'static {
    context().sound().state_stream()
}

/// Open an owning sound scope; all sounds stop when it is dropped
pub fn sound_scope() -> SoundScope {
    SoundScope::new(context())
}

#[cfg(test)]
mod tests;
