//! TimerEngine: process-wide owner of the focus session.
//!
//! The engine does not run a clock. A driver (see [`super::TickDriver`])
//! computes the next state and pushes it through the setters; the engine
//! keeps the session invariant, writes the whole session through to the
//! store and then notifies every attached observer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use futures::Stream;
use tokio::sync::broadcast;

use super::session::{TimerMode, TimerSession};
use crate::config::AppConfig;
use crate::error::{log_storage_error, log_timer_error, StorageError, TimerError};
use crate::managers::{spawn_background, BroadcastChannelManager};
use crate::storage::KeyValueStore;
use crate::visibility::{Visibility, VisibilitySignal};

/// Process-wide timer session owner.
pub struct TimerEngine {
    session: RwLock<TimerSession>,
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    observers: BroadcastChannelManager<TimerSession>,
    auto_pause_on_hidden: bool,
    visibility_attached: AtomicBool,
}

impl TimerEngine {
    /// Build the engine from the persisted record under `storage.timer_key`,
    /// falling back to defaults field by field.
    pub fn new(store: Arc<dyn KeyValueStore>, config: &AppConfig) -> Self {
        let storage_key = config.storage.timer_key.clone();
        let session = Self::load(store.as_ref(), &storage_key);

        log::info!(
            "[TimerEngine] Restored session: mode={}, remaining={}s, active={}, completed={}, sessions={}",
            session.mode,
            session.time_remaining_seconds,
            session.is_active,
            session.is_completed,
            session.completed_sessions
        );

        Self {
            session: RwLock::new(session),
            store,
            storage_key,
            observers: BroadcastChannelManager::new(
                "TimerEngine",
                config.observers.timer_buffer,
            ),
            auto_pause_on_hidden: config.timer.auto_pause_on_hidden,
            visibility_attached: AtomicBool::new(false),
        }
    }

    fn load(store: &dyn KeyValueStore, key: &str) -> TimerSession {
        store
            .get(key)
            .map(|raw| TimerSession::from_record(&raw))
            .unwrap_or_default()
    }

    // ========================================================================
    // READ ACCESS
    // ========================================================================

    /// Current session snapshot.
    pub fn snapshot(&self) -> Result<TimerSession, TimerError> {
        Ok(*self.read_session()?)
    }

    /// Attach an observer; it receives every snapshot published afterwards.
    pub fn subscribe(&self) -> broadcast::Receiver<TimerSession> {
        self.observers.subscribe()
    }

    /// Attach an observer as an async stream.
    pub fn state_stream(&self) -> impl Stream<Item = TimerSession> + Send + 'static {
        self.observers.stream()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.observer_count()
    }

    // ========================================================================
    // SETTERS
    // ========================================================================

    /// Overwrite the remaining time. Decrementing is the driver's job.
    pub fn set_time_remaining(&self, seconds: u32) -> Result<TimerSession, TimerError> {
        self.mutate("set_time_remaining", |session| {
            session.time_remaining_seconds = seconds;
        })
    }

    /// Start or pause ticking.
    ///
    /// Starting clears a pending completion so the session never ticks while
    /// marked completed.
    pub fn set_active(&self, active: bool) -> Result<TimerSession, TimerError> {
        self.mutate("set_active", |session| {
            session.is_active = active;
            if active {
                session.is_completed = false;
            }
        })
    }

    /// Mark or clear completion. Marking also stops ticking.
    pub fn set_completed(&self, completed: bool) -> Result<TimerSession, TimerError> {
        self.mutate("set_completed", |session| {
            session.is_completed = completed;
            if completed {
                session.is_active = false;
            }
        })
    }

    pub fn set_mode(&self, mode: TimerMode) -> Result<TimerSession, TimerError> {
        self.mutate("set_mode", |session| {
            session.mode = mode;
        })
    }

    pub fn set_completed_sessions(&self, count: u32) -> Result<TimerSession, TimerError> {
        self.mutate("set_completed_sessions", |session| {
            session.completed_sessions = count;
        })
    }

    /// Complete the running interval in one step: stopped and completed.
    pub fn complete(&self) -> Result<TimerSession, TimerError> {
        self.set_completed(true)
    }

    // ========================================================================
    // VISIBILITY
    // ========================================================================

    /// React to a host visibility change.
    ///
    /// Hiding the page pauses an active session; showing it again never
    /// resumes. Returns whether the session was paused by this call.
    pub fn handle_visibility(&self, visibility: Visibility) -> Result<bool, TimerError> {
        if visibility != Visibility::Hidden || !self.auto_pause_on_hidden {
            return Ok(false);
        }

        let mut session = self.write_session()?;
        if !session.is_active {
            return Ok(false);
        }

        session.is_active = false;
        self.persist(&session);
        let snapshot = *session;
        drop(session);

        log::info!(
            "[TimerEngine] Page hidden, paused with {}s remaining",
            snapshot.time_remaining_seconds
        );
        self.observers.publish(snapshot);
        Ok(true)
    }

    /// Listen to `signal` for the rest of the engine's lifetime.
    ///
    /// Only the first call attaches a listener; later calls (a consumer
    /// remounting) are no-ops and return `false`.
    pub fn attach_visibility(self: &Arc<Self>, signal: &VisibilitySignal) -> bool {
        if self
            .visibility_attached
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let engine: Weak<Self> = Arc::downgrade(self);
        let mut rx = signal.subscribe();

        spawn_background("timer-visibility", async move {
            // Only the latest value matters; intermediate changes are skipped.
            while rx.changed().await.is_ok() {
                let visibility = *rx.borrow_and_update();
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                if let Err(err) = engine.handle_visibility(visibility) {
                    log_timer_error(&err, "handle_visibility");
                }
            }
        });

        log::debug!("[TimerEngine] Attached to visibility signal");
        true
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    /// Apply `change`, write through while still holding the lock (so the
    /// store sees mutations in order), then notify observers.
    fn mutate<F>(&self, context: &str, change: F) -> Result<TimerSession, TimerError>
    where
        F: FnOnce(&mut TimerSession),
    {
        let mut session = self.write_session().inspect_err(|err| {
            log_timer_error(err, context);
        })?;

        change(&mut session);
        self.persist(&session);
        let snapshot = *session;
        drop(session);

        self.observers.publish(snapshot);
        Ok(snapshot)
    }

    fn persist(&self, session: &TimerSession) {
        match session.to_record() {
            Ok(record) => self.store.set(&self.storage_key, &record),
            Err(err) => log_storage_error(
                &StorageError::Serialization {
                    key: self.storage_key.clone(),
                    reason: err.to_string(),
                },
                "persist_timer",
            ),
        }
    }

    fn read_session(&self) -> Result<RwLockReadGuard<'_, TimerSession>, TimerError> {
        self.session.read().map_err(|_| TimerError::StatePoisoned)
    }

    fn write_session(&self) -> Result<RwLockWriteGuard<'_, TimerSession>, TimerError> {
        self.session.write().map_err(|_| TimerError::StatePoisoned)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
