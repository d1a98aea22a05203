//! TickDriver - advances the timer once per elapsed second.
//!
//! The engine only stores state; this driver owns the countdown arithmetic
//! and the focus → break → focus rotation, pushing every step through the
//! engine's setters so persistence and notification stay in one place.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use super::engine::TimerEngine;
use super::session::{TimerMode, TimerSession};
use crate::config::TimerConfig;
use crate::error::TimerError;

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session is paused; nothing changed
    Idle,
    /// One second elapsed
    Ticked { remaining: u32 },
    /// Countdown reached zero and the interval was marked completed
    Completed { mode: TimerMode },
}

/// Why [`TickDriver::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(TimerMode),
    /// Session stopped ticking without completing (paused, page hidden)
    Paused,
    /// Shutdown future resolved first
    Interrupted,
}

/// External clock for a [`TimerEngine`].
pub struct TickDriver {
    engine: Arc<TimerEngine>,
    config: TimerConfig,
}

impl TickDriver {
    pub fn new(engine: Arc<TimerEngine>, config: TimerConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &Arc<TimerEngine> {
        &self.engine
    }

    /// Configured length of `mode` in seconds.
    pub fn duration_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.config.focus_seconds,
            TimerMode::Break => self.config.break_seconds,
            TimerMode::LongBreak => self.config.long_break_seconds,
        }
    }

    /// Mode that follows a completed `mode`, given the session count after
    /// that completion.
    pub fn next_mode(&self, mode: TimerMode, completed_sessions: u32) -> TimerMode {
        match mode {
            TimerMode::Focus => {
                let interval = self.config.long_break_interval;
                if interval > 0 && completed_sessions > 0 && completed_sessions % interval == 0 {
                    TimerMode::LongBreak
                } else {
                    TimerMode::Break
                }
            }
            TimerMode::Break | TimerMode::LongBreak => TimerMode::Focus,
        }
    }

    /// Start (or resume) ticking.
    ///
    /// A completed interval is acknowledged first; an empty countdown is
    /// refilled with the current mode's duration.
    pub fn start(&self) -> Result<TimerSession, TimerError> {
        let mut session = self.engine.snapshot()?;
        if session.is_completed {
            session = self.acknowledge()?;
        }
        if session.time_remaining_seconds == 0 {
            self.engine
                .set_time_remaining(self.duration_for(session.mode))?;
        }
        self.engine.set_active(true)
    }

    pub fn pause(&self) -> Result<TimerSession, TimerError> {
        self.engine.set_active(false)
    }

    /// Stop and refill the current mode's countdown.
    pub fn reset(&self) -> Result<TimerSession, TimerError> {
        let mode = self.engine.snapshot()?.mode;
        self.engine.set_active(false)?;
        self.engine.set_completed(false)?;
        self.engine.set_time_remaining(self.duration_for(mode))
    }

    /// Jump to `mode` with a full, paused countdown.
    pub fn switch_mode(&self, mode: TimerMode) -> Result<TimerSession, TimerError> {
        self.engine.set_active(false)?;
        self.engine.set_completed(false)?;
        self.engine.set_mode(mode)?;
        self.engine.set_time_remaining(self.duration_for(mode))
    }

    /// Clear a completion and move to the next mode.
    ///
    /// No-op when the session is not completed.
    pub fn acknowledge(&self) -> Result<TimerSession, TimerError> {
        let session = self.engine.snapshot()?;
        if !session.is_completed {
            return Ok(session);
        }

        let next = self.next_mode(session.mode, session.completed_sessions);
        self.engine.set_completed(false)?;
        self.engine.set_mode(next)?;
        self.engine.set_time_remaining(self.duration_for(next))
    }

    /// Account for one elapsed second.
    pub fn tick(&self) -> Result<TickOutcome, TimerError> {
        let session = self.engine.snapshot()?;
        if !session.is_active {
            return Ok(TickOutcome::Idle);
        }

        if session.time_remaining_seconds > 1 {
            let remaining = session.time_remaining_seconds - 1;
            self.engine.set_time_remaining(remaining)?;
            return Ok(TickOutcome::Ticked { remaining });
        }

        self.engine.set_time_remaining(0)?;
        self.engine.complete()?;
        if session.mode == TimerMode::Focus {
            self.engine
                .set_completed_sessions(session.completed_sessions.saturating_add(1))?;
        }

        tracing::info!(
            "[TickDriver] {} interval completed ({} focus sessions)",
            session.mode,
            session.completed_sessions + u32::from(session.mode == TimerMode::Focus)
        );
        Ok(TickOutcome::Completed { mode: session.mode })
    }

    /// Tick once per second until the interval completes, the session stops
    /// being active, or `shutdown` resolves.
    pub async fn run<S>(&self, shutdown: S) -> Result<RunOutcome, TimerError>
    where
        S: Future<Output = ()>,
    {
        let mut ticker = interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!("[TickDriver] Shutdown requested");
                    return Ok(RunOutcome::Interrupted);
                }
                _ = ticker.tick() => {
                    match self.tick()? {
                        TickOutcome::Idle => return Ok(RunOutcome::Paused),
                        TickOutcome::Ticked { .. } => {}
                        TickOutcome::Completed { mode } => return Ok(RunOutcome::Completed(mode)),
                    }
                }
            }
        }
    }
}
