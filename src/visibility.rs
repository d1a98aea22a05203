//! Page visibility signal provided by the host.
//!
//! The host reports whether its UI is currently visible; engines subscribe
//! and react (the timer pauses itself when the page is hidden). Listeners
//! only ever see the latest visibility, never a backlog of past changes.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Host-reported visibility of the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Source of the current page visibility.
///
/// Cloning shares the same underlying channel.
#[derive(Clone)]
pub struct VisibilitySignal {
    tx: watch::Sender<Visibility>,
}

impl VisibilitySignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Visibility::Visible);
        Self { tx }
    }

    /// Record the current visibility and wake every listener.
    pub fn emit(&self, visibility: Visibility) {
        log::debug!("[Visibility] Page is now {:?}", visibility);
        self.tx.send_replace(visibility);
    }

    /// Most recently reported visibility.
    pub fn current(&self) -> Visibility {
        *self.tx.borrow()
    }

    /// Listener that wakes on changes made after this call.
    pub fn subscribe(&self) -> watch::Receiver<Visibility> {
        self.tx.subscribe()
    }
}

impl Default for VisibilitySignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_visible() {
        assert_eq!(VisibilitySignal::new().current(), Visibility::Visible);
    }

    #[test]
    fn test_emit_without_listeners_still_records() {
        let signal = VisibilitySignal::new();
        signal.emit(Visibility::Hidden);
        assert_eq!(signal.current(), Visibility::Hidden);
    }

    #[test]
    fn test_listener_sees_only_latest() {
        let signal = VisibilitySignal::new();
        let mut rx = signal.subscribe();
        assert!(!rx.has_changed().unwrap());

        signal.emit(Visibility::Hidden);
        signal.clone().emit(Visibility::Visible);

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Visibility::Visible);
        assert!(!rx.has_changed().unwrap());
    }
}
