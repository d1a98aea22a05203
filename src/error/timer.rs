// Timer engine error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Timer error code constants
///
/// Error code range: 2001
pub struct TimerErrorCodes {}

impl TimerErrorCodes {
    /// Timer session RwLock was poisoned
    pub const STATE_POISONED: i32 = 2001;
}

/// Log a timer error with structured context
pub fn log_timer_error(err: &TimerError, context: &str) {
    error!(
        "Timer error in {}: code={}, component=TimerEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Timer-related errors
///
/// Setter inputs are typed (`u32` seconds and counts, `TimerMode`), so the
/// only failure left at runtime is a poisoned session lock.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerError {
    /// Timer session RwLock was poisoned
    StatePoisoned,
}

impl ErrorCode for TimerError {
    fn code(&self) -> i32 {
        match self {
            TimerError::StatePoisoned => TimerErrorCodes::STATE_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            TimerError::StatePoisoned => "Timer session lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TimerError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for TimerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_error_code_and_display() {
        let err = TimerError::StatePoisoned;
        assert_eq!(err.code(), TimerErrorCodes::STATE_POISONED);
        assert_eq!(err.message(), "Timer session lock poisoned");
        assert!(format!("{}", err).contains("2001"));
    }
}
