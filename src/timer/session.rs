// TimerSession - the persisted focus/break session state
//
// One session exists per process. It is written to the store as a single
// JSON object with camelCase keys and read back field by field, so one
// corrupt field never costs the rest of the record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of interval the timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    #[default]
    Focus,
    Break,
    LongBreak,
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Focus => "focus",
            TimerMode::Break => "break",
            TimerMode::LongBreak => "longBreak",
        }
    }

    /// Parse the persisted literal; anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "focus" => Some(TimerMode::Focus),
            "break" => Some(TimerMode::Break),
            "longBreak" => Some(TimerMode::LongBreak),
            _ => None,
        }
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown timer mode '{}'", s))
    }
}

/// Snapshot of the timer session.
///
/// Invariant: `is_active` implies `!is_completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    pub time_remaining_seconds: u32,
    /// Ticking (true) vs paused (false)
    pub is_active: bool,
    /// Reached zero and not yet acknowledged
    pub is_completed: bool,
    pub mode: TimerMode,
    /// Number of finished focus intervals
    pub completed_sessions: u32,
}

impl TimerSession {
    /// Decode a persisted record with per-field fallback.
    ///
    /// Unparsable input, or a value that is not a JSON object, yields the
    /// default session. Within an object each field is validated on its own:
    /// - numbers must be finite and non-negative (fractions are truncated)
    /// - flags must be JSON booleans
    /// - `mode` must be one of the known literals
    pub fn from_record(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("[TimerSession] Unparsable record, using defaults: {}", err);
                return Self::default();
            }
        };

        let Some(fields) = value.as_object() else {
            log::warn!("[TimerSession] Record is not an object, using defaults");
            return Self::default();
        };

        let session = Self {
            time_remaining_seconds: count_field(fields.get("timeRemainingSeconds")),
            is_active: flag_field(fields.get("isActive")),
            is_completed: flag_field(fields.get("isCompleted")),
            mode: fields
                .get("mode")
                .and_then(Value::as_str)
                .and_then(TimerMode::parse)
                .unwrap_or_default(),
            completed_sessions: count_field(fields.get("completedSessions")),
        };

        session.normalized()
    }

    /// Encode as the persisted JSON record.
    pub fn to_record(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore `is_active => !is_completed`, favouring the paused reading.
    pub fn normalized(mut self) -> Self {
        if self.is_active && self.is_completed {
            log::warn!("[TimerSession] Record was both active and completed; pausing");
            self.is_active = false;
        }
        self
    }
}

fn count_field(value: Option<&Value>) -> u32 {
    match value.and_then(Value::as_f64) {
        Some(n) if n.is_finite() && n >= 0.0 => n.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn flag_field(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let session = TimerSession::default();
        assert_eq!(session.time_remaining_seconds, 0);
        assert!(!session.is_active);
        assert!(!session.is_completed);
        assert_eq!(session.mode, TimerMode::Focus);
        assert_eq!(session.completed_sessions, 0);
    }

    #[test]
    fn test_record_uses_camel_case_keys() {
        let session = TimerSession {
            time_remaining_seconds: 125,
            is_active: true,
            is_completed: false,
            mode: TimerMode::LongBreak,
            completed_sessions: 3,
        };
        let value: Value = serde_json::from_str(&session.to_record().unwrap()).unwrap();

        assert_eq!(value["timeRemainingSeconds"], 125);
        assert_eq!(value["isActive"], true);
        assert_eq!(value["isCompleted"], false);
        assert_eq!(value["mode"], "longBreak");
        assert_eq!(value["completedSessions"], 3);
    }

    #[test]
    fn test_full_record_round_trips() {
        let session = TimerSession {
            time_remaining_seconds: 125,
            is_active: true,
            is_completed: false,
            mode: TimerMode::Break,
            completed_sessions: 3,
        };
        let restored = TimerSession::from_record(&session.to_record().unwrap());
        assert_eq!(restored, session);
    }

    #[test]
    fn test_corrupt_field_falls_back_alone() {
        let raw = r#"{"timeRemainingSeconds":"abc","isActive":true,"isCompleted":false,"mode":"break","completedSessions":3}"#;
        let session = TimerSession::from_record(raw);

        assert_eq!(session.time_remaining_seconds, 0);
        assert!(session.is_active);
        assert_eq!(session.mode, TimerMode::Break);
        assert_eq!(session.completed_sessions, 3);
    }

    #[test]
    fn test_partial_record_fills_missing_fields() {
        let session = TimerSession::from_record(r#"{"completedSessions":5}"#);
        assert_eq!(session.completed_sessions, 5);
        assert_eq!(session.mode, TimerMode::Focus);
        assert_eq!(session.time_remaining_seconds, 0);
    }

    #[test]
    fn test_invalid_values_use_defaults() {
        let raw = r#"{"timeRemainingSeconds":-4,"isActive":"yes","mode":"nap","completedSessions":null}"#;
        let session = TimerSession::from_record(raw);
        assert_eq!(session, TimerSession::default());
    }

    #[test]
    fn test_fractional_seconds_truncate() {
        let session = TimerSession::from_record(r#"{"timeRemainingSeconds":59.9}"#);
        assert_eq!(session.time_remaining_seconds, 59);
    }

    #[test]
    fn test_garbage_yields_defaults() {
        assert_eq!(TimerSession::from_record("not json"), TimerSession::default());
        assert_eq!(TimerSession::from_record("[1,2,3]"), TimerSession::default());
        assert_eq!(TimerSession::from_record("null"), TimerSession::default());
    }

    #[test]
    fn test_active_and_completed_record_is_paused() {
        let session = TimerSession::from_record(r#"{"isActive":true,"isCompleted":true}"#);
        assert!(!session.is_active);
        assert!(session.is_completed);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("longBreak".parse::<TimerMode>(), Ok(TimerMode::LongBreak));
        assert!("long_break".parse::<TimerMode>().is_err());
        assert_eq!(TimerMode::Break.to_string(), "break");
    }
}
