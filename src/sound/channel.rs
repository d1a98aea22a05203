//! Channel names and the resource abstraction backends implement.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::SoundError;

/// The closed set of ambient channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelName {
    Rain,
    Cafe,
    Birds,
}

impl ChannelName {
    pub const ALL: [ChannelName; 3] = [ChannelName::Rain, ChannelName::Cafe, ChannelName::Birds];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelName::Rain => "rain",
            ChannelName::Cafe => "cafe",
            ChannelName::Birds => "birds",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.as_str() == name)
    }
}

impl std::fmt::Display for ChannelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChannelName {
    type Err = SoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| SoundError::UnknownChannel {
            name: s.to_string(),
        })
    }
}

/// Completion of an asynchronous playback start.
pub type PlaybackFuture = BoxFuture<'static, Result<(), SoundError>>;

/// A loop-playable audio resource owned by the registry.
///
/// Implementations are shared across threads and must keep their own
/// state consistent under concurrent calls.
pub trait ChannelResource: Send + Sync {
    /// Begin (or resume) playback from the current position.
    ///
    /// The returned future reports whether the start actually succeeded;
    /// callers do not have to await it.
    fn start(&self) -> PlaybackFuture;

    /// Stop producing sound, keeping the position.
    fn pause(&self);

    /// Move the position back to zero.
    fn rewind(&self);

    fn set_volume(&self, volume: f32);

    fn volume(&self) -> f32;

    fn is_playing(&self) -> bool;

    fn position(&self) -> Duration;
}

/// Registry entry: one named, looping channel and its resource.
#[derive(Clone)]
pub struct SoundChannel {
    pub name: ChannelName,
    pub resource: Arc<dyn ChannelResource>,
    pub looping: bool,
}

impl std::fmt::Debug for SoundChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundChannel")
            .field("name", &self.name)
            .field("looping", &self.looping)
            .field("playing", &self.resource.is_playing())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!(ChannelName::parse("rain"), Some(ChannelName::Rain));
        assert_eq!(ChannelName::parse("cafe"), Some(ChannelName::Cafe));
        assert_eq!(ChannelName::parse("birds"), Some(ChannelName::Birds));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(ChannelName::parse("Rain"), None);
        assert!(matches!(
            "thunder".parse::<ChannelName>(),
            Err(SoundError::UnknownChannel { .. })
        ));
    }

    #[test]
    fn test_serde_literal() {
        assert_eq!(serde_json::to_string(&ChannelName::Birds).unwrap(), "\"birds\"");
    }
}
