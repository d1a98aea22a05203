//! Background sound: looping ambience channels behind a single-active engine.

pub mod backend;
pub mod channel;
pub mod engine;
pub mod registry;

pub use backend::{create_backend, SimulatedBackend, SimulatedChannel, SoundBackend};
pub use channel::{ChannelName, ChannelResource, PlaybackFuture, SoundChannel};
pub use engine::{BackgroundSoundEngine, SoundEngineState};
pub use registry::SoundChannelRegistry;
