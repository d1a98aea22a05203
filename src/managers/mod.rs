// Managers Module
//
// Shared plumbing used by both engines:
// - BroadcastChannelManager: observer fan-out of state snapshots
// - spawn_background: fire-and-forget execution of async engine work

pub mod background;
pub mod broadcast_manager;

pub use background::spawn_background;
pub use broadcast_manager::BroadcastChannelManager;
