// Focus Timer Core - timer state engine and background sound engine
// Write-through persistence, shared observers, single-active ambience playback

// Module declarations
pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod managers;
pub mod sound;
pub mod storage;
pub mod timer;
pub mod visibility;

// Re-exports for convenience
pub use api::*;

use std::sync::Once;

static LOGGING: Once = Once::new();

/// Install the fmt subscriber for hosts that have none.
///
/// Safe to call repeatedly; only the first call does anything, and a
/// subscriber installed elsewhere is left in place.
pub fn init_logging() {
    LOGGING.call_once(|| {
        if let Err(err) = tracing_subscriber::fmt().with_target(false).try_init() {
            eprintln!("Logging already initialized: {err}");
        }
    });
}
