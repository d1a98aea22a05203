// Timer module
//
// TimerSession is the persisted state, TimerEngine its process-wide owner,
// and TickDriver the once-per-second clock that feeds the engine.

pub mod driver;
pub mod engine;
pub mod session;

pub use driver::{RunOutcome, TickDriver, TickOutcome};
pub use engine::TimerEngine;
pub use session::{TimerMode, TimerSession};
