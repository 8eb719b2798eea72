pub mod fast;
pub mod timer;

pub use fast::{Fast, FastInfo, FastStats, NewFast};
pub use timer::{StartTimer, Timer, TimerPatch};
