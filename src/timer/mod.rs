pub mod client;
pub mod controller;
pub mod state;

pub use client::{HttpTimerApi, TimerApi};
pub use controller::{LiveTimer, TimerSnapshot};
pub use state::{TimerState, TimerStatus};
