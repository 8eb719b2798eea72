mod fasts;
mod timers;
