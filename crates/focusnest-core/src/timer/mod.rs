mod driver;
mod engine;

pub use driver::{drive, drive_with};
pub use engine::{CompletedSession, DurationBounds, FocusTimer, TimerState};
