//! Cooperative tick source for a [`FocusTimer`].

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use super::engine::{CompletedSession, FocusTimer, TimerState};

/// Tick `timer` once per `period` until it stops running.
///
/// Returns the completed session if the run finished, or `None` if it was
/// paused or abandoned from `on_tick`.
pub async fn drive_with<F>(
    timer: &mut FocusTimer,
    period: Duration,
    mut on_tick: F,
) -> Option<CompletedSession>
where
    F: FnMut(&mut FocusTimer),
{
    let mut ticks = interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticks.tick().await;

    while timer.state() == TimerState::Running {
        ticks.tick().await;
        timer.tick();
        on_tick(timer);
    }
    timer.completed_session()
}

pub async fn drive(timer: &mut FocusTimer, period: Duration) -> Option<CompletedSession> {
    drive_with(timer, period, |_| {}).await
}
