//! Focus timer state machine.
//!
//! The timer is a plain value owned by whoever runs the session. It has no
//! internal thread: the caller drives it with `tick()` (one second per call)
//! or `advance(n)`, typically from [`super::drive`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running
//! Running --tick (elapsed >= target)--> Finished
//! Running|Paused --skip_to_end--> Finished
//! Running|Paused --abandon--> Idle
//! Finished --start--> Running
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = FocusTimer::new(DurationBounds::default());
//! timer.start(45, AffinityTag::Fruit);
//! // In a loop:
//! if let Some(Event::TimerFinished { session, .. }) = timer.tick() { /* reward */ }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::AffinityTag;
use crate::clock::{Clock, SystemClock};
use crate::events::Event;
use crate::reward::reward_count;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Allowed session length in minutes. Out-of-range requests are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationBounds {
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl DurationBounds {
    pub fn new(min_minutes: u32, max_minutes: u32) -> Self {
        Self {
            min_minutes: min_minutes.min(max_minutes),
            max_minutes: max_minutes.max(min_minutes),
        }
    }

    pub fn clamp(&self, minutes: u32) -> u32 {
        minutes.clamp(self.min_minutes, self.max_minutes)
    }
}

impl Default for DurationBounds {
    fn default() -> Self {
        Self::new(15, 180)
    }
}

/// Descriptor of a finished run, handed to the progression store.
///
/// `id` is the run id assigned at `start`; it identifies the session
/// document, so completing the same run twice is detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub id: String,
    pub duration_minutes: u32,
    pub affinity: AffinityTag,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Run {
    id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    started_at: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    completed_at: Option<DateTime<Utc>>,
}

/// Single-owner countdown timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusTimer {
    bounds: DurationBounds,
    state: TimerState,
    target_minutes: u32,
    affinity: AffinityTag,
    /// Elapsed seconds within the current run; never exceeds the target.
    elapsed_secs: u64,
    #[serde(default)]
    run: Option<Run>,
    #[serde(skip, default = "system_clock")]
    clock: Arc<dyn Clock>,
}

fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

impl FocusTimer {
    /// Create an idle timer targeting the minimum duration.
    pub fn new(bounds: DurationBounds) -> Self {
        Self {
            bounds,
            state: TimerState::Idle,
            target_minutes: bounds.min_minutes,
            affinity: AffinityTag::Seed,
            elapsed_secs: 0,
            run: None,
            clock: system_clock(),
        }
    }

    /// Create an idle timer that stamps runs and events from `clock`.
    pub fn with_clock(bounds: DurationBounds, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ..Self::new(bounds)
        }
    }

    /// Adopt new duration bounds for the next run.
    ///
    /// Ignored while a run is active so its target never changes mid-run.
    /// Returns whether the bounds were applied.
    pub fn set_bounds(&mut self, bounds: DurationBounds) -> bool {
        match self.state {
            TimerState::Idle | TimerState::Finished => {
                self.bounds = bounds;
                if self.state == TimerState::Idle {
                    self.target_minutes = bounds.clamp(self.target_minutes);
                }
                true
            }
            TimerState::Running | TimerState::Paused => false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn bounds(&self) -> DurationBounds {
        self.bounds
    }

    pub fn target_minutes(&self) -> u32 {
        self.target_minutes
    }

    pub fn affinity(&self) -> AffinityTag {
        self.affinity
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn target_secs(&self) -> u64 {
        u64::from(self.target_minutes) * 60
    }

    pub fn remaining_secs(&self) -> u64 {
        self.target_secs().saturating_sub(self.elapsed_secs)
    }

    /// Id of the current or last run.
    pub fn run_id(&self) -> Option<&str> {
        self.run.as_ref().map(|r| r.id.as_str())
    }

    /// 0.0 .. 100.0 progress within the current run.
    pub fn progress_pct(&self) -> f64 {
        let total = self.target_secs();
        if total == 0 {
            return 0.0;
        }
        (self.elapsed_secs as f64 / total as f64 * 100.0).min(100.0)
    }

    /// Remaining time as `MM:SS`.
    pub fn formatted_remaining(&self) -> String {
        let s = self.remaining_secs();
        format!("{:02}:{:02}", s / 60, s % 60)
    }

    /// Eggs a completed run at the current target would earn.
    pub fn reward_preview(&self) -> u32 {
        reward_count(self.target_minutes)
    }

    /// The finished run, while in `Finished`.
    pub fn completed_session(&self) -> Option<CompletedSession> {
        if self.state != TimerState::Finished {
            return None;
        }
        let run = self.run.as_ref()?;
        Some(CompletedSession {
            id: run.id.clone(),
            duration_minutes: self.target_minutes,
            affinity: self.affinity,
            started_at: run.started_at,
            completed_at: run.completed_at?,
        })
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            target_minutes: self.target_minutes,
            affinity: self.affinity,
            elapsed_secs: self.elapsed_secs,
            remaining_secs: self.remaining_secs(),
            remaining: self.formatted_remaining(),
            progress_pct: self.progress_pct(),
            reward_preview: self.reward_preview(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm a new run. No-op while a run is active.
    pub fn start(&mut self, minutes: u32, affinity: AffinityTag) -> Option<Event> {
        match self.state {
            TimerState::Idle | TimerState::Finished => {
                let now = self.clock.now();
                let run_id = Uuid::new_v4().to_string();
                self.target_minutes = self.bounds.clamp(minutes);
                self.affinity = affinity;
                self.elapsed_secs = 0;
                self.run = Some(Run {
                    id: run_id.clone(),
                    started_at: now,
                    completed_at: None,
                });
                self.state = TimerState::Running;
                Some(Event::TimerStarted {
                    run_id,
                    duration_minutes: self.target_minutes,
                    affinity,
                    at: now,
                })
            }
            TimerState::Running | TimerState::Paused => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        Some(Event::TimerPaused {
            elapsed_secs: self.elapsed_secs,
            remaining_secs: self.remaining_secs(),
            at: self.clock.now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        self.state = TimerState::Running;
        Some(Event::TimerResumed {
            remaining_secs: self.remaining_secs(),
            at: self.clock.now(),
        })
    }

    /// Drop the current run without reward.
    pub fn abandon(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running | TimerState::Paused => {
                let elapsed_secs = self.elapsed_secs;
                self.state = TimerState::Idle;
                self.elapsed_secs = 0;
                self.run = None;
                Some(Event::TimerAbandoned {
                    elapsed_secs,
                    at: self.clock.now(),
                })
            }
            TimerState::Idle | TimerState::Finished => None,
        }
    }

    /// Advance by one second. Returns `Some(Event::TimerFinished)` on completion.
    pub fn tick(&mut self) -> Option<Event> {
        self.advance(1)
    }

    /// Advance by `secs` seconds at once, e.g. to catch up on wall-clock time.
    pub fn advance(&mut self, secs: u64) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.elapsed_secs = self
            .elapsed_secs
            .saturating_add(secs)
            .min(self.target_secs());
        if self.elapsed_secs >= self.target_secs() {
            return self.finish();
        }
        None
    }

    /// Force completion. Intended for administrative and test use.
    pub fn skip_to_end(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running | TimerState::Paused => {
                self.elapsed_secs = self.target_secs();
                self.finish()
            }
            TimerState::Idle | TimerState::Finished => None,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self) -> Option<Event> {
        let now = self.clock.now();
        self.state = TimerState::Finished;
        if let Some(run) = self.run.as_mut() {
            run.completed_at = Some(now);
        }
        Some(Event::TimerFinished {
            session: self.completed_session()?,
            at: now,
        })
    }
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::new(DurationBounds::default())
    }
}
