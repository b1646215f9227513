use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::AffinityTag;
use crate::timer::{CompletedSession, TimerState};

/// Every timer state change produces an Event.
/// Only `TimerFinished` leads to downstream reward computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        run_id: String,
        duration_minutes: u32,
        affinity: AffinityTag,
        at: DateTime<Utc>,
    },
    TimerPaused {
        elapsed_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Progress discarded; no reward.
    TimerAbandoned {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerFinished {
        session: CompletedSession,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        target_minutes: u32,
        affinity: AffinityTag,
        elapsed_secs: u64,
        remaining_secs: u64,
        remaining: String,
        progress_pct: f64,
        reward_preview: u32,
        at: DateTime<Utc>,
    },
}
