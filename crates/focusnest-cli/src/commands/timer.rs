use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use focusnest_core::gateway::{Document, DocumentStore, WriteBatch};
use focusnest_core::timer::{drive_with, DurationBounds};
use focusnest_core::{AffinityTag, Event, FocusTimer, TimerState};
use serde::{Deserialize, Serialize};

use super::{benign_or_fail, print_json, App, CliResult};

const TIMERS: &str = "timers";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a focus run
    Start {
        /// Target minutes (clamped to the configured bounds)
        #[arg(long)]
        minutes: Option<u32>,
        /// Food affinity: seed, fruit or biscuit
        #[arg(long)]
        affinity: Option<AffinityTag>,
    },
    /// Pause the running timer
    Pause,
    /// Resume a paused timer
    Resume,
    /// Abandon the current run without reward
    Abandon,
    /// Print current timer state as JSON
    Status,
    /// Finish the current run immediately
    Skip,
    /// Run the timer in the foreground until it finishes
    Run {
        #[arg(long)]
        minutes: Option<u32>,
        #[arg(long)]
        affinity: Option<AffinityTag>,
    },
}

/// Timer persisted between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimerRecord {
    timer: FocusTimer,
    /// Wall-clock instant up to which elapsed time has been counted.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    counted_until: DateTime<Utc>,
    /// Whether the finished run was handed to the progression store.
    #[serde(default)]
    reported: bool,
}

impl TimerRecord {
    fn new(bounds: DurationBounds) -> Self {
        Self {
            timer: FocusTimer::new(bounds),
            counted_until: Utc::now(),
            reported: false,
        }
    }

    /// Count whole seconds of wall-clock time since the last invocation.
    fn catch_up(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.timer.state() != TimerState::Running {
            self.counted_until = now;
            return None;
        }
        let secs = (now - self.counted_until).num_seconds();
        if secs <= 0 {
            return None;
        }
        self.counted_until += Duration::seconds(secs);
        self.timer.advance(secs.unsigned_abs())
    }
}

async fn load(app: &App) -> Result<TimerRecord, Box<dyn std::error::Error>> {
    let mut record = match app.store.get(TIMERS, &app.owner).await? {
        Some(doc) => match doc.decode::<TimerRecord>() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(owner = %app.owner, error = %e, "discarding unreadable timer state");
                TimerRecord::new(app.config.timer.bounds())
            }
        },
        None => TimerRecord::new(app.config.timer.bounds()),
    };
    // Config may have changed since the timer was saved.
    record.timer.set_bounds(app.config.timer.bounds());
    Ok(record)
}

async fn save(app: &App, record: &TimerRecord) -> CliResult {
    let mut batch = WriteBatch::new();
    batch.put(TIMERS, Document::from_value(&app.owner, record)?);
    app.store.commit(batch).await?;
    Ok(())
}

/// Hand a finished, unreported run to the progression store.
async fn report(app: &App, record: &mut TimerRecord) -> CliResult {
    if record.reported || record.timer.state() != TimerState::Finished {
        return Ok(());
    }
    let Some(session) = record.timer.completed_session() else {
        return Ok(());
    };
    match app.progression.complete_session(&app.owner, &session).await {
        Ok(outcome) => {
            record.reported = true;
            print_json(&outcome)
        }
        Err(e) if e.is_benign() => {
            record.reported = true;
            benign_or_fail(e)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_event_or_snapshot(event: Option<Event>, timer: &FocusTimer) -> CliResult {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&timer.snapshot()),
    }
}

pub async fn run(action: TimerAction, owner: Option<String>) -> CliResult {
    let app = App::open(owner)?;
    let mut record = load(&app).await?;
    let caught_up = record.catch_up(Utc::now());
    if let Some(event) = &caught_up {
        print_json(event)?;
    }

    match action {
        TimerAction::Start { minutes, affinity } => {
            let minutes = minutes.unwrap_or(app.config.timer.default_minutes);
            let affinity = affinity.unwrap_or(app.config.timer.default_affinity);
            let event = record.timer.start(minutes, affinity);
            if event.is_some() {
                record.counted_until = Utc::now();
                record.reported = false;
            }
            print_event_or_snapshot(event, &record.timer)?;
        }
        TimerAction::Pause => {
            let event = record.timer.pause();
            print_event_or_snapshot(event, &record.timer)?;
        }
        TimerAction::Resume => {
            let event = record.timer.resume();
            if event.is_some() {
                record.counted_until = Utc::now();
            }
            print_event_or_snapshot(event, &record.timer)?;
        }
        TimerAction::Abandon => {
            let event = record.timer.abandon();
            print_event_or_snapshot(event, &record.timer)?;
        }
        TimerAction::Status => {
            if caught_up.is_none() {
                print_json(&record.timer.snapshot())?;
            }
        }
        TimerAction::Skip => {
            let event = record.timer.skip_to_end();
            print_event_or_snapshot(event, &record.timer)?;
        }
        TimerAction::Run { minutes, affinity } => {
            if matches!(record.timer.state(), TimerState::Idle | TimerState::Finished) {
                let minutes = minutes.unwrap_or(app.config.timer.default_minutes);
                let affinity = affinity.unwrap_or(app.config.timer.default_affinity);
                if let Some(event) = record.timer.start(minutes, affinity) {
                    record.reported = false;
                    print_json(&event)?;
                }
            } else if let Some(event) = record.timer.resume() {
                print_json(&event)?;
            }
            save(&app, &record).await?;

            let period = StdDuration::from_millis(app.config.timer.tick_millis.max(1));
            let finished = drive_with(&mut record.timer, period, |timer| {
                eprint!("\r{} ", timer.formatted_remaining());
            })
            .await;
            eprintln!();
            record.counted_until = Utc::now();
            if let Some(session) = finished {
                print_json(&Event::TimerFinished {
                    session,
                    at: Utc::now(),
                })?;
            }
        }
    }

    report(&app, &mut record).await?;
    save(&app, &record).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catch_up_counts_whole_seconds() {
        let mut record = TimerRecord::new(DurationBounds::default());
        record.timer.start(15, AffinityTag::Seed);
        let start = record.counted_until;

        assert!(record
            .catch_up(start + Duration::milliseconds(2500))
            .is_none());
        assert_eq!(record.timer.elapsed_secs(), 2);
        assert_eq!(record.counted_until, start + Duration::seconds(2));
    }

    #[test]
    fn catch_up_finishes_overdue_run() {
        let mut record = TimerRecord::new(DurationBounds::default());
        record.timer.start(15, AffinityTag::Fruit);
        let start = record.counted_until;

        let event = record.catch_up(start + Duration::hours(1));
        assert!(matches!(event, Some(Event::TimerFinished { .. })));
        assert_eq!(record.timer.state(), TimerState::Finished);
        assert_eq!(record.timer.elapsed_secs(), 15 * 60);
    }

    #[test]
    fn paused_timer_does_not_accumulate() {
        let mut record = TimerRecord::new(DurationBounds::default());
        record.timer.start(15, AffinityTag::Seed);
        record.timer.pause();
        let later = record.counted_until + Duration::minutes(5);
        record.catch_up(later);
        assert_eq!(record.timer.elapsed_secs(), 0);
        assert_eq!(record.counted_until, later);
    }
}
