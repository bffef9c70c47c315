use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Intensity, RunState, TimerState};

/// Every engine transition that the presentation layer may care about
/// produces an Event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase_index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase_index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A phase ran out and the next one began.
    PhaseAdvanced {
        from_phase: usize,
        to_phase: usize,
        intensity: Intensity,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// The last phase ran out.
    RoutineCompleted {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerRestarted {
        at: DateTime<Utc>,
    },
    TimerExited {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        run: RunState,
        phase_count: usize,
        total_secs: u64,
        routine_progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short machine name, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "TimerStarted",
            Event::TimerPaused { .. } => "TimerPaused",
            Event::PhaseAdvanced { .. } => "PhaseAdvanced",
            Event::RoutineCompleted { .. } => "RoutineCompleted",
            Event::TimerRestarted { .. } => "TimerRestarted",
            Event::TimerExited { .. } => "TimerExited",
            Event::StateSnapshot { .. } => "StateSnapshot",
        }
    }
}
