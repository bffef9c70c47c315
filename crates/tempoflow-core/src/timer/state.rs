//! Run state and the pure transitions over it.
//!
//! Every transition is a function `(RunState, Input) -> (RunState, effects)`.
//! Nothing here touches a clock or a device: the caller decides when a tick
//! happens and what to do with the returned effects.

use serde::{Deserialize, Serialize};

use super::sequence::PhaseSequence;

/// Derived state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Constructed or restarted, nothing counted yet.
    Idle,
    Running,
    /// Paused somewhere after the initial position.
    Paused,
    /// Terminal until restart.
    Completed,
}

/// Inputs accepted by [`RunState::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Start,
    Pause,
    TogglePause,
    Tick,
    Restart,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Play the boundary cue. Emitted once for every phase that runs out,
    /// the last one included.
    FireAlarm { phase_index: usize },
    /// Silently prime the audio device on the first user interaction.
    UnlockAudio,
}

/// Snapshot of progress through a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub current_phase_index: usize,
    /// Seconds left in the current phase.
    pub time_remaining_in_phase: u64,
    /// Seconds counted while running, across all phases.
    pub elapsed_total: u64,
    pub paused: bool,
    pub completed: bool,
}

impl RunState {
    /// Initial state: first phase, full duration, paused.
    pub fn initial(sequence: &PhaseSequence) -> Self {
        Self {
            current_phase_index: 0,
            time_remaining_in_phase: sequence.at(0).map(|p| p.duration_secs).unwrap_or(0),
            elapsed_total: 0,
            paused: true,
            completed: false,
        }
    }

    pub fn status(&self, sequence: &PhaseSequence) -> TimerState {
        if self.completed {
            TimerState::Completed
        } else if !self.paused {
            TimerState::Running
        } else if *self == Self::initial(sequence) {
            TimerState::Idle
        } else {
            TimerState::Paused
        }
    }

    pub fn is_running(&self) -> bool {
        !self.paused && !self.completed
    }

    /// Apply one input and return the next state with the effects it requests.
    pub fn apply(self, input: Input, sequence: &PhaseSequence) -> (Self, Vec<Effect>) {
        if self.completed && input != Input::Restart {
            return (self, Vec::new());
        }

        match input {
            Input::Start => (Self { paused: false, ..self }, Vec::new()),
            Input::Pause => (Self { paused: true, ..self }, Vec::new()),
            Input::TogglePause => (
                Self {
                    paused: !self.paused,
                    ..self
                },
                Vec::new(),
            ),
            Input::Restart => (Self::initial(sequence), Vec::new()),
            Input::Tick if self.paused => (self, Vec::new()),
            Input::Tick => self.tick(sequence),
        }
    }

    fn tick(self, sequence: &PhaseSequence) -> (Self, Vec<Effect>) {
        let mut next = Self {
            time_remaining_in_phase: self.time_remaining_in_phase.saturating_sub(1),
            elapsed_total: self.elapsed_total.saturating_add(1),
            ..self
        };
        if next.time_remaining_in_phase > 0 {
            return (next, Vec::new());
        }

        let effects = vec![Effect::FireAlarm {
            phase_index: self.current_phase_index,
        }];
        let next_index = self.current_phase_index + 1;
        match sequence.at(next_index) {
            Some(phase) => {
                next.current_phase_index = next_index;
                next.time_remaining_in_phase = phase.duration_secs;
            }
            None => {
                next.completed = true;
                next.paused = true;
            }
        }
        (next, effects)
    }
}
