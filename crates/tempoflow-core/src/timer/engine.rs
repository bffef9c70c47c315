//! Timer engine implementation.
//!
//! The timer engine is a tick-counting state machine over one routine. It
//! does not read a clock and owns no threads: the caller (normally the
//! [`TickScheduler`](super::TickScheduler)) invokes `tick()` once per second
//! while the engine is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v
//!        Completed --restart--> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(routine)?;
//! engine.toggle_pause();
//! // Once per second:
//! let outcome = engine.tick(); // outcome.effects holds FireAlarm at a boundary
//! ```

use chrono::Utc;
use tracing::{debug, info};

use super::sequence::{Phase, PhaseSequence, Routine};
use super::state::{Effect, Input, RunState, TimerState};
use crate::error::{CoreError, Result};
use crate::events::Event;

/// Result of one engine operation.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// State after the operation.
    pub state: RunState,
    /// Side effects the caller must dispatch, in order.
    pub effects: Vec<Effect>,
    /// Presentation event, if the operation changed anything worth reporting.
    pub event: Option<Event>,
}

impl Outcome {
    pub fn fires_alarm(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, Effect::FireAlarm { .. }))
    }
}

/// Core countdown engine, bound to one routine for its whole lifetime.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    routine_id: String,
    routine_name: String,
    sequence: PhaseSequence,
    run: RunState,
    /// Set by the first start; survives restart.
    audio_unlocked: bool,
    exited: bool,
}

impl TimerEngine {
    /// Create an engine for `routine`, starting in the `Idle` state.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidRoutine`] if the routine has no phases or
    /// contains a phase without duration.
    pub fn new(routine: Routine) -> Result<Self> {
        if routine.phases.is_empty() {
            return Err(CoreError::InvalidRoutine {
                name: routine.name,
                reason: "routine has no phases".into(),
            });
        }
        if let Some(pos) = routine.phases.iter().position(|p| p.duration_secs == 0) {
            return Err(CoreError::InvalidRoutine {
                name: routine.name,
                reason: format!("phase {} has no duration", pos + 1),
            });
        }

        let sequence = PhaseSequence::new(routine.phases);
        let run = RunState::initial(&sequence);
        debug!(
            routine = %routine.name,
            phases = sequence.len(),
            total_secs = sequence.total_duration(),
            "timer engine created"
        );
        Ok(Self {
            routine_id: routine.id,
            routine_name: routine.name,
            sequence,
            run,
            audio_unlocked: false,
            exited: false,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.run.status(&self.sequence)
    }

    pub fn snapshot(&self) -> RunState {
        self.run
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.sequence.at(self.run.current_phase_index)
    }

    pub fn sequence(&self) -> &PhaseSequence {
        &self.sequence
    }

    pub fn routine_id(&self) -> &str {
        &self.routine_id
    }

    pub fn routine_name(&self) -> &str {
        &self.routine_name
    }

    pub fn is_exited(&self) -> bool {
        self.exited
    }

    pub fn is_audio_unlocked(&self) -> bool {
        self.audio_unlocked
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self) -> f64 {
        if self.run.completed {
            return 1.0;
        }
        let total = self.current_phase().map(|p| p.duration_secs).unwrap_or(0);
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.run.time_remaining_in_phase as f64 / total as f64)
    }

    /// 0.0 .. 100.0 progress across the entire routine.
    pub fn routine_progress_pct(&self) -> f64 {
        let total = self.sequence.total_duration() as f64;
        if total == 0.0 {
            return 0.0;
        }
        if self.run.completed {
            return 100.0;
        }
        let done = self.sequence.cumulative(self.run.current_phase_index) as f64;
        let current = self.current_phase().map(|p| p.duration_secs).unwrap_or(0) as f64;
        ((done + current * self.phase_progress()) / total * 100.0).min(100.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot_event(&self) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            run: self.run,
            phase_count: self.sequence.len(),
            total_secs: self.sequence.total_duration(),
            routine_progress_pct: self.routine_progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Idle/Paused -> Running. No-op when running, completed or exited.
    pub fn start(&mut self) -> Outcome {
        if self.exited || self.run.completed || !self.run.paused {
            return self.unchanged();
        }
        let (next, mut effects) = self.run.apply(Input::Start, &self.sequence);
        self.run = next;
        if !self.audio_unlocked {
            self.audio_unlocked = true;
            effects.insert(0, Effect::UnlockAudio);
        }
        debug!(
            phase_index = self.run.current_phase_index,
            remaining_secs = self.run.time_remaining_in_phase,
            "timer running"
        );
        Outcome {
            state: self.run,
            effects,
            event: Some(Event::TimerStarted {
                phase_index: self.run.current_phase_index,
                remaining_secs: self.run.time_remaining_in_phase,
                at: Utc::now(),
            }),
        }
    }

    /// Running -> Paused. No-op otherwise.
    pub fn pause(&mut self) -> Outcome {
        if self.exited || !self.run.is_running() {
            return self.unchanged();
        }
        let (next, effects) = self.run.apply(Input::Pause, &self.sequence);
        self.run = next;
        debug!(
            phase_index = self.run.current_phase_index,
            remaining_secs = self.run.time_remaining_in_phase,
            "timer paused"
        );
        Outcome {
            state: self.run,
            effects,
            event: Some(Event::TimerPaused {
                phase_index: self.run.current_phase_index,
                remaining_secs: self.run.time_remaining_in_phase,
                at: Utc::now(),
            }),
        }
    }

    /// Running -> Paused, Idle/Paused -> Running. No-op once completed.
    pub fn toggle_pause(&mut self) -> Outcome {
        if self.run.paused {
            self.start()
        } else {
            self.pause()
        }
    }

    /// Advance the countdown by one second. No-op unless running.
    pub fn tick(&mut self) -> Outcome {
        if self.exited {
            return self.unchanged();
        }
        let before = self.run;
        let (next, effects) = before.apply(Input::Tick, &self.sequence);
        self.run = next;

        let event = if effects.is_empty() {
            None
        } else if next.completed {
            info!(
                routine = %self.routine_name,
                elapsed_secs = next.elapsed_total,
                "routine completed"
            );
            Some(Event::RoutineCompleted {
                elapsed_secs: next.elapsed_total,
                at: Utc::now(),
            })
        } else {
            let phase = self.current_phase();
            debug!(
                from_phase = before.current_phase_index,
                to_phase = next.current_phase_index,
                "phase advanced"
            );
            Some(Event::PhaseAdvanced {
                from_phase: before.current_phase_index,
                to_phase: next.current_phase_index,
                intensity: phase.map(|p| p.intensity).unwrap_or_default(),
                duration_secs: next.time_remaining_in_phase,
                at: Utc::now(),
            })
        };

        Outcome {
            state: self.run,
            effects,
            event,
        }
    }

    /// Any state -> Idle, including Completed.
    pub fn restart(&mut self) -> Outcome {
        if self.exited {
            return self.unchanged();
        }
        let (next, effects) = self.run.apply(Input::Restart, &self.sequence);
        self.run = next;
        info!(routine = %self.routine_name, "timer restarted");
        Outcome {
            state: self.run,
            effects,
            event: Some(Event::TimerRestarted { at: Utc::now() }),
        }
    }

    /// Terminate the engine. Idempotent; later commands are no-ops.
    pub fn exit(&mut self) -> Outcome {
        if self.exited {
            return self.unchanged();
        }
        self.exited = true;
        self.run.paused = true;
        info!(
            routine = %self.routine_name,
            elapsed_secs = self.run.elapsed_total,
            "timer exited"
        );
        Outcome {
            state: self.run,
            effects: Vec::new(),
            event: Some(Event::TimerExited {
                elapsed_secs: self.run.elapsed_total,
                at: Utc::now(),
            }),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn unchanged(&self) -> Outcome {
        Outcome {
            state: self.run,
            effects: Vec::new(),
            event: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::sequence::Intensity;

    fn routine(durations: &[u64]) -> Routine {
        let phases = durations
            .iter()
            .map(|&d| Phase::new(d, Intensity::Normal).unwrap())
            .collect();
        Routine::new("Intervals", phases).unwrap()
    }

    fn ticks(engine: &mut TimerEngine, n: usize) -> Vec<Outcome> {
        (0..n).map(|_| engine.tick()).collect()
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = TimerEngine::new(routine(&[5, 3])).unwrap();
        assert_eq!(engine.state(), TimerState::Idle);

        assert!(engine.start().event.is_some());
        assert_eq!(engine.state(), TimerState::Running);

        assert!(engine.pause().event.is_some());
        assert_eq!(engine.state(), TimerState::Idle);

        engine.toggle_pause();
        engine.tick();
        engine.toggle_pause();
        assert_eq!(engine.state(), TimerState::Paused);
    }

    #[test]
    fn zero_phase_routine_is_rejected() {
        let empty = Routine::new("Empty", Vec::new()).unwrap();
        let err = TimerEngine::new(empty).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRoutine { .. }));
    }

    #[test]
    fn zero_duration_phase_is_rejected() {
        let mut r = routine(&[5]);
        r.phases[0].duration_secs = 0;
        assert!(matches!(
            TimerEngine::new(r),
            Err(CoreError::InvalidRoutine { .. })
        ));
    }

    #[test]
    fn boundary_advances_and_completes() {
        let mut engine = TimerEngine::new(routine(&[5, 3])).unwrap();
        engine.start();

        let outcomes = ticks(&mut engine, 5);
        let snap = engine.snapshot();
        assert_eq!(snap.current_phase_index, 1);
        assert_eq!(snap.time_remaining_in_phase, 3);
        assert!(outcomes[..4].iter().all(|o| !o.fires_alarm()));
        assert!(matches!(
            outcomes[4].event,
            Some(Event::PhaseAdvanced { from_phase: 0, to_phase: 1, .. })
        ));

        let outcomes = ticks(&mut engine, 3);
        assert!(engine.snapshot().completed);
        assert_eq!(engine.state(), TimerState::Completed);
        assert!(matches!(
            outcomes[2].event,
            Some(Event::RoutineCompleted { elapsed_secs: 8, .. })
        ));
    }

    #[test]
    fn alarm_fires_once_per_phase() {
        let mut engine = TimerEngine::new(routine(&[2, 1, 3])).unwrap();
        engine.start();
        let fired = ticks(&mut engine, 20)
            .iter()
            .filter(|o| o.fires_alarm())
            .count();
        assert_eq!(fired, 3);
    }

    #[test]
    fn pause_freezes_counters() {
        let mut engine = TimerEngine::new(routine(&[10])).unwrap();
        engine.start();
        ticks(&mut engine, 3);
        engine.pause();
        let frozen = engine.snapshot();
        ticks(&mut engine, 5);
        assert_eq!(engine.snapshot(), frozen);

        engine.start();
        engine.tick();
        assert_eq!(engine.snapshot().elapsed_total, 4);
        assert_eq!(engine.snapshot().time_remaining_in_phase, 6);
    }

    #[test]
    fn restart_from_completed_resets() {
        let mut engine = TimerEngine::new(routine(&[1, 2])).unwrap();
        engine.start();
        ticks(&mut engine, 3);
        assert_eq!(engine.state(), TimerState::Completed);

        engine.restart();
        let snap = engine.snapshot();
        assert_eq!(snap.current_phase_index, 0);
        assert_eq!(snap.time_remaining_in_phase, 1);
        assert_eq!(snap.elapsed_total, 0);
        assert!(snap.paused);
        assert!(!snap.completed);
        assert_eq!(engine.state(), TimerState::Idle);
    }

    #[test]
    fn toggle_is_noop_when_completed() {
        let mut engine = TimerEngine::new(routine(&[1])).unwrap();
        engine.start();
        engine.tick();
        let outcome = engine.toggle_pause();
        assert!(outcome.event.is_none());
        assert_eq!(engine.state(), TimerState::Completed);
    }

    #[test]
    fn unlock_requested_once_per_lifetime() {
        let mut engine = TimerEngine::new(routine(&[3])).unwrap();
        assert_eq!(engine.toggle_pause().effects, vec![Effect::UnlockAudio]);
        engine.toggle_pause();
        assert!(engine.toggle_pause().effects.is_empty());

        engine.restart();
        assert!(engine.start().effects.is_empty());
        assert!(engine.is_audio_unlocked());
    }

    #[test]
    fn exit_is_idempotent_and_final() {
        let mut engine = TimerEngine::new(routine(&[3])).unwrap();
        engine.start();
        engine.tick();
        assert!(engine.exit().event.is_some());
        assert!(engine.exit().event.is_none());

        let frozen = engine.snapshot();
        engine.tick();
        engine.start();
        engine.restart();
        assert_eq!(engine.snapshot(), frozen);
        assert!(engine.is_exited());
    }

    #[test]
    fn progress_tracks_routine() {
        let mut engine = TimerEngine::new(routine(&[4, 4])).unwrap();
        engine.start();
        ticks(&mut engine, 2);
        assert!((engine.phase_progress() - 0.5).abs() < f64::EPSILON);
        assert!((engine.routine_progress_pct() - 25.0).abs() < 1e-9);
        ticks(&mut engine, 6);
        assert!((engine.routine_progress_pct() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_event_reports_state() {
        let engine = TimerEngine::new(routine(&[5, 3])).unwrap();
        match engine.snapshot_event() {
            Event::StateSnapshot {
                state,
                run,
                phase_count,
                total_secs,
                ..
            } => {
                assert_eq!(state, TimerState::Idle);
                assert_eq!(run.time_remaining_in_phase, 5);
                assert_eq!(phase_count, 2);
                assert_eq!(total_secs, 8);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
