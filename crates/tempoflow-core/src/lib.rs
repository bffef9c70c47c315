//! # Tempoflow Core Library
//!
//! This library provides the core logic for Tempoflow, an interval timer
//! that runs named routines of timed phases ("tempos") with a countdown,
//! pause/resume and an audible cue at every phase boundary.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-counting state machine over one routine.
//!   Transitions are pure functions on [`RunState`]; side effects come back
//!   to the caller as [`Effect`] values
//! - **Tick Scheduler**: a single tokio task that owns the engine and drives
//!   it once per second while running
//! - **Alarm**: fire-and-forget boundary cue with unlock gating and a length
//!   ceiling
//! - **Storage**: TOML configuration and a JSON routine store
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TickScheduler`]: Real-time driver
//! - [`AlarmNotifier`]: Boundary cue
//! - [`Config`] / [`RoutineStore`]: Persistence used by the CLI

pub mod alarm;
pub mod error;
pub mod events;
pub mod format;
pub mod storage;
pub mod timer;

pub use alarm::{AlarmNotifier, AlarmPlayer};
pub use error::{ConfigError, CoreError, PlaybackError, StorageError, ValidationError};
pub use events::Event;
pub use storage::{Config, RoutineStore};
pub use timer::{
    Effect, Intensity, MoveDirection, Outcome, Phase, PhaseSequence, Routine, RunState,
    SchedulerHandle, TickScheduler, TimerEngine, TimerState,
};
