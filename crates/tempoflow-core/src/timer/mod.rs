mod engine;
mod scheduler;
mod sequence;
mod state;

pub use engine::{Outcome, TimerEngine};
pub use scheduler::{SchedulerHandle, TickScheduler, TICK_PERIOD};
pub use sequence::{Intensity, MoveDirection, Phase, PhaseSequence, Routine};
pub use state::{Effect, Input, RunState, TimerState};
