//! Tick scheduler.
//!
//! Owns a [`TimerEngine`] and an [`AlarmNotifier`] inside a single tokio task
//! and drives `tick()` once per second while the engine is running. The
//! periodic driver only exists while running: it is created when the engine
//! starts and dropped before any transition that leaves the running state.
//!
//! Hosts talk to the task through a [`SchedulerHandle`]. Every control call
//! is acknowledged only after it has been applied, so a tick that was due
//! when a pause, restart or exit arrived can never land after the call
//! returns.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::debug;

use super::engine::{Outcome, TimerEngine};
use super::state::{Effect, RunState};
use crate::alarm::AlarmNotifier;
use crate::error::{CoreError, Result};
use crate::events::Event;

/// Real-time length of one tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Start,
    Pause,
    TogglePause,
    Restart,
    Exit,
}

struct Request {
    control: Control,
    reply: oneshot::Sender<RunState>,
}

enum Wake {
    Control(Option<Request>),
    Beat,
}

/// Drives one engine on one task.
pub struct TickScheduler {
    engine: TimerEngine,
    notifier: AlarmNotifier,
    period: Duration,
    /// Present only while the engine is running.
    driver: Option<Interval>,
    /// Instant the second currently being counted began.
    beat_origin: Option<Instant>,
    /// Unspent part of the second that was interrupted by a pause.
    carry: Option<Duration>,
    state_tx: watch::Sender<RunState>,
    events_tx: mpsc::UnboundedSender<Event>,
}

impl TickScheduler {
    /// Move `engine` and `notifier` onto a new task.
    ///
    /// Returns the control handle and the stream of presentation events.
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        engine: TimerEngine,
        notifier: AlarmNotifier,
    ) -> (SchedulerHandle, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(engine.snapshot());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let scheduler = Self {
            engine,
            notifier,
            period: TICK_PERIOD,
            driver: None,
            beat_origin: None,
            carry: None,
            state_tx,
            events_tx,
        };
        let task = tokio::spawn(scheduler.run(rx));

        let handle = SchedulerHandle {
            tx,
            state_rx,
            task: Some(task),
        };
        (handle, events_rx)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Request>) {
        debug!(routine = %self.engine.routine_name(), "tick scheduler started");
        loop {
            let wake = match self.driver.as_mut() {
                Some(driver) => tokio::select! {
                    biased;
                    request = rx.recv() => Wake::Control(request),
                    _ = driver.tick() => Wake::Beat,
                },
                None => Wake::Control(rx.recv().await),
            };

            match wake {
                Wake::Beat => self.on_beat(),
                Wake::Control(Some(Request { control, reply })) => {
                    let state = self.on_control(control);
                    let _ = reply.send(state);
                    if self.engine.is_exited() {
                        break;
                    }
                }
                Wake::Control(None) => {
                    // Every handle is gone.
                    self.on_control(Control::Exit);
                    break;
                }
            }
        }
        debug!(routine = %self.engine.routine_name(), "tick scheduler stopped");
    }

    fn on_beat(&mut self) {
        self.beat_origin = Some(Instant::now());
        let outcome = self.engine.tick();
        if !outcome.state.is_running() {
            self.stop_driver();
            self.carry = None;
        }
        self.dispatch(outcome);
    }

    fn on_control(&mut self, control: Control) -> RunState {
        let running = self.engine.snapshot().is_running();
        let outcome = match control {
            Control::Start => self.engine.start(),
            Control::Pause | Control::TogglePause if running => {
                self.suspend_driver();
                self.engine.pause()
            }
            Control::Pause => self.engine.pause(),
            Control::TogglePause => self.engine.toggle_pause(),
            Control::Restart => {
                self.stop_driver();
                self.carry = None;
                self.engine.restart()
            }
            Control::Exit => {
                self.stop_driver();
                self.carry = None;
                let outcome = self.engine.exit();
                self.notifier.stop();
                outcome
            }
        };
        self.dispatch(outcome);

        if self.engine.snapshot().is_running() && self.driver.is_none() {
            self.start_driver();
        }
        self.engine.snapshot()
    }

    /// Perform the effects of one transition, then publish it.
    fn dispatch(&mut self, outcome: Outcome) {
        for effect in &outcome.effects {
            match effect {
                Effect::UnlockAudio => self.notifier.unlock(),
                Effect::FireAlarm { phase_index } => {
                    debug!(phase_index, "phase boundary");
                    self.notifier.fire();
                }
            }
        }
        if let Some(event) = outcome.event {
            let _ = self.events_tx.send(event);
        }
        self.state_tx.send_replace(outcome.state);
    }

    fn start_driver(&mut self) {
        let now = Instant::now();
        let first = now + self.carry.take().unwrap_or(self.period);
        self.beat_origin = Some(first.checked_sub(self.period).unwrap_or(now));

        let mut driver = tokio::time::interval_at(first, self.period);
        driver.set_missed_tick_behavior(MissedTickBehavior::Burst);
        self.driver = Some(driver);
    }

    fn suspend_driver(&mut self) {
        if self.driver.is_none() {
            return;
        }
        let spent = self
            .beat_origin
            .map(|origin| origin.elapsed().min(self.period))
            .unwrap_or_default();
        self.carry = Some(self.period - spent);
        self.stop_driver();
    }

    fn stop_driver(&mut self) {
        self.driver = None;
        self.beat_origin = None;
    }
}

/// Control handle for a running [`TickScheduler`].
///
/// Dropping the handle tears the scheduler down.
pub struct SchedulerHandle {
    tx: mpsc::Sender<Request>,
    state_rx: watch::Receiver<RunState>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub async fn start(&self) -> Result<RunState> {
        self.request(Control::Start).await
    }

    pub async fn pause(&self) -> Result<RunState> {
        self.request(Control::Pause).await
    }

    pub async fn toggle_pause(&self) -> Result<RunState> {
        self.request(Control::TogglePause).await
    }

    pub async fn restart(&self) -> Result<RunState> {
        self.request(Control::Restart).await
    }

    /// Exit the engine and wait for the scheduler task to finish.
    pub async fn exit(mut self) -> Result<RunState> {
        let state = self.request(Control::Exit).await?;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        Ok(state)
    }

    /// Latest published state.
    pub fn state(&self) -> RunState {
        *self.state_rx.borrow()
    }

    /// Receiver notified after every tick and control call.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state_rx.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request(&self, control: Control) -> Result<RunState> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request { control, reply })
            .await
            .map_err(|_| CoreError::SchedulerClosed)?;
        rx.await.map_err(|_| CoreError::SchedulerClosed)
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
