//! Boundary alarm.
//!
//! [`AlarmNotifier`] plays a short cue when a phase runs out. At most one cue
//! is audible at a time, every cue is cut off after a ceiling, and playback
//! stays gated until the first user interaction has unlocked the device.
//! Playback failures are logged and dropped.

mod player;
#[cfg(feature = "rodio")]
mod rodio_player;

pub use player::{AlarmPlayer, SilentPlayer, TerminalBell};
#[cfg(feature = "rodio")]
pub use rodio_player::RodioPlayer;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::PlaybackError;
use crate::storage::AlarmConfig;

/// Longest a single cue may sound.
pub const DEFAULT_CEILING: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct AlarmNotifier {
    player: Arc<dyn AlarmPlayer>,
    ceiling: Duration,
    unlocked: bool,
    /// Bumped on every fire; a ceiling task only stops its own cue.
    generation: Arc<AtomicU64>,
    ceiling_task: Option<JoinHandle<()>>,
}

impl AlarmNotifier {
    pub fn new(player: Arc<dyn AlarmPlayer>) -> Self {
        Self {
            player,
            ceiling: DEFAULT_CEILING,
            unlocked: false,
            generation: Arc::new(AtomicU64::new(0)),
            ceiling_task: None,
        }
    }

    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Notifier that never makes a sound.
    pub fn silent() -> Self {
        Self::new(Arc::new(SilentPlayer))
    }

    /// Build the notifier described by the `[alarm]` config section.
    ///
    /// A configured sound file that cannot be opened falls back to the
    /// terminal bell.
    pub fn from_config(config: &AlarmConfig) -> Self {
        if !config.enabled {
            return Self::silent();
        }
        let ceiling = Duration::from_secs(config.ceiling_secs.max(1));
        Self::new(player_for(config)).with_ceiling(ceiling)
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Prime the device on the first user interaction. Later calls do nothing.
    pub fn unlock(&mut self) {
        if self.unlocked {
            return;
        }
        self.unlocked = true;
        match self.player.prime() {
            Ok(()) => debug!("audio unlocked"),
            Err(e) => warn!(error = %e, "could not unlock audio"),
        }
    }

    /// Play the cue from the start, replacing any cue still sounding.
    pub fn fire(&mut self) {
        if !self.unlocked {
            warn!(error = %PlaybackError::Locked, "alarm not played");
            return;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_ceiling();
        if let Err(e) = self.player.play_from_start() {
            warn!(error = %e, "alarm playback failed");
            return;
        }
        self.arm_ceiling(generation);
    }

    /// Silence the current cue immediately.
    pub fn stop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel_ceiling();
        self.player.stop();
    }

    fn cancel_ceiling(&mut self) {
        if let Some(task) = self.ceiling_task.take() {
            task.abort();
        }
    }

    fn arm_ceiling(&mut self, generation: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no tokio runtime; alarm ceiling not enforced");
            return;
        };
        let player = Arc::clone(&self.player);
        let current = Arc::clone(&self.generation);
        let ceiling = self.ceiling;
        self.ceiling_task = Some(runtime.spawn(async move {
            tokio::time::sleep(ceiling).await;
            if current.load(Ordering::SeqCst) == generation {
                debug!(?ceiling, "alarm ceiling reached");
                player.stop();
            }
        }));
    }
}

impl Drop for AlarmNotifier {
    fn drop(&mut self) {
        self.cancel_ceiling();
    }
}

#[cfg(feature = "rodio")]
fn player_for(config: &AlarmConfig) -> Arc<dyn AlarmPlayer> {
    match config.sound_file.as_deref() {
        Some(path) => match RodioPlayer::open(std::path::Path::new(path), config.volume) {
            Ok(player) => Arc::new(player),
            Err(e) => {
                warn!(error = %e, path, "falling back to terminal bell");
                Arc::new(TerminalBell)
            }
        },
        None => Arc::new(TerminalBell),
    }
}

#[cfg(not(feature = "rodio"))]
fn player_for(config: &AlarmConfig) -> Arc<dyn AlarmPlayer> {
    if let Some(path) = config.sound_file.as_deref() {
        warn!(path, "built without the rodio feature; using terminal bell");
    }
    Arc::new(TerminalBell)
}
