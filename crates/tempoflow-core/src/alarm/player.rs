use std::fmt;
use std::io::Write;

use crate::error::PlaybackError;

/// Output device for the boundary cue.
///
/// Implementations must be cheap to call from the tick path: `play_from_start`
/// hands the work off and returns immediately.
pub trait AlarmPlayer: Send + Sync + fmt::Debug {
    /// Start the cue from position zero, cutting off any cue still playing.
    fn play_from_start(&self) -> Result<(), PlaybackError>;

    /// Silence the cue. A no-op when nothing is playing.
    fn stop(&self);

    /// Satisfy interaction gating with an inaudible play-then-stop.
    fn prime(&self) -> Result<(), PlaybackError> {
        self.play_from_start()?;
        self.stop();
        Ok(())
    }
}

/// Player that produces no output. Used when the alarm is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl AlarmPlayer for SilentPlayer {
    fn play_from_start(&self) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn stop(&self) {}

    fn prime(&self) -> Result<(), PlaybackError> {
        Ok(())
    }
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl AlarmPlayer for TerminalBell {
    fn play_from_start(&self) -> Result<(), PlaybackError> {
        let mut err = std::io::stderr().lock();
        err.write_all(b"\x07")
            .and_then(|()| err.flush())
            .map_err(|e| PlaybackError::Device(e.to_string()))
    }

    fn stop(&self) {}

    // A bell cannot be played silently; nothing to unlock.
    fn prime(&self) -> Result<(), PlaybackError> {
        Ok(())
    }
}
