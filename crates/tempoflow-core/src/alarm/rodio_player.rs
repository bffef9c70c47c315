//! Sound-file playback through rodio.
//!
//! rodio's output stream cannot leave the thread that opened it, so the
//! player owns a dedicated audio thread and talks to it over a channel.

use std::io::Cursor;
use std::path::Path;
use std::sync::mpsc;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::player::AlarmPlayer;
use crate::error::PlaybackError;

#[derive(Debug, Clone, Copy)]
enum Command {
    Play,
    Stop,
}

/// Plays a sound file on the default output device.
#[derive(Debug)]
pub struct RodioPlayer {
    tx: mpsc::Sender<Command>,
}

impl RodioPlayer {
    /// Load `path` and open the default output device.
    ///
    /// # Errors
    /// Returns [`PlaybackError::Decode`] if the file cannot be read or
    /// decoded, and [`PlaybackError::Device`] if no output device opens.
    pub fn open(path: &Path, volume: u32) -> Result<Self, PlaybackError> {
        let bytes = std::fs::read(path)
            .map_err(|e| PlaybackError::Decode(format!("{}: {e}", path.display())))?;
        Decoder::new(Cursor::new(bytes.clone()))
            .map_err(|e| PlaybackError::Decode(format!("{}: {e}", path.display())))?;

        let (tx, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let gain = volume.min(100) as f32 / 100.0;
        std::thread::Builder::new()
            .name("tempoflow-audio".into())
            .spawn(move || audio_thread(bytes, gain, rx, ready_tx))
            .map_err(|e| PlaybackError::Device(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| PlaybackError::Device("audio thread exited during startup".into()))??;
        debug!(path = %path.display(), "rodio alarm player ready");
        Ok(Self { tx })
    }

    fn send(&self, command: Command) -> Result<(), PlaybackError> {
        self.tx
            .send(command)
            .map_err(|_| PlaybackError::Device("audio thread has stopped".into()))
    }
}

impl AlarmPlayer for RodioPlayer {
    fn play_from_start(&self) -> Result<(), PlaybackError> {
        self.send(Command::Play)
    }

    fn stop(&self) {
        let _ = self.send(Command::Stop);
    }
}

fn audio_thread(
    bytes: Vec<u8>,
    gain: f32,
    rx: mpsc::Receiver<Command>,
    ready: mpsc::Sender<Result<(), PlaybackError>>,
) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready.send(Err(PlaybackError::Device(e.to_string())));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    let mut current: Option<Sink> = None;
    while let Ok(command) = rx.recv() {
        if let Some(sink) = current.take() {
            sink.stop();
        }
        if let Command::Play = command {
            match start_sink(&handle, &bytes, gain) {
                Ok(sink) => current = Some(sink),
                Err(e) => warn!(error = %e, "alarm playback failed"),
            }
        }
    }
    debug!("audio thread shutting down");
}

fn start_sink(
    handle: &OutputStreamHandle,
    bytes: &[u8],
    gain: f32,
) -> Result<Sink, PlaybackError> {
    let sink = Sink::try_new(handle).map_err(|e| PlaybackError::Device(e.to_string()))?;
    let source =
        Decoder::new(Cursor::new(bytes.to_vec())).map_err(|e| PlaybackError::Decode(e.to_string()))?;
    sink.set_volume(gain);
    sink.append(source);
    Ok(sink)
}
