use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::sources::Track;

use super::backend::{MediaBackend, MediaListener, stream_location};
use super::error::PlaybackError;
use super::tap::SignalTap;
use super::thread::spawn_audio_thread;
use super::types::AudioCmd;

/// How long quitting waits beyond the fade for the audio thread, which may be
/// in the middle of a download.
const QUIT_GRACE: Duration = Duration::from_secs(1);

/// Plays decodable streams (MP3, FLAC, WAV, OGG) on the default output device.
pub struct RodioBackend {
    tx: Sender<AudioCmd>,
    tap: SignalTap,
    volume: f32,
    loaded: bool,
    fade_out: Duration,
    join: Option<JoinHandle<()>>,
    done: Receiver<()>,
}

impl RodioBackend {
    pub fn new(volume: f32, fade_out: Duration) -> Self {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let tap = SignalTap::new();
        let volume = volume.clamp(0.0, 1.0);
        let (done_tx, done) = mpsc::channel::<()>();
        let audio_handle = spawn_audio_thread(rx, tap.clone(), volume, done_tx);

        Self {
            tx,
            tap,
            volume,
            loaded: false,
            fade_out,
            join: Some(audio_handle),
            done,
        }
    }

    fn send(&self, cmd: AudioCmd) -> Result<(), PlaybackError> {
        self.tx.send(cmd).map_err(|_| PlaybackError::Disconnected)
    }

    fn send_loaded(&self, cmd: AudioCmd) -> Result<(), PlaybackError> {
        if !self.loaded {
            return Err(PlaybackError::NotLoaded);
        }
        self.send(cmd)
    }

    /// Fade out and stop the audio thread. Waits for it only as long as the
    /// fade plus [`QUIT_GRACE`]; a thread stuck in a fetch is left behind.
    pub fn quit_softly(&mut self) {
        let _ = self.send(AudioCmd::Quit {
            fade_out_ms: self.fade_out.as_millis() as u64,
        });

        let Some(h) = self.join.take() else {
            return;
        };
        match self.done.recv_timeout(self.fade_out + QUIT_GRACE) {
            Err(RecvTimeoutError::Disconnected) | Ok(()) => {
                let _ = h.join();
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("audio thread still busy; not waiting for it");
            }
        }
    }
}

impl MediaBackend for RodioBackend {
    fn name(&self) -> &'static str {
        "rodio"
    }

    fn load(&mut self, track: &Track) -> Result<MediaListener, PlaybackError> {
        let location = stream_location(track)?;
        let (events, listener) = MediaListener::channel();
        self.send(AudioCmd::Load {
            location,
            duration_hint: track.duration,
            events,
        })?;
        self.loaded = true;
        Ok(listener)
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.send_loaded(AudioCmd::Play)
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        self.send_loaded(AudioCmd::Pause)
    }

    fn seek(&mut self, to: Duration) -> Result<(), PlaybackError> {
        self.send_loaded(AudioCmd::Seek(to))
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), PlaybackError> {
        self.send(AudioCmd::SetVolume(volume))?;
        self.volume = volume;
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn signal(&self) -> Option<SignalTap> {
        Some(self.tap.clone())
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.quit_softly();
    }
}
