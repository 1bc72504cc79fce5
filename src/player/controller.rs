use std::time::Duration;

use crate::audio::{MediaBackend, MediaEvent, MediaListener, PlaybackError, SignalTap};
use crate::sources::Track;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlayerStatus {
    /// No tracks.
    Idle,
    /// A track is bound to the media handle but has not been started.
    Loaded,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_track_index: usize,
    pub is_playing: bool,
    pub current_time: Duration,
    /// Zero while unknown.
    pub duration: Duration,
    /// In `[0, 1]`.
    pub volume: f32,
}

pub struct Player {
    backend: Box<dyn MediaBackend>,
    tracks: Vec<Track>,
    state: PlaybackState,
    status: PlayerStatus,
    listener: Option<MediaListener>,
    last_error: Option<String>,
    generation: u64,
}

impl Player {
    pub fn new(mut backend: Box<dyn MediaBackend>, volume: f32) -> Self {
        let requested = if volume.is_nan() { 1.0 } else { volume.clamp(0.0, 1.0) };
        if let Err(e) = backend.set_volume(requested) {
            log::warn!("failed to set initial volume: {e}");
        }
        // A refused volume leaves the backend's own level in place.
        let volume = backend.volume();
        Self {
            backend,
            tracks: Vec::new(),
            state: PlaybackState {
                current_track_index: 0,
                is_playing: false,
                current_time: Duration::ZERO,
                duration: Duration::ZERO,
                volume,
            },
            status: PlayerStatus::Idle,
            listener: None,
            last_error: None,
            generation: 0,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    /// Bumped on every load; identifies the track bound to the media handle.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_track(&self) -> Option<&Track> {
        match self.status {
            PlayerStatus::Idle => None,
            _ => self.tracks.get(self.state.current_track_index),
        }
    }

    /// The output signal of the loaded track, if the backend exposes one.
    pub fn signal(&self) -> Option<SignalTap> {
        self.listener.as_ref()?;
        self.backend.signal()
    }

    /// The most recent failure, cleared on read.
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    /// Replace the track list and load its first entry without playing it.
    pub fn replace_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.state.current_track_index = 0;
        if self.tracks.is_empty() {
            self.listener = None;
            self.generation += 1;
            if let Err(e) = self.backend.pause() {
                log::debug!("pause on empty list: {e}");
            }
            self.state.is_playing = false;
            self.state.current_time = Duration::ZERO;
            self.state.duration = Duration::ZERO;
            self.status = PlayerStatus::Idle;
            return;
        }
        self.load_index(0);
    }

    /// Load and play the track at `index`.
    pub fn select(&mut self, index: usize) {
        if index >= self.tracks.len() {
            return;
        }
        if self.load_index(index) {
            self.play();
        }
    }

    pub fn play(&mut self) {
        if self.status == PlayerStatus::Idle || self.status == PlayerStatus::Playing {
            return;
        }
        if self.listener.is_none() {
            self.fail(PlaybackError::NotLoaded);
            return;
        }
        match self.backend.play() {
            Ok(()) => {
                self.status = PlayerStatus::Playing;
                self.state.is_playing = true;
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn pause(&mut self) {
        if self.status != PlayerStatus::Playing {
            return;
        }
        if let Err(e) = self.backend.pause() {
            self.fail(e);
            return;
        }
        self.status = PlayerStatus::Paused;
        self.state.is_playing = false;
    }

    pub fn toggle(&mut self) {
        if self.status == PlayerStatus::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Advance to the next track, wrapping to the first, and play it.
    pub fn next(&mut self) {
        let len = self.tracks.len();
        if len == 0 {
            return;
        }
        self.select((self.state.current_track_index + 1) % len);
    }

    /// Step back to the previous track, wrapping to the last, and play it.
    pub fn previous(&mut self) {
        let len = self.tracks.len();
        if len == 0 {
            return;
        }
        self.select((self.state.current_track_index + len - 1) % len);
    }

    /// Jump to `to`, clamped to the known duration.
    pub fn seek(&mut self, to: Duration) {
        if self.listener.is_none() {
            return;
        }
        let to = if self.state.duration.is_zero() {
            to
        } else {
            to.min(self.state.duration)
        };
        match self.backend.seek(to) {
            Ok(()) => self.state.current_time = to,
            Err(e) => self.fail(e),
        }
    }

    pub fn seek_by(&mut self, delta_secs: i64) {
        let target = (self.state.current_time.as_secs_f64() + delta_secs as f64).max(0.0);
        self.seek(Duration::from_secs_f64(target));
    }

    /// Set the volume, clamped to `[0, 1]`. NaN is ignored.
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        match self.backend.set_volume(volume) {
            Ok(()) => self.state.volume = volume,
            Err(e) => {
                log::warn!("set volume failed: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Apply the media events received since the last tick.
    pub fn tick(&mut self) {
        let Some(listener) = self.listener.as_ref() else {
            return;
        };
        for event in listener.drain() {
            match event {
                MediaEvent::TimeUpdate(t) => self.state.current_time = t,
                MediaEvent::MetadataLoaded(d) => self.state.duration = d,
                MediaEvent::Ended => {
                    log::debug!("track {} ended", self.state.current_track_index);
                    // The listener is replaced; the rest of this batch is stale.
                    self.next();
                    return;
                }
                MediaEvent::Failed(message) => {
                    log::warn!("playback failed: {message}");
                    // Nothing is bound any more; play() must not report Playing
                    // until another track is loaded.
                    self.listener = None;
                    self.status = PlayerStatus::Paused;
                    self.state.is_playing = false;
                    self.last_error = Some(message);
                    return;
                }
            }
        }
    }

    /// Bind track `index` to the media handle. The previous listener is
    /// disposed first. Returns false when the backend refused the track.
    fn load_index(&mut self, index: usize) -> bool {
        self.listener = None;
        self.generation += 1;
        self.state.current_track_index = index;
        self.state.current_time = Duration::ZERO;
        self.state.is_playing = false;

        let Some(track) = self.tracks.get(index) else {
            return false;
        };
        self.state.duration = track.duration.unwrap_or(Duration::ZERO);
        log::info!("loading '{}' ({})", track.title, track.id);

        match self.backend.load(track) {
            Ok(listener) => {
                self.listener = Some(listener);
                self.status = PlayerStatus::Loaded;
                true
            }
            Err(e) => {
                // Keep the previous track from playing on under the new selection.
                let _ = self.backend.pause();
                self.fail(e);
                false
            }
        }
    }

    fn fail(&mut self, e: PlaybackError) {
        log::warn!("playback error: {e}");
        self.status = PlayerStatus::Paused;
        self.state.is_playing = false;
        self.last_error = Some(e.to_string());
    }
}
