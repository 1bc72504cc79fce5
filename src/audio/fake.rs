//! In-memory media backend for controller and app tests.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::sources::Track;

use super::backend::{MediaBackend, MediaListener, stream_location};
use super::error::PlaybackError;
use super::tap::SignalTap;
use super::types::MediaEvent;

#[derive(Default)]
pub struct FakeState {
    pub calls: Vec<String>,
    pub events: Option<Sender<MediaEvent>>,
    pub fail_play: bool,
    pub volume: f32,
}

impl FakeState {
    /// Deliver `event` to the current listener; false once it has been dropped.
    pub fn emit(&self, event: MediaEvent) -> bool {
        self.events
            .as_ref()
            .is_some_and(|tx| tx.send(event).is_ok())
    }
}

pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
    tap: Option<SignalTap>,
}

impl FakeBackend {
    pub fn new() -> (Self, Arc<Mutex<FakeState>>) {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let backend = Self {
            state: state.clone(),
            tap: None,
        };
        (backend, state)
    }

    pub fn with_tap(tap: SignalTap) -> (Self, Arc<Mutex<FakeState>>) {
        let (mut backend, state) = Self::new();
        backend.tap = Some(tap);
        (backend, state)
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl MediaBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn load(&mut self, track: &Track) -> Result<MediaListener, PlaybackError> {
        stream_location(track)?;
        let (tx, listener) = MediaListener::channel();
        self.record(format!("load:{}", track.id));
        self.state.lock().unwrap().events = Some(tx);
        Ok(listener)
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.state.lock().unwrap().fail_play {
            return Err(PlaybackError::NoOutput);
        }
        self.record("play".into());
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        self.record("pause".into());
        Ok(())
    }

    fn seek(&mut self, to: Duration) -> Result<(), PlaybackError> {
        self.record(format!("seek:{}", to.as_secs()));
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), PlaybackError> {
        self.state.lock().unwrap().volume = volume;
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.state.lock().unwrap().volume
    }

    fn signal(&self) -> Option<SignalTap> {
        self.tap.clone()
    }
}
