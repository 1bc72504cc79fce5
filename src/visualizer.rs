//! Frequency visualizer: attaches an analyser to the active signal tap and
//! produces one byte spectrum per animation frame.

mod analyser;
mod bars;
mod schedule;

use std::time::Instant;

use thiserror::Error;

use crate::audio::{SignalTap, TapError, TapGuard};
use crate::config::VisualizerSettings;

use analyser::{Analyser, check_frame_size};
pub use bars::{BACKGROUND, gradient_color, layout};
pub use schedule::{FrameHandle, FrameScheduler};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisualizerError {
    #[error("visualizer unavailable: {0}")]
    Unavailable(#[from] TapError),
    #[error("frame size must be a power of two in [32, 32768], got {0}")]
    InvalidFrameSize(usize),
}

pub struct Visualizer {
    analyser: Analyser,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
    samples: Vec<f32>,
    frame: Vec<u8>,
    tap: Option<TapGuard>,
    active: bool,
    pending: Option<FrameHandle>,
}

impl Visualizer {
    pub fn new(settings: &VisualizerSettings) -> Result<Self, VisualizerError> {
        let analyser = Analyser::new(
            settings.fft_size,
            settings.smoothing,
            settings.min_decibels,
            settings.max_decibels,
        )?;
        Ok(Self {
            samples: vec![0.0; analyser.frame_size()],
            frame: vec![0; analyser.bin_count()],
            analyser,
            smoothing: settings.smoothing,
            min_db: settings.min_decibels,
            max_db: settings.max_decibels,
            tap: None,
            active: false,
            pending: None,
        })
    }

    /// Tear down the current graph and connect the analyser to `tap`.
    ///
    /// `None` means there is no signal yet and succeeds with nothing attached.
    pub fn attach(&mut self, tap: Option<SignalTap>) -> Result<(), VisualizerError> {
        self.detach();
        let Some(tap) = tap else {
            return Ok(());
        };
        self.tap = Some(tap.acquire()?);
        self.analyser.reset();
        Ok(())
    }

    fn detach(&mut self) {
        self.tap = None;
        self.frame.fill(0);
    }

    pub fn is_attached(&self) -> bool {
        self.tap.is_some()
    }

    /// Change the analysis window. The tap stays attached.
    pub fn configure(&mut self, frame_size: usize) -> Result<(), VisualizerError> {
        check_frame_size(frame_size)?;
        if frame_size == self.analyser.frame_size() {
            return Ok(());
        }
        self.analyser = Analyser::new(frame_size, self.smoothing, self.min_db, self.max_db)?;
        self.samples = vec![0.0; frame_size];
        self.frame = vec![0; self.analyser.bin_count()];
        Ok(())
    }

    pub fn frame_size(&self) -> usize {
        self.analyser.frame_size()
    }

    pub fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start or stop the render loop. Any pending frame is cancelled first,
    /// so at most one callback is ever live.
    pub fn set_active(&mut self, active: bool, scheduler: &mut FrameScheduler, now: Instant) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
        self.active = active;
        if active {
            self.pending = Some(scheduler.request(now));
        } else {
            self.frame.fill(0);
        }
    }

    /// Run the frame callback for `handle`. Pulls one spectrum and schedules
    /// the next frame. Returns false for handles this visualizer does not own.
    pub fn on_frame(&mut self, handle: FrameHandle, scheduler: &mut FrameScheduler, now: Instant) -> bool {
        if self.pending != Some(handle) {
            return false;
        }
        self.pending = None;
        if !self.active {
            return false;
        }
        self.pull();
        self.pending = Some(scheduler.request(now));
        true
    }

    fn pull(&mut self) {
        match &self.tap {
            Some(tap) => {
                tap.copy_mono(&mut self.samples);
                self.analyser.process(&self.samples, &mut self.frame);
            }
            None => self.frame.fill(0),
        }
    }

    /// The latest spectrum, `bin_count` bytes.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }
}
