//! Byte frequency spectrum of a block of mono samples.
//!
//! Blackman window, forward FFT, magnitude scaled by 1/N, exponential smoothing
//! across frames, then decibels mapped linearly from `[min_db, max_db]` onto
//! `0..=255`.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

use super::VisualizerError;

const MIN_FRAME_SIZE: usize = 32;
const MAX_FRAME_SIZE: usize = 32768;

const BLACKMAN_ALPHA: f32 = 0.16;

pub struct Analyser {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
}

pub fn check_frame_size(size: usize) -> Result<(), VisualizerError> {
    if size.is_power_of_two() && (MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(VisualizerError::InvalidFrameSize(size))
    }
}

fn blackman(size: usize) -> Vec<f32> {
    let a0 = (1.0 - BLACKMAN_ALPHA) / 2.0;
    let a1 = 0.5;
    let a2 = BLACKMAN_ALPHA / 2.0;
    let n = size as f32;
    (0..size)
        .map(|i| {
            let x = i as f32 / n;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

impl Analyser {
    pub fn new(size: usize, smoothing: f32, min_db: f32, max_db: f32) -> Result<Self, VisualizerError> {
        check_frame_size(size)?;
        let mut planner = FftPlanner::new();
        Ok(Self {
            fft: planner.plan_fft_forward(size),
            window: blackman(size),
            buffer: vec![Complex::new(0.0, 0.0); size],
            smoothed: vec![0.0; size / 2],
            smoothing: smoothing.clamp(0.0, 1.0),
            min_db,
            max_db,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.window.len()
    }

    pub fn bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Forget smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }

    /// Analyse `samples` (exactly `frame_size` of them, oldest first) into `out`
    /// (`bin_count` bytes).
    pub fn process(&mut self, samples: &[f32], out: &mut [u8]) {
        let size = self.frame_size();
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let s = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let tau = self.smoothing;
        let scale = 255.0 / (self.max_db - self.min_db);
        for (k, (smoothed, byte)) in self.smoothed.iter_mut().zip(out.iter_mut()).enumerate() {
            let magnitude = self.buffer[k].norm() / size as f32;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;

            *byte = if *smoothed > 0.0 {
                let db = 20.0 * smoothed.log10();
                ((db - self.min_db) * scale).floor().clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
    }
}
