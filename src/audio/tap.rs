//! Live copy of the samples the rodio backend is playing.
//!
//! The mixer thread pushes into a bounded ring with `try_lock`, so a reader
//! holding the lock costs a few dropped samples rather than an audio glitch.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rodio::Source;

use super::error::TapError;

/// Interleaved samples kept in the ring; enough for the largest analyser window in stereo.
const RING_CAPACITY: usize = 32768 * 2;

#[derive(Default)]
struct TapInner {
    samples: Mutex<VecDeque<f32>>,
    channels: AtomicU16,
    attached: AtomicBool,
    closed: AtomicBool,
}

/// Shared handle to a backend's output signal.
#[derive(Clone, Default)]
pub struct SignalTap {
    inner: Arc<TapInner>,
}

/// Exclusive read access to a [`SignalTap`]. Dropping it detaches the reader.
pub struct TapGuard {
    tap: SignalTap,
}

impl SignalTap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a reader. Only one reader may hold the tap at a time.
    pub fn acquire(&self) -> Result<TapGuard, TapError> {
        if self.is_closed() {
            return Err(TapError::Closed);
        }
        if self.inner.attached.swap(true, Ordering::AcqRel) {
            return Err(TapError::Busy);
        }
        Ok(TapGuard { tap: self.clone() })
    }

    /// Mark the signal as permanently unavailable (no output device, backend gone).
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        if let Ok(mut ring) = self.inner.samples.lock() {
            ring.clear();
        }
    }

    pub(super) fn set_channels(&self, channels: u16) {
        self.inner.channels.store(channels.max(1), Ordering::Release);
    }

    /// Append one interleaved frame. The ring only ever gains or loses whole
    /// frames, so readers stay aligned to channel 0 even when a frame is
    /// dropped because the reader holds the lock.
    fn push_frame(&self, frame: &[f32]) {
        let Ok(mut ring) = self.inner.samples.try_lock() else {
            return;
        };
        let width = frame.len().max(1);
        let excess = (ring.len() + frame.len()).saturating_sub(RING_CAPACITY);
        let excess = (excess.div_ceil(width) * width).min(ring.len());
        ring.drain(..excess);
        ring.extend(frame.iter().copied());
    }

    #[cfg(test)]
    pub(crate) fn feed(&self, channels: u16, samples: &[f32]) {
        self.set_channels(channels);
        for frame in samples.chunks(channels.max(1) as usize) {
            self.push_frame(frame);
        }
    }
}

impl TapGuard {
    /// Fill `out` with the most recent mono frames, oldest first. Missing
    /// history is zero-padded at the front. Returns the number of real frames.
    pub fn copy_mono(&self, out: &mut [f32]) -> usize {
        out.fill(0.0);
        let channels = self.tap.inner.channels.load(Ordering::Acquire).max(1) as usize;
        let Ok(ring) = self.tap.inner.samples.lock() else {
            return 0;
        };

        let frames = ring.len() / channels;
        let n = frames.min(out.len());
        let first = (frames - n) * channels;
        let pad = out.len() - n;

        for (i, slot) in out[pad..].iter_mut().enumerate() {
            let start = first + i * channels;
            let sum: f32 = (start..start + channels).map(|j| ring[j]).sum();
            *slot = sum / channels as f32;
        }
        n
    }
}

impl Drop for TapGuard {
    fn drop(&mut self) {
        self.tap.inner.attached.store(false, Ordering::Release);
        self.tap.clear();
    }
}

/// Source adapter that copies every sample into a [`SignalTap`] while a reader is attached.
pub(super) struct TapSource<S> {
    inner: S,
    tap: SignalTap,
    // Samples of the frame being assembled; filled even while detached so
    // the channel phase is never lost.
    frame: Vec<f32>,
    channels: usize,
}

impl<S: Source> TapSource<S> {
    pub(super) fn new(inner: S, tap: SignalTap) -> Self {
        let channels = inner.channels().max(1);
        tap.set_channels(channels);
        Self {
            inner,
            tap,
            frame: Vec::with_capacity(channels as usize),
            channels: channels as usize,
        }
    }
}

impl<S: Source> Iterator for TapSource<S> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;
        self.frame.push(sample);
        if self.frame.len() == self.channels {
            if self.tap.is_attached() {
                self.tap.push_frame(&self.frame);
            }
            self.frame.clear();
        }
        Some(sample)
    }
}

impl<S: Source> Source for TapSource<S> {
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), rodio::source::SeekError> {
        self.inner.try_seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rodio::buffer::SamplesBuffer;

    #[test]
    fn only_one_reader_at_a_time() {
        let tap = SignalTap::new();
        let guard = tap.acquire().unwrap();
        assert_eq!(tap.acquire().err(), Some(TapError::Busy));
        drop(guard);
        assert!(tap.acquire().is_ok());
    }

    #[test]
    fn closed_tap_cannot_be_acquired() {
        let tap = SignalTap::new();
        tap.close();
        assert_eq!(tap.acquire().err(), Some(TapError::Closed));
    }

    #[test]
    fn copy_mono_downmixes_and_pads_front() {
        let tap = SignalTap::new();
        let guard = tap.acquire().unwrap();
        tap.feed(2, &[0.2, 0.4, 1.0, 0.0]);

        let mut out = [9.0f32; 4];
        assert_eq!(guard.copy_mono(&mut out), 2);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);
        assert!((out[2] - 0.3).abs() < 1e-6);
        assert!((out[3] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn copy_mono_keeps_latest_frames() {
        let tap = SignalTap::new();
        let guard = tap.acquire().unwrap();
        tap.feed(1, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut out = [0.0f32; 3];
        assert_eq!(guard.copy_mono(&mut out), 3);
        assert_eq!(out, [3.0, 4.0, 5.0]);
    }

    #[test]
    fn releasing_the_guard_clears_history() {
        let tap = SignalTap::new();
        let guard = tap.acquire().unwrap();
        tap.feed(1, &[1.0, 1.0]);
        drop(guard);

        let guard = tap.acquire().unwrap();
        let mut out = [0.0f32; 2];
        assert_eq!(guard.copy_mono(&mut out), 0);
    }

    #[test]
    fn frames_dropped_under_contention_keep_channels_aligned() {
        let tap = SignalTap::new();
        let guard = tap.acquire().unwrap();
        let buffer = SamplesBuffer::new(2, 44_100, vec![1.0f32, 0.0, 0.2, 0.4, 0.6, 0.8]);
        let mut source = TapSource::new(buffer, tap.clone());

        {
            // The first sample arrives while a reader holds the ring.
            let _held = tap.inner.samples.lock().unwrap();
            assert_eq!(source.next(), Some(1.0));
        }
        let rest: Vec<f32> = source.collect();
        assert_eq!(rest.len(), 5);

        let mut out = [0.0f32; 3];
        assert_eq!(guard.copy_mono(&mut out), 3);
        assert!((out[0] - 0.5).abs() < 1e-6);
        assert!((out[1] - 0.3).abs() < 1e-6);
        assert!((out[2] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn full_ring_evicts_whole_frames() {
        let tap = SignalTap::new();
        let guard = tap.acquire().unwrap();
        // Three channels do not divide the ring capacity evenly.
        let frames = RING_CAPACITY / 3 + 7;
        let samples: Vec<f32> = (0..frames).flat_map(|_| [0.3f32, 0.0, 0.6]).collect();
        tap.feed(3, &samples);

        let mut out = [0.0f32; 64];
        assert_eq!(guard.copy_mono(&mut out), 64);
        assert!(out.iter().all(|v| (v - 0.3).abs() < 1e-6));
        assert_eq!(tap.inner.samples.lock().unwrap().len() % 3, 0);
    }

    #[test]
    fn tap_source_passes_samples_through_and_records_when_attached() {
        let tap = SignalTap::new();
        let buffer = || SamplesBuffer::new(1, 44_100, vec![0.1f32, 0.2, 0.3]);

        let unobserved: Vec<f32> = TapSource::new(buffer(), tap.clone()).collect();
        assert_eq!(unobserved, vec![0.1, 0.2, 0.3]);

        let guard = tap.acquire().unwrap();
        let played: Vec<f32> = TapSource::new(buffer(), tap.clone()).collect();
        assert_eq!(played, vec![0.1, 0.2, 0.3]);

        let mut out = [0.0f32; 3];
        assert_eq!(guard.copy_mono(&mut out), 3);
        assert_eq!(out, [0.1, 0.2, 0.3]);
    }
}
