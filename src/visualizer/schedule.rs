//! Frame callbacks for the event loop, in the manner of `requestAnimationFrame`.
//!
//! Handles are one-shot: a fired or cancelled handle never fires again.

use std::time::{Duration, Instant};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameHandle(u64);

pub struct FrameScheduler {
    interval: Duration,
    next_id: u64,
    pending: Vec<(FrameHandle, Instant)>,
    last_fire: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / fps.max(1),
            next_id: 1,
            pending: Vec::new(),
            last_fire: None,
        }
    }

    /// Schedule a callback for the next frame boundary after `now`.
    pub fn request(&mut self, now: Instant) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        let due = match self.last_fire {
            Some(last) => (last + self.interval).max(now),
            None => now,
        };
        self.pending.push((handle, due));
        handle
    }

    pub fn cancel(&mut self, handle: FrameHandle) {
        self.pending.retain(|(h, _)| *h != handle);
    }

    /// Number of callbacks that have neither fired nor been cancelled.
    #[cfg(test)]
    pub fn live(&self) -> usize {
        self.pending.len()
    }

    /// Time until the earliest pending callback; `None` when nothing is scheduled.
    pub fn due_in(&self, now: Instant) -> Option<Duration> {
        self.pending
            .iter()
            .map(|(_, due)| due.saturating_duration_since(now))
            .min()
    }

    /// Remove and return every callback due at `now`.
    pub fn fire(&mut self, now: Instant) -> Vec<FrameHandle> {
        let (due, rest): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|(_, at)| *at <= now);
        self.pending = rest;
        if !due.is_empty() {
            self.last_fire = Some(now);
        }
        due.into_iter().map(|(h, _)| h).collect()
    }
}
