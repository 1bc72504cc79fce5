//! Playback controller: the track list, the current index and the state
//! machine that drives a [`crate::audio::MediaBackend`].

mod controller;

pub use controller::*;

#[cfg(test)]
mod tests;
