use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crate::sources::Track;

use super::error::PlaybackError;
use super::tap::SignalTap;
use super::types::MediaEvent;

/// The media handle the playback controller drives.
///
/// Every call is non-blocking; outcomes that take time (buffering, decoding,
/// end of track) arrive later on the [`MediaListener`] returned by `load`.
pub trait MediaBackend: Send {
    fn name(&self) -> &'static str;

    /// Replace the current track. The returned listener receives this track's
    /// events only; dropping it disconnects them.
    fn load(&mut self, track: &Track) -> Result<MediaListener, PlaybackError>;

    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self) -> Result<(), PlaybackError>;

    /// Jump to an absolute position in the current track.
    fn seek(&mut self, to: Duration) -> Result<(), PlaybackError>;

    /// `volume` is already clamped to `[0, 1]`.
    fn set_volume(&mut self, volume: f32) -> Result<(), PlaybackError>;

    fn volume(&self) -> f32;

    /// The live output signal, when this backend can expose one.
    fn signal(&self) -> Option<SignalTap>;
}

/// Receiving end of one loaded track's [`MediaEvent`]s.
pub struct MediaListener {
    rx: Receiver<MediaEvent>,
}

impl MediaListener {
    pub fn channel() -> (Sender<MediaEvent>, MediaListener) {
        let (tx, rx) = mpsc::channel();
        (tx, MediaListener { rx })
    }

    /// Everything received since the last call.
    pub fn drain(&self) -> Vec<MediaEvent> {
        self.rx.try_iter().collect()
    }
}

/// Local paths are read from disk; everything with a scheme is fetched.
pub(crate) fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// The playable reference of `track`, or [`PlaybackError::NoStream`].
pub(crate) fn stream_location(track: &Track) -> Result<String, PlaybackError> {
    track
        .stream_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PlaybackError::NoStream(track.title.clone()))
}
