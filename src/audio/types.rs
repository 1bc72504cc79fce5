//! Commands sent to the audio thread and events sent back to the controller.

use std::sync::mpsc::Sender;
use std::time::Duration;

/// Notifications a media backend emits for the currently loaded track.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position advanced.
    TimeUpdate(Duration),
    /// Total length became known.
    MetadataLoaded(Duration),
    /// The track played to its end.
    Ended,
    /// Loading or playback failed; the message is shown to the user.
    Failed(String),
}

#[derive(Debug)]
pub(super) enum AudioCmd {
    /// Replace the current track. Events for it go to `events`.
    Load {
        location: String,
        duration_hint: Option<Duration>,
        events: Sender<MediaEvent>,
    },
    Play,
    Pause,
    /// Jump to an absolute position.
    Seek(Duration),
    SetVolume(f32),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}
