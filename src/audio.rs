//! Media backends: the handle the playback controller loads tracks into.
//!
//! [`RodioBackend`] decodes and plays in-process and exposes a [`SignalTap`]
//! for the visualizer. [`MpvBackend`] drives an external `mpv` for streams
//! rodio cannot decode.

mod backend;
mod error;
mod player;
mod sink;
mod tap;
mod thread;
mod types;

#[cfg(unix)]
mod mpv;

#[cfg(test)]
pub(crate) mod fake;

use std::time::Duration;

use crate::config::{BackendKind, Settings, SourceKind};

pub use backend::{MediaBackend, MediaListener};
pub use error::{PlaybackError, TapError};
#[cfg(unix)]
pub use mpv::MpvBackend;
pub use player::RodioBackend;
pub use tap::{SignalTap, TapGuard};
pub use types::MediaEvent;

/// Pick the backend for `settings`. `auto` uses mpv for YouTube results and
/// falls back to rodio when mpv cannot be started.
pub fn build_backend(settings: &Settings) -> Box<dyn MediaBackend> {
    let playback = &settings.playback;
    let want_mpv = match playback.backend {
        BackendKind::Mpv => true,
        BackendKind::Rodio => false,
        BackendKind::Auto => settings.source.kind == SourceKind::Youtube,
    };

    if want_mpv {
        #[cfg(unix)]
        match MpvBackend::spawn(&playback.mpv_path, playback.volume) {
            Ok(backend) => return Box::new(backend),
            Err(e) => log::warn!("mpv backend unavailable, using rodio: {e}"),
        }
        #[cfg(not(unix))]
        log::warn!("mpv backend needs a unix platform, using rodio");
    }

    Box::new(RodioBackend::new(
        playback.volume,
        Duration::from_millis(playback.quit_fade_out_ms),
    ))
}
