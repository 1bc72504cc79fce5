//! Utilities for creating `rodio` sinks from fetched stream bytes.
//!
//! The whole stream is held in memory so seeking can rebuild the sink and
//! skip into it without fetching again.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use super::backend::is_remote;
use super::error::PlaybackError;
use super::tap::{SignalTap, TapSource};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for stream downloads. A whole track must arrive within
/// `FETCH_TIMEOUT`.
pub(super) fn stream_client() -> reqwest::blocking::Client {
    let built = reqwest::blocking::Client::builder()
        .user_agent(concat!("audiowave/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(FETCH_TIMEOUT)
        .build();
    match built {
        Ok(client) => client,
        Err(e) => {
            log::warn!("stream client setup failed, using defaults: {e}");
            reqwest::blocking::Client::new()
        }
    }
}

/// Fetch the full stream at `location` (HTTP(S) URL or local path).
pub(super) fn fetch_stream(
    client: &reqwest::blocking::Client,
    location: &str,
) -> Result<Arc<[u8]>, PlaybackError> {
    if is_remote(location) {
        log::debug!("fetching stream {location}");
        let response = client.get(location).send()?.error_for_status()?;
        Ok(Arc::from(response.bytes()?.as_ref()))
    } else {
        std::fs::read(location)
            .map(Arc::from)
            .map_err(|e| PlaybackError::Read {
                path: location.to_string(),
                source: e,
            })
    }
}

/// Create a paused `Sink` over `bytes` that starts playback at `start_at`.
///
/// Also returns the decoder's total duration, when the format reports one.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    bytes: Arc<[u8]>,
    start_at: Duration,
    tap: &SignalTap,
) -> Result<(Sink, Option<Duration>), PlaybackError> {
    let decoder = Decoder::new(Cursor::new(bytes))?;
    let total = decoder.total_duration();

    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    let source = TapSource::new(decoder.skip_duration(start_at), tap.clone());

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}
