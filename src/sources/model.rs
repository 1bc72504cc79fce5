use std::time::Duration;

/// A normalized search result, whatever catalog it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist_name: String,
    pub image_url: Option<String>,
    /// Playable reference: an HTTP(S) URL, a local path, or a page URL the mpv backend understands.
    pub stream_url: Option<String>,
    /// `None` when the upstream did not report a length.
    pub duration: Option<Duration>,
}

impl Track {
    /// Duration from a seconds count; zero and negative counts mean unknown.
    pub fn seconds(secs: f64) -> Option<Duration> {
        (secs.is_finite() && secs > 0.0).then(|| Duration::from_secs_f64(secs))
    }
}
