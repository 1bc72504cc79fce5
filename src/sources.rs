//! Track sources: catalog adapters that turn a free-text query into a list of
//! normalized [`Track`]s.
//!
//! Every backend implements [`TrackSource`]; the event loop never talks to one
//! directly but goes through the [`worker::SearchWorker`] thread.

mod catalog;
mod display;
mod error;
mod fuzzy;
mod http;
mod jamendo;
mod model;
mod proxy;
mod scan;
mod worker;
mod youtube;

pub use catalog::{CatalogSource, builtin};
pub use display::{display_from_fields, format_duration};
pub use error::SourceError;
pub use fuzzy::fuzzy_match_positions;
pub use jamendo::JamendoSource;
pub use model::Track;
pub use proxy::ProxySource;
pub use worker::{SearchOutcome, SearchWorker};
pub use youtube::YoutubeSource;

use crate::config::{Settings, SourceKind};

/// A searchable catalog.
pub trait TrackSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Upper bound on the number of results a single search returns.
    fn cap(&self) -> usize;

    /// Run one search. Blocking; call from a worker thread.
    fn search(&self, query: &str) -> Result<Vec<Track>, SourceError>;
}

/// Drop entries without an id or title and truncate to `cap`, keeping upstream order.
pub(crate) fn finalize(tracks: Vec<Track>, cap: usize) -> Vec<Track> {
    tracks
        .into_iter()
        .filter(|t| !t.id.trim().is_empty() && !t.title.trim().is_empty())
        .take(cap)
        .collect()
}

/// Decode the handful of HTML entities upstream APIs leave in titles.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    // `&amp;` last so "&amp;quot;" decodes one level only.
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Build the backend selected by `source.kind`.
pub fn build_source(settings: &Settings) -> Result<Box<dyn TrackSource>, SourceError> {
    let source = &settings.source;
    let built: Box<dyn TrackSource> = match source.kind {
        SourceKind::Youtube => Box::new(YoutubeSource::new(source.credential())?),
        SourceKind::Jamendo => Box::new(JamendoSource::new(source.credential())?),
        SourceKind::Proxy => Box::new(ProxySource::new(
            &source.proxy_base_url,
            source.resolve_concurrency,
        )?),
        SourceKind::Catalog => Box::new(CatalogSource::from_settings(source, &settings.library)?),
    };
    log::info!("track source: {}", built.name());
    Ok(built)
}
