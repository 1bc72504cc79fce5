use std::time::Instant;

use crate::app::App;
use crate::config::{self, VisualizerSettings};
use crate::sources::{self, CatalogSource, TrackSource};
use crate::visualizer::{Visualizer, VisualizerError};

/// Build the configured track source, falling back to the built-in catalog.
pub fn build_source(settings: &config::Settings) -> Box<dyn TrackSource> {
    match sources::build_source(settings) {
        Ok(source) => source,
        Err(e) => {
            log::error!("track source unavailable, using built-in catalog: {e}");
            Box::new(CatalogSource::new(sources::builtin()))
        }
    }
}

/// Build the analyser at the default window, then resize it to the configured
/// one. An invalid size keeps the default.
pub fn build_visualizer(settings: &VisualizerSettings) -> Result<Visualizer, VisualizerError> {
    let mut visualizer = Visualizer::new(&VisualizerSettings {
        fft_size: VisualizerSettings::default().fft_size,
        ..settings.clone()
    })?;
    if let Err(e) = visualizer.configure(settings.fft_size) {
        log::warn!("{e}; keeping {} samples", visualizer.frame_size());
    }
    log::debug!(
        "visualizer: {} samples, {} bins",
        visualizer.frame_size(),
        visualizer.bin_count()
    );
    Ok(visualizer)
}

/// Command-line words joined into one query, else the configured initial query.
pub fn initial_query<I: IntoIterator<Item = String>>(args: I, configured: &str) -> Option<String> {
    let joined = args.into_iter().collect::<Vec<String>>().join(" ");
    [joined.trim(), configured.trim()]
        .into_iter()
        .find(|q| !q.is_empty())
        .map(str::to_string)
}

pub fn apply_defaults(app: &mut App, settings: &config::Settings, query: Option<&str>, now: Instant) {
    app.visualizer_enabled = settings.visualizer.enabled;
    app.sync_visualizer(now);

    if let Some(q) = query {
        app.query = q.to_string();
        app.begin_search(q);
    }
}
