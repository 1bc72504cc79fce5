//! Static catalog backend: built-in demo tracks, an optional TOML catalog
//! file and an optional scanned music directory, searched locally.

use std::path::Path;

use serde::Deserialize;

use crate::config::{LibrarySettings, SourceSettings};

use super::error::SourceError;
use super::fuzzy::fuzzy_match_positions;
use super::model::Track;
use super::scan::scan;
use super::{TrackSource, finalize};

const SERVICE: &str = "Catalog";
pub const CAP: usize = 20;

const BUILTIN: [(&str, &str, u64); 5] = [
    ("Midnight Drive", "Synthwave Dreams", 234),
    ("Neon Lights", "Electric Pulse", 198),
    ("Digital Sunset", "Cyber Waves", 267),
    ("Retro Future", "Synthwave Dreams", 221),
    ("Ocean Waves", "Ambient Flow", 189),
];

pub struct CatalogSource {
    tracks: Vec<Track>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tracks: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct CatalogEntry {
    id: Option<toml::Value>,
    title: String,
    #[serde(default, alias = "artist_name")]
    artist: String,
    #[serde(default)]
    duration: f64,
    #[serde(alias = "stream_url")]
    url: Option<String>,
    #[serde(alias = "image_url")]
    image: Option<String>,
}

/// The demo tracks shipped with the player.
pub fn builtin() -> Vec<Track> {
    BUILTIN
        .iter()
        .enumerate()
        .map(|(i, (title, artist, secs))| Track {
            id: (i + 1).to_string(),
            title: title.to_string(),
            artist_name: artist.to_string(),
            image_url: None,
            stream_url: Some(format!(
                "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-{}.mp3",
                i + 1
            )),
            duration: Track::seconds(*secs as f64),
        })
        .collect()
}

fn entry_id(v: Option<toml::Value>, fallback: usize) -> String {
    match v {
        Some(toml::Value::String(s)) if !s.trim().is_empty() => s,
        Some(toml::Value::Integer(n)) => n.to_string(),
        _ => format!("file-{fallback}"),
    }
}

/// Relative local paths in a catalog file are relative to the file itself.
fn resolve_location(url: String, base: Option<&Path>) -> String {
    if url.contains("://") || Path::new(&url).is_absolute() {
        return url;
    }
    match base {
        Some(dir) => dir.join(&url).display().to_string(),
        None => url,
    }
}

/// Parse the `[[tracks]]` tables of a catalog file.
pub(crate) fn parse_catalog(text: &str, base: Option<&Path>) -> Result<Vec<Track>, toml::de::Error> {
    let file: CatalogFile = toml::from_str(text)?;
    Ok(file
        .tracks
        .into_iter()
        .enumerate()
        .map(|(i, e)| Track {
            id: entry_id(e.id, i + 1),
            title: e.title.trim().to_string(),
            artist_name: e.artist.trim().to_string(),
            image_url: e.image.filter(|s| !s.trim().is_empty()),
            stream_url: e
                .url
                .filter(|s| !s.trim().is_empty())
                .map(|u| resolve_location(u, base)),
            duration: Track::seconds(e.duration),
        })
        .collect())
}

impl CatalogSource {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    /// Built-in tracks, then the catalog file, then the scanned library directory.
    pub fn from_settings(source: &SourceSettings, library: &LibrarySettings) -> Result<Self, SourceError> {
        let mut tracks = builtin();

        if let Some(path) = &source.catalog_file {
            let text = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            let extra = parse_catalog(&text, path.parent()).map_err(|e| SourceError::Catalog {
                path: path.display().to_string(),
                source: e,
            })?;
            log::info!("loaded {} catalog tracks from {}", extra.len(), path.display());
            tracks.extend(extra);
        }

        if let Some(dir) = &library.dir {
            let scanned = scan(dir, library);
            log::info!("scanned {} tracks under {}", scanned.len(), dir.display());
            tracks.extend(scanned);
        }

        Ok(Self::new(tracks))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }
}

fn matches(track: &Track, query: &str) -> bool {
    let haystack = format!("{} {}", track.artist_name, track.title);
    fuzzy_match_positions(&haystack, query).is_some()
        || fuzzy_match_positions(&track.title, query).is_some()
}

impl TrackSource for CatalogSource {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn cap(&self) -> usize {
        CAP
    }

    fn search(&self, query: &str) -> Result<Vec<Track>, SourceError> {
        let query = query.trim();
        let hits: Vec<Track> = self
            .tracks
            .iter()
            .filter(|t| query.is_empty() || matches(t, query))
            .cloned()
            .collect();
        Ok(finalize(hits, CAP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn builtin_catalog_has_streamable_demo_tracks() {
        let tracks = builtin();
        assert_eq!(tracks.len(), 5);
        assert_eq!(tracks[0].id, "1");
        assert_eq!(tracks[0].title, "Midnight Drive");
        assert_eq!(tracks[4].duration, Some(Duration::from_secs(189)));
        assert!(tracks.iter().all(|t| t.stream_url.is_some()));
    }

    #[test]
    fn search_matches_artist_and_title_fuzzily() {
        let source = CatalogSource::new(builtin());

        let hits = source.search("synthwave").unwrap();
        let titles: Vec<&str> = hits.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Midnight Drive", "Retro Future"]);

        let hits = source.search("ocn wvs").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Ocean Waves");

        assert!(source.search("zzzz").unwrap().is_empty());
    }

    #[test]
    fn blank_query_lists_everything() {
        let source = CatalogSource::new(builtin());
        assert_eq!(source.search("   ").unwrap().len(), 5);
    }

    #[test]
    fn search_is_capped() {
        let many: Vec<Track> = (0..30)
            .map(|i| Track {
                id: i.to_string(),
                title: format!("Loop {i}"),
                artist_name: "Looper".into(),
                image_url: None,
                stream_url: None,
                duration: None,
            })
            .collect();
        let source = CatalogSource::new(many);
        assert_eq!(source.search("loop").unwrap().len(), CAP);
    }

    #[test]
    fn parse_catalog_accepts_numeric_ids_and_relative_paths() {
        let text = r#"
[[tracks]]
id = 7
title = "Local Song"
artist = "Me"
duration = 61
url = "songs/local.mp3"

[[tracks]]
title = "Remote"
url = "https://example.com/remote.mp3"
"#;
        let tracks = parse_catalog(text, Some(Path::new("/music"))).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "7");
        assert_eq!(
            tracks[0].stream_url.as_deref(),
            Some(Path::new("/music").join("songs/local.mp3").display().to_string().as_str())
        );
        assert_eq!(tracks[0].duration, Some(Duration::from_secs(61)));
        assert_eq!(tracks[1].id, "file-2");
        assert_eq!(tracks[1].artist_name, "");
        assert_eq!(tracks[1].stream_url.as_deref(), Some("https://example.com/remote.mp3"));
    }

    #[test]
    fn from_settings_merges_catalog_file_and_library_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cat = dir.path().join("catalog.toml");
        std::fs::write(&cat, "[[tracks]]\nid = \"x\"\ntitle = \"Extra\"\nurl = \"extra.mp3\"\n").unwrap();
        let music = dir.path().join("music");
        std::fs::create_dir_all(&music).unwrap();
        std::fs::write(music.join("scanned.mp3"), b"not real").unwrap();

        let source = SourceSettings {
            catalog_file: Some(cat),
            ..SourceSettings::default()
        };
        let library = LibrarySettings {
            dir: Some(music),
            ..LibrarySettings::default()
        };

        let catalog = CatalogSource::from_settings(&source, &library).unwrap();
        assert_eq!(catalog.len(), 7);
        assert_eq!(catalog.search("extra").unwrap()[0].id, "x");
        assert_eq!(catalog.search("scanned").unwrap().len(), 1);
    }

    #[test]
    fn from_settings_reports_bad_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let cat = dir.path().join("catalog.toml");
        std::fs::write(&cat, "[[tracks]]\nartist = \"missing title\"\n").unwrap();
        let source = SourceSettings {
            catalog_file: Some(cat),
            ..SourceSettings::default()
        };
        let err = CatalogSource::from_settings(&source, &LibrarySettings::default())
            .err()
            .unwrap();
        assert!(matches!(err, SourceError::Catalog { .. }));
    }
}
