//! Community music-proxy backend (saavn-style API).
//!
//! Search results do not carry a playable URL, so every hit is resolved with a
//! second request keyed by its id. Those requests run in parallel with a fixed
//! concurrency bound; a hit whose URL cannot be resolved is dropped.

use std::sync::Mutex;
use std::thread;

use reqwest::blocking::{Client, Request};
use serde::Deserialize;

use super::error::SourceError;
use super::model::Track;
use super::{TrackSource, decode_entities, finalize, http};

const SERVICE: &str = "Music proxy";
pub const CAP: usize = 20;

pub struct ProxySource {
    client: Client,
    base_url: String,
    concurrency: usize,
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct SearchData {
    #[serde(default)]
    results: Vec<Song>,
}

#[derive(Deserialize)]
struct Song {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    duration: Option<serde_json::Value>,
    #[serde(default)]
    artists: Option<Artists>,
    #[serde(rename = "primaryArtists", default)]
    primary_artists: Option<String>,
    #[serde(default)]
    image: Vec<Link>,
    #[serde(rename = "downloadUrl", default)]
    download_url: Vec<Link>,
}

#[derive(Deserialize)]
struct Artists {
    #[serde(default)]
    primary: Vec<Artist>,
}

#[derive(Deserialize)]
struct Artist {
    name: String,
}

/// One quality variant of an image or audio file. Upstream lists them lowest first.
#[derive(Deserialize)]
struct Link {
    #[serde(alias = "link")]
    url: String,
}

impl ProxySource {
    pub fn new(base_url: &str, concurrency: usize) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            concurrency: concurrency.max(1),
        })
    }

    fn search_request(&self, query: &str) -> Result<Request, SourceError> {
        let limit = CAP.to_string();
        Ok(self
            .client
            .get(format!("{}/api/search/songs", self.base_url))
            .query(&[("query", query.trim()), ("limit", limit.as_str())])
            .build()?)
    }

    fn song_request(&self, id: &str) -> Result<Request, SourceError> {
        Ok(self
            .client
            .get(format!("{}/api/songs/{}", self.base_url, id))
            .build()?)
    }

    fn resolve_stream(&self, id: &str) -> Result<String, SourceError> {
        let (status, body) = http::fetch_body(&self.client, self.song_request(id)?)?;
        http::interpret(SERVICE, status, parse_song_stream(&body))
    }
}

fn upstream_error<T>(env: &Envelope<T>) -> Option<SourceError> {
    if env.success == Some(false) {
        let message = env
            .message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "request was not successful".to_string());
        return Some(SourceError::Upstream {
            service: SERVICE,
            message,
        });
    }
    None
}

fn seconds(v: Option<&serde_json::Value>) -> f64 {
    match v {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn artist_of(song: &Song) -> String {
    if let Some(artists) = &song.artists {
        let names: Vec<&str> = artists.primary.iter().map(|a| a.name.as_str()).collect();
        if !names.is_empty() {
            return names.join(", ");
        }
    }
    song.primary_artists.clone().unwrap_or_default()
}

/// Parse a search page into tracks without stream URLs.
pub(crate) fn parse_search(body: &str) -> Result<Vec<Track>, SourceError> {
    let env: Envelope<SearchData> = serde_json::from_str(body)?;
    if let Some(err) = upstream_error(&env) {
        return Err(err);
    }

    let results = env.data.map(|d| d.results).unwrap_or_default();
    let tracks = results
        .into_iter()
        .map(|song| Track {
            artist_name: decode_entities(&artist_of(&song)),
            title: decode_entities(&song.name),
            image_url: song.image.last().map(|l| l.url.clone()),
            stream_url: song.download_url.last().map(|l| l.url.clone()),
            duration: Track::seconds(seconds(song.duration.as_ref())),
            id: song.id,
        })
        .collect();

    Ok(finalize(tracks, CAP))
}

/// Pick the highest-quality download URL from a song detail response.
pub(crate) fn parse_song_stream(body: &str) -> Result<String, SourceError> {
    let env: Envelope<Vec<Song>> = serde_json::from_str(body)?;
    if let Some(err) = upstream_error(&env) {
        return Err(err);
    }

    env.data
        .unwrap_or_default()
        .into_iter()
        .find_map(|song| song.download_url.last().map(|l| l.url.clone()))
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| SourceError::Upstream {
            service: SERVICE,
            message: "song has no download URL".to_string(),
        })
}

/// Fill in `stream_url` for every track using at most `concurrency` requests at
/// a time. Tracks that fail to resolve are dropped; order is preserved.
pub(crate) fn resolve_all<F>(tracks: Vec<Track>, concurrency: usize, resolve: F) -> Vec<Track>
where
    F: Fn(&str) -> Result<String, SourceError> + Sync,
{
    let slots: Vec<Mutex<Option<Track>>> = tracks.into_iter().map(|t| Mutex::new(Some(t))).collect();
    let next = Mutex::new(0usize);
    let workers = concurrency.max(1).min(slots.len());

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    let i = {
                        let Ok(mut n) = next.lock() else { return };
                        let i = *n;
                        *n += 1;
                        i
                    };
                    let Some(slot) = slots.get(i) else { return };
                    let Ok(mut guard) = slot.lock() else { continue };
                    let Some(track) = guard.as_mut() else { continue };
                    if track.stream_url.is_some() {
                        continue;
                    }
                    match resolve(&track.id) {
                        Ok(url) => track.stream_url = Some(url),
                        Err(e) => {
                            log::warn!("dropping '{}' ({}): {e}", track.title, track.id);
                            *guard = None;
                        }
                    }
                }
            });
        }
    });

    slots
        .into_iter()
        .filter_map(|slot| slot.into_inner().ok().flatten())
        .collect()
}

impl TrackSource for ProxySource {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn cap(&self) -> usize {
        CAP
    }

    fn search(&self, query: &str) -> Result<Vec<Track>, SourceError> {
        let (status, body) = http::fetch_body(&self.client, self.search_request(query)?)?;
        let tracks = http::interpret(SERVICE, status, parse_search(&body))?;
        Ok(resolve_all(tracks, self.concurrency, |id| {
            self.resolve_stream(id)
        }))
    }
}
