//! Jamendo catalog backend. Tracks come with a direct MP3 stream URL.

use reqwest::blocking::{Client, Request};
use serde::Deserialize;

use super::error::SourceError;
use super::model::Track;
use super::{TrackSource, decode_entities, finalize, http};

const SERVICE: &str = "Jamendo";
const TRACKS_URL: &str = "https://api.jamendo.com/v3.0/tracks/";
pub const CAP: usize = 10;

pub struct JamendoSource {
    client: Client,
    client_id: String,
}

#[derive(Deserialize)]
struct TracksResponse {
    headers: Headers,
    #[serde(default)]
    results: Vec<JamendoTrack>,
}

#[derive(Deserialize)]
struct Headers {
    status: String,
    #[serde(default)]
    error_message: String,
}

#[derive(Deserialize)]
struct JamendoTrack {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artist_name: String,
    image: Option<String>,
    audio: Option<String>,
    #[serde(default)]
    duration: f64,
}

impl JamendoSource {
    pub fn new(client_id: String) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::client()?,
            client_id,
        })
    }

    fn search_request(&self, query: &str) -> Result<Request, SourceError> {
        let limit = CAP.to_string();
        Ok(self
            .client
            .get(TRACKS_URL)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("search", query.trim()),
                ("audioformat", "mp32"),
            ])
            .build()?)
    }
}

/// Jamendo ids arrive as strings, older endpoints send numbers.
fn id_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

pub(crate) fn parse_search(body: &str) -> Result<Vec<Track>, SourceError> {
    let resp: TracksResponse = serde_json::from_str(body)?;
    if resp.headers.status != "success" {
        let message = if resp.headers.error_message.trim().is_empty() {
            format!("status '{}'", resp.headers.status)
        } else {
            resp.headers.error_message
        };
        return Err(SourceError::Upstream {
            service: SERVICE,
            message,
        });
    }

    let tracks = resp
        .results
        .into_iter()
        .map(|t| Track {
            id: id_string(&t.id),
            title: decode_entities(&t.name),
            artist_name: decode_entities(&t.artist_name),
            image_url: non_empty(t.image),
            stream_url: non_empty(t.audio),
            duration: Track::seconds(t.duration),
        })
        .collect();

    Ok(finalize(tracks, CAP))
}

impl TrackSource for JamendoSource {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn cap(&self) -> usize {
        CAP
    }

    fn search(&self, query: &str) -> Result<Vec<Track>, SourceError> {
        let (status, body) = http::fetch_body(&self.client, self.search_request(query)?)?;
        http::interpret(SERVICE, status, parse_search(&body))
    }
}
