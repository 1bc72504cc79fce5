//! YouTube Data API v3 search backend.
//!
//! Results are music videos; their stream reference is the watch page URL, which
//! only the mpv backend can play.

use reqwest::blocking::{Client, Request};
use serde::Deserialize;

use super::error::SourceError;
use super::model::Track;
use super::{TrackSource, decode_entities, finalize, http};

const SERVICE: &str = "YouTube";
const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
pub const CAP: usize = 20;

pub struct YoutubeSource {
    client: Client,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct Item {
    id: ItemId,
    snippet: Option<Snippet>,
}

#[derive(Deserialize)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(rename = "channelTitle", default)]
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
    #[serde(rename = "default")]
    fallback: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

impl YoutubeSource {
    pub fn new(api_key: String) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::client()?,
            api_key,
        })
    }

    fn search_request(&self, query: &str) -> Result<Request, SourceError> {
        let q = format!("{} music", query.trim());
        let limit = CAP.to_string();
        Ok(self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("maxResults", limit.as_str()),
                ("q", q.as_str()),
                ("type", "video"),
                ("videoCategoryId", "10"),
                ("key", self.api_key.as_str()),
            ])
            .build()?)
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

pub(crate) fn parse_search(body: &str) -> Result<Vec<Track>, SourceError> {
    let resp: SearchResponse = serde_json::from_str(body)?;
    if let Some(err) = resp.error {
        return Err(SourceError::Upstream {
            service: SERVICE,
            message: err.message,
        });
    }

    let tracks = resp
        .items
        .into_iter()
        .filter_map(|item| {
            // Channel and playlist hits carry no videoId.
            let id = item.id.video_id?;
            let snippet = item.snippet?;
            let thumbs = snippet.thumbnails;
            let image_url = thumbs
                .medium
                .or(thumbs.high)
                .or(thumbs.fallback)
                .map(|t| t.url);
            Some(Track {
                stream_url: Some(watch_url(&id)),
                id,
                title: decode_entities(&snippet.title),
                artist_name: decode_entities(&snippet.channel_title),
                image_url,
                duration: None,
            })
        })
        .collect();

    Ok(finalize(tracks, CAP))
}

impl TrackSource for YoutubeSource {
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
