use std::path::PathBuf;

use serde::Deserialize;

/// Credential used when neither the config file nor the environment provide one.
pub const FALLBACK_API_KEY: &str = "audiowave-public";

/// Environment variable consulted for the API credential when the config leaves it unset.
pub const API_KEY_ENV: &str = "AUDIOWAVE_API_KEY";

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/audiowave/config.toml` or `~/.config/audiowave/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `AUDIOWAVE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub controls: ControlsSettings,
    pub visualizer: VisualizerSettings,
    pub ui: UiSettings,
    pub log: LogSettings,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    #[serde(alias = "yt")]
    Youtube,
    Jamendo,
    #[serde(alias = "saavn")]
    Proxy,
    #[serde(alias = "local", alias = "static")]
    Catalog,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Which catalog answers searches.
    pub kind: SourceKind,
    /// API credential (YouTube key or Jamendo client id).
    pub api_key: Option<String>,
    /// Query searched once at startup. Empty disables the startup search.
    pub initial_query: String,
    /// Base URL of the music-proxy API.
    pub proxy_base_url: String,
    /// How many stream URLs the proxy backend resolves at once.
    pub resolve_concurrency: usize,
    /// Optional TOML file listing extra catalog tracks.
    pub catalog_file: Option<PathBuf>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: SourceKind::Catalog,
            api_key: None,
            initial_query: "popular music 2024".to_string(),
            proxy_base_url: "https://saavn.dev".to_string(),
            resolve_concurrency: 4,
            catalog_file: None,
        }
    }
}

impl SourceSettings {
    /// Resolve the API credential: config value, then `AUDIOWAVE_API_KEY`, then the fallback.
    pub fn credential(&self) -> String {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| {
                std::env::var(API_KEY_ENV)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
            })
            .unwrap_or_else(|| FALLBACK_API_KEY.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Local directory merged into the catalog backend. Unset means built-in tracks only.
    pub dir: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            dir: None,
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// `mpv` for YouTube results, `rodio` for everything else.
    Auto,
    Rodio,
    Mpv,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub backend: BackendKind,
    /// Starting volume in `[0, 1]`.
    pub volume: f32,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// Executable used by the mpv backend.
    pub mpv_path: String,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            volume: 0.7,
            quit_fade_out_ms: 300,
            mpv_path: "mpv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to seek when pressing `H` / `L`.
    pub seek_seconds: u64,
    /// Volume change per `-` / `+` press.
    pub volume_step: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            seek_seconds: 5,
            volume_step: 0.05,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisualizerSettings {
    /// Whether the spectrum pane starts visible.
    pub enabled: bool,
    /// Transform window size; must be a power of two in `[32, 32768]`.
    pub fft_size: usize,
    /// Smoothing time constant in `[0, 1]`.
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
    /// Animation frames per second.
    pub fps: u32,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            fps: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Which track fields to show in the list and the now-playing panel, and in what order.
    ///
    /// Example: ["artist", "title"]
    pub track_fields: Vec<TrackDisplayField>,

    /// Separator used to join `track_fields`.
    pub track_separator: String,

    /// Which time fields to show in the now-playing panel, and in what order.
    ///
    /// Example: ["elapsed", "total", "remaining"]
    pub now_playing_time_fields: Vec<TimeField>,

    /// Separator used to join `now_playing_time_fields`.
    pub now_playing_time_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ audiowave ~ ".to_string(),
            track_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            track_separator: " - ".to_string(),
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total],
            now_playing_time_separator: " / ".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    Title,
    Artist,
    Duration,
    Id,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `env_logger` filter, e.g. `info` or `audiowave=debug`. `RUST_LOG` wins when set.
    pub level: String,
    /// Log file. Defaults to `$XDG_STATE_HOME/audiowave/audiowave.log`.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
