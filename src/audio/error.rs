use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("'{0}' has no playable stream")]
    NoStream(String),
    #[error("no track loaded")]
    NotLoaded,
    #[error("failed to fetch stream: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode stream: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("no audio output device")]
    NoOutput,
    #[error("media backend is not running")]
    Disconnected,
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("mpv IPC error: {0}")]
    Ipc(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapError {
    #[error("audio output is unavailable")]
    Closed,
    #[error("signal is already attached to an analyser")]
    Busy,
}
