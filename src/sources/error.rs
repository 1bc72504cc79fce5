use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{service} API error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },
    #[error("{service} answered HTTP {status}")]
    Http {
        service: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("invalid catalog file '{path}': {source}")]
    Catalog {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
