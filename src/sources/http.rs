//! Thin helpers over the blocking `reqwest` client shared by the HTTP backends.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Request};

use super::error::SourceError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Upper bound for a whole search request, body included.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub(crate) fn client() -> Result<Client, SourceError> {
    build_client(CONNECT_TIMEOUT, REQUEST_TIMEOUT)
}

fn build_client(connect: Duration, total: Duration) -> Result<Client, SourceError> {
    Ok(Client::builder()
        .user_agent(concat!("audiowave/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(connect)
        .timeout(total)
        .build()?)
}

/// Execute `request` and return the status together with the raw body.
///
/// Upstream APIs report their own errors in non-2xx bodies, so the status is
/// not checked here; see [`interpret`].
pub(crate) fn fetch_body(client: &Client, request: Request) -> Result<(StatusCode, String), SourceError> {
    log::debug!("GET {}", redact(request.url()));
    let response = client.execute(request)?;
    let status = response.status();
    let body = response.text()?;
    Ok((status, body))
}

/// Prefer the upstream's own error over the HTTP status; an unparsable error
/// page becomes [`SourceError::Http`].
pub(crate) fn interpret<T>(
    service: &'static str,
    status: StatusCode,
    parsed: Result<T, SourceError>,
) -> Result<T, SourceError> {
    match parsed {
        Err(SourceError::Parse(_)) if !status.is_success() => {
            Err(SourceError::Http { service, status })
        }
        Ok(_) if !status.is_success() => Err(SourceError::Http { service, status }),
        other => other,
    }
}

/// Strip credentials from a URL before it reaches the log.
fn redact(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if matches!(k.as_ref(), "key" | "client_id") {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    if !pairs.is_empty() {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url.to_string()
}
