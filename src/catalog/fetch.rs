//! Network access for catalog sources and the audio thread.
//!
//! Everything that leaves the process goes through the `Fetcher` trait so
//! sources can be exercised against canned responses.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::{CatalogError, FetchError};

pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body as text.
    fn get_text(&self, url: &str) -> Result<String, FetchError>;

    /// GET `url` (or read it from disk when it is not an `http(s)` URL).
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// `Fetcher` backed by a blocking `reqwest` client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client. `timeout = None` leaves requests unbounded.
    pub fn new(timeout: Option<Duration>) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(concat!("lenify/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, FetchError> {
        debug!(url, "GET");
        let resp = self.client.get(url).send().map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

impl Fetcher for HttpFetcher {
    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        if !is_remote(url) {
            let bytes = read_local(url)?;
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }
        self.get(url)?.text().map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if !is_remote(url) {
            return read_local(url);
        }
        let body = self.get(url)?.bytes().map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        Ok(body.to_vec())
    }
}

/// Whether `url` must be fetched over HTTP.
pub fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn read_local(url: &str) -> Result<Vec<u8>, FetchError> {
    let path = url.strip_prefix("file://").unwrap_or(url);
    std::fs::read(path).map_err(|source| FetchError::Io {
        path: path.to_string(),
        source,
    })
}

/// Join `base` and URI-component-encoded `segments` with `/`.
pub fn asset_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for seg in segments {
        url.push('/');
        url.push_str(&urlencoding::encode(seg));
    }
    url
}

/// The percent-decoded last path segment of `url`.
pub fn last_segment(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let seg = path
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(path);
    urlencoding::decode(seg)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| seg.to_string())
}
