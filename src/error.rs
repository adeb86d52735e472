//! Error types shared by the catalog, audio and runtime layers.

use thiserror::Error;

/// A failed network or disk read.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that prevents a catalog (or one folder of it) from loading.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("malformed catalog data from {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog cache error: {0}")]
    Cache(String),

    #[error("invalid catalog configuration: {0}")]
    Config(String),

    #[error("loading folder {0} aborted")]
    Aborted(String),
}

impl CatalogError {
    pub fn decode(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            origin: origin.into(),
            source,
        }
    }
}

/// A rejected attempt to start playback.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("no source loaded")]
    NoSource,

    #[error("audio thread is not running")]
    Disconnected,
}
