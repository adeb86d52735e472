//! Repository-tree source with an on-disk cache.
//!
//! A recursive tree listing (`{"tree": [{"path": ...}, ...]}`) is turned into
//! folders by first path segment; audio files are served from `base_url`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::CatalogError;

use super::cache::CatalogCache;
use super::fetch::{Fetcher, asset_url};
use super::model::{Catalog, FolderInfo, Track, UNCATEGORIZED, has_audio_extension};
use super::source::{CatalogSource, RemoteAssets};

#[derive(Deserialize)]
struct TreeListing {
    tree: Vec<TreeEntry>,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

pub struct TreeSource {
    assets: RemoteAssets,
    tree_url: String,
    extensions: Vec<String>,
    cache: CatalogCache,
}

impl TreeSource {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        tree_url: &str,
        base_url: &str,
        extensions: Vec<String>,
        cache: CatalogCache,
    ) -> Self {
        Self {
            assets: RemoteAssets {
                fetcher,
                base_url: base_url.trim_end_matches('/').to_string(),
            },
            tree_url: tree_url.to_string(),
            extensions,
            cache,
        }
    }

    /// Identifies this source in the cache file; a cache written for another
    /// tree or base URL is never served.
    fn cache_key(&self) -> String {
        format!("{} {}", self.tree_url, self.assets.base_url)
    }

    pub(super) fn load_at(&self, now: DateTime<Utc>) -> Result<Catalog, CatalogError> {
        let key = self.cache_key();
        if let Some(catalog) = self.cache.read_fresh(&key, now) {
            info!(
                path = %self.cache.path().display(),
                tracks = catalog.track_count(),
                "using cached catalog"
            );
            return Ok(catalog);
        }

        let body = self.assets.fetcher.get_text(&self.tree_url)?;
        let listing: TreeListing =
            serde_json::from_str(&body).map_err(|e| CatalogError::decode(&self.tree_url, e))?;
        let catalog = build_catalog(listing, &self.assets.base_url, &self.extensions);
        info!(
            folders = catalog.folders.len(),
            tracks = catalog.track_count(),
            "loaded tree catalog"
        );

        if let Err(e) = self.cache.write(&key, &catalog, now) {
            warn!(error = %e, "could not persist catalog cache");
        }
        Ok(catalog)
    }
}

impl CatalogSource for TreeSource {
    fn load(&self) -> Result<Catalog, CatalogError> {
        self.load_at(Utc::now())
    }

    fn folder_info(&self, folder: &str) -> FolderInfo {
        self.assets.folder_info(folder)
    }

    fn cover_url(&self, folder: &str) -> Option<String> {
        self.assets.cover_url(folder)
    }
}

fn build_catalog(listing: TreeListing, base_url: &str, extensions: &[String]) -> Catalog {
    let mut catalog = Catalog {
        folders: Vec::new(),
        all_folder: true,
    };

    for entry in listing.tree {
        if entry.kind.as_deref() == Some("tree") {
            continue;
        }
        if !has_audio_extension(&entry.path, extensions) {
            continue;
        }

        let segments: Vec<&str> = entry
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let Some((&name, parents)) = segments.split_last() else {
            continue;
        };
        let folder = parents.first().copied().unwrap_or(UNCATEGORIZED);
        let url = asset_url(base_url, &segments);
        catalog.push(folder, Track::new(name, url, extensions));
    }

    catalog
}
