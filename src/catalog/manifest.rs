//! `tracks.json` manifest source.
//!
//! The manifest maps folder names to arrays of `{ "name": "<file>" }`
//! descriptors. Folder order in the document is kept.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::error::CatalogError;

use super::fetch::{Fetcher, asset_url};
use super::model::{Catalog, Folder, FolderInfo, Track};
use super::source::{CatalogSource, RemoteAssets};

#[derive(Deserialize)]
struct TrackDescriptor {
    name: String,
}

pub struct ManifestSource {
    assets: RemoteAssets,
    manifest_url: String,
    extensions: Vec<String>,
}

impl ManifestSource {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        base_url: &str,
        manifest_file: &str,
        extensions: Vec<String>,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let manifest_url = format!("{}/{}", base_url, manifest_file.trim_start_matches('/'));
        Self {
            assets: RemoteAssets { fetcher, base_url },
            manifest_url,
            extensions,
        }
    }
}

impl CatalogSource for ManifestSource {
    fn load(&self) -> Result<Catalog, CatalogError> {
        let body = self.assets.fetcher.get_text(&self.manifest_url)?;
        let catalog = parse_manifest(&body, &self.assets.base_url, &self.extensions)
            .map_err(|e| CatalogError::decode(&self.manifest_url, e))?;
        info!(
            folders = catalog.folders.len(),
            tracks = catalog.track_count(),
            "loaded manifest catalog"
        );
        Ok(catalog)
    }

    fn folder_info(&self, folder: &str) -> FolderInfo {
        self.assets.folder_info(folder)
    }

    fn cover_url(&self, folder: &str) -> Option<String> {
        self.assets.cover_url(folder)
    }
}

pub(super) fn parse_manifest(
    body: &str,
    base_url: &str,
    extensions: &[String],
) -> Result<Catalog, serde_json::Error> {
    let doc: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body)?;
    let mut catalog = Catalog::default();
    for (folder, entries) in doc {
        let entries: Vec<TrackDescriptor> = serde_json::from_value(entries)?;
        let tracks = entries
            .into_iter()
            .map(|d| {
                let url = asset_url(base_url, &[&folder, &d.name]);
                Track::new(d.name, url, extensions)
            })
            .collect();
        catalog.folders.push(Folder {
            name: folder,
            tracks,
        });
    }
    Ok(catalog)
}
