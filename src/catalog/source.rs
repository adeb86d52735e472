use std::sync::Arc;

use tracing::debug;

use crate::config::{CatalogSettings, SourceKind, default_cache_path};
use crate::error::CatalogError;

use super::cache::CatalogCache;
use super::fetch::{Fetcher, asset_url};
use super::listing::ListingSource;
use super::local::LocalSource;
use super::manifest::ManifestSource;
use super::model::{Album, Catalog, FolderInfo, Track};
use super::tree::TreeSource;

/// A place albums and their tracks are read from.
pub trait CatalogSource: Send + Sync {
    /// Load the whole catalog.
    fn load(&self) -> Result<Catalog, CatalogError>;

    /// Load the tracks of one folder (case-insensitive). Unknown folders are empty.
    fn load_folder(&self, folder: &str) -> Result<Vec<Track>, CatalogError> {
        Ok(self.load()?.tracks_in(folder))
    }

    /// Card metadata for `folder`; never fails.
    fn folder_info(&self, folder: &str) -> FolderInfo {
        FolderInfo::untitled(folder)
    }

    /// Conventional cover image location for `folder`.
    fn cover_url(&self, _folder: &str) -> Option<String> {
        None
    }

    /// Build the album cards for every folder of `catalog`.
    fn albums(&self, catalog: &Catalog) -> Vec<Album> {
        catalog
            .folder_names()
            .into_iter()
            .map(|folder| Album {
                info: self.folder_info(&folder),
                cover_url: self.cover_url(&folder),
                folder,
            })
            .collect()
    }
}

/// `info.json` / `cover.jpg` living next to each folder under a base URL.
pub(super) struct RemoteAssets {
    pub fetcher: Arc<dyn Fetcher>,
    pub base_url: String,
}

impl RemoteAssets {
    pub fn folder_info(&self, folder: &str) -> FolderInfo {
        let url = asset_url(&self.base_url, &[folder, "info.json"]);
        let body = match self.fetcher.get_text(&url) {
            Ok(b) => b,
            Err(e) => {
                debug!(folder, error = %e, "no folder info, using folder name");
                return FolderInfo::untitled(folder);
            }
        };
        match serde_json::from_str::<FolderInfo>(&body) {
            Ok(info) => info,
            Err(e) => {
                debug!(folder, error = %e, "unreadable folder info, using folder name");
                FolderInfo::untitled(folder)
            }
        }
    }

    pub fn cover_url(&self, folder: &str) -> Option<String> {
        Some(asset_url(&self.base_url, &[folder, "cover.jpg"]))
    }
}

/// Build the configured catalog source.
pub fn source_from_settings(
    settings: &CatalogSettings,
    fetcher: Arc<dyn Fetcher>,
) -> Result<Arc<dyn CatalogSource>, CatalogError> {
    let extensions = settings.extensions.clone();
    let source: Arc<dyn CatalogSource> = match settings.source {
        SourceKind::Manifest => Arc::new(ManifestSource::new(
            fetcher,
            &settings.base_url,
            &settings.manifest_file,
            extensions,
        )),
        SourceKind::Tree => {
            let path = settings
                .cache_file
                .clone()
                .or_else(default_cache_path)
                .ok_or_else(|| CatalogError::Config("no cache location available".into()))?;
            let cache = CatalogCache::new(path, settings.cache_ttl_hours);
            Arc::new(TreeSource::new(
                fetcher,
                &settings.tree_url,
                &settings.base_url,
                extensions,
                cache,
            ))
        }
        SourceKind::Listing => Arc::new(ListingSource::new(
            fetcher,
            &settings.listing_url(),
            extensions,
        )?),
        SourceKind::Local => {
            let dir = settings
                .local_dir
                .clone()
                .ok_or_else(|| CatalogError::Config("catalog.local_dir is not set".into()))?;
            Arc::new(LocalSource::new(dir, extensions))
        }
    };
    Ok(source)
}
