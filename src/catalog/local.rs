use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{CatalogError, FetchError};

use super::model::{Catalog, Folder, FolderInfo, Track, UNCATEGORIZED, has_audio_extension};
use super::source::CatalogSource;

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Albums laid out as `<root>/<folder>/<file>` on the local filesystem.
pub struct LocalSource {
    root: PathBuf,
    extensions: Vec<String>,
}

impl LocalSource {
    pub fn new(root: PathBuf, extensions: Vec<String>) -> Self {
        Self { root, extensions }
    }
}

impl CatalogSource for LocalSource {
    fn load(&self) -> Result<Catalog, CatalogError> {
        if !self.root.is_dir() {
            return Err(FetchError::Io {
                path: self.root.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            }
            .into());
        }

        let root = fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        let mut catalog = Catalog::default();
        for entry in WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(Result::ok)
        {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if !path.is_file() || !has_audio_extension(name, &self.extensions) {
                continue;
            }

            let folder = match path.strip_prefix(&root) {
                Ok(rel) if rel.components().count() > 1 => rel
                    .components()
                    .next()
                    .and_then(|c| c.as_os_str().to_str())
                    .unwrap_or(UNCATEGORIZED)
                    .to_string(),
                _ => UNCATEGORIZED.to_string(),
            };
            let url = path.to_string_lossy().into_owned();
            catalog.push(&folder, Track::new(name, url, &self.extensions));
        }

        catalog
            .folders
            .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        for Folder { tracks, .. } in &mut catalog.folders {
            tracks.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }

        info!(
            root = %self.root.display(),
            folders = catalog.folders.len(),
            tracks = catalog.track_count(),
            "scanned local catalog"
        );
        Ok(catalog)
    }

    fn folder_info(&self, folder: &str) -> FolderInfo {
        let path = self.root.join(folder).join("info.json");
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|body| serde_json::from_str::<FolderInfo>(&body).map_err(|e| e.to_string()));
        match parsed {
            Ok(info) => info,
            Err(e) => {
                debug!(folder, error = %e, "no folder info, using folder name");
                FolderInfo::untitled(folder)
            }
        }
    }

    fn cover_url(&self, folder: &str) -> Option<String> {
        let path = self.root.join(folder).join("cover.jpg");
        path.is_file().then(|| path.to_string_lossy().into_owned())
    }
}
