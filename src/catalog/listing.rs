//! HTML directory-listing source.
//!
//! The root listing links to one sub-directory per folder; each folder
//! listing links to its audio files. Anchor targets may use `\` separators.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use reqwest::Url;
use tracing::{debug, info};

use crate::error::CatalogError;

use super::fetch::{Fetcher, last_segment};
use super::model::{Catalog, Folder, FolderInfo, Track, UNCATEGORIZED, has_audio_extension, same_folder};
use super::source::{CatalogSource, RemoteAssets};

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("anchor pattern is valid")
});

/// Links found on one listing page.
#[derive(Debug, Default)]
pub(super) struct ListingPage {
    pub folders: Vec<(String, Url)>,
    pub tracks: Vec<Track>,
}

pub struct ListingSource {
    assets: RemoteAssets,
    root: Url,
    extensions: Vec<String>,
}

impl ListingSource {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        listing_url: &str,
        extensions: Vec<String>,
    ) -> Result<Self, CatalogError> {
        let root = directory_url(listing_url)?;
        Ok(Self {
            assets: RemoteAssets {
                fetcher,
                base_url: root.as_str().trim_end_matches('/').to_string(),
            },
            root,
            extensions,
        })
    }

    fn page(&self, url: &Url) -> Result<ListingPage, CatalogError> {
        let html = self.assets.fetcher.get_text(url.as_str())?;
        Ok(parse_listing(&html, url, &self.extensions))
    }
}

impl CatalogSource for ListingSource {
    fn load(&self) -> Result<Catalog, CatalogError> {
        let root = self.page(&self.root)?;
        let mut catalog = Catalog::default();
        if !root.tracks.is_empty() {
            catalog.folders.push(Folder {
                name: UNCATEGORIZED.to_string(),
                tracks: root.tracks,
            });
        }
        for (name, url) in root.folders {
            let page = self.page(&url)?;
            catalog.folders.push(Folder {
                name,
                tracks: page.tracks,
            });
        }
        info!(
            folders = catalog.folders.len(),
            tracks = catalog.track_count(),
            "loaded directory listing catalog"
        );
        Ok(catalog)
    }

    fn load_folder(&self, folder: &str) -> Result<Vec<Track>, CatalogError> {
        let root = self.page(&self.root)?;
        if let Some((_, url)) = root.folders.iter().find(|(name, _)| same_folder(name, folder)) {
            return Ok(self.page(url)?.tracks);
        }
        if same_folder(folder, UNCATEGORIZED) {
            return Ok(root.tracks);
        }
        debug!(folder, "folder not present in listing");
        Ok(Vec::new())
    }

    fn folder_info(&self, folder: &str) -> FolderInfo {
        self.assets.folder_info(folder)
    }

    fn cover_url(&self, folder: &str) -> Option<String> {
        self.assets.cover_url(folder)
    }
}

/// Parse `listing_url`, making sure it ends in `/` so relative links resolve inside it.
fn directory_url(listing_url: &str) -> Result<Url, CatalogError> {
    let mut s = listing_url.trim().replace('\\', "/");
    if !s.ends_with('/') {
        s.push('/');
    }
    Url::parse(&s).map_err(|e| CatalogError::Config(format!("bad listing url {listing_url}: {e}")))
}

pub(super) fn parse_listing(html: &str, page: &Url, extensions: &[String]) -> ListingPage {
    let mut out = ListingPage::default();

    for cap in HREF.captures_iter(html) {
        let Some(raw) = cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)) else {
            continue;
        };
        let href = raw.as_str().trim().replace('\\', "/");
        if href.is_empty() || href.starts_with('?') || href.starts_with('#') {
            continue;
        }
        let Ok(target) = page.join(&href) else {
            continue;
        };
        // Only entries below this page count; parent and sibling links are navigation.
        if target.path() == page.path() || !target.path().starts_with(page.path()) {
            continue;
        }

        let path = target.path().to_string();
        if path.ends_with('/') {
            let name = last_segment(&path);
            if !name.is_empty() && !out.folders.iter().any(|(n, _)| *n == name) {
                out.folders.push((name, target));
            }
        } else if has_audio_extension(&path, extensions) {
            let name = last_segment(&path);
            if out.tracks.iter().any(|t| t.name == name) {
                continue;
            }
            out.tracks.push(Track::new(name, target.as_str(), extensions));
        }
    }

    out
}
