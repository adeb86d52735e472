use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::app::{App, Command};
use crate::audio::AudioHandle;
use crate::catalog::{
    Album, CatalogSource, Fetcher, FolderLoader, HttpFetcher, same_folder, source_from_settings,
};
use crate::config;
use crate::error::CatalogError;

/// Everything the event loop needs that comes from the catalog.
pub struct Bootstrap {
    pub fetcher: Arc<dyn Fetcher>,
    pub source: Arc<dyn CatalogSource>,
    pub albums: Vec<Album>,
}

/// Build the catalog source and load the album cards. A failure here is fatal.
pub fn load_catalog(settings: &config::Settings) -> Result<Bootstrap, CatalogError> {
    let timeout = settings.catalog.request_timeout_secs.map(Duration::from_secs);
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(timeout)?);
    let source = source_from_settings(&settings.catalog, fetcher.clone())?;

    let catalog = source.load()?;
    let albums = source.albums(&catalog);
    info!(
        source = ?settings.catalog.source,
        folders = albums.len(),
        tracks = catalog.track_count(),
        "catalog loaded"
    );

    Ok(Bootstrap {
        fetcher,
        source,
        albums,
    })
}

/// Push the configured playback defaults into the handle and open the
/// initial album, if any.
pub fn apply_playback_defaults(
    app: &mut App,
    audio: &mut impl AudioHandle,
    loader: &FolderLoader,
    settings: &config::Settings,
) {
    audio.set_volume(settings.audio.initial_volume);
    audio.set_looping(settings.playback.looping);

    let folder = settings
        .playback
        .initial_folder
        .clone()
        .or_else(|| app.albums.first().map(|a| a.folder.clone()));
    if let Some(folder) = folder {
        if let Some(pos) = app
            .albums
            .iter()
            .position(|a| same_folder(&a.folder, &folder))
        {
            app.album_cursor = pos;
        }
        // The first album opens paused; nothing plays until asked.
        if let Some(req) = app.apply(
            Command::SelectAlbum {
                folder,
                autoplay: false,
            },
            audio,
        ) {
            loader.request(req);
        }
    }
}
