use crate::catalog::{FolderLoaded, FolderRequest, Track};
use crate::error::CatalogError;

/// Everything the player controller reacts to.
#[derive(Debug)]
pub enum Command {
    Play,
    Pause,
    TogglePlayPause,
    /// Jump to a fraction of the current track, `0.0..=1.0`.
    Seek(f64),
    SetVolume(f32),
    ToggleMute,
    ToggleLoop,
    SelectTrack {
        index: usize,
        autoplay: bool,
    },
    SelectAlbum {
        folder: String,
        autoplay: bool,
    },
    /// A folder load requested by `SelectAlbum` has finished.
    FolderLoaded {
        request: FolderRequest,
        result: Result<Vec<Track>, CatalogError>,
    },
    Next,
    Previous,
    /// Refresh the time text and seek bar from the audio handle.
    TimeUpdate,
}

impl From<FolderLoaded> for Command {
    fn from(loaded: FolderLoaded) -> Self {
        Command::FolderLoaded {
            request: loaded.request,
            result: loaded.result,
        }
    }
}
