use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/lenify/config.toml` or `~/.config/lenify/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `LENIFY__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub catalog: CatalogSettings,
    pub audio: AudioSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub playback: PlaybackSettings,
    pub log: LogSettings,
}

/// Where the album catalog comes from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// A `tracks.json` manifest mapping folder -> `[{name}]`.
    #[serde(alias = "json", alias = "tracks-json")]
    Manifest,
    /// A recursive repository tree listing, cached on disk.
    #[serde(alias = "cdn", alias = "github")]
    Tree,
    /// An HTML directory listing.
    #[serde(alias = "scrape", alias = "directory")]
    Listing,
    /// A directory on the local filesystem.
    #[serde(alias = "dir", alias = "filesystem")]
    Local,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub source: SourceKind,
    /// Root that folder assets (`info.json`, `cover.jpg`, audio files) live under.
    pub base_url: String,
    /// Manifest file name, relative to `base_url`.
    pub manifest_file: String,
    /// Recursive tree endpoint used by the `tree` source.
    pub tree_url: String,
    /// Directory listing page used by the `listing` source. Defaults to `base_url`.
    pub listing_url: Option<String>,
    /// Root directory used by the `local` source.
    pub local_dir: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// How long a cached tree catalog stays fresh.
    pub cache_ttl_hours: u64,
    /// Cache file location. Defaults to `$XDG_CACHE_HOME/lenify/catalog.json`.
    pub cache_file: Option<PathBuf>,
    /// Per-request timeout. Unset means requests never time out.
    pub request_timeout_secs: Option<u64>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            source: SourceKind::Manifest,
            base_url: "https://cdn.jsdelivr.net/gh/mahadrehmann/lenify-tracks@main".to_string(),
            manifest_file: "tracks.json".to_string(),
            tree_url:
                "https://api.github.com/repos/mahadrehmann/lenify-tracks/git/trees/main?recursive=1"
                    .to_string(),
            listing_url: None,
            local_dir: None,
            extensions: vec!["mp3".into()],
            cache_ttl_hours: 12,
            cache_file: None,
            request_timeout_secs: None,
        }
    }
}

impl CatalogSettings {
    /// The listing page, falling back to `base_url` with a trailing slash.
    pub fn listing_url(&self) -> String {
        match &self.listing_url {
            Some(u) if !u.trim().is_empty() => u.trim().to_string(),
            _ => format!("{}/", self.base_url.trim_end_matches('/')),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Volume the player starts with (0.0 - 1.0).
    pub initial_volume: f32,
    /// Volume restored when un-muting (0.0 - 1.0). The previous level is not remembered.
    pub unmute_volume: f32,
    /// Amount `+` / `-` change the volume by.
    pub volume_step: f32,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            initial_volume: 1.0,
            unmute_volume: 0.10,
            volume_step: 0.05,
            quit_fade_out_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// How long transient notifications (e.g. "Loop on") stay on screen.
    pub notification_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ lenify ~ ".to_string(),
            notification_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self { scrub_seconds: 5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether choosing an album starts its first track right away.
    pub autoplay_on_album_select: bool,
    /// Album opened (paused) at startup.
    pub initial_folder: Option<String>,
    /// Whether the loop flag starts enabled.
    pub looping: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            autoplay_on_album_select: true,
            initial_folder: None,
            looping: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive used when `LENIFY_LOG` is unset (e.g. "info", "lenify=debug").
    pub level: String,
    /// Log file. Defaults to `$XDG_STATE_HOME/lenify/lenify.log`.
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
