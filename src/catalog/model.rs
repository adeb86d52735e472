use serde::{Deserialize, Serialize};

/// Folder used for tracks that sit directly at the catalog root.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Synthetic folder listing every track of the catalog.
pub const ALL_FOLDER: &str = "all";

/// One playable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// File name, unique within its folder.
    pub name: String,
    /// Display name: `name` without its audio extension.
    pub title: String,
    pub audio_url: String,
}

impl Track {
    pub fn new(name: impl Into<String>, audio_url: impl Into<String>, extensions: &[String]) -> Self {
        let name = name.into();
        let title = strip_audio_extension(&name, extensions).to_string();
        Self {
            name,
            title,
            audio_url: audio_url.into(),
        }
    }
}

/// Title and blurb shown on an album card, read from a folder's `info.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FolderInfo {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl FolderInfo {
    /// Fallback used when a folder has no readable `info.json`.
    pub fn untitled(folder: &str) -> Self {
        Self {
            title: folder.to_string(),
            description: String::new(),
        }
    }
}

/// An album card: a folder plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub folder: String,
    pub info: FolderInfo,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    pub tracks: Vec<Track>,
}

/// Mapping from folder name to its ordered track list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub folders: Vec<Folder>,
    /// Whether the synthetic `all` folder is offered.
    #[serde(default)]
    pub all_folder: bool,
}

impl Catalog {
    /// Append `track` to `folder`, creating the folder on first use.
    pub fn push(&mut self, folder: &str, track: Track) {
        match self.folders.iter_mut().find(|f| f.name == folder) {
            Some(f) => f.tracks.push(track),
            None => self.folders.push(Folder {
                name: folder.to_string(),
                tracks: vec![track],
            }),
        }
    }

    /// Folder names in display order, with `all` first when offered.
    pub fn folder_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.folders.len() + 1);
        if self.all_folder && self.find(ALL_FOLDER).is_none() {
            names.push(ALL_FOLDER.to_string());
        }
        names.extend(self.folders.iter().map(|f| f.name.clone()));
        names
    }

    /// Tracks of `folder`, matched case-insensitively. Unknown folders are empty.
    pub fn tracks_in(&self, folder: &str) -> Vec<Track> {
        if let Some(f) = self.find(folder) {
            return f.tracks.clone();
        }
        if self.all_folder && folder.eq_ignore_ascii_case(ALL_FOLDER) {
            return self
                .folders
                .iter()
                .flat_map(|f| f.tracks.iter().cloned())
                .collect();
        }
        Vec::new()
    }

    pub fn track_count(&self) -> usize {
        self.folders.iter().map(|f| f.tracks.len()).sum()
    }

    fn find(&self, folder: &str) -> Option<&Folder> {
        self.folders
            .iter()
            .find(|f| f.name == folder)
            .or_else(|| self.folders.iter().find(|f| same_folder(&f.name, folder)))
    }
}

/// Case-insensitive folder comparison.
pub fn same_folder(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Whether `name` ends in one of `extensions` (case-insensitive, dot optional in config).
pub fn has_audio_extension(name: &str, extensions: &[String]) -> bool {
    audio_extension_len(name, extensions).is_some()
}

/// `name` without a trailing audio extension; other names are returned unchanged.
pub fn strip_audio_extension<'a>(name: &'a str, extensions: &[String]) -> &'a str {
    match audio_extension_len(name, extensions) {
        Some(len) => &name[..name.len() - len],
        None => name,
    }
}

fn audio_extension_len(name: &str, extensions: &[String]) -> Option<usize> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.'))
        .filter(|e| !e.is_empty())
        .any(|e| e.eq_ignore_ascii_case(ext))
        .then_some(ext.len() + 1)
}
