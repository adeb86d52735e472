//! Application model: the single owner of player state.
//!
//! `App` holds the album cards, the loaded track list, cursor positions and
//! the text shown in the now-playing block. Every change goes through
//! `App::apply`, which also drives the `AudioHandle`.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::audio::AudioHandle;
use crate::catalog::{Album, FolderRequest, Track, last_segment};
use crate::config::Settings;

use super::command::Command;
use super::time::seconds_to_minutes_seconds;

pub const EMPTY_TIME_TEXT: &str = "00:00 / 00:00";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// Nothing loaded.
    #[default]
    Idle,
    Paused,
    Playing,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Albums,
    Tracks,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VolumeIcon {
    Muted,
    Audible,
}

impl VolumeIcon {
    pub fn for_level(volume: f32) -> Self {
        if volume > 0.0 {
            Self::Audible
        } else {
            Self::Muted
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Muted => "🔇",
            Self::Audible => "🔊",
        }
    }
}

/// A short message shown on top of the UI until it expires.
#[derive(Clone, Debug)]
pub struct Notification {
    pub text: String,
    shown_at: Instant,
    ttl: Duration,
}

impl Notification {
    pub fn new(text: impl Into<String>, shown_at: Instant, ttl: Duration) -> Self {
        Self {
            text: text.into(),
            shown_at,
            ttl,
        }
    }

    pub fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.ttl
    }
}

/// The main application model.
pub struct App {
    pub albums: Vec<Album>,
    pub album_cursor: usize,
    pub track_cursor: usize,
    pub focus: Pane,
    pub album_window: bool,

    /// Folder whose tracks are listed.
    pub current_folder: Option<String>,
    pub tracks: Vec<Track>,
    /// Index of the track whose URL is the handle's source.
    pub current_track: Option<usize>,

    pub state: PlayerState,
    pub time_text: String,
    /// Seek bar position, `0.0..=1.0`.
    pub progress: f64,
    pub volume: f32,
    pub looping: bool,

    pub notification: Option<Notification>,
    /// Last catalog failure, shown on the status line.
    pub error: Option<String>,

    pending_request: Option<u64>,
    next_request_id: u64,
    unmute_volume: f32,
    notification_ttl: Duration,
}

impl App {
    pub fn new(albums: Vec<Album>, settings: &Settings) -> Self {
        Self {
            albums,
            album_cursor: 0,
            track_cursor: 0,
            focus: Pane::Albums,
            album_window: false,

            current_folder: None,
            tracks: Vec::new(),
            current_track: None,

            state: PlayerState::Idle,
            time_text: EMPTY_TIME_TEXT.to_string(),
            progress: 0.0,
            volume: settings.audio.initial_volume,
            looping: settings.playback.looping,

            notification: None,
            error: None,

            pending_request: None,
            next_request_id: 1,
            unmute_volume: settings.audio.unmute_volume,
            notification_ttl: Duration::from_millis(settings.ui.notification_ms),
        }
    }

    /// Whether a folder load is in flight.
    pub fn loading(&self) -> bool {
        self.pending_request.is_some()
    }

    pub fn volume_icon(&self) -> VolumeIcon {
        VolumeIcon::for_level(self.volume)
    }

    pub fn current_title(&self) -> Option<&str> {
        self.current_track
            .and_then(|i| self.tracks.get(i))
            .map(|t| t.title.as_str())
    }

    pub fn selected_album(&self) -> Option<&Album> {
        self.albums.get(self.album_cursor)
    }

    /// Index of the track `src` points at. An exact URL wins; the trailing
    /// file name is only consulted when no URL matches.
    pub fn position_of(&self, src: &str) -> Option<usize> {
        if src.is_empty() {
            return None;
        }
        if let Some(idx) = self.tracks.iter().position(|t| t.audio_url == src) {
            return Some(idx);
        }
        let name = last_segment(src);
        self.tracks.iter().position(|t| t.name == name)
    }

    /// Apply one command. Returns a folder request when the runtime has to
    /// start a catalog load.
    pub fn apply(&mut self, cmd: Command, audio: &mut impl AudioHandle) -> Option<FolderRequest> {
        let mut request = None;

        match cmd {
            Command::Play => self.start(audio),

            Command::Pause => audio.pause(),

            Command::TogglePlayPause => {
                if audio.paused() {
                    self.start(audio);
                } else {
                    audio.pause();
                }
            }

            Command::Seek(fraction) => {
                if fraction.is_finite() {
                    if let Some(total) = audio.duration().filter(|d| !d.is_zero()) {
                        audio.set_current_time(total.mul_f64(fraction.clamp(0.0, 1.0)));
                        self.refresh_time(audio);
                    }
                }
            }

            Command::SetVolume(level) => {
                if !level.is_nan() {
                    audio.set_volume(level.clamp(0.0, 1.0));
                }
            }

            Command::ToggleMute => {
                let level = if audio.volume() > 0.0 {
                    0.0
                } else {
                    self.unmute_volume
                };
                audio.set_volume(level);
            }

            Command::ToggleLoop => {
                let on = !audio.looping();
                audio.set_looping(on);
                let text = if on { "Loop on" } else { "Loop off" };
                self.notify(text, Instant::now());
            }

            Command::SelectTrack { index, autoplay } => self.select_track(index, autoplay, audio),

            Command::SelectAlbum { folder, autoplay } => {
                let id = self.next_request_id;
                self.next_request_id += 1;
                self.pending_request = Some(id);
                self.error = None;
                debug!(id, folder = %folder, "requesting folder");
                request = Some(FolderRequest {
                    id,
                    folder,
                    autoplay,
                });
            }

            Command::FolderLoaded { request: done, result } => {
                if self.pending_request != Some(done.id) {
                    debug!(id = done.id, folder = %done.folder, "dropping stale folder result");
                } else {
                    self.pending_request = None;
                    match result {
                        Ok(tracks) => self.show_folder(done.folder, tracks, done.autoplay, audio),
                        Err(e) => {
                            warn!(folder = %done.folder, error = %e, "cannot load folder");
                            self.error = Some(format!("cannot load {}: {e}", done.folder));
                        }
                    }
                }
            }

            Command::Next => {
                if let Some(i) = self.position_of(audio.src()) {
                    if i + 1 < self.tracks.len() {
                        self.select_track(i + 1, true, audio);
                    }
                }
            }

            Command::Previous => {
                if let Some(i) = self.position_of(audio.src()) {
                    if i > 0 {
                        self.select_track(i - 1, true, audio);
                    }
                }
            }

            Command::TimeUpdate => {
                self.refresh_time(audio);
                self.expire_notification(Instant::now());
            }
        }

        self.sync(audio);
        request
    }

    fn start(&mut self, audio: &mut impl AudioHandle) {
        // A rejected play leaves the handle paused; nothing is surfaced.
        if let Err(e) = audio.play() {
            debug!(src = audio.src(), error = %e, "play rejected");
        }
    }

    fn select_track(&mut self, index: usize, autoplay: bool, audio: &mut impl AudioHandle) {
        let Some(url) = self.tracks.get(index).map(|t| t.audio_url.clone()) else {
            return;
        };
        audio.set_src(&url);
        self.current_track = Some(index);
        self.track_cursor = index;
        self.time_text = EMPTY_TIME_TEXT.to_string();
        self.progress = 0.0;
        if autoplay {
            self.start(audio);
        }
    }

    fn show_folder(
        &mut self,
        folder: String,
        tracks: Vec<Track>,
        autoplay: bool,
        audio: &mut impl AudioHandle,
    ) {
        debug!(folder = %folder, count = tracks.len(), "folder loaded");
        self.current_folder = Some(folder);
        self.tracks = tracks;
        self.track_cursor = 0;
        self.current_track = None;
        if self.tracks.is_empty() {
            audio.set_src("");
            self.time_text = EMPTY_TIME_TEXT.to_string();
            self.progress = 0.0;
        } else {
            self.select_track(0, autoplay, audio);
        }
    }

    fn refresh_time(&mut self, audio: &impl AudioHandle) {
        let elapsed = audio.current_time().as_secs_f64();
        let total = audio.duration().map_or(f64::NAN, |d| d.as_secs_f64());
        self.time_text = format!(
            "{} / {}",
            seconds_to_minutes_seconds(elapsed),
            seconds_to_minutes_seconds(total)
        );
        self.progress = if total > 0.0 {
            (elapsed / total).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    fn sync(&mut self, audio: &impl AudioHandle) {
        self.state = if audio.src().is_empty() {
            PlayerState::Idle
        } else if audio.paused() {
            PlayerState::Paused
        } else {
            PlayerState::Playing
        };
        self.volume = audio.volume();
        self.looping = audio.looping();
    }

    pub fn notify(&mut self, text: &str, now: Instant) {
        self.notification = Some(Notification::new(text, now, self.notification_ttl));
    }

    pub fn expire_notification(&mut self, now: Instant) {
        if self.notification.as_ref().is_some_and(|n| n.expired(now)) {
            self.notification = None;
        }
    }

    pub fn toggle_album_window(&mut self) {
        self.album_window = !self.album_window;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Pane::Albums => Pane::Tracks,
            Pane::Tracks => Pane::Albums,
        };
    }

    fn focused_len(&self) -> usize {
        match self.focus {
            Pane::Albums => self.albums.len(),
            Pane::Tracks => self.tracks.len(),
        }
    }

    fn focused_cursor(&mut self) -> &mut usize {
        match self.focus {
            Pane::Albums => &mut self.album_cursor,
            Pane::Tracks => &mut self.track_cursor,
        }
    }

    /// Move the cursor of the focused pane by `delta`, clamped to the list.
    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.focused_len();
        let cursor = self.focused_cursor();
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = cursor.saturating_add_signed(delta).min(len - 1);
    }

    pub fn cursor_top(&mut self) {
        *self.focused_cursor() = 0;
    }

    pub fn cursor_bottom(&mut self) {
        let last = self.focused_len().saturating_sub(1);
        *self.focused_cursor() = last;
    }

    /// A seek `delta_secs` away from the current position, as a fraction.
    pub fn scrub(&self, audio: &impl AudioHandle, delta_secs: i64) -> Option<Command> {
        let total = audio.duration().filter(|d| !d.is_zero())?.as_secs_f64();
        let target = (audio.current_time().as_secs_f64() + delta_secs as f64).clamp(0.0, total);
        Some(Command::Seek(target / total))
    }

    /// The command `Enter` maps to in the focused pane.
    pub fn activate(&self, autoplay: bool) -> Option<Command> {
        match self.focus {
            Pane::Albums => self.selected_album().map(|a| Command::SelectAlbum {
                folder: a.folder.clone(),
                autoplay,
            }),
            Pane::Tracks => (self.track_cursor < self.tracks.len()).then_some(
                Command::SelectTrack {
                    index: self.track_cursor,
                    autoplay: true,
                },
            ),
        }
    }
}
