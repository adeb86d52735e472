//! Audio-related small types and handles.
//!
//! This module defines the `AudioHandle` interface the player controller
//! drives, the commands understood by the audio thread and the playback
//! info it shares back.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::PlaybackError;

/// The single playback resource: a source, a position, a volume and a loop flag.
pub trait AudioHandle {
    /// Current source URL; empty when nothing is loaded.
    fn src(&self) -> &str;
    /// Replace the source. Position resets to zero and playback pauses.
    fn set_src(&mut self, url: &str);
    /// Try to start playback.
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn paused(&self) -> bool;
    fn current_time(&self) -> Duration;
    fn set_current_time(&mut self, position: Duration);
    /// Length of the source, once known.
    fn duration(&self) -> Option<Duration>;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn looping(&self) -> bool;
    fn set_looping(&mut self, looping: bool);
}

#[derive(Debug)]
pub enum AudioCmd {
    /// Fetch and decode `url`, replacing the current source (paused).
    Load { url: String },
    /// Drop the current source.
    Unload,
    Play,
    Pause,
    /// Jump to an absolute position.
    Seek(Duration),
    SetVolume(f32),
    SetLoop(bool),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

#[derive(Debug, Clone, Default)]
/// Runtime playback information shared with the UI.
pub struct PlaybackInfo {
    /// Source the audio thread is working on.
    pub src: String,
    /// Elapsed playback time for the current source.
    pub elapsed: Duration,
    /// Total length, once the source has been probed.
    pub duration: Option<Duration>,
    /// Whether playback is currently active.
    pub playing: bool,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
