use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::debug;

use crate::catalog::Fetcher;
use crate::config::AudioSettings;
use crate::error::PlaybackError;

use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, AudioHandle, PlaybackHandle, PlaybackInfo};

/// `AudioHandle` backed by the audio thread.
///
/// Setters apply locally right away and are forwarded to the thread; getters
/// read back what the thread reports through the shared `PlaybackInfo`.
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
    src: String,
    volume: f32,
    looping: bool,
}

impl AudioPlayer {
    pub fn new(fetcher: Arc<dyn Fetcher>, audio_settings: &AudioSettings) -> Self {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let playback_info: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));

        let audio_handle =
            spawn_audio_thread(fetcher, rx, playback_info.clone(), audio_settings.clone());

        Self {
            tx,
            playback: playback_info,
            join: Mutex::new(Some(audio_handle)),
            src: String::new(),
            volume: audio_settings.initial_volume,
            looping: false,
        }
    }

    fn send(&self, cmd: AudioCmd) -> Result<(), PlaybackError> {
        self.tx.send(cmd).map_err(|e| {
            debug!(cmd = ?e.0, "audio thread is gone");
            PlaybackError::Disconnected
        })
    }

    fn with_info<R>(&self, f: impl FnOnce(&mut PlaybackInfo) -> R) -> Option<R> {
        self.playback.lock().ok().map(|mut info| f(&mut info))
    }

    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl AudioHandle for AudioPlayer {
    fn src(&self) -> &str {
        &self.src
    }

    fn set_src(&mut self, url: &str) {
        self.src = url.to_string();
        self.with_info(|info| {
            *info = PlaybackInfo {
                src: url.to_string(),
                ..PlaybackInfo::default()
            }
        });
        let cmd = if url.is_empty() {
            AudioCmd::Unload
        } else {
            AudioCmd::Load {
                url: url.to_string(),
            }
        };
        let _ = self.send(cmd);
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.src.is_empty() {
            return Err(PlaybackError::NoSource);
        }
        self.send(AudioCmd::Play)?;
        self.with_info(|info| info.playing = true);
        Ok(())
    }

    fn pause(&mut self) {
        let _ = self.send(AudioCmd::Pause);
        self.with_info(|info| info.playing = false);
    }

    fn paused(&self) -> bool {
        !self.with_info(|info| info.playing).unwrap_or(false)
    }

    fn current_time(&self) -> Duration {
        self.with_info(|info| info.elapsed).unwrap_or_default()
    }

    fn set_current_time(&mut self, position: Duration) {
        if self.send(AudioCmd::Seek(position)).is_ok() {
            self.with_info(|info| info.elapsed = position);
        }
    }

    fn duration(&self) -> Option<Duration> {
        self.with_info(|info| info.duration).flatten()
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        let _ = self.send(AudioCmd::SetVolume(self.volume));
    }

    fn looping(&self) -> bool {
        self.looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
        let _ = self.send(AudioCmd::SetLoop(looping));
    }
}

