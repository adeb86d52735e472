use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, warn};

use crate::catalog::Fetcher;
use crate::config::AudioSettings;

use super::sink::LoadedSource;
use super::types::{AudioCmd, PlaybackHandle};

/// Everything the audio thread owns about the current source.
struct Deck {
    src: String,
    source: Option<LoadedSource>,
    sink: Option<Sink>,
    /// Position the current sink was started from.
    offset: Duration,
    paused: bool,
    volume: f32,
    looping: bool,
}

impl Deck {
    fn elapsed(&self) -> Duration {
        self.offset + self.sink.as_ref().map_or(Duration::ZERO, Sink::get_pos)
    }

    fn clear(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.source = None;
        self.offset = Duration::ZERO;
        self.paused = true;
    }

    /// Replace the sink with a fresh one starting at `start_at`, keeping play/pause state.
    fn rebuild_at(&mut self, stream: &OutputStream, start_at: Duration) {
        let Some(source) = self.source.as_ref() else {
            return;
        };
        match source.sink_at(stream, start_at, self.volume) {
            Ok(new_sink) => {
                if let Some(old) = self.sink.replace(new_sink) {
                    old.stop();
                }
                self.offset = start_at;
                if !self.paused {
                    if let Some(s) = self.sink.as_ref() {
                        s.play();
                    }
                }
            }
            Err(e) => warn!(src = %self.src, error = %e, "cannot rebuild sink"),
        }
    }
}

fn fade_out_sink(sink: &Sink, from: f32, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}

pub(super) fn spawn_audio_thread(
    fetcher: Arc<dyn Fetcher>,
    rx: Receiver<AudioCmd>,
    playback_info: PlaybackHandle,
    audio_settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "no audio output device; playback disabled");
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);

        let mut deck = Deck {
            src: String::new(),
            source: None,
            sink: None,
            offset: Duration::ZERO,
            paused: true,
            volume: audio_settings.initial_volume,
            looping: false,
        };

        loop {
            match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(cmd) => match cmd {
                    AudioCmd::Load { url } => {
                        deck.clear();
                        deck.src = url.clone();
                        match LoadedSource::fetch(fetcher.as_ref(), &url) {
                            Ok(source) => {
                                let duration = source.duration;
                                deck.source = Some(source);
                                deck.rebuild_at(&stream, Duration::ZERO);
                                if let Ok(mut info) = playback_info.lock() {
                                    if info.src == url {
                                        info.duration = duration;
                                    }
                                }
                                debug!(url, ?duration, "loaded track");
                            }
                            Err(e) => warn!(url, error = %e, "cannot load track"),
                        }
                    }

                    AudioCmd::Unload => {
                        deck.clear();
                        deck.src.clear();
                    }

                    AudioCmd::Play => match deck.sink.as_ref() {
                        Some(s) => {
                            s.play();
                            deck.paused = false;
                        }
                        None => {
                            // Mirrors a rejected play(): nothing to play, stay paused.
                            debug!(src = %deck.src, "play rejected, no decoded source");
                            deck.paused = true;
                        }
                    },

                    AudioCmd::Pause => {
                        if let Some(s) = deck.sink.as_ref() {
                            s.pause();
                        }
                        deck.paused = true;
                    }

                    AudioCmd::Seek(position) => {
                        // Seeking: rebuild the current sink and skip into the source.
                        let position = match deck.source.as_ref().and_then(|s| s.duration) {
                            Some(total) => position.min(total),
                            None => position,
                        };
                        deck.rebuild_at(&stream, position);
                    }

                    AudioCmd::SetVolume(v) => {
                        deck.volume = v;
                        if let Some(s) = deck.sink.as_ref() {
                            s.set_volume(v);
                        }
                    }

                    AudioCmd::SetLoop(on) => deck.looping = on,

                    AudioCmd::Quit { fade_out_ms } => {
                        if let Some(s) = deck.sink.as_ref() {
                            if !deck.paused {
                                // Fade out gently before stopping.
                                fade_out_sink(s, deck.volume, fade_out_ms);
                            }
                            s.stop();
                        }
                        if let Ok(mut info) = playback_info.lock() {
                            info.playing = false;
                        }
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            // End of source: replay when looping, otherwise stop at the end.
            let ended = !deck.paused && deck.sink.as_ref().is_some_and(Sink::empty);
            if ended {
                if deck.looping {
                    deck.rebuild_at(&stream, Duration::ZERO);
                } else {
                    deck.paused = true;
                }
            }

            if let Ok(mut info) = playback_info.lock() {
                if !deck.src.is_empty() && info.src == deck.src {
                    info.playing = !deck.paused;
                    info.elapsed = if ended && !deck.looping {
                        info.duration.unwrap_or_else(|| deck.elapsed())
                    } else {
                        deck.elapsed()
                    };
                }
            }
        }
    })
}
