//! Playback: a dedicated audio thread driving `rodio`, and the handle the
//! player controller talks to.

mod player;
mod sink;
mod thread;
mod types;

pub use player::AudioPlayer;
pub use types::AudioHandle;
