//! Utilities for turning a track URL into a `rodio` sink.
//!
//! Sources are downloaded once and kept in memory so seeking and looping
//! can rebuild the sink without another request.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use lofty::file::AudioFile;
use lofty::probe::Probe;
use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, Sink, Source};
use thiserror::Error;

use crate::catalog::Fetcher;
use crate::error::FetchError;

#[derive(Error, Debug)]
pub(super) enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("cannot decode audio: {0}")]
    Decode(#[from] DecoderError),
}

/// A downloaded source.
pub(super) struct LoadedSource {
    bytes: Arc<[u8]>,
    pub duration: Option<Duration>,
}

impl LoadedSource {
    pub fn fetch(fetcher: &dyn Fetcher, url: &str) -> Result<Self, SourceError> {
        let bytes: Arc<[u8]> = fetcher.get_bytes(url)?.into();
        let mut duration = probe_duration(&bytes);
        if duration.is_none() {
            duration = Decoder::new(Cursor::new(bytes.clone()))?.total_duration();
        }
        Ok(Self { bytes, duration })
    }

    /// Create a paused `Sink` at `volume` that starts playback at `start_at`.
    pub fn sink_at(
        &self,
        stream: &OutputStream,
        start_at: Duration,
        volume: f32,
    ) -> Result<Sink, SourceError> {
        let source = Decoder::new(Cursor::new(self.bytes.clone()))?
            // `skip_duration` is the fallback seeking primitive; Duration::ZERO is fine.
            .skip_duration(start_at);

        let sink = Sink::connect_new(stream.mixer());
        sink.set_volume(volume);
        sink.append(source);
        sink.pause();
        Ok(sink)
    }
}

/// Read the stream length from the container headers.
fn probe_duration(bytes: &[u8]) -> Option<Duration> {
    let tagged = Probe::new(Cursor::new(bytes))
        .guess_file_type()
        .ok()?
        .read()
        .ok()?;
    let d = tagged.properties().duration();
    (!d.is_zero()).then_some(d)
}
