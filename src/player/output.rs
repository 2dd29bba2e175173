//! `MediaElement` backed by a rodio output stream.
//!
//! Sources are decoded from memory: a blob is read from the registry, a remote
//! source carries the body fetched for it. The element never touches the
//! network. The decoded bytes stay with the element so seeking keeps working
//! after the blob lease is gone.

use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lofty::file::AudioFile;
use lofty::probe::Probe;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use super::blob::BlobRegistry;
use super::element::{MediaElement, MediaEvent, MediaSource};
use super::error::MediaError;

struct Loaded {
    data: Arc<[u8]>,
    duration: Option<Duration>,
}

pub struct RodioElement {
    stream: Option<OutputStream>,
    blobs: BlobRegistry,
    source: Option<MediaSource>,
    loaded: Result<Loaded, MediaError>,
    sink: Option<Sink>,
    volume: f32,
    playing: bool,
    // Elapsed time is `accumulated` plus the time since `started_at`.
    started_at: Option<Instant>,
    accumulated: Duration,
    metadata_pending: bool,
}

impl RodioElement {
    pub fn new(blobs: BlobRegistry) -> Self {
        Self {
            stream: None,
            blobs,
            source: None,
            loaded: Err(MediaError::NothingLoaded),
            sink: None,
            volume: 1.0,
            playing: false,
            started_at: None,
            accumulated: Duration::ZERO,
            metadata_pending: false,
        }
    }

    fn position(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    fn ensure_stream(&mut self) -> Result<(), MediaError> {
        if self.stream.is_none() {
            let mut stream = OutputStreamBuilder::open_default_stream()
                .map_err(|e| MediaError::Output(e.to_string()))?;
            // rodio logs to stderr when the stream is dropped, which corrupts the TUI.
            stream.log_on_drop(false);
            self.stream = Some(stream);
        }
        Ok(())
    }

    fn read_source(&self, source: &MediaSource) -> Result<Arc<[u8]>, MediaError> {
        match source {
            MediaSource::Blob(url) => self
                .blobs
                .resolve(url)
                .ok_or_else(|| MediaError::Unavailable(format!("{} was revoked", url))),
            MediaSource::Remote { body, .. } => Ok(body.clone()),
        }
    }

    fn stop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    /// Replace the sink with a fresh one starting at `start_at`.
    fn rebuild_sink(&mut self, start_at: Duration) -> Result<(), MediaError> {
        self.ensure_stream()?;
        self.stop_sink();

        let (Some(stream), Ok(loaded)) = (self.stream.as_ref(), self.loaded.as_ref()) else {
            return Err(MediaError::NothingLoaded);
        };
        let sink = create_sink_at(stream, loaded.data.clone(), start_at)?;
        sink.set_volume(self.volume);
        self.sink = Some(sink);
        self.accumulated = start_at;
        self.started_at = None;
        Ok(())
    }
}

impl MediaElement for RodioElement {
    fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    fn set_source(&mut self, source: MediaSource) {
        self.source = Some(source);
    }

    fn load(&mut self) {
        self.stop_sink();
        self.playing = false;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.metadata_pending = false;

        let Some(source) = self.source.clone() else {
            self.loaded = Err(MediaError::NothingLoaded);
            return;
        };

        self.loaded = self.read_source(&source).map(|data| {
            let duration = probe_duration(&data);
            Loaded { data, duration }
        });
        match &self.loaded {
            Ok(loaded) => {
                debug!(source = ?source, bytes = loaded.data.len(), duration = ?loaded.duration, "Source loaded");
                self.metadata_pending = loaded.duration.is_some();
            }
            Err(e) => warn!(source = ?source, error = %e, "Source failed to load"),
        }
    }

    fn play(&mut self) -> Result<(), MediaError> {
        if let Err(e) = &self.loaded {
            return Err(e.clone());
        }
        if self.sink.is_none() {
            self.rebuild_sink(self.accumulated)?;
        }
        if let Some(sink) = self.sink.as_ref() {
            sink.play();
        }
        if !self.playing {
            self.playing = true;
            self.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.pause();
        }
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
        self.playing = false;
    }

    fn duration(&self) -> Option<Duration> {
        self.loaded.as_ref().ok().and_then(|l| l.duration)
    }

    fn set_position(&mut self, position: Duration) {
        if self.loaded.is_err() {
            return;
        }
        // Seeking rebuilds the sink and skips into the decoded stream.
        if let Err(e) = self.rebuild_sink(position) {
            warn!(error = %e, "Seek failed");
            return;
        }
        if self.playing {
            if let Some(sink) = self.sink.as_ref() {
                sink.play();
            }
            self.started_at = Some(Instant::now());
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(sink) = self.sink.as_ref() {
            sink.set_volume(volume);
        }
    }

    fn fade_out(&mut self, over: Duration) {
        if let Some(sink) = self.sink.as_ref() {
            if self.playing {
                fade_out_sink(sink, self.volume, over);
            }
            sink.stop();
        }
        self.sink = None;
        self.playing = false;
        self.started_at = None;
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        let mut events = Vec::new();

        if self.metadata_pending {
            self.metadata_pending = false;
            if let Some(duration) = self.duration() {
                events.push(MediaEvent::MetadataLoaded { duration });
            }
        }

        if !self.playing {
            return events;
        }

        let ended = self.sink.as_ref().is_none_or(|s| s.empty());
        if ended {
            let position = self.duration().unwrap_or_else(|| self.position());
            events.push(MediaEvent::TimeUpdate { position });
            events.push(MediaEvent::Ended);
            // The next play starts over from the beginning.
            self.sink = None;
            self.playing = false;
            self.started_at = None;
            self.accumulated = Duration::ZERO;
        } else {
            events.push(MediaEvent::TimeUpdate {
                position: self.position(),
            });
        }
        events
    }
}

/// Create a paused `Sink` decoding `data` from `start_at`.
fn create_sink_at(
    stream: &OutputStream,
    data: Arc<[u8]>,
    start_at: Duration,
) -> Result<Sink, MediaError> {
    let source = Decoder::new(Cursor::new(data))
        .map_err(|e| MediaError::Decode(e.to_string()))?
        .skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok(sink)
}

fn fade_out_sink(sink: &Sink, from: f32, over: Duration) {
    if over.is_zero() {
        sink.set_volume(0.0);
        return;
    }
    let steps: u32 = 20;
    let step = (over / steps).max(Duration::from_millis(1));
    for i in 1..=steps {
        let t = i as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(step);
    }
    sink.set_volume(0.0);
}

fn probe_duration(data: &[u8]) -> Option<Duration> {
    let probe = Probe::new(Cursor::new(data)).guess_file_type().ok()?;
    let file = probe.read().ok()?;
    let duration = file.properties().duration();
    (!duration.is_zero()).then_some(duration)
}
