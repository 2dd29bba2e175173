//! The audio engine: one media element, at most one live blob, and the
//! prefetch-then-fallback load sequence.
//!
//! Both fetches of a load run off the player thread. The engine only keeps
//! the pending request and binds whatever comes back for it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{StreamEndpoints, Track};

use super::blob::{BlobLease, BlobRegistry};
use super::element::{MediaElement, MediaEvent, MediaSource};
use super::error::{MediaError, PlaybackError};
use super::prefetch::{FetchPurpose, PrefetchOutcome, PrefetchRequest, Prefetcher};
use super::types::PlayerEvent;

#[derive(Debug)]
struct PendingLoad {
    request_id: u64,
    purpose: FetchPurpose,
    track: Track,
    url: String,
}

pub struct AudioEngine<E, P> {
    element: E,
    prefetcher: P,
    blobs: BlobRegistry,
    endpoints: StreamEndpoints,
    lease: Option<BlobLease>,
    last_request_id: u64,
    pending: Option<PendingLoad>,
}

impl<E: MediaElement, P: Prefetcher> AudioEngine<E, P> {
    pub fn new(element: E, prefetcher: P, blobs: BlobRegistry, endpoints: StreamEndpoints) -> Self {
        Self {
            element,
            prefetcher,
            blobs,
            endpoints,
            lease: None,
            last_request_id: 0,
            pending: None,
        }
    }

    /// Begin loading `track`. The result arrives through `complete_prefetch`.
    ///
    /// The previous blob is released up front. Whatever is currently playing
    /// keeps playing until the new source is bound.
    pub fn load_and_play(&mut self, track: Track) {
        self.lease = None;

        self.last_request_id += 1;
        let request_id = self.last_request_id;
        let url = self.endpoints.stream_url(track.id);
        info!(request_id, track_id = %track.id, title = %track.title, "Loading track");

        self.fetch(request_id, FetchPurpose::Prefetch, track, url);
    }

    /// Forget the load in flight, so its completion is discarded as stale.
    pub fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(
                request_id = pending.request_id,
                track_id = %pending.track.id,
                "Cancelled pending load"
            );
        }
    }

    fn fetch(&mut self, request_id: u64, purpose: FetchPurpose, track: Track, url: String) {
        self.pending = Some(PendingLoad {
            request_id,
            purpose,
            track: track.clone(),
            url: url.clone(),
        });
        self.prefetcher.start(PrefetchRequest {
            request_id,
            purpose,
            track,
            url,
        });
    }

    /// Finish the load step that `outcome` belongs to.
    ///
    /// A stale outcome (superseded by a later `load_and_play`, or cancelled)
    /// is dropped along with its bytes and yields no events. A failed
    /// prefetch starts the stream fetch and yields nothing until that one
    /// completes too.
    pub fn complete_prefetch(&mut self, outcome: PrefetchOutcome) -> Vec<PlayerEvent> {
        let expected = self
            .pending
            .as_ref()
            .is_some_and(|p| p.request_id == outcome.request_id && p.purpose == outcome.purpose);
        if !expected {
            debug!(
                request_id = outcome.request_id,
                purpose = ?outcome.purpose,
                latest = self.last_request_id,
                "Discarding stale fetch"
            );
            return Vec::new();
        }
        let Some(PendingLoad {
            request_id,
            track,
            url,
            ..
        }) = self.pending.take()
        else {
            return Vec::new();
        };

        let mut events = Vec::new();
        match (outcome.purpose, outcome.result) {
            (FetchPurpose::Prefetch, Ok(data)) => {
                let (replaced, played) = self.play_blob(data);
                match played {
                    Ok(()) => events.push(PlayerEvent::Started(track)),
                    Err(e) => {
                        warn!(track_id = %track.id, error = %e, "Blob playback failed, streaming instead");
                        if replaced {
                            events.push(PlayerEvent::Paused);
                        }
                        self.fetch(request_id, FetchPurpose::Stream, track, url);
                    }
                }
            }
            (FetchPurpose::Prefetch, Err(e)) => {
                warn!(track_id = %track.id, error = %e, "Prefetch failed, streaming instead");
                self.fetch(request_id, FetchPurpose::Stream, track, url);
            }
            (FetchPurpose::Stream, Ok(body)) => {
                let replaced = self.bind(MediaSource::Remote { url, body });
                match self.element.play() {
                    Ok(()) => events.push(PlayerEvent::Started(track)),
                    Err(source) => {
                        // The previous track stopped when the element reloaded.
                        if replaced {
                            events.push(PlayerEvent::Paused);
                        }
                        events.push(unplayable(track, source));
                    }
                }
            }
            (FetchPurpose::Stream, Err(e)) => {
                warn!(track_id = %track.id, error = %e, "Stream fetch failed");
                events.push(unplayable(track, MediaError::Unavailable(e.to_string())));
            }
        }
        events
    }

    /// Bind and play a prefetched blob. Returns whether the element's source
    /// was replaced, along with the play result.
    fn play_blob(&mut self, data: Arc<[u8]>) -> (bool, Result<(), MediaError>) {
        let lease = self.blobs.acquire(data);
        let replaced = self.bind(MediaSource::Blob(lease.url().clone()));
        self.lease = Some(lease);

        let played = self.element.play();
        if played.is_err() {
            self.lease = None;
        }
        (replaced, played)
    }

    /// Bind `source`, reloading only when it differs from the current one.
    /// Returns whether it reloaded.
    fn bind(&mut self, source: MediaSource) -> bool {
        if self.element.source() == Some(&source) {
            return false;
        }
        debug!(source = %source.url(), "Binding source");
        self.element.set_source(source);
        self.element.load();
        true
    }

    /// Resume the bound source without refetching.
    pub fn resume(&mut self, track: &Track) -> PlayerEvent {
        match self.element.play() {
            Ok(()) => PlayerEvent::Resumed,
            Err(source) => unplayable(track.clone(), source),
        }
    }

    pub fn pause(&mut self) -> PlayerEvent {
        self.element.pause();
        PlayerEvent::Paused
    }

    /// Seek to `percent` of the known duration. No-op while the duration is
    /// unknown or `percent` is not a number.
    pub fn seek(&mut self, percent: f64) -> Option<PlayerEvent> {
        if percent.is_nan() {
            return None;
        }
        let duration = self.element.duration().filter(|d| !d.is_zero())?;
        let percent = percent.clamp(0.0, 100.0);
        self.element.set_position(duration.mul_f64(percent / 100.0));
        Some(PlayerEvent::Progress(percent))
    }

    pub fn set_volume(&mut self, volume: f32) -> PlayerEvent {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.element.set_volume(volume);
        PlayerEvent::VolumeChanged(volume)
    }

    /// Translate element events into player events.
    pub fn tick(&mut self) -> Vec<PlayerEvent> {
        let duration = self.element.duration();
        self.element
            .poll_events()
            .into_iter()
            .filter_map(|event| match event {
                MediaEvent::MetadataLoaded { duration } => {
                    Some(PlayerEvent::DurationKnown(duration.as_secs_f64()))
                }
                MediaEvent::TimeUpdate { position } => {
                    let total = duration.filter(|d| !d.is_zero())?;
                    let percent = position.as_secs_f64() / total.as_secs_f64() * 100.0;
                    Some(PlayerEvent::Progress(percent.clamp(0.0, 100.0)))
                }
                MediaEvent::Ended => Some(PlayerEvent::Ended),
            })
            .collect()
    }

    pub fn fade_out(&mut self, over: Duration) {
        self.element.fade_out(over);
        self.lease = None;
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    pub(super) fn element(&self) -> &E {
        &self.element
    }

    #[cfg(test)]
    pub(super) fn element_mut(&mut self) -> &mut E {
        &mut self.element
    }

    #[cfg(test)]
    pub(super) fn prefetcher(&self) -> &P {
        &self.prefetcher
    }
}

fn unplayable(track: Track, source: MediaError) -> PlayerEvent {
    PlayerEvent::Failed {
        error: PlaybackError::Unplayable {
            title: track.title.clone(),
            source,
        },
        track,
    }
}
