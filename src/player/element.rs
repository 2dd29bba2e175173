//! The media element abstraction the engine drives.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::blob::BlobUrl;
use super::error::MediaError;

/// Where the element reads audio from.
///
/// Sources compare by address only: rebinding the stream URL that is already
/// bound is not a change, whatever bytes came with it.
#[derive(Clone)]
pub enum MediaSource {
    /// A prefetched blob held in the `BlobRegistry`.
    Blob(BlobUrl),
    /// The service stream URL, with the body fetched off the player thread.
    Remote { url: String, body: Arc<[u8]> },
}

impl MediaSource {
    pub fn url(&self) -> &str {
        match self {
            MediaSource::Blob(url) => url.as_str(),
            MediaSource::Remote { url, .. } => url,
        }
    }
}

impl PartialEq for MediaSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MediaSource::Blob(a), MediaSource::Blob(b)) => a == b,
            (MediaSource::Remote { url: a, .. }, MediaSource::Remote { url: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for MediaSource {}

impl fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::Blob(url) => f.debug_tuple("Blob").field(url).finish(),
            MediaSource::Remote { url, body } => f
                .debug_struct("Remote")
                .field("url", url)
                .field("bytes", &body.len())
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    TimeUpdate { position: Duration },
    MetadataLoaded { duration: Duration },
    Ended,
}

/// A single-source audio output.
///
/// Binding a source with `set_source` does nothing until `load` is called.
/// Load failures surface from the next `play`.
pub trait MediaElement {
    fn source(&self) -> Option<&MediaSource>;

    fn set_source(&mut self, source: MediaSource);

    /// (Re)read the bound source and reset position to zero.
    fn load(&mut self);

    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);

    /// Known once metadata has loaded.
    fn duration(&self) -> Option<Duration>;

    fn set_position(&mut self, position: Duration);

    /// `volume` is already clamped to `[0, 1]`.
    fn set_volume(&mut self, volume: f32);

    /// Ramp the volume down to silence over `over`, then stop.
    fn fade_out(&mut self, over: Duration);

    /// Drain events observed since the last call.
    fn poll_events(&mut self) -> Vec<MediaEvent>;
}
