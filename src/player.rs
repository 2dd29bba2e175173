//! Audio playback: the playback store, the audio engine and the thread they
//! live on.
//!
//! UI code talks to the `Player` handle only. Commands travel over one queue
//! to the player thread, where `PlaybackStore` (sole writer of
//! `PlaybackState`) drives `AudioEngine` (sole owner of the media element and
//! the transient audio blob). Engine events flow back into the store and the
//! UI reads the shared `PlaybackHandle` snapshot when it redraws.
//!
//! The player thread never waits on the network: fetches run on the tokio
//! runtime and come back through the same queue.

mod blob;
mod element;
mod engine;
mod error;
mod handle;
mod output;
mod prefetch;
mod store;
mod thread;
mod types;

pub use blob::{BlobLease, BlobRegistry, BlobStats, BlobUrl};
pub use element::{MediaElement, MediaEvent, MediaSource};
pub use engine::AudioEngine;
pub use error::{MediaError, PlaybackError, PrefetchError};
pub use handle::Player;
pub use output::RodioElement;
pub use prefetch::{
    FetchPurpose, HttpPrefetcher, PrefetchOutcome, PrefetchRequest, Prefetcher, fetch_audio,
    is_playable_content_type,
};
pub use store::PlaybackStore;
pub use types::{Notice, PlaybackHandle, PlaybackState, PlayerCmd, PlayerEvent};
