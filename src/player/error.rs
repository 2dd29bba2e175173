//! Error types for playback.

use thiserror::Error;

/// Failures reported by the media element.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("No audio output device: {0}")]
    Output(String),

    #[error("Cannot decode audio: {0}")]
    Decode(String),

    /// The bound source could not be read (revoked blob, unreachable stream).
    #[error("Audio source unavailable: {0}")]
    Unavailable(String),

    #[error("Nothing loaded")]
    NothingLoaded,
}

/// Why the local prefetch of a track was not usable. Never fatal: the engine
/// falls back to streaming directly.
#[derive(Debug, Error)]
pub enum PrefetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Not audio content: {0:?}")]
    NotAudio(String),
}

/// A playback failure the user has to be told about.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Unable to play this track. Make sure the file exists.")]
    Unplayable {
        title: String,
        #[source]
        source: MediaError,
    },
}
