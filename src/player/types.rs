//! Playback state, commands and events shared across the player.

use std::sync::{Arc, Mutex};

use crate::api::{Track, TrackId};

use super::error::PlaybackError;
use super::prefetch::PrefetchOutcome;

/// What is playing. Written only by `PlaybackStore`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_track: Option<Track>,
    pub is_playing: bool,
    /// Linear volume in `[0, 1]`.
    pub volume: f32,
    pub(crate) progress_percent: f64,
    pub(crate) duration_seconds: f64,
}

impl PlaybackState {
    pub fn new(volume: f32) -> Self {
        Self {
            current_track: None,
            is_playing: false,
            volume: volume.clamp(0.0, 1.0),
            progress_percent: 0.0,
            duration_seconds: 0.0,
        }
    }

    /// Progress in `[0, 100]`; 0 when no track is current.
    pub fn progress_percent(&self) -> f64 {
        if self.current_track.is_none() {
            0.0
        } else {
            self.progress_percent
        }
    }

    /// Duration of the current track once its metadata is known; 0 otherwise.
    pub fn duration_seconds(&self) -> f64 {
        if self.current_track.is_none() {
            0.0
        } else {
            self.duration_seconds
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.progress_percent() / 100.0 * self.duration_seconds()
    }

    pub fn is_current(&self, id: TrackId) -> bool {
        self.current_track.as_ref().map(|t| t.id) == Some(id)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(0.8)
    }
}

pub type PlaybackHandle = Arc<Mutex<PlaybackState>>;

#[derive(Debug)]
pub enum PlayerCmd {
    /// Play `track`, resuming instead when it is the current, paused track.
    Play(Track),
    Pause,
    /// Pause when playing, resume the current track when paused.
    TogglePause,
    /// Seek to a percentage of the current track.
    Seek(f64),
    /// Seek relative to the current progress, in percent (positive or negative).
    SeekBy(f64),
    SetVolume(f32),
    /// Change volume by a signed delta.
    AdjustVolume(f32),
    /// A prefetch issued by the engine has completed.
    Prefetched(PrefetchOutcome),
    /// The fallback stream fetch issued after a failed prefetch has completed.
    StreamLoaded(PrefetchOutcome),
    /// Stop the player thread, fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// Engine output, applied to the state by the store.
#[derive(Debug)]
pub enum PlayerEvent {
    /// A load finished and playback started.
    Started(Track),
    Resumed,
    Paused,
    Progress(f64),
    DurationKnown(f64),
    Ended,
    VolumeChanged(f32),
    Failed { track: Track, error: PlaybackError },
}

/// A user-visible failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}
