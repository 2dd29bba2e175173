//! `PlaybackStore` owns the playback state and routes user intent to the
//! engine.

use std::sync::mpsc::Sender;
use std::sync::{MutexGuard, PoisonError};

use tracing::{debug, error};

use crate::api::Track;

use super::element::MediaElement;
use super::engine::AudioEngine;
use super::prefetch::Prefetcher;
use super::types::{Notice, PlaybackHandle, PlaybackState, PlayerCmd, PlayerEvent};

pub struct PlaybackStore {
    state: PlaybackHandle,
    notices: Sender<Notice>,
}

impl PlaybackStore {
    pub fn new(state: PlaybackHandle, notices: Sender<Notice>) -> Self {
        Self { state, notices }
    }

    pub fn snapshot(&self) -> PlaybackState {
        self.lock().clone()
    }

    /// Route one command to the engine and apply whatever it reports.
    ///
    /// `Quit` is handled by the player thread and ignored here.
    pub fn dispatch<E: MediaElement, P: Prefetcher>(
        &mut self,
        engine: &mut AudioEngine<E, P>,
        cmd: PlayerCmd,
    ) {
        match cmd {
            PlayerCmd::Play(track) => self.play(engine, track),
            PlayerCmd::Pause => self.pause(engine),
            PlayerCmd::TogglePause => self.toggle(engine),
            PlayerCmd::Seek(percent) => self.seek(engine, percent),
            PlayerCmd::SeekBy(delta) => {
                let target = self.snapshot().progress_percent() + delta;
                self.seek(engine, target);
            }
            PlayerCmd::SetVolume(volume) => self.set_volume(engine, volume),
            PlayerCmd::AdjustVolume(delta) => {
                let target = self.snapshot().volume + delta;
                self.set_volume(engine, target);
            }
            PlayerCmd::Prefetched(outcome) | PlayerCmd::StreamLoaded(outcome) => {
                for event in engine.complete_prefetch(outcome) {
                    self.apply(event);
                }
            }
            PlayerCmd::Quit { .. } => {}
        }
    }

    /// Play `track`: resume when it is the current, paused track, otherwise
    /// load it from scratch. Playing the track that is already playing does
    /// nothing to the audio.
    ///
    /// Choosing the current track again also abandons any other track still
    /// loading, so a late completion cannot replace it.
    pub fn play<E: MediaElement, P: Prefetcher>(
        &mut self,
        engine: &mut AudioEngine<E, P>,
        track: Track,
    ) {
        let (is_current, is_playing) = {
            let state = self.lock();
            (state.is_current(track.id), state.is_playing)
        };

        match (is_current, is_playing) {
            (true, true) => {
                engine.cancel_pending();
                debug!(track_id = %track.id, "Already playing");
            }
            (true, false) => {
                engine.cancel_pending();
                let event = engine.resume(&track);
                self.apply(event);
            }
            (false, _) => engine.load_and_play(track),
        }
    }

    pub fn pause<E: MediaElement, P: Prefetcher>(&mut self, engine: &mut AudioEngine<E, P>) {
        let event = engine.pause();
        self.apply(event);
    }

    pub fn toggle<E: MediaElement, P: Prefetcher>(&mut self, engine: &mut AudioEngine<E, P>) {
        let state = self.snapshot();
        match state.current_track {
            Some(_) if state.is_playing => self.pause(engine),
            Some(track) => self.play(engine, track),
            None => {}
        }
    }

    pub fn seek<E: MediaElement, P: Prefetcher>(
        &mut self,
        engine: &mut AudioEngine<E, P>,
        percent: f64,
    ) {
        if let Some(event) = engine.seek(percent) {
            self.apply(event);
        }
    }

    pub fn set_volume<E: MediaElement, P: Prefetcher>(
        &mut self,
        engine: &mut AudioEngine<E, P>,
        volume: f32,
    ) {
        let event = engine.set_volume(volume);
        self.apply(event);
    }

    /// Fold an engine event into the state.
    pub fn apply(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Started(track) => {
                let mut state = self.lock();
                if !state.is_current(track.id) {
                    state.progress_percent = 0.0;
                    state.duration_seconds = 0.0;
                }
                state.current_track = Some(track);
                state.is_playing = true;
            }
            PlayerEvent::Resumed => {
                let mut state = self.lock();
                state.is_playing = state.current_track.is_some();
            }
            PlayerEvent::Paused => self.lock().is_playing = false,
            PlayerEvent::Progress(percent) => {
                if !percent.is_nan() {
                    self.lock().progress_percent = percent.clamp(0.0, 100.0);
                }
            }
            PlayerEvent::DurationKnown(seconds) => {
                if seconds.is_finite() && seconds >= 0.0 {
                    self.lock().duration_seconds = seconds;
                }
            }
            PlayerEvent::Ended => {
                let mut state = self.lock();
                state.is_playing = false;
                state.progress_percent = 0.0;
            }
            PlayerEvent::VolumeChanged(volume) => self.lock().volume = volume,
            PlayerEvent::Failed { track, error } => {
                error!(track_id = %track.id, title = %track.title, error = ?error, "Playback failed");
                let notice = Notice::new(format!("Cannot play \"{}\"", track.title), error.to_string());
                // Nobody listening means the UI is gone.
                let _ = self.notices.send(notice);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
