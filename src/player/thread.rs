use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::api::StreamEndpoints;
use crate::config::AudioSettings;

use super::blob::BlobRegistry;
use super::engine::AudioEngine;
use super::output::RodioElement;
use super::prefetch::HttpPrefetcher;
use super::store::PlaybackStore;
use super::types::{Notice, PlaybackHandle, PlayerCmd, PlayerEvent};

pub(super) struct ThreadContext {
    pub rx: Receiver<PlayerCmd>,
    pub tx: Sender<PlayerCmd>,
    pub playback: PlaybackHandle,
    pub notices: Sender<Notice>,
    pub settings: AudioSettings,
    pub endpoints: StreamEndpoints,
    pub http: Client,
    pub runtime: Handle,
}

/// Run the store and engine on a dedicated thread until `Quit` arrives or
/// every sender is gone.
pub(super) fn spawn_player_thread(ctx: ThreadContext) -> JoinHandle<()> {
    thread::spawn(move || {
        let ThreadContext {
            rx,
            tx,
            playback,
            notices,
            settings,
            endpoints,
            http,
            runtime,
        } = ctx;

        let timeout = Duration::from_millis(settings.prefetch_timeout_ms);
        let blobs = BlobRegistry::new();
        let element = RodioElement::new(blobs.clone());
        let prefetcher = HttpPrefetcher::new(http, runtime, timeout, tx);
        let mut engine = AudioEngine::new(element, prefetcher, blobs, endpoints);
        let mut store = PlaybackStore::new(playback, notices);
        store.set_volume(&mut engine, settings.initial_volume);

        let tick = Duration::from_millis(settings.tick_ms.max(10));
        let mut last_tick = Instant::now();
        info!(tick_ms = tick.as_millis() as u64, "Player thread started");

        loop {
            match rx.recv_timeout(tick) {
                Ok(PlayerCmd::Quit { fade_out_ms }) => {
                    engine.fade_out(Duration::from_millis(fade_out_ms));
                    // Keep the UI from showing a playing state after exit.
                    store.apply(PlayerEvent::Paused);
                    break;
                }
                Ok(cmd) => {
                    debug!(cmd = ?cmd, "Player command");
                    store.dispatch(&mut engine, cmd);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            // Commands arriving faster than the tick must not starve progress updates.
            if last_tick.elapsed() >= tick {
                for event in engine.tick() {
                    store.apply(event);
                }
                last_tick = Instant::now();
            }
        }
        info!("Player thread stopped");
    })
}
