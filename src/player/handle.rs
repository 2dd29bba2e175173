use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use reqwest::Client;
use tokio::runtime::Handle;

use crate::api::StreamEndpoints;
use crate::config::AudioSettings;

use super::thread::{ThreadContext, spawn_player_thread};
use super::types::{Notice, PlaybackHandle, PlaybackState, PlayerCmd};

/// Handle to the player thread.
pub struct Player {
    tx: Sender<PlayerCmd>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    /// Start the player thread. Failure notices arrive on the returned receiver.
    pub fn spawn(
        settings: AudioSettings,
        endpoints: StreamEndpoints,
        http: Client,
        runtime: Handle,
    ) -> (Self, Receiver<Notice>) {
        let (tx, rx) = mpsc::channel::<PlayerCmd>();
        let (notice_tx, notice_rx) = mpsc::channel::<Notice>();
        let playback: PlaybackHandle =
            Arc::new(Mutex::new(PlaybackState::new(settings.initial_volume)));

        let join = spawn_player_thread(ThreadContext {
            rx,
            tx: tx.clone(),
            playback: playback.clone(),
            notices: notice_tx,
            settings,
            endpoints,
            http,
            runtime,
        });

        let player = Self {
            tx,
            playback,
            join: Mutex::new(Some(join)),
        };
        (player, notice_rx)
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.clone()
    }

    pub fn send(&self, cmd: PlayerCmd) -> Result<(), mpsc::SendError<PlayerCmd>> {
        self.tx.send(cmd)
    }

    /// Fade out, stop the thread and wait for it.
    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.send(PlayerCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        // The prefetcher holds a sender too, so the thread never sees a
        // disconnect on its own. Nothing to do once `quit_softly` joined it.
        let running = self
            .join
            .get_mut()
            .map(|j| j.is_some())
            .unwrap_or_else(|e| e.into_inner().is_some());
        if running {
            self.quit_softly(Duration::ZERO);
        }
    }
}
