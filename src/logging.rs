//! File logging. The terminal belongs to the TUI, so logs go to
//! `$XDG_STATE_HOME/cadenza/cadenza.log` (or `~/.local/state/...`).
//! Verbosity follows `CADENZA_LOG`, e.g. `CADENZA_LOG=cadenza=debug`.

use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn log_path() -> PathBuf {
    let state_home = env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("state")))
        .unwrap_or_else(env::temp_dir);
    state_home.join("cadenza").join("cadenza.log")
}

/// Install the global subscriber. Returns the log file path, or `None` when
/// the file could not be opened (logging is then disabled).
pub fn init() -> Option<PathBuf> {
    let path = log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok()?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

    let filter = EnvFilter::try_from_env("CADENZA_LOG").unwrap_or_else(|_| "cadenza=info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init()
        .ok()?;
    Some(path)
}
