use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/cadenza/config.toml` or `~/.config/cadenza/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CADENZA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub audio: AudioSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Root URL of the service, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Credentials used to sign in at startup when no token is set.
    pub email: Option<String>,
    pub password: Option<String>,
    /// A previously issued token. Takes precedence over email/password.
    pub token: Option<String>,
    /// Timeout for catalog requests (milliseconds).
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            email: None,
            password: None,
            token: None,
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Volume applied when the player starts, in `[0, 1]`.
    pub initial_volume: f32,
    /// How long to wait for a track prefetch before streaming directly (milliseconds).
    pub prefetch_timeout_ms: u64,
    /// Interval between progress updates (milliseconds).
    pub tick_ms: u64,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            initial_volume: 0.8,
            prefetch_timeout_ms: 10_000,
            tick_ms: 200,
            quit_fade_out_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Which track fields to show in the player bar, and in what order.
    ///
    /// Example: ["artist", "title"]
    pub now_playing_fields: Vec<TrackField>,

    /// Separator used to join `now_playing_fields`.
    pub now_playing_separator: String,

    /// Width of the progress bar in the player bar (cells).
    pub progress_width: u16,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ cadenza ~ ".to_string(),
            now_playing_fields: vec![TrackField::Title, TrackField::Artist],
            now_playing_separator: " - ".to_string(),
            progress_width: 30,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackField {
    Title,
    Artist,
    Album,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Percentage of the track to skip when pressing `H` / `L`.
    pub seek_step_percent: f64,
    /// Volume change per `+` / `-` press.
    pub volume_step: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            seek_step_percent: 5.0,
            volume_step: 0.05,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Tracks requested per page for the "All" view.
    pub page_size: u32,
    /// Number of tracks shown in the "Popular" view.
    pub popular_limit: u32,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            page_size: 50,
            popular_limit: 10,
        }
    }
}
