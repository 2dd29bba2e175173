use crate::api::TrackId;

/// Tabs of the main screen.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum View {
    All,
    Popular,
    Liked,
    Playlists,
    Artists,
    Plans,
}

impl View {
    pub const ALL: [View; 6] = [
        View::All,
        View::Popular,
        View::Liked,
        View::Playlists,
        View::Artists,
        View::Plans,
    ];

    pub fn title(self) -> &'static str {
        match self {
            View::All => "All",
            View::Popular => "Popular",
            View::Liked => "Liked",
            View::Playlists => "Playlists",
            View::Artists => "Artists",
            View::Plans => "Plans",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&v| v == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Whether rows of this view are tracks (playable, likeable).
    pub fn lists_tracks(self) -> bool {
        matches!(self, View::All | View::Popular | View::Liked)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PromptKind {
    /// Path of a local audio file to upload.
    Upload,
    /// Title of a new playlist.
    NewPlaylist,
}

impl PromptKind {
    pub fn title(self) -> &'static str {
        match self {
            PromptKind::Upload => " upload file (path) ",
            PromptKind::NewPlaylist => " new playlist title ",
        }
    }
}

/// A single-line text input shown as a popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

impl Prompt {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            input: String::new(),
        }
    }
}

/// A yes/no question asked before a destructive action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    DeleteTrack { id: TrackId, title: String },
}

impl Confirm {
    pub fn title(&self) -> &'static str {
        match self {
            Confirm::DeleteTrack { .. } => " delete track ",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Confirm::DeleteTrack { title, .. } => {
                format!("Delete \"{}\"? This will remove it from the database.", title)
            }
        }
    }
}
