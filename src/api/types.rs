//! Request and response shapes of the streaming service.
//!
//! Field names follow the service's JSON. Most fields are defaulted so that a
//! partially filled record (older server, missing join) still deserializes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub i64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(pub i64);

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn unknown_artist() -> String {
    "Unknown".to_string()
}

/// A track as listed by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(rename = "track_id")]
    pub id: TrackId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist_id: Option<i64>,
    #[serde(default = "unknown_artist")]
    pub artist_name: String,
    #[serde(default)]
    pub album_title: Option<String>,
    /// `HH:MM:SS` as stored by the service. Only a hint: the decoded media
    /// decides the real duration.
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub duration_seconds: u64,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub is_liked_by_user: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subscription_plan_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u64,
    #[serde(default)]
    pub current_page: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TrackList {
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Like state confirmed by the service after a like/unlike call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LikeStatus {
    pub is_liked_by_user: bool,
    pub likes_count: u64,
}

/// The liked-tracks endpoint has used several keys over time.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LikedTracks {
    #[serde(default)]
    liked_tracks: Option<Vec<Track>>,
    #[serde(default)]
    tracks: Option<Vec<Track>>,
    #[serde(default)]
    liked: Option<Vec<Track>>,
}

impl LikedTracks {
    pub fn into_tracks(self) -> Vec<Track> {
        self.liked_tracks
            .or(self.tracks)
            .or(self.liked)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Playlist {
    #[serde(rename = "playlist_id")]
    pub id: PlaylistId,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub track_count: u64,
    /// Only present when a single playlist is fetched.
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PlaylistList {
    #[serde(default)]
    pub playlists: Vec<Playlist>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlaylistEnvelope {
    pub playlist: Playlist,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Artist {
    pub artist_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub genre: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ArtistList {
    #[serde(default)]
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubscriptionPlan {
    pub subscription_plan_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PlanList {
    #[serde(default)]
    pub subscription_plans: Vec<SubscriptionPlan>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadResponse {
    pub track: Track,
}

/// Form fields sent alongside an uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadMetadata {
    pub title: String,
    pub artist_name: String,
    pub album_title: Option<String>,
    /// `HH:MM:SS`.
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// Signed-in state shared by every clone of the client.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
}
