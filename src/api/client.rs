//! The service client.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::error::{ApiError, Result};
use super::types::*;

/// Builds stream URLs for tracks. Cheap to clone and hand to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndpoints {
    base_url: String,
}

impl StreamEndpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn stream_url(&self, id: TrackId) -> String {
        format!("{}/api/tracks/{}/stream", self.base_url, id)
    }
}

/// Client for the streaming service.
///
/// Clones share the HTTP connection pool and the session, so a clone can be
/// moved into a background task and a login performed there is visible to
/// every other clone.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<RwLock<Session>>,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(ApiError::InvalidUrl("URL cannot be empty".into()));
        }

        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .user_agent(format!("cadenza/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            session: Arc::new(RwLock::new(Session::default())),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying HTTP client, shared with the player's prefetcher.
    pub fn http(&self) -> Client {
        self.http.clone()
    }

    pub fn stream_endpoints(&self) -> StreamEndpoints {
        StreamEndpoints::new(&self.base_url)
    }

    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.token.is_some()
    }

    /// Adopt an existing token and validate it against the service.
    pub async fn resume_session(&self, token: &str) -> Result<User> {
        self.session.write().await.token = Some(token.to_string());
        match self.current_user().await {
            Ok(user) => {
                self.session.write().await.user = Some(user.clone());
                info!(user = %user.username, "Resumed session");
                Ok(user)
            }
            Err(e) => {
                // A rejected token is dropped, mirroring a logout.
                warn!(error = %e, "Stored token rejected");
                self.logout().await;
                Err(e)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let url = self.url("/api/auth/login");
        debug!(url = %url, "Logging in");

        let response = self
            .http
            .post(&url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let auth: AuthResponse = read_json(response).await?;
        self.adopt(auth).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let url = self.url("/api/auth/register");
        debug!(url = %url, "Registering");

        let response = self
            .http
            .post(&url)
            .json(&json!({ "username": username, "email": email, "password": password }))
            .send()
            .await?;
        let auth: AuthResponse = read_json(response).await?;
        self.adopt(auth).await
    }

    pub async fn logout(&self) {
        let mut session = self.session.write().await;
        session.user = None;
        session.token = None;
    }

    pub async fn current_user(&self) -> Result<User> {
        let request = self.authed(self.http.get(self.url("/api/auth/user"))).await?;
        read_json(request.send().await?).await
    }

    /// One page of the full catalog.
    pub async fn tracks(&self, page: u32, limit: u32) -> Result<TrackPage> {
        let url = self.url(&format!("/api/tracks?page={}&limit={}", page, limit));
        debug!(url = %url, "Fetching tracks");
        let request = self.optional_auth(self.http.get(&url)).await;
        let page: TrackPage = read_json(request.send().await?).await?;
        debug!(count = page.tracks.len(), total = page.total, "Fetched tracks");
        Ok(page)
    }

    pub async fn popular_tracks(&self, limit: u32) -> Result<Vec<Track>> {
        let url = self.url(&format!("/api/tracks/popular?limit={}", limit));
        debug!(url = %url, "Fetching popular tracks");
        let request = self.optional_auth(self.http.get(&url)).await;
        let list: TrackList = read_json(request.send().await?).await?;
        Ok(list.tracks)
    }

    pub async fn like(&self, id: TrackId) -> Result<LikeStatus> {
        let url = self.url(&format!("/api/tracks/{}/like", id));
        debug!(url = %url, "Liking track");
        let request = self.authed(self.http.post(&url)).await?;
        read_json(request.send().await?).await
    }

    pub async fn unlike(&self, id: TrackId) -> Result<LikeStatus> {
        let url = self.url(&format!("/api/tracks/{}/like", id));
        debug!(url = %url, "Unliking track");
        let request = self.authed(self.http.delete(&url)).await?;
        read_json(request.send().await?).await
    }

    pub async fn delete_track(&self, id: TrackId) -> Result<()> {
        let url = self.url(&format!("/api/tracks/{}", id));
        debug!(url = %url, "Deleting track");
        let request = self.authed(self.http.delete(&url)).await?;
        expect_success(request.send().await?).await?;
        info!(track_id = %id, "Track deleted");
        Ok(())
    }

    /// Upload the audio file at `path` with the given form fields.
    pub async fn upload_track(&self, path: &Path, meta: &UploadMetadata) -> Result<Track> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload")
            .to_string();

        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.clone()))
            .text("title", meta.title.clone())
            .text("artist_name", meta.artist_name.clone());
        if let Some(album) = &meta.album_title {
            form = form.text("album_title", album.clone());
        }
        if let Some(duration) = &meta.duration {
            form = form.text("duration", duration.clone());
        }

        let url = self.url("/api/tracks/upload");
        debug!(url = %url, file = %file_name, "Uploading track");
        let request = self.authed(self.http.post(&url)).await?;
        let uploaded: UploadResponse = read_json(request.multipart(form).send().await?).await?;
        info!(track_id = %uploaded.track.id, title = %uploaded.track.title, "Track uploaded");
        Ok(uploaded.track)
    }

    pub async fn liked_tracks(&self, user_id: i64) -> Result<Vec<Track>> {
        let url = self.url(&format!("/api/tracks/user/{}/likes", user_id));
        debug!(url = %url, "Fetching liked tracks");
        let request = self.optional_auth(self.http.get(&url)).await;
        let liked: LikedTracks = read_json(request.send().await?).await?;
        Ok(liked.into_tracks())
    }

    pub async fn user_playlists(&self, user_id: i64) -> Result<Vec<Playlist>> {
        let url = self.url(&format!("/api/playlists/user/{}", user_id));
        debug!(url = %url, "Fetching playlists");
        let request = self.optional_auth(self.http.get(&url)).await;
        let list: PlaylistList = read_json(request.send().await?).await?;
        Ok(list.playlists)
    }

    pub async fn create_playlist(&self, title: &str) -> Result<Playlist> {
        let url = self.url("/api/playlists");
        debug!(url = %url, title = %title, "Creating playlist");
        let request = self.authed(self.http.post(&url)).await?;
        let created: PlaylistEnvelope = read_json(
            request
                .json(&json!({ "title": title.trim() }))
                .send()
                .await?,
        )
        .await?;
        Ok(created.playlist)
    }

    /// A single playlist including its tracks.
    pub async fn playlist(&self, id: PlaylistId) -> Result<Playlist> {
        let url = self.url(&format!("/api/playlists/{}", id));
        debug!(url = %url, "Fetching playlist");
        let request = self.optional_auth(self.http.get(&url)).await;
        read_json(request.send().await?).await
    }

    pub async fn add_to_playlist(&self, playlist: PlaylistId, track: TrackId) -> Result<Playlist> {
        let url = self.url(&format!("/api/playlists/{}/tracks", playlist));
        debug!(url = %url, track_id = %track, "Adding track to playlist");
        let request = self.authed(self.http.post(&url)).await?;
        let updated: PlaylistEnvelope = read_json(
            request
                .json(&json!({ "track_id": track.0 }))
                .send()
                .await?,
        )
        .await?;
        Ok(updated.playlist)
    }

    pub async fn remove_from_playlist(
        &self,
        playlist: PlaylistId,
        track: TrackId,
    ) -> Result<Playlist> {
        let url = self.url(&format!("/api/playlists/{}/tracks/{}", playlist, track));
        debug!(url = %url, "Removing track from playlist");
        let request = self.authed(self.http.delete(&url)).await?;
        let updated: PlaylistEnvelope = read_json(request.send().await?).await?;
        Ok(updated.playlist)
    }

    pub async fn artists(&self) -> Result<Vec<Artist>> {
        let url = self.url("/api/artists");
        debug!(url = %url, "Fetching artists");
        let list: ArtistList = read_json(self.http.get(&url).send().await?).await?;
        Ok(list.artists)
    }

    pub async fn subscription_plans(&self) -> Result<Vec<SubscriptionPlan>> {
        let url = self.url("/api/subscription_plans");
        debug!(url = %url, "Fetching subscription plans");
        let list: PlanList = read_json(self.http.get(&url).send().await?).await?;
        Ok(list.subscription_plans)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn adopt(&self, auth: AuthResponse) -> Result<User> {
        let mut session = self.session.write().await;
        session.token = Some(auth.token);
        session.user = Some(auth.user.clone());
        info!(user = %auth.user.username, "Signed in");
        Ok(auth.user)
    }

    async fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match self.session.read().await.token.as_deref() {
            Some(token) => Ok(request.bearer_auth(token)),
            None => Err(ApiError::AuthRequired),
        }
    }

    async fn optional_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.read().await.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Map a non-success response to an `ApiError`, preferring the service's
/// `{"error": ...}` message over the raw body.
///
/// A 401 without such a message comes from the token layer (missing or
/// expired token) and becomes `AuthRequired`.
async fn error_from(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => ApiError::Server {
            status,
            message: body.error,
        },
        Err(_) if status == 401 => ApiError::AuthRequired,
        Err(_) => ApiError::Server {
            status,
            message: text,
        },
    }
}

async fn expect_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from(response).await)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = expect_success(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
}
