//! Catalog calls run on the tokio runtime; each reports back to the UI loop
//! as one `CatalogEvent`.

use std::future::Future;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use tokio::runtime::Handle;
use tracing::warn;

use crate::api::{ApiClient, ApiError, PlaylistId, Track, TrackId};
use crate::app::CatalogEvent;
use crate::config::{LibrarySettings, ServerSettings};
use crate::library::read_upload_metadata;

#[derive(Clone)]
pub struct Catalog {
    client: ApiClient,
    runtime: Handle,
    tx: Sender<CatalogEvent>,
    library: LibrarySettings,
}

impl Catalog {
    pub fn new(
        client: ApiClient,
        runtime: Handle,
        tx: Sender<CatalogEvent>,
        library: LibrarySettings,
    ) -> Self {
        Self {
            client,
            runtime,
            tx,
            library,
        }
    }

    fn spawn<F, Fut>(&self, action: &'static str, call: F)
    where
        F: FnOnce(ApiClient) -> Fut + Send + 'static,
        Fut: Future<Output = Result<CatalogEvent, ApiError>> + Send + 'static,
    {
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let event = call(client).await.unwrap_or_else(|e| {
                warn!(action, error = %e, "Catalog call failed");
                CatalogEvent::Failed {
                    action: action.to_string(),
                    message: e.user_message(),
                }
            });
            // The UI may already be gone.
            let _ = tx.send(event);
        });
    }

    /// Sign in from configured credentials. A token wins over email/password.
    pub fn sign_in(&self, server: &ServerSettings) {
        if let Some(token) = server.token.clone().filter(|t| !t.trim().is_empty()) {
            self.spawn("Sign in", move |client| async move {
                Ok(CatalogEvent::SignedIn(client.resume_session(&token).await?))
            });
        } else if let (Some(email), Some(password)) = (server.email.clone(), server.password.clone())
        {
            self.spawn("Sign in", move |client| async move {
                Ok(CatalogEvent::SignedIn(client.login(&email, &password).await?))
            });
        }
    }

    pub fn load_page(&self, page: u32) {
        let limit = self.library.page_size;
        self.spawn("Loading tracks", move |client| async move {
            Ok(CatalogEvent::TracksPage(client.tracks(page.max(1), limit).await?))
        });
    }

    pub fn load_popular(&self) {
        let limit = self.library.popular_limit;
        self.spawn("Loading popular tracks", move |client| async move {
            Ok(CatalogEvent::Popular(client.popular_tracks(limit).await?))
        });
    }

    pub fn load_liked(&self, user_id: i64) {
        self.spawn("Loading liked tracks", move |client| async move {
            Ok(CatalogEvent::Liked(client.liked_tracks(user_id).await?))
        });
    }

    pub fn load_playlists(&self, user_id: i64) {
        self.spawn("Loading playlists", move |client| async move {
            Ok(CatalogEvent::Playlists(client.user_playlists(user_id).await?))
        });
    }

    pub fn open_playlist(&self, id: PlaylistId) {
        self.spawn("Opening playlist", move |client| async move {
            Ok(CatalogEvent::PlaylistOpened(client.playlist(id).await?))
        });
    }

    pub fn load_artists(&self) {
        self.spawn("Loading artists", |client| async move {
            Ok(CatalogEvent::Artists(client.artists().await?))
        });
    }

    pub fn load_plans(&self) {
        self.spawn("Loading plans", |client| async move {
            Ok(CatalogEvent::Plans(client.subscription_plans().await?))
        });
    }

    /// Flip the like state of `track`. The UI changes only once the service
    /// confirms.
    pub fn toggle_like(&self, track: Track) {
        self.spawn("Like", move |client| async move {
            let status = if track.is_liked_by_user {
                client.unlike(track.id).await?
            } else {
                client.like(track.id).await?
            };
            Ok(CatalogEvent::LikeChanged { track, status })
        });
    }

    pub fn delete_track(&self, id: TrackId) {
        self.spawn("Delete", move |client| async move {
            client.delete_track(id).await?;
            Ok(CatalogEvent::TrackDeleted(id))
        });
    }

    pub fn upload(&self, path: PathBuf) {
        self.spawn("Upload", move |client| async move {
            let file = path.clone();
            let meta = tokio::task::spawn_blocking(move || read_upload_metadata(&file))
                .await
                .map_err(|e| ApiError::Io(std::io::Error::other(e)))?;
            Ok(CatalogEvent::TrackUploaded(
                client.upload_track(&path, &meta).await?,
            ))
        });
    }

    pub fn create_playlist(&self, title: String) {
        self.spawn("Create playlist", move |client| async move {
            Ok(CatalogEvent::PlaylistCreated(
                client.create_playlist(&title).await?,
            ))
        });
    }

    pub fn add_to_playlist(&self, playlist: PlaylistId, track: TrackId) {
        self.spawn("Add to playlist", move |client| async move {
            Ok(CatalogEvent::PlaylistChanged(
                client.add_to_playlist(playlist, track).await?,
            ))
        });
    }

    pub fn remove_from_playlist(&self, playlist: PlaylistId, track: TrackId) {
        self.spawn("Remove from playlist", move |client| async move {
            Ok(CatalogEvent::PlaylistChanged(
                client.remove_from_playlist(playlist, track).await?,
            ))
        });
    }
}
