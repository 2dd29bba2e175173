//! Folding results of catalog calls into the model.

use tracing::debug;

use crate::api::{
    Artist, LikeStatus, Playlist, SubscriptionPlan, Track, TrackId, TrackPage, User,
};
use crate::player::Notice;

use super::model::App;
use super::view::View;

/// Outcome of a background catalog call, delivered to the UI loop.
#[derive(Debug)]
pub enum CatalogEvent {
    SignedIn(User),
    TracksPage(TrackPage),
    Popular(Vec<Track>),
    Liked(Vec<Track>),
    Playlists(Vec<Playlist>),
    PlaylistOpened(Playlist),
    PlaylistCreated(Playlist),
    /// A playlist after a track was added or removed.
    PlaylistChanged(Playlist),
    Artists(Vec<Artist>),
    Plans(Vec<SubscriptionPlan>),
    /// The service confirmed a like or unlike.
    LikeChanged {
        track: Track,
        status: LikeStatus,
    },
    TrackDeleted(TrackId),
    TrackUploaded(Track),
    Failed {
        action: String,
        message: String,
    },
}

impl App {
    pub fn apply_catalog(&mut self, event: CatalogEvent) {
        match event {
            CatalogEvent::SignedIn(user) => {
                self.status = format!("Signed in as {}", user.username);
                self.user = Some(user);
            }
            CatalogEvent::TracksPage(page) => {
                self.all = page.tracks;
                self.total_tracks = page.total;
                self.pages = u32::try_from(page.pages).unwrap_or(u32::MAX).max(1);
                self.page = u32::try_from(page.current_page)
                    .unwrap_or(1)
                    .clamp(1, self.pages);
            }
            CatalogEvent::Popular(tracks) => self.popular = tracks,
            CatalogEvent::Liked(tracks) => self.liked = tracks,
            CatalogEvent::Playlists(playlists) => self.playlists = playlists,
            CatalogEvent::PlaylistOpened(playlist) => {
                if self.view == View::Playlists {
                    self.selected = 0;
                    self.filter_query.clear();
                }
                self.open_playlist = Some(playlist);
            }
            CatalogEvent::PlaylistCreated(playlist) => {
                self.status = format!("Created playlist \"{}\"", playlist.title);
                self.playlists.insert(0, playlist);
            }
            CatalogEvent::PlaylistChanged(playlist) => self.replace_playlist(playlist),
            CatalogEvent::Artists(artists) => self.artists = artists,
            CatalogEvent::Plans(plans) => self.plans = plans,
            CatalogEvent::LikeChanged { track, status } => self.apply_like(track, status),
            CatalogEvent::TrackDeleted(id) => {
                self.remove_track(id);
                self.status = "Track deleted".to_string();
            }
            CatalogEvent::TrackUploaded(track) => {
                self.status = format!("Uploaded \"{}\"", track.title);
                self.all.insert(0, track);
                self.total_tracks += 1;
            }
            CatalogEvent::Failed { action, message } => {
                self.show_notice(Notice::new(format!("{} failed", action), message));
            }
        }
        self.ensure_selected_visible();
    }

    /// Commit a confirmed like state to every list holding the track.
    ///
    /// The Liked view gains the track when it becomes liked and loses it
    /// when unliked.
    pub fn apply_like(&mut self, track: Track, status: LikeStatus) {
        let id = track.id;
        debug!(track_id = %id, liked = status.is_liked_by_user, likes = status.likes_count, "Like confirmed");

        for t in self.tracks_mut() {
            if t.id == id {
                t.is_liked_by_user = status.is_liked_by_user;
                t.likes_count = status.likes_count;
            }
        }

        let in_liked = self.liked.iter().any(|t| t.id == id);
        if status.is_liked_by_user && !in_liked {
            let mut track = track;
            track.is_liked_by_user = true;
            track.likes_count = status.likes_count;
            self.liked.insert(0, track);
        } else if !status.is_liked_by_user && in_liked {
            self.liked.retain(|t| t.id != id);
        }
    }

    /// Drop a deleted track from every list.
    pub fn remove_track(&mut self, id: TrackId) {
        let before = self.all.len();
        self.all.retain(|t| t.id != id);
        if self.all.len() < before {
            self.total_tracks = self.total_tracks.saturating_sub(1);
        }
        self.popular.retain(|t| t.id != id);
        self.liked.retain(|t| t.id != id);
        if let Some(p) = self.open_playlist.as_mut() {
            p.tracks.retain(|t| t.id != id);
            p.track_count = p.tracks.len() as u64;
        }
        let rows = self.row_count();
        if self.selected >= rows {
            self.selected = rows.saturating_sub(1);
        }
    }

    fn replace_playlist(&mut self, playlist: Playlist) {
        self.status = format!(
            "\"{}\" now has {} tracks",
            playlist.title, playlist.track_count
        );
        if let Some(existing) = self.playlists.iter_mut().find(|p| p.id == playlist.id) {
            existing.track_count = playlist.track_count;
        }
        if let Some(open) = self.open_playlist.as_mut() {
            if open.id == playlist.id {
                *open = playlist;
            }
        }
    }

    fn tracks_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.all
            .iter_mut()
            .chain(self.popular.iter_mut())
            .chain(self.liked.iter_mut())
            .chain(
                self.open_playlist
                    .iter_mut()
                    .flat_map(|p| p.tracks.iter_mut()),
            )
    }
}
