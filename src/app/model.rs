//! Application model: the `App` struct.
//!
//! `App` holds what the service returned for each view, the current view,
//! selection and filter, plus popup state (prompt, notice). Playback itself is
//! owned by the player thread and observed through the `PlaybackHandle`.

use crate::api::{Artist, Playlist, PlaylistId, SubscriptionPlan, Track, User};
use crate::library::{list_label, track_duration_label};
use crate::player::{Notice, PlaybackHandle, PlaybackState};

use super::view::{Confirm, Prompt, PromptKind, View};

/// The main application model.
pub struct App {
    pub view: View,

    pub all: Vec<Track>,
    /// Current page of the "All" view (1-based) and the number of pages.
    pub page: u32,
    pub pages: u32,
    pub total_tracks: u64,
    pub popular: Vec<Track>,
    pub liked: Vec<Track>,
    pub playlists: Vec<Playlist>,
    /// The playlist whose tracks are shown in the Playlists view.
    pub open_playlist: Option<Playlist>,
    /// Playlist that `a` adds the selected track to.
    pub target_playlist: Option<PlaylistId>,
    pub artists: Vec<Artist>,
    pub plans: Vec<SubscriptionPlan>,

    /// Index into the rows of the current view.
    pub selected: usize,
    pub filter_mode: bool,
    pub filter_query: String,

    pub prompt: Option<Prompt>,
    /// Pending yes/no question; the action runs only on `y`.
    pub confirm: Option<Confirm>,
    pub notice: Option<Notice>,
    /// One-line feedback shown in the status box.
    pub status: String,
    pub user: Option<User>,
    pub playback_handle: Option<PlaybackHandle>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            view: View::All,
            all: Vec::new(),
            page: 1,
            pages: 1,
            total_tracks: 0,
            popular: Vec::new(),
            liked: Vec::new(),
            playlists: Vec::new(),
            open_playlist: None,
            target_playlist: None,
            artists: Vec::new(),
            plans: Vec::new(),
            selected: 0,
            filter_mode: false,
            filter_query: String::new(),
            prompt: None,
            confirm: None,
            notice: None,
            status: String::new(),
            user: None,
            playback_handle: None,
        }
    }

    /// Attach a `PlaybackHandle` used to observe playback progress.
    pub fn set_playback_handle(&mut self, h: PlaybackHandle) {
        self.playback_handle = Some(h);
    }

    /// Copy of the shared playback state, if a player is attached.
    pub fn playback(&self) -> Option<PlaybackState> {
        self.playback_handle
            .as_ref()
            .and_then(|h| h.lock().ok().map(|s| s.clone()))
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Switch to `view`, resetting selection and filter.
    pub fn set_view(&mut self, view: View) {
        if self.view != view {
            self.view = view;
            self.selected = 0;
            self.filter_query.clear();
            self.filter_mode = false;
        }
    }

    pub fn next_view(&mut self) {
        self.set_view(self.view.next());
    }

    pub fn prev_view(&mut self) {
        self.set_view(self.view.prev());
    }

    /// The tracks listed in the current view, if its rows are tracks.
    pub fn current_tracks(&self) -> Option<&[Track]> {
        match self.view {
            View::All => Some(&self.all),
            View::Popular => Some(&self.popular),
            View::Liked => Some(&self.liked),
            View::Playlists => self.open_playlist.as_ref().map(|p| p.tracks.as_slice()),
            View::Artists | View::Plans => None,
        }
    }

    /// Row labels of the current view; the filter matches against these.
    pub fn labels(&self) -> Vec<String> {
        if let Some(tracks) = self.current_tracks() {
            return tracks
                .iter()
                .map(|t| format!("{}  [{}]", list_label(t), track_duration_label(t)))
                .collect();
        }
        match self.view {
            View::Playlists => self
                .playlists
                .iter()
                .map(|p| {
                    let marker = if self.target_playlist == Some(p.id) {
                        " *"
                    } else {
                        ""
                    };
                    format!("{} ({} tracks){}", p.title, p.track_count, marker)
                })
                .collect(),
            View::Artists => self
                .artists
                .iter()
                .map(|a| match a.genre.as_deref().filter(|g| !g.trim().is_empty()) {
                    Some(genre) => format!("{} · {}", a.name, genre),
                    None => a.name.clone(),
                })
                .collect(),
            View::Plans => self
                .plans
                .iter()
                .map(|p| {
                    let description = p.description.as_deref().unwrap_or("");
                    format!("{} - ${:.2}  {}", p.name, p.price, description)
                        .trim_end()
                        .to_string()
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        match self.current_tracks() {
            Some(tracks) => tracks.len(),
            None => match self.view {
                View::Playlists => self.playlists.len(),
                View::Artists => self.artists.len(),
                View::Plans => self.plans.len(),
                _ => 0,
            },
        }
    }

    /// Return the visible row indices, taking the active filter into account.
    pub fn display_indices(&self) -> Vec<usize> {
        let query = self.filter_query.trim();
        if query.is_empty() {
            return (0..self.row_count()).collect();
        }
        self.labels()
            .iter()
            .enumerate()
            .filter(|(_, label)| Self::fuzzy_match_positions(label, query).is_some())
            .map(|(i, _)| i)
            .collect()
    }

    /// The selected track, when the current view lists tracks and the
    /// selection is visible.
    pub fn selected_track(&self) -> Option<&Track> {
        if !self.display_indices().contains(&self.selected) {
            return None;
        }
        self.current_tracks()?.get(self.selected)
    }

    /// The selected playlist while the playlist index is shown.
    pub fn selected_playlist(&self) -> Option<&Playlist> {
        if self.view != View::Playlists || self.open_playlist.is_some() {
            return None;
        }
        self.playlists.get(self.selected)
    }

    /// Return the next visible index in the current display order after `current`.
    /// Wraps around to the first element.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Return the previous visible index in the current display order before `current`.
    /// Wraps around to the last element.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(0) => Some(display[display.len() - 1]),
            Some(p) => Some(display[p - 1]),
            None => Some(display[display.len() - 1]),
        }
    }

    /// Set the selected row and ensure it is visible in the display.
    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible();
    }

    /// Move selection to the next visible row.
    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    /// Move selection to the previous visible row.
    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    pub fn select_first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }

    /// Fuzzy/subsequence match: return the character positions in `title`
    /// that match `query`, or `None` if not matched.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        if query.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title.chars().enumerate();

        for qc in query.chars() {
            let qc_low = qc.to_ascii_lowercase();
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc.to_ascii_lowercase() == qc_low => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    /// Enter filter mode.
    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.ensure_selected_visible();
    }

    /// Leave filter mode, keeping the query applied.
    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    /// Clear the active filter and restore selection visibility.
    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    /// Append a character to the filter query and refresh view.
    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    /// Remove the last character from the filter query and refresh view.
    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Ensure that `selected` is part of the current filtered view, otherwise
    /// move selection to the first visible row.
    pub(super) fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            self.selected = 0;
            return;
        }

        if !display.contains(&self.selected) {
            self.selected = display[0];
        }
    }

    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt = Some(Prompt::new(kind));
    }

    /// Close the prompt and return what was typed, trimmed. Blank input
    /// yields `None`.
    pub fn take_prompt(&mut self) -> Option<(PromptKind, String)> {
        let prompt = self.prompt.take()?;
        let input = prompt.input.trim().to_string();
        (!input.is_empty()).then_some((prompt.kind, input))
    }

    /// Ask before deleting the selected track. Returns `false` when no track
    /// is selected.
    pub fn confirm_delete_selected(&mut self) -> bool {
        let Some(track) = self.selected_track() else {
            return false;
        };
        self.confirm = Some(Confirm::DeleteTrack {
            id: track.id,
            title: track.title.clone(),
        });
        true
    }

    pub fn take_confirm(&mut self) -> Option<Confirm> {
        self.confirm.take()
    }

    pub fn show_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Close the open playlist and return to the playlist index.
    pub fn close_playlist(&mut self) -> bool {
        let Some(playlist) = self.open_playlist.take() else {
            return false;
        };
        self.selected = self
            .playlists
            .iter()
            .position(|p| p.id == playlist.id)
            .unwrap_or(0);
        self.filter_query.clear();
        true
    }

    /// Mark the selected playlist as the target for `a`.
    pub fn mark_target_playlist(&mut self) -> Option<&Playlist> {
        let id = self.selected_playlist()?.id;
        self.target_playlist = Some(id);
        self.playlists.iter().find(|p| p.id == id)
    }
}
