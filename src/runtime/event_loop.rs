use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::{App, CatalogEvent, Confirm, PromptKind, View};
use crate::config;
use crate::player::{Notice, Player, PlayerCmd};
use crate::ui;

use super::startup::after_sign_in;
use super::tasks::Catalog;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Everything the loop talks to besides the terminal and the model.
pub struct Channels<'a> {
    pub player: &'a Player,
    pub catalog: &'a Catalog,
    pub notices: &'a Receiver<Notice>,
    pub catalog_rx: &'a Receiver<CatalogEvent>,
}

/// Main terminal event loop: handles input, UI drawing and results coming
/// back from the player and catalog tasks. Returns `Ok(())` when shutdown is
/// requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    channels: &Channels<'_>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Ok(notice) = channels.notices.try_recv() {
            app.show_notice(notice);
        }

        while let Ok(event) = channels.catalog_rx.try_recv() {
            let signed_in = matches!(event, CatalogEvent::SignedIn(_));
            app.apply_catalog(event);
            if signed_in {
                after_sign_in(channels.catalog, app);
            }
        }

        let display = app.display_indices();
        terminal.draw(|f| ui::draw(f, app, &display, settings))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, channels, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns `true` when the app should quit.
fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    channels: &Channels<'_>,
    state: &mut EventLoopState,
) -> bool {
    // A notice is modal; any key dismisses it.
    if app.notice.is_some() {
        app.dismiss_notice();
        return false;
    }

    if app.confirm.is_some() {
        handle_confirm_key(key, app, channels.catalog);
        return false;
    }

    if app.prompt.is_some() {
        handle_prompt_key(key, app, channels.catalog);
        return false;
    }

    if app.filter_mode {
        state.pending_gg = false;
        match key.code {
            KeyCode::Esc => app.clear_filter(),
            KeyCode::Backspace => app.pop_filter_char(),
            KeyCode::Char('j') | KeyCode::Char('n')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                app.next()
            }
            KeyCode::Char('k') | KeyCode::Char('p')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                app.prev()
            }
            KeyCode::Char(c) => {
                if !c.is_control() {
                    app.push_filter_char(c);
                }
            }
            KeyCode::Enter => {
                if !app.display_indices().is_empty() {
                    app.exit_filter_mode();
                    activate_selected(app, channels);
                }
            }
            _ => {}
        }
        return false;
    }

    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    let player = channels.player;
    let catalog = channels.catalog;
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Tab => app.next_view(),
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char(c @ '1'..='6') => {
            let idx = c as usize - '1' as usize;
            app.set_view(View::ALL[idx]);
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Enter => activate_selected(app, channels),
        KeyCode::Esc | KeyCode::Backspace => {
            if app.view == View::Playlists {
                app.close_playlist();
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let _ = player.send(PlayerCmd::TogglePause);
        }
        KeyCode::Char('L') | KeyCode::Right => {
            let _ = player.send(PlayerCmd::SeekBy(settings.controls.seek_step_percent));
        }
        KeyCode::Char('H') | KeyCode::Left => {
            let _ = player.send(PlayerCmd::SeekBy(-settings.controls.seek_step_percent));
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let _ = player.send(PlayerCmd::AdjustVolume(settings.controls.volume_step));
        }
        KeyCode::Char('-') => {
            let _ = player.send(PlayerCmd::AdjustVolume(-settings.controls.volume_step));
        }
        KeyCode::Char('f') => {
            if let Some(track) = app.selected_track() {
                catalog.toggle_like(track.clone());
            }
        }
        KeyCode::Char('D') => {
            app.confirm_delete_selected();
        }
        KeyCode::Char('u') => app.open_prompt(PromptKind::Upload),
        KeyCode::Char('n') => app.open_prompt(PromptKind::NewPlaylist),
        KeyCode::Char('m') => {
            if let Some(title) = app.mark_target_playlist().map(|p| p.title.clone()) {
                app.status = format!("Adding to \"{}\" with [a]", title);
            }
        }
        KeyCode::Char('a') => add_selected_to_target(app, catalog),
        KeyCode::Char('x') => {
            let open = app.open_playlist.as_ref().map(|p| p.id);
            if let (Some(playlist), Some(track)) = (open, app.selected_track()) {
                catalog.remove_from_playlist(playlist, track.id);
            }
        }
        KeyCode::Char(']') => {
            if app.view == View::All && app.page < app.pages {
                catalog.load_page(app.page + 1);
            }
        }
        KeyCode::Char('[') => {
            if app.view == View::All && app.page > 1 {
                catalog.load_page(app.page - 1);
            }
        }
        KeyCode::Char('R') => refresh_view(app, catalog),
        _ => {}
    }

    false
}

/// `y` runs the confirmed action; any other key cancels it.
fn handle_confirm_key(key: KeyEvent, app: &mut App, catalog: &Catalog) {
    let Some(confirm) = app.take_confirm() else {
        return;
    };
    if !matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
        debug!(?confirm, "Cancelled");
        return;
    }
    match confirm {
        Confirm::DeleteTrack { id, title } => {
            app.status = format!("Deleting \"{}\"", title);
            catalog.delete_track(id);
        }
    }
}

fn handle_prompt_key(key: KeyEvent, app: &mut App, catalog: &Catalog) {
    let Some(prompt) = app.prompt.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => app.prompt = None,
        KeyCode::Backspace => {
            prompt.input.pop();
        }
        KeyCode::Enter => match app.take_prompt() {
            Some((PromptKind::Upload, path)) => {
                app.status = format!("Uploading {}", path);
                catalog.upload(PathBuf::from(path));
            }
            Some((PromptKind::NewPlaylist, title)) => catalog.create_playlist(title),
            None => {}
        },
        KeyCode::Char(c) if !c.is_control() => prompt.input.push(c),
        _ => {}
    }
}

/// Enter on a row: play a track or open a playlist.
fn activate_selected(app: &mut App, channels: &Channels<'_>) {
    if let Some(track) = app.selected_track() {
        debug!(track_id = %track.id, "Play requested");
        let _ = channels.player.send(PlayerCmd::Play(track.clone()));
    } else if let Some(playlist) = app.selected_playlist() {
        channels.catalog.open_playlist(playlist.id);
    }
}

fn add_selected_to_target(app: &mut App, catalog: &Catalog) {
    let Some(track) = app.selected_track().map(|t| t.id) else {
        return;
    };
    match app.target_playlist {
        Some(playlist) => catalog.add_to_playlist(playlist, track),
        None => {
            app.show_notice(Notice::new(
                "No playlist selected",
                "Mark a playlist with [m] in the Playlists tab first.",
            ));
        }
    }
}

fn refresh_view(app: &App, catalog: &Catalog) {
    match app.view {
        View::All => catalog.load_page(app.page),
        View::Popular => catalog.load_popular(),
        View::Liked => {
            if let Some(user) = &app.user {
                catalog.load_liked(user.user_id);
            }
        }
        View::Playlists => match (&app.open_playlist, &app.user) {
            (Some(open), _) => catalog.open_playlist(open.id),
            (None, Some(user)) => catalog.load_playlists(user.user_id),
            (None, None) => {}
        },
        View::Artists => catalog.load_artists(),
        View::Plans => catalog.load_plans(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use tokio::runtime::Runtime;

    use super::*;
    use crate::api::{ApiClient, Track, TrackId};
    use crate::config::{AudioSettings, LibrarySettings};

    struct Fixture {
        player: Player,
        notices: Receiver<Notice>,
        catalog: Catalog,
        catalog_rx: Receiver<CatalogEvent>,
        settings: config::Settings,
        _runtime: Runtime,
    }

    impl Fixture {
        fn new() -> Self {
            // Never driven: spawned catalog calls stay queued.
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
            let (player, notices) = Player::spawn(
                AudioSettings::default(),
                client.stream_endpoints(),
                client.http(),
                runtime.handle().clone(),
            );
            let (tx, catalog_rx) = mpsc::channel();
            let catalog = Catalog::new(
                client,
                runtime.handle().clone(),
                tx,
                LibrarySettings::default(),
            );
            Self {
                player,
                notices,
                catalog,
                catalog_rx,
                settings: config::Settings::default(),
                _runtime: runtime,
            }
        }

        fn press(&self, app: &mut App, code: KeyCode) -> bool {
            let channels = Channels {
                player: &self.player,
                catalog: &self.catalog,
                notices: &self.notices,
                catalog_rx: &self.catalog_rx,
            };
            let mut state = EventLoopState::default();
            handle_key_event(
                KeyEvent::new(code, KeyModifiers::NONE),
                &self.settings,
                app,
                &channels,
                &mut state,
            )
        }
    }

    fn track(id: i64, title: &str) -> Track {
        Track {
            id: TrackId(id),
            title: title.into(),
            artist_id: None,
            artist_name: "Nina".into(),
            album_title: None,
            duration: None,
            duration_seconds: 0,
            likes_count: 0,
            is_liked_by_user: false,
        }
    }

    #[test]
    fn q_requests_quit_without_stopping_player() {
        let f = Fixture::new();
        let mut app = App::new();

        assert!(f.press(&mut app, KeyCode::Char('q')));
        // Shutting the player down is left to the caller of the loop.
        assert!(f.player.send(PlayerCmd::Pause).is_ok());
    }

    #[test]
    fn delete_waits_for_yes() {
        let f = Fixture::new();
        let mut app = App::new();
        app.all = vec![track(1, "Alpha")];

        assert!(!f.press(&mut app, KeyCode::Char('D')));
        assert!(app.confirm.is_some());
        assert!(app.status.is_empty());

        f.press(&mut app, KeyCode::Char('n'));
        assert!(app.confirm.is_none());
        assert!(app.status.is_empty());

        f.press(&mut app, KeyCode::Char('D'));
        f.press(&mut app, KeyCode::Char('y'));
        assert!(app.confirm.is_none());
        assert_eq!(app.status, "Deleting \"Alpha\"");
        assert_eq!(app.all.len(), 1);
    }

    #[test]
    fn other_keys_are_swallowed_while_confirming() {
        let f = Fixture::new();
        let mut app = App::new();
        app.all = vec![track(1, "Alpha")];

        f.press(&mut app, KeyCode::Char('D'));
        // Cancels instead of quitting.
        assert!(!f.press(&mut app, KeyCode::Char('q')));
        assert!(app.confirm.is_none());
    }
}
