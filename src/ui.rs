//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Tabs, Wrap},
};

use crate::app::{App, View};
use crate::config::{ControlsSettings, Settings, UiSettings};
use crate::library::{display_from_fields, format_mmss};
use crate::player::PlaybackState;

const LEFT_PAD: Padding = Padding {
    left: 1,
    right: 0,
    top: 0,
    bottom: 0,
};

/// Render the controls help text for the current view.
fn controls_text(view: View, controls: &ControlsSettings) -> String {
    let mut keys: Vec<String> = vec![
        "[j/k] up/down".into(),
        "[tab/1-6] views".into(),
        "[enter] play/open".into(),
        "[space/p] play/pause".into(),
        format!("[H/L] seek -/+{}%", controls.seek_step_percent),
        format!("[-/+] volume {:.0}%", controls.volume_step * 100.0),
        "[/] filter".into(),
    ];
    match view {
        View::All | View::Popular | View::Liked => {
            keys.push("[f] like".into());
            keys.push("[a] add to playlist".into());
            keys.push("[D] delete".into());
        }
        View::Playlists => {
            keys.push("[m] mark target".into());
            keys.push("[x] remove".into());
            keys.push("[esc] back".into());
        }
        View::Artists | View::Plans => {}
    }
    if view == View::All {
        keys.push("[ [/] ] page".into());
    }
    keys.push("[u] upload".into());
    keys.push("[n] new playlist".into());
    keys.push("[R] refresh".into());
    keys.push("[q] quit".into());
    keys.join(" | ")
}

/// A fixed-width text progress bar.
fn progress_bar(percent: f64, width: u16) -> String {
    let width = width.max(1) as usize;
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "━".repeat(filled), "─".repeat(width - filled.min(width)))
}

/// Lines of the player bar.
fn player_lines(playback: Option<&PlaybackState>, ui: &UiSettings) -> Vec<Line<'static>> {
    let Some(state) = playback else {
        return vec![Line::from("Select a track to play")];
    };
    let Some(track) = state.current_track.as_ref() else {
        return vec![Line::from("Select a track to play")];
    };

    let glyph = if state.is_playing { "▶" } else { "⏸" };
    let title = display_from_fields(track, &ui.now_playing_fields, &ui.now_playing_separator);

    let total = state.duration_seconds();
    let time = if total > 0.0 {
        format!(
            "{} / {}",
            format_mmss(state.elapsed_seconds() as u64),
            format_mmss(total as u64)
        )
    } else {
        "--:-- / --:--".to_string()
    };

    vec![
        Line::from(format!("{glyph} {title}")),
        Line::from(format!(
            "{time}  {}  vol {:.0}%",
            progress_bar(state.progress_percent(), ui.progress_width),
            state.volume * 100.0
        )),
    ]
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Uppercase the characters of `label` matched by the filter query.
fn highlight(label: &str, query: &str) -> String {
    let Some(positions) = App::fuzzy_match_positions(label, query) else {
        return label.to_string();
    };
    let mut rendered = String::new();
    let mut pos_iter = positions.into_iter();
    let mut next_pos = pos_iter.next();

    for (ci, ch) in label.chars().enumerate() {
        if next_pos == Some(ci) {
            rendered.extend(ch.to_uppercase());
            next_pos = pos_iter.next();
        } else {
            rendered.push(ch);
        }
    }
    rendered
}

fn list_title(app: &App) -> String {
    match app.view {
        View::All => format!(" tracks · page {}/{} · {} total ", app.page, app.pages, app.total_tracks),
        View::Playlists => match &app.open_playlist {
            Some(p) => format!(" {} ", p.title),
            None => " playlists ".to_string(),
        },
        other => format!(" {} ", other.title().to_lowercase()),
    }
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, display: &[usize], settings: &Settings) {
    let ui_settings = &settings.ui;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let account = match &app.user {
        Some(user) => format!(" {} ", user.username),
        None => " not signed in ".to_string(),
    };
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" cadenza ")
                .title_alignment(Alignment::Center)
                .title_bottom(Line::from(account).right_aligned()),
        );
    frame.render_widget(header, chunks[0]);

    // Tabs and status
    let tabs = Tabs::new(View::ALL.iter().map(|v| v.title()))
        .select(app.view.index())
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(
            Block::bordered()
                .padding(LEFT_PAD)
                .title_bottom(Line::from(status_text(app)).right_aligned()),
        );
    frame.render_widget(tabs, chunks[1]);

    // Main list
    {
        let q = app.filter_query.trim();
        let labels = app.labels();

        // Center the selected item when possible by creating a visible window.
        let total = display.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let current = app
            .playback()
            .and_then(|s| s.current_track.map(|t| t.id));
        let tracks = app.current_tracks();
        let visible_items: Vec<ListItem> = display[start..end]
            .iter()
            .map(|&i| {
                let label = labels.get(i).map(String::as_str).unwrap_or_default();
                let mut text = if q.is_empty() {
                    label.to_string()
                } else {
                    highlight(label, q)
                };
                if let Some(track) = tracks.and_then(|t| t.get(i)) {
                    let heart = if track.is_liked_by_user { "♥" } else { "♡" };
                    text = format!("{text}  {heart} {}", track.likes_count);
                    if current == Some(track.id) {
                        text = format!("♪ {text}");
                    }
                }
                ListItem::new(text)
            })
            .collect();

        let empty_hint = if total == 0 && app.row_count() == 0 {
            " (empty) "
        } else {
            ""
        };
        let list = List::new(visible_items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(list_title(app))
                    .title_bottom(empty_hint),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Player bar
    let playback = app.playback();
    let player = Paragraph::new(player_lines(playback.as_ref(), ui_settings))
        .block(Block::bordered().padding(LEFT_PAD).title(" player "));
    frame.render_widget(player, chunks[3]);

    let footer = Paragraph::new(controls_text(app.view, &settings.controls))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(LEFT_PAD),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);

    if let Some(prompt) = &app.prompt {
        let area = centered_rect_sized(60, 3, chunks[2]);
        frame.render_widget(Clear, area);
        let input = Paragraph::new(format!("{}▏", prompt.input)).block(
            Block::default()
                .borders(Borders::ALL)
                .padding(LEFT_PAD)
                .title(prompt.kind.title())
                .title_bottom(" enter submits · esc cancels "),
        );
        frame.render_widget(input, area);
    }

    if let Some(confirm) = &app.confirm {
        let area = centered_rect_sized(60, 6, frame.area());
        frame.render_widget(Clear, area);
        let popup = Paragraph::new(confirm.message())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .padding(LEFT_PAD)
                    .title(confirm.title())
                    .title_bottom(" [y] yes · any other key cancels "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(popup, area);
    }

    // Notices go on top of everything else.
    if let Some(notice) = &app.notice {
        let area = centered_rect_sized(60, 7, frame.area());
        frame.render_widget(Clear, area);
        let popup = Paragraph::new(notice.message.as_str())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .padding(LEFT_PAD)
                    .title(format!(" {} ", notice.title))
                    .title_bottom(" any key closes "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(popup, area);
    }
}

fn status_text(app: &App) -> String {
    let mut parts: Vec<String> = Vec::new();
    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        parts.push(format!("FILTER: {}", q));
    }
    if !app.status.is_empty() {
        parts.push(app.status.clone());
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" {} ", parts.join(" • "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Track, TrackId};

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0.0, 4), "────");
        assert_eq!(progress_bar(50.0, 4), "━━──");
        assert_eq!(progress_bar(150.0, 4), "━━━━");
    }

    #[test]
    fn idle_player_prompts_for_selection() {
        let ui = UiSettings::default();
        let idle = PlaybackState::default();
        assert_eq!(player_lines(None, &ui), vec![Line::from("Select a track to play")]);
        assert_eq!(player_lines(Some(&idle), &ui), vec![Line::from("Select a track to play")]);
    }

    #[test]
    fn player_shows_track_and_volume() {
        let ui = UiSettings::default();
        let state = PlaybackState {
            current_track: Some(Track {
                id: TrackId(1),
                title: "Song".into(),
                artist_id: None,
                artist_name: "Nina".into(),
                album_title: None,
                duration: None,
                duration_seconds: 0,
                likes_count: 0,
                is_liked_by_user: false,
            }),
            is_playing: true,
            volume: 0.5,
            progress_percent: 50.0,
            duration_seconds: 120.0,
        };
        let lines = player_lines(Some(&state), &ui);
        assert_eq!(lines[0], Line::from("▶ Song - Nina"));
        let second = lines[1].to_string();
        assert!(second.starts_with("1:00 / 2:00"));
        assert!(second.ends_with("vol 50%"));
    }

    #[test]
    fn highlight_uppercases_matches() {
        assert_eq!(highlight("nina - song", "ns"), "Nina - Song");
        assert_eq!(highlight("abc", "x"), "abc");
    }
}
