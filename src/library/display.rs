use std::time::Duration;

use crate::api::Track;
use crate::config::TrackField;

/// Build a display string for `track` from the configured `fields`, joined by
/// `sep`. Falls back to the title when no field produced anything.
pub fn display_from_fields(track: &Track, fields: &[TrackField], sep: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for f in fields {
        let value = match f {
            TrackField::Title => Some(track.title.as_str()),
            TrackField::Artist => Some(track.artist_name.as_str()),
            TrackField::Album => track.album_title.as_deref(),
        };
        if let Some(v) = value.map(str::trim).filter(|s| !s.is_empty()) {
            parts.push(v);
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}

/// `Artist - Title`, the text the list filter matches against.
pub fn list_label(track: &Track) -> String {
    let artist = track.artist_name.trim();
    if artist.is_empty() {
        track.title.clone()
    } else {
        format!("{} - {}", artist, track.title)
    }
}

/// `m:ss`, or `h:mm:ss` past an hour.
pub fn format_mmss(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// `HH:MM:SS`, the duration format the service stores.
pub fn format_hms(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Listed duration of a track, preferring the numeric field.
pub fn track_duration_label(track: &Track) -> String {
    if track.duration_seconds > 0 {
        return format_mmss(track.duration_seconds);
    }
    match track.duration.as_deref().and_then(parse_hms) {
        Some(secs) => format_mmss(secs),
        None => "--:--".to_string(),
    }
}

fn parse_hms(s: &str) -> Option<u64> {
    s.split(':')
        .map(|p| p.trim().parse::<u64>().ok())
        .try_fold(0u64, |acc, part| Some(acc * 60 + part?))
}
