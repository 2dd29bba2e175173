use std::time::Duration;

use super::*;
use crate::api::{Track, TrackId};
use crate::config::TrackField;

fn t(title: &str, artist: &str, album: Option<&str>) -> Track {
    Track {
        id: TrackId(1),
        title: title.into(),
        artist_id: None,
        artist_name: artist.into(),
        album_title: album.map(str::to_string),
        duration: None,
        duration_seconds: 0,
        likes_count: 0,
        is_liked_by_user: false,
    }
}

#[test]
fn display_from_fields_can_format_artist_title() {
    let track = t("Song", "  Artist  ", None);
    assert_eq!(
        display_from_fields(&track, &[TrackField::Artist, TrackField::Title], " - "),
        "Artist - Song"
    );
    // Missing album is skipped, not rendered empty.
    assert_eq!(
        display_from_fields(
            &track,
            &[TrackField::Title, TrackField::Album, TrackField::Artist],
            " | "
        ),
        "Song | Artist"
    );
}

#[test]
fn display_from_fields_falls_back_to_title() {
    let track = t("Song", "", None);
    assert_eq!(display_from_fields(&track, &[TrackField::Artist], " - "), "Song");
    assert_eq!(display_from_fields(&track, &[], " - "), "Song");
}

#[test]
fn list_label_omits_blank_artist() {
    assert_eq!(list_label(&t("Song", "Nina", None)), "Nina - Song");
    assert_eq!(list_label(&t("Song", " ", None)), "Song");
}

#[test]
fn format_mmss_and_hms() {
    assert_eq!(format_mmss(0), "0:00");
    assert_eq!(format_mmss(75), "1:15");
    assert_eq!(format_mmss(3725), "1:02:05");
    assert_eq!(format_hms(Duration::from_secs(210)), "00:03:30");
    assert_eq!(format_hms(Duration::from_secs(3725)), "01:02:05");
}

#[test]
fn duration_label_prefers_seconds_then_text() {
    let mut track = t("Song", "Nina", None);
    assert_eq!(track_duration_label(&track), "--:--");

    track.duration = Some("00:03:30".into());
    assert_eq!(track_duration_label(&track), "3:30");

    track.duration_seconds = 61;
    assert_eq!(track_duration_label(&track), "1:01");
}

#[test]
fn upload_metadata_falls_back_for_untagged_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Late Night Demo.mp3");
    std::fs::write(&path, b"not really an mp3").unwrap();

    let meta = read_upload_metadata(&path);
    assert_eq!(meta.title, "Late Night Demo");
    assert_eq!(meta.artist_name, "Unknown Artist");
    assert!(meta.album_title.is_none());
    assert!(meta.duration.is_none());
}
