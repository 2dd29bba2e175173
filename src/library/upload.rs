use std::path::Path;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::Accessor;
use tracing::debug;

use crate::api::UploadMetadata;

use super::display::format_hms;

/// Read the form fields for uploading the file at `path` from its tags.
///
/// Files lofty cannot read still upload: the title falls back to the file
/// stem and the artist to "Unknown Artist".
pub fn read_upload_metadata(path: &Path) -> UploadMetadata {
    let mut meta = UploadMetadata {
        title: path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string(),
        artist_name: "Unknown Artist".to_string(),
        album_title: None,
        duration: None,
    };

    let tagged = match lofty::read_from_path(path) {
        Ok(tagged) => tagged,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No readable tags");
            return meta;
        }
    };

    let duration = tagged.properties().duration();
    if !duration.is_zero() {
        meta.duration = Some(format_hms(duration));
    }

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        if let Some(v) = non_empty(tag.title().as_deref()) {
            meta.title = v;
        }
        if let Some(v) = non_empty(tag.artist().as_deref()) {
            meta.artist_name = v;
        }
        meta.album_title = non_empty(tag.album().as_deref());
    }

    meta
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
