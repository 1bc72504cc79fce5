use std::time::Duration;

use crate::config::TrackDisplayField;

use super::model::Track;

/// Format a duration as `M:SS`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Build a display string for a track according to the provided `fields` and separator.
///
/// Empty fields are skipped; falls back to the title when no parts were produced.
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        match f {
            TrackDisplayField::Title => {
                if !track.title.trim().is_empty() {
                    parts.push(track.title.trim().to_string());
                }
            }
            TrackDisplayField::Artist => {
                if !track.artist_name.trim().is_empty() {
                    parts.push(track.artist_name.trim().to_string());
                }
            }
            TrackDisplayField::Duration => {
                if let Some(d) = track.duration {
                    parts.push(format_duration(d));
                }
            }
            TrackDisplayField::Id => {
                if !track.id.is_empty() {
                    parts.push(track.id.clone());
                }
            }
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}
