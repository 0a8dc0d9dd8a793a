//! Filename generation and manipulation.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::media::{truncate, TrackDescriptor};
use crate::remux::Container;

/// Longest artist / title kept in a generated filename.
const MAX_NAME_PART: usize = 100;

fn invalid_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("valid regex"))
}

/// Make `name` safe to use as a single path component on NTFS and POSIX.
///
/// Invalid characters are replaced with `_` and trailing dots/spaces are
/// dropped. Names that end up empty or are `.`/`..` are rejected.
pub fn sanitize_filename(name: &str) -> Result<String> {
    let sanitized = invalid_chars().replace_all(name, "_");
    let sanitized = sanitized
        .trim_end_matches(|c: char| c == '.' || c == ' ')
        .trim_start();

    if sanitized.is_empty() {
        return Err(Error::InvalidFilename(format!(
            "Filename cannot be empty after sanitizing: '{}'",
            name
        )));
    }

    Ok(sanitized.to_string())
}

/// Default output filename: `"<artist> - <title> (<id>).<ext>"`.
pub fn track_filename(track: &TrackDescriptor, container: Container) -> Result<String> {
    let name = format!(
        "{} - {} ({}).{}",
        truncate(&track.artist, MAX_NAME_PART),
        truncate(&track.title, MAX_NAME_PART),
        track.id,
        container.extension()
    );
    sanitize_filename(&name)
}
