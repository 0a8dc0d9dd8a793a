//! Track descriptor representation.

use serde::{Deserialize, Serialize};

/// How a track's audio is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// HLS playlist of (possibly encrypted) segments.
    Playlist,
    /// A single media file.
    Direct,
}

/// Everything the pipeline needs to know about one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Track ID.
    pub id: String,

    pub artist: String,

    pub title: String,

    /// Owner (user or group) ID.
    pub owner_id: String,

    /// Playlist or direct media URL.
    pub url: String,

    /// Optional cover art URL.
    #[serde(default)]
    pub cover_url: Option<String>,
}

impl TrackDescriptor {
    /// Detect the source kind from the URL path.
    pub fn source_kind(&self) -> SourceKind {
        let path = url::Url::parse(&self.url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| self.url.split('?').next().unwrap_or("").to_string());

        if path.to_lowercase().ends_with(".m3u8") {
            SourceKind::Playlist
        } else {
            SourceKind::Direct
        }
    }

    /// Short "artist - title" label for logs and progress.
    pub fn label(&self) -> String {
        format!("{} - {}", truncate(&self.artist, 50), truncate(&self.title, 50))
    }
}

/// Cut `s` to at most `max` characters.
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
