//! Remux module.
//!
//! Provides:
//! - The `Remuxer` capability (stream copy + tags + cover)
//! - The ffmpeg-backed implementation
//! - Output container and tag definitions

pub mod ffmpeg;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::media::TrackDescriptor;

pub use ffmpeg::FfmpegRemuxer;

/// Textual metadata embedded in the final file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub artist: String,
    pub title: String,
    /// `<owner_id>_<id>`, the identifier the track can be looked up by.
    pub comment: String,
}

impl TrackTags {
    pub fn from_descriptor(track: &TrackDescriptor) -> Self {
        Self {
            artist: track.artist.clone(),
            title: track.title.clone(),
            comment: format!("{}_{}", track.owner_id, track.id),
        }
    }
}

/// Target container of the remux step.
///
/// Audio is stream-copied, so only containers that accept the source's MP3
/// stream are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    #[default]
    Mp3,
}

impl Container {
    /// File extension, without dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp3 => "mp3",
        }
    }

    /// Muxer name passed to `ffmpeg -f`.
    pub fn muxer(&self) -> &'static str {
        match self {
            Container::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(Container::Mp3),
            _ => Err(format!(
                "Unsupported container: {} (audio is stream-copied, only mp3 is available)",
                s
            )),
        }
    }
}

/// Copies an audio stream into a tagged container without re-encoding.
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Container written by [`Remuxer::remux`].
    fn container(&self) -> Container;

    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        tags: &TrackTags,
        cover: Option<&Path>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_parse() {
        assert_eq!("MP3".parse::<Container>(), Ok(Container::Mp3));
        for name in ["m4a", "ogg", "flac"] {
            let err = name.parse::<Container>().unwrap_err();
            assert!(err.contains("only mp3"), "{}", err);
        }
    }
}
