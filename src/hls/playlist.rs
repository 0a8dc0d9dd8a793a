//! M3U8 media playlist parsing.

use m3u8_rs::{Key, KeyMethod, MediaPlaylist, Playlist};

use crate::error::{Error, Result};

/// One encrypted (or plain) piece of a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position in the final output.
    pub index: usize,
    /// Absolute segment URL.
    pub url: String,
    /// Absolute URL of the AES-128 key, `None` when the segment is not encrypted.
    pub key_url: Option<String>,
}

/// Result of parsing a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPlaylist {
    pub segments: Vec<Segment>,
    /// Distinct key URLs, in the order they first appear.
    pub key_urls: Vec<String>,
}

impl ParsedPlaylist {
    pub fn is_encrypted(&self) -> bool {
        !self.key_urls.is_empty()
    }
}

/// Parse playlist text fetched from `playlist_url`.
///
/// Segment and key URIs are resolved against the playlist's own directory.
pub fn parse_playlist(content: &[u8], playlist_url: &str) -> Result<ParsedPlaylist> {
    let playlist = m3u8_rs::parse_playlist_res(content)
        .map_err(|e| Error::MalformedPlaylist(format!("Failed to parse playlist: {:?}", e)))?;

    let media = match playlist {
        Playlist::MediaPlaylist(media) => media,
        Playlist::MasterPlaylist(_) => {
            return Err(Error::MalformedPlaylist(
                "Master playlists are not supported".into(),
            ))
        }
    };

    let parsed = extract_segments(playlist_url, &media)?;
    if parsed.segments.is_empty() {
        return Err(Error::MalformedPlaylist("No segments found in playlist".into()));
    }

    Ok(parsed)
}

/// Walk the segments, carrying the active `EXT-X-KEY` forward.
fn extract_segments(base_url: &str, playlist: &MediaPlaylist) -> Result<ParsedPlaylist> {
    let mut segments = Vec::with_capacity(playlist.segments.len());
    let mut key_urls: Vec<String> = Vec::new();
    let mut active_key: Option<String> = None;

    for seg in &playlist.segments {
        if let Some(key) = &seg.key {
            active_key = key_url(base_url, key)?;
            if let Some(url) = &active_key {
                if !key_urls.contains(url) {
                    key_urls.push(url.clone());
                }
            }
        }

        if seg.uri.trim().is_empty() {
            continue;
        }

        segments.push(Segment {
            index: segments.len(),
            url: resolve_url(base_url, seg.uri.trim())?,
            key_url: active_key.clone(),
        });
    }

    Ok(ParsedPlaylist { segments, key_urls })
}

/// Key URL declared by an `EXT-X-KEY` tag, `None` for `METHOD=NONE`.
fn key_url(base_url: &str, key: &Key) -> Result<Option<String>> {
    match &key.method {
        KeyMethod::None => Ok(None),
        KeyMethod::AES128 => {
            if key.iv.is_some() {
                tracing::debug!("Ignoring playlist IV, segments use a zero IV");
            }
            let uri = key
                .uri
                .as_deref()
                .ok_or_else(|| Error::MalformedPlaylist("AES-128 key without URI".into()))?;
            Ok(Some(resolve_url(base_url, uri)?))
        }
        KeyMethod::SampleAES => Err(Error::UnsupportedEncryption("SAMPLE-AES".into())),
        KeyMethod::Other(method) => Err(Error::UnsupportedEncryption(method.clone())),
    }
}

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &str, path: &str) -> Result<String> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(path.to_string());
    }

    let base_url = url::Url::parse(base)?;
    let resolved = base_url.join(path)?;
    Ok(resolved.to_string())
}
