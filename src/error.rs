//! Error types for the audio-dumper application.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // Playlist errors
    #[error("Malformed playlist: {0}")]
    MalformedPlaylist(String),

    #[error("Unsupported encryption method: {0}")]
    UnsupportedEncryption(String),

    // Fetch errors
    #[error("Failed to fetch key {url}: {source}")]
    KeyFetch {
        url: String,
        #[source]
        source: NetError,
    },

    #[error("Failed to fetch segment #{index}: {source}")]
    SegmentFetch {
        index: usize,
        #[source]
        source: NetError,
    },

    #[error("Failed to decrypt segment #{index}: {message}")]
    SegmentDecrypt { index: usize, message: String },

    #[error("Reassembly error: {0}")]
    Reassembly(String),

    #[error("Download of {} failed: {reason}", .path.display())]
    Download {
        status: Option<u16>,
        path: PathBuf,
        reason: String,
    },

    // External tool errors
    #[error("Remux failed: {0}")]
    Remux(String),

    #[error("FFmpeg not found. Please install ffmpeg and ensure it's in your PATH.")]
    FFmpegNotFound,

    // File system errors
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed classification of a failed network operation.
///
/// The retry helper only looks at [`NetError::is_retryable`], so the
/// "resource is gone" class never burns through the retry budget.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("not found (HTTP {0})")]
    NotFound(u16),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connect(String),

    #[error("response body interrupted: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

impl NetError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 | 410 => NetError::NotFound(status),
            _ => NetError::Status(status),
        }
    }

    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, NetError::NotFound(_))
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            NetError::NotFound(s) | NetError::Status(s) => Some(*s),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetError::Timeout
        } else if err.is_connect() {
            NetError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            NetError::from_status(status.as_u16())
        } else if err.is_body() || err.is_decode() {
            NetError::Body(err.to_string())
        } else {
            NetError::Other(err.to_string())
        }
    }
}

/// Pipeline stage a track failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Playlist,
    Key,
    Segment,
    Decrypt,
    Download,
    Remux,
    Filesystem,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Playlist => write!(f, "playlist"),
            Stage::Key => write!(f, "key"),
            Stage::Segment => write!(f, "segment"),
            Stage::Decrypt => write!(f, "decrypt"),
            Stage::Download => write!(f, "download"),
            Stage::Remux => write!(f, "remux"),
            Stage::Filesystem => write!(f, "filesystem"),
        }
    }
}

/// Failure of a whole track, as returned by `TrackFetcher::fetch_track`.
#[derive(Error, Debug)]
#[error("track {track_id} failed during {stage}: {source}")]
pub struct TrackError {
    pub track_id: String,
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl TrackError {
    pub fn new(track_id: impl Into<String>, source: Error) -> Self {
        Self {
            track_id: track_id.into(),
            stage: stage_of(&source),
            source,
        }
    }

    /// Index of the segment that failed, for segment-level failures.
    pub fn segment_index(&self) -> Option<usize> {
        match &self.source {
            Error::SegmentFetch { index, .. } | Error::SegmentDecrypt { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }
}

fn stage_of(err: &Error) -> Stage {
    match err {
        Error::MalformedPlaylist(_) | Error::UnsupportedEncryption(_) | Error::UrlParse(_) => {
            Stage::Playlist
        }
        Error::KeyFetch { .. } => Stage::Key,
        Error::SegmentFetch { .. } => Stage::Segment,
        Error::SegmentDecrypt { .. } | Error::Reassembly(_) => Stage::Decrypt,
        Error::Download { .. } | Error::Http(_) => Stage::Download,
        Error::Remux(_) | Error::FFmpegNotFound => Stage::Remux,
        _ => Stage::Filesystem,
    }
}

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
    pub const SOME_TRACKS_FAILED: i32 = 6;
}
