//! audio-dumper - fetch, decrypt and tag audio tracks.
//!
//! This library turns a track descriptor (artist, title, ids and a source
//! URL) into a finished, tagged audio file.
//!
//! # Features
//!
//! - Direct media downloads with resumable-safe `.part` files
//! - AES-128 encrypted HLS playlists with key rotation
//! - Bounded concurrent segment fetching with ordered reassembly
//! - Retry with exponential backoff for every network request
//! - ffmpeg stream-copy remux with tags and cover art
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use audio_dumper::{
//!     Config, FfmpegRemuxer, HttpFetcher, NoProgress, TrackDescriptor, TrackFetcher,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let fetcher = HttpFetcher::new(&config.network.user_agent, config.request_timeout())?;
//!     let remuxer = FfmpegRemuxer::new(&config.remux.ffmpeg_path, config.remux.container);
//!     let pipeline = TrackFetcher::new(Arc::new(fetcher), Arc::new(remuxer), Arc::new(NoProgress));
//!
//!     let track = TrackDescriptor {
//!         id: "456239017".into(),
//!         artist: "Artist".into(),
//!         title: "Title".into(),
//!         owner_id: "-2001".into(),
//!         url: "https://cdn.example/audio/index.m3u8".into(),
//!         cover_url: None,
//!     };
//!     pipeline
//!         .fetch_track(&track, Path::new("Artist - Title.mp3"), &config.fetch_options())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod hls;
pub mod media;
pub mod net;
pub mod output;
pub mod remux;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use config::Config;
pub use download::{download_direct, FetchOptions, RunStats, TrackFetcher, TrackOutcome};
pub use error::{Error, Result, Stage, TrackError};
pub use media::{SourceKind, TrackDescriptor};
pub use net::{Fetcher, HttpFetcher, RetryPolicy};
pub use output::{BarProgress, NoProgress, ProgressSink};
pub use remux::{Container, FfmpegRemuxer, Remuxer, TrackTags};
