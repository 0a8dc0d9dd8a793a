//! Command-line argument definitions using clap.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::media::TrackDescriptor;
use crate::remux::Container;

/// Audio track fetcher CLI.
#[derive(Parser, Debug)]
#[command(
    name = "audio-dumper",
    version,
    about = "Fetch, decrypt and tag audio tracks",
    long_about = "A CLI tool to save audio tracks delivered either as direct media files or as\n\
                  AES-128 encrypted HLS playlists, remuxed and tagged with ffmpeg.\n\n\
                  Pass a single track with --url/--artist/--title/--id/--owner-id, or a JSON\n\
                  list of tracks with --tracks."
)]
pub struct Args {
    /// Playlist (.m3u8) or direct media URL of a single track.
    #[arg(long, requires_all = ["artist", "title", "id", "owner_id"], conflicts_with = "tracks")]
    pub url: Option<String>,

    /// Track artist.
    #[arg(long)]
    pub artist: Option<String>,

    /// Track title.
    #[arg(long)]
    pub title: Option<String>,

    /// Track ID.
    #[arg(long)]
    pub id: Option<String>,

    /// Owner (user or group) ID.
    #[arg(long = "owner-id", allow_hyphen_values = true)]
    pub owner_id: Option<String>,

    /// Cover art URL.
    #[arg(long)]
    pub cover: Option<String>,

    /// JSON file with a list of track descriptors.
    #[arg(long)]
    pub tracks: Option<PathBuf>,

    /// Output directory.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Number of segments fetched at once.
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Overwrite existing files.
    #[arg(short = 'r', long = "rewrite")]
    pub rewrite: bool,

    /// Attempts per request before giving up.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Path to the ffmpeg binary.
    #[arg(long, env = "FFMPEG_PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Output container (mp3).
    #[arg(long)]
    pub container: Option<Container>,

    /// Don't embed cover art.
    #[arg(long)]
    pub no_cover: bool,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Hide download progress information.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(dir) = &self.download_directory {
            config.download.directory = Some(dir.clone());
        }

        if let Some(threads) = self.threads {
            config.download.concurrency = threads;
        }

        if let Some(retries) = self.retries {
            config.network.retry_bound = retries;
        }

        if let Some(ffmpeg) = &self.ffmpeg {
            config.remux.ffmpeg_path = ffmpeg.clone();
        }

        if let Some(container) = self.container {
            config.remux.container = container;
        }

        // Boolean flags (only override if set to non-default)
        if self.rewrite {
            config.download.overwrite = true;
        }

        if self.no_cover {
            config.remux.embed_cover = false;
        }
    }

    /// Tracks to process, from `--tracks` or the single-track flags.
    pub fn track_list(&self) -> Result<Vec<TrackDescriptor>> {
        if let Some(path) = &self.tracks {
            return load_tracks(path);
        }

        match (&self.url, &self.artist, &self.title, &self.id, &self.owner_id) {
            (Some(url), Some(artist), Some(title), Some(id), Some(owner_id)) => {
                Ok(vec![TrackDescriptor {
                    id: id.clone(),
                    artist: artist.clone(),
                    title: title.clone(),
                    owner_id: owner_id.clone(),
                    url: url.clone(),
                    cover_url: self.cover.clone(),
                }])
            }
            _ => Err(Error::MissingConfig(
                "a track (--url with --artist/--title/--id/--owner-id) or --tracks <file>"
                    .to_string(),
            )),
        }
    }
}

/// Read a JSON array of track descriptors.
pub fn load_tracks(path: &Path) -> Result<Vec<TrackDescriptor>> {
    let content = std::fs::read_to_string(path)?;
    let tracks: Vec<TrackDescriptor> = serde_json::from_str(&content)?;
    Ok(tracks)
}
