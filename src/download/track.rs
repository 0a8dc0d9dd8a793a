//! Whole-track pipeline: source -> audio stream -> tagged container.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::BufWriter;

use crate::download::direct::{download_direct, DirectOptions, DEFAULT_PROGRESS_INTERVAL};
use crate::error::{Error, Result, TrackError};
use crate::fs::{ensure_dir, remove_dir_if_exists, remove_file_if_exists, work_dir};
use crate::hls::{
    decrypt_segment, fetch_segments, parse_playlist, KeyResolver, Reassembler, DEFAULT_CONCURRENCY,
};
use crate::media::{SourceKind, TrackDescriptor};
use crate::net::{with_retry, Fetcher, RetryPolicy};
use crate::output::progress::{ProgressReporter, ProgressSink, ProgressUnit};
use crate::remux::{Remuxer, TrackTags};

/// Reassembled transport stream inside the work directory.
const STREAM_FILE: &str = "stream.ts";
/// Directly downloaded source inside the work directory.
const SOURCE_FILE: &str = "source";
const COVER_FILE: &str = "cover.jpg";

/// Per-track knobs.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Segments fetched at once.
    pub concurrency: usize,
    /// Replace an existing destination instead of skipping the track.
    pub overwrite: bool,
    pub retry: RetryPolicy,
    pub progress_interval: Duration,
    /// Embed cover art when the descriptor has one.
    pub embed_cover: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            overwrite: false,
            retry: RetryPolicy::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            embed_cover: true,
        }
    }
}

/// Result of a successful [`TrackFetcher::fetch_track`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    Fetched(PathBuf),
    /// The destination already existed.
    Skipped(PathBuf),
}

impl TrackOutcome {
    pub fn path(&self) -> &Path {
        match self {
            TrackOutcome::Fetched(path) | TrackOutcome::Skipped(path) => path,
        }
    }
}

/// Turns a [`TrackDescriptor`] into a finished, tagged audio file.
///
/// Every call owns its session state (key cache, progress counters, work
/// directory), so one fetcher can be reused for any number of tracks.
pub struct TrackFetcher {
    fetcher: Arc<dyn Fetcher>,
    remuxer: Arc<dyn Remuxer>,
    progress: Arc<dyn ProgressSink>,
}

impl TrackFetcher {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        remuxer: Arc<dyn Remuxer>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            fetcher,
            remuxer,
            progress,
        }
    }

    /// Fetch `track` into `destination`.
    ///
    /// On failure nothing is left at `destination` and the work directory is
    /// removed.
    pub async fn fetch_track(
        &self,
        track: &TrackDescriptor,
        destination: &Path,
        options: &FetchOptions,
    ) -> std::result::Result<TrackOutcome, TrackError> {
        let wrap = |e: Error| TrackError::new(track.id.clone(), e);

        let exists = tokio::fs::try_exists(destination)
            .await
            .map_err(|e| wrap(e.into()))?;
        if !options.overwrite && exists {
            tracing::info!("Skipping existing track: {}", destination.display());
            return Ok(TrackOutcome::Skipped(destination.to_path_buf()));
        }

        let work = work_dir(destination, &track.id).map_err(wrap)?;
        let label = track.label();

        let result = self.run(track, destination, &work, options, &label).await;

        if let Err(e) = remove_dir_if_exists(&work).await {
            tracing::warn!("Failed to remove {}: {}", work.display(), e);
        }
        self.progress.finish(&label);

        match result {
            Ok(()) => {
                tracing::info!("Saved {}", destination.display());
                Ok(TrackOutcome::Fetched(destination.to_path_buf()))
            }
            Err(e) => Err(wrap(e)),
        }
    }

    async fn run(
        &self,
        track: &TrackDescriptor,
        destination: &Path,
        work: &Path,
        options: &FetchOptions,
        label: &str,
    ) -> Result<()> {
        remove_dir_if_exists(work).await?;
        ensure_dir(work).await?;

        let audio = match track.source_kind() {
            SourceKind::Playlist => self.fetch_segmented(track, work, options, label).await?,
            SourceKind::Direct => self.fetch_direct(track, work, options).await?,
        };

        let cover = match (&track.cover_url, options.embed_cover) {
            (Some(url), true) => self.fetch_cover(url, work, options).await,
            _ => None,
        };

        let remuxed = work.join(format!("remux.{}", self.remuxer.container().extension()));
        let tags = TrackTags::from_descriptor(track);

        self.progress.status(label, "merging...");
        let remux = self
            .remuxer
            .remux(&audio, &remuxed, &tags, cover.as_deref())
            .await;
        match remux {
            Ok(()) => {}
            Err(e) if cover.is_some() => {
                tracing::warn!("Remux with cover failed ({}), retrying without cover", e);
                self.remuxer.remux(&audio, &remuxed, &tags, None).await?;
            }
            Err(e) => return Err(e),
        }

        if options.overwrite {
            remove_file_if_exists(destination).await?;
        }
        tokio::fs::rename(&remuxed, destination).await?;
        Ok(())
    }

    /// Playlist -> keys -> segments -> ordered plaintext in `stream.ts`.
    async fn fetch_segmented(
        &self,
        track: &TrackDescriptor,
        work: &Path,
        options: &FetchOptions,
        label: &str,
    ) -> Result<PathBuf> {
        let fetcher = self.fetcher.as_ref();

        let body = with_retry(&options.retry, "playlist", || fetcher.get_bytes(&track.url))
            .await
            .map_err(|e| Error::Download {
                status: e.status(),
                path: PathBuf::from(&track.url),
                reason: format!("playlist request failed: {}", e),
            })?;
        let playlist = parse_playlist(&body, &track.url)?;

        tracing::info!(
            "{}: {} segments, {} key(s)",
            label,
            playlist.segments.len(),
            playlist.key_urls.len()
        );

        let keys = KeyResolver::new(fetcher, options.retry);
        for url in &playlist.key_urls {
            keys.resolve(url).await?;
        }

        let stream_path = work.join(STREAM_FILE);
        let file = File::create(&stream_path).await?;
        let mut reassembler = Reassembler::new(BufWriter::new(file), playlist.segments.len());
        let mut reporter = ProgressReporter::new(
            self.progress.as_ref(),
            label,
            ProgressUnit::Segments,
            Some(playlist.segments.len() as u64),
            options.progress_interval,
        );

        let mut fetched = fetch_segments(
            fetcher,
            &playlist.segments,
            options.concurrency,
            options.retry,
        );
        while let Some(result) = fetched.next().await {
            let segment = result?;
            let index = segment.index;
            let plaintext = decrypt_segment(&keys, &playlist.segments[index], segment).await?;
            reassembler.push(index, plaintext).await?;
            reporter.advance(1);
        }

        let (_, bytes) = reassembler.finish().await?;
        reporter.finish();
        tracing::debug!("{}: reassembled {} bytes", label, bytes);

        Ok(stream_path)
    }

    async fn fetch_direct(
        &self,
        track: &TrackDescriptor,
        work: &Path,
        options: &FetchOptions,
    ) -> Result<PathBuf> {
        let direct = DirectOptions {
            overwrite: true,
            retry: options.retry,
            progress_interval: options.progress_interval,
        };
        let outcome = download_direct(
            self.fetcher.as_ref(),
            &track.url,
            &work.join(SOURCE_FILE),
            &direct,
            self.progress.as_ref(),
        )
        .await?;
        Ok(outcome.path().to_path_buf())
    }

    /// Cover art is optional; any failure only costs the embedded picture.
    async fn fetch_cover(&self, url: &str, work: &Path, options: &FetchOptions) -> Option<PathBuf> {
        let fetcher = self.fetcher.as_ref();
        let data = match with_retry(&options.retry, "cover", || fetcher.get_bytes(url)).await {
            Ok(data) if !data.is_empty() => data,
            Ok(_) => {
                tracing::warn!("Cover {} is empty, skipping", url);
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch cover {}: {}", url, e);
                return None;
            }
        };

        let path = work.join(COVER_FILE);
        match tokio::fs::write(&path, &data).await {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!("Failed to save cover: {}", e);
                None
            }
        }
    }
}
