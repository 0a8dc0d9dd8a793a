//! Direct (single-file) media downloading.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, NetError, Result};
use crate::fs::{ensure_dir, part_path, remove_file_if_exists};
use crate::net::{with_retry, Fetcher, RetryPolicy, Retryable};
use crate::output::progress::{ProgressReporter, ProgressSink, ProgressUnit};

/// Default interval between progress updates.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// Options for [`download_direct`].
#[derive(Debug, Clone)]
pub struct DirectOptions {
    /// Replace an existing destination instead of skipping it.
    pub overwrite: bool,
    pub retry: RetryPolicy,
    pub progress_interval: Duration,
}

impl Default for DirectOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            retry: RetryPolicy::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// What [`download_direct`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectOutcome {
    /// The destination already existed; nothing was fetched.
    Skipped(PathBuf),
    Downloaded { path: PathBuf, bytes: u64 },
}

impl DirectOutcome {
    pub fn path(&self) -> &Path {
        match self {
            DirectOutcome::Skipped(path) => path,
            DirectOutcome::Downloaded { path, .. } => path,
        }
    }
}

/// Failure of one download attempt.
#[derive(Debug)]
enum AttemptError {
    Net(NetError),
    Io(std::io::Error),
}

impl Retryable for AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Net(e) => e.is_retryable(),
            AttemptError::Io(_) => false,
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Net(e) => write!(f, "{}", e),
            AttemptError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl From<NetError> for AttemptError {
    fn from(e: NetError) -> Self {
        AttemptError::Net(e)
    }
}

impl From<std::io::Error> for AttemptError {
    fn from(e: std::io::Error) -> Self {
        AttemptError::Io(e)
    }
}

/// Stream `url` into `destination`.
///
/// The body goes to `<destination>.part` first and is renamed into place
/// only once it is complete, so `destination` never holds a partial file.
pub async fn download_direct(
    fetcher: &dyn Fetcher,
    url: &str,
    destination: &Path,
    options: &DirectOptions,
    progress: &dyn ProgressSink,
) -> Result<DirectOutcome> {
    if !options.overwrite && tokio::fs::try_exists(destination).await? {
        tracing::debug!("Skipping existing file: {}", destination.display());
        return Ok(DirectOutcome::Skipped(destination.to_path_buf()));
    }

    let part = part_path(destination);
    if options.overwrite {
        remove_file_if_exists(destination).await?;
    }
    remove_file_if_exists(&part).await?;

    if let Some(parent) = destination.parent() {
        ensure_dir(parent).await?;
    }

    let label = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| url.to_string());

    let result = with_retry(&options.retry, &label, || {
        download_attempt(fetcher, url, &part, &label, options.progress_interval, progress)
    })
    .await;

    match result {
        Ok(bytes) => {
            tokio::fs::rename(&part, destination).await?;
            tracing::debug!("Downloaded {} ({} bytes)", destination.display(), bytes);
            Ok(DirectOutcome::Downloaded {
                path: destination.to_path_buf(),
                bytes,
            })
        }
        Err(err) => {
            let _ = remove_file_if_exists(&part).await;
            match err {
                AttemptError::Io(e) => Err(Error::Io(e)),
                AttemptError::Net(e) => Err(Error::Download {
                    status: e.status(),
                    path: destination.to_path_buf(),
                    reason: e.to_string(),
                }),
            }
        }
    }
}

/// One full attempt: a fresh request written over a truncated `.part` file.
async fn download_attempt(
    fetcher: &dyn Fetcher,
    url: &str,
    part: &Path,
    label: &str,
    interval: Duration,
    progress: &dyn ProgressSink,
) -> std::result::Result<u64, AttemptError> {
    let response = fetcher.get(url).await?;
    let expected = response.content_length;

    let mut reporter = ProgressReporter::new(progress, label, ProgressUnit::Bytes, expected, interval);
    let mut file = File::create(part).await?;
    let mut body = response.body;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        reporter.advance(chunk.len() as u64);
    }
    file.flush().await?;

    let received = reporter.done();
    if let Some(expected) = expected {
        if received < expected {
            return Err(AttemptError::Net(NetError::Body(format!(
                "received {} of {} bytes",
                received, expected
            ))));
        }
    }

    reporter.finish();
    Ok(received)
}
