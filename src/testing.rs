//! In-memory fetcher and remuxer used by unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio::sync::watch;

use crate::error::{Error, NetError, Result};
use crate::net::{FetchResponse, Fetcher};
use crate::output::progress::{ProgressSink, ProgressUpdate};
use crate::remux::{Container, Remuxer, TrackTags};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

/// Encrypt `plain` the way the source service packages a segment.
pub fn encrypt_segment(key: &[u8; 16], plain: &[u8]) -> Vec<u8> {
    Aes128CbcEnc::new(key.into(), &[0u8; 16].into()).encrypt_padded_vec_mut::<Pkcs7>(plain)
}

enum Route {
    Body {
        data: Bytes,
        send_length: bool,
        /// Number of leading attempts that fail with a 503.
        failures: u32,
        /// Hold the response until this many other responses completed.
        wait_for: Option<usize>,
    },
    Status(u16),
}

/// Scripted [`Fetcher`].
pub struct MockFetcher {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<HashMap<String, u32>>,
    completed: watch::Sender<usize>,
    total_calls: AtomicUsize,
    order: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        let (completed, _) = watch::channel(0);
        Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            completed,
            total_calls: AtomicUsize::new(0),
            order: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    fn insert(&self, url: &str, route: Route) {
        self.routes.lock().unwrap().insert(url.to_string(), route);
    }

    pub fn serve(&self, url: &str, data: impl Into<Bytes>) -> &Self {
        self.insert(
            url,
            Route::Body {
                data: data.into(),
                send_length: true,
                failures: 0,
                wait_for: None,
            },
        );
        self
    }

    pub fn serve_without_length(&self, url: &str, data: impl Into<Bytes>) -> &Self {
        self.insert(
            url,
            Route::Body {
                data: data.into(),
                send_length: false,
                failures: 0,
                wait_for: None,
            },
        );
        self
    }

    pub fn serve_after_failures(&self, url: &str, data: impl Into<Bytes>, failures: u32) -> &Self {
        self.insert(
            url,
            Route::Body {
                data: data.into(),
                send_length: true,
                failures,
                wait_for: None,
            },
        );
        self
    }

    /// Serve `data` only once `others` other responses have completed.
    pub fn serve_after(&self, url: &str, data: impl Into<Bytes>, others: usize) -> &Self {
        self.insert(
            url,
            Route::Body {
                data: data.into(),
                send_length: true,
                failures: 0,
                wait_for: Some(others),
            },
        );
        self
    }

    pub fn fail_with(&self, url: &str, status: u16) -> &Self {
        self.insert(url, Route::Status(status));
        self
    }

    pub fn calls(&self, url: &str) -> u32 {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Most `get` calls that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// URLs in the order their responses completed.
    pub fn completion_order(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &str) -> std::result::Result<FetchResponse, NetError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        // Let other requests start before this one answers.
        tokio::task::yield_now().await;
        let response = self.respond(url).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

impl MockFetcher {
    async fn respond(&self, url: &str) -> std::result::Result<FetchResponse, NetError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(url.to_string()).or_insert(0);
            *n += 1;
            *n
        };

        let (data, send_length, wait_for) = {
            let routes = self.routes.lock().unwrap();
            match routes.get(url) {
                None => return Err(NetError::NotFound(404)),
                Some(Route::Status(status)) => return Err(NetError::from_status(*status)),
                Some(Route::Body {
                    failures, ..
                }) if attempt <= *failures => return Err(NetError::Status(503)),
                Some(Route::Body {
                    data,
                    send_length,
                    wait_for,
                    ..
                }) => (data.clone(), *send_length, *wait_for),
            }
        };

        if let Some(others) = wait_for {
            let mut rx = self.completed.subscribe();
            let _ = rx.wait_for(|done| *done >= others).await;
        }

        self.order.lock().unwrap().push(url.to_string());
        self.completed.send_modify(|done| *done += 1);

        let content_length = send_length.then_some(data.len() as u64);
        let chunks: Vec<std::result::Result<Bytes, NetError>> = data
            .chunks(64 * 1024)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        Ok(FetchResponse {
            status: 200,
            content_length,
            body: stream::iter(chunks).boxed(),
        })
    }
}

/// One recorded remux invocation.
#[derive(Debug, Clone)]
pub struct RemuxCall {
    pub input: Vec<u8>,
    pub output: PathBuf,
    pub tags: TrackTags,
    pub cover: Option<Vec<u8>>,
}

/// [`Remuxer`] that copies its input and records what it was asked to do.
pub struct MockRemuxer {
    fail: bool,
    fail_with_cover: bool,
    calls: Mutex<Vec<RemuxCall>>,
}

impl MockRemuxer {
    pub fn new() -> Self {
        Self {
            fail: false,
            fail_with_cover: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn failing_with_cover() -> Self {
        Self {
            fail_with_cover: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<RemuxCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Remuxer for MockRemuxer {
    fn container(&self) -> Container {
        Container::Mp3
    }

    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        tags: &TrackTags,
        cover: Option<&Path>,
    ) -> Result<()> {
        let input_bytes = tokio::fs::read(input).await?;
        let cover_bytes = match cover {
            Some(path) => Some(tokio::fs::read(path).await?),
            None => None,
        };

        self.calls.lock().unwrap().push(RemuxCall {
            input: input_bytes.clone(),
            output: output.to_path_buf(),
            tags: tags.clone(),
            cover: cover_bytes,
        });

        if self.fail || (self.fail_with_cover && cover.is_some()) {
            // Leave a half-written container behind, like a crashed ffmpeg.
            tokio::fs::write(output, b"partial").await?;
            return Err(Error::Remux("mock remux failure".into()));
        }

        tokio::fs::write(output, input_bytes).await?;
        Ok(())
    }
}

/// [`ProgressSink`] collecting every update.
#[derive(Default)]
pub struct RecordingProgress {
    pub updates: Mutex<Vec<ProgressUpdate>>,
}

impl ProgressSink for RecordingProgress {
    fn update(&self, update: &ProgressUpdate) {
        self.updates.lock().unwrap().push(update.clone());
    }
}
