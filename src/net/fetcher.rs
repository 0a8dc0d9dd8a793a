//! HTTP fetch capability used by every network-facing stage.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, StreamExt};
use reqwest::{header, Client};

use crate::error::{Error, NetError, Result};

/// Upper bound on what [`FetchResponse::bytes`] reserves from Content-Length.
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// Streaming response body.
pub type BodyStream = BoxStream<'static, std::result::Result<Bytes, NetError>>;

/// A successful (2xx) response.
pub struct FetchResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: BodyStream,
}

impl FetchResponse {
    /// Drain the body into memory.
    pub async fn bytes(mut self) -> std::result::Result<Bytes, NetError> {
        // The header is only a hint; the buffer grows with the real body.
        let reserve = self.content_length.map_or(0, |n| n.min(MAX_PREALLOCATION));
        let mut buf = BytesMut::with_capacity(usize::try_from(reserve).unwrap_or(0));
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

/// Network fetch capability.
///
/// `get` resolves to `Err` for non-2xx responses, already classified through
/// [`NetError::from_status`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> std::result::Result<FetchResponse, NetError>;

    /// Fetch a whole (small) resource into memory.
    async fn get_bytes(&self, url: &str) -> std::result::Result<Bytes, NetError> {
        self.get(url).await?.bytes().await
    }
}

/// [`Fetcher`] backed by a shared reqwest client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client with the given user agent and per-request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> std::result::Result<FetchResponse, NetError> {
        tracing::debug!("GET {}", url);

        // Segments are already compressed; a transparent gzip layer breaks
        // Content-Length based progress.
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT_ENCODING, "identity")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(NetError::from_status(status.as_u16()));
        }

        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(NetError::from))
            .boxed();

        Ok(FetchResponse {
            status: status.as_u16(),
            content_length,
            body,
        })
    }
}
