//! Per-track key cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use crate::error::{Error, NetError, Result};
use crate::hls::decrypt::SegmentDecryptor;
use crate::net::{with_retry, Fetcher, RetryPolicy};

/// Fetches AES-128 keys at most once per URL.
///
/// Concurrent lookups of the same URL share a single in-flight request; the
/// first successful resolution is reused for the lifetime of the resolver.
pub struct KeyResolver<'a> {
    fetcher: &'a dyn Fetcher,
    retry: RetryPolicy,
    cache: Mutex<HashMap<String, Arc<OnceCell<[u8; 16]>>>>,
}

impl<'a> KeyResolver<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, retry: RetryPolicy) -> Self {
        Self {
            fetcher,
            retry,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Key bytes for `url`.
    pub async fn resolve(&self, url: &str) -> Result<[u8; 16]> {
        let cell = {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.entry(url.to_string()).or_default().clone()
        };

        let key = cell.get_or_try_init(|| self.fetch_key(url)).await?;
        Ok(*key)
    }

    /// Decryptor for the key at `url`.
    pub async fn decryptor(&self, url: &str) -> Result<SegmentDecryptor> {
        Ok(SegmentDecryptor::new(self.resolve(url).await?))
    }

    /// Number of distinct keys resolved so far.
    pub fn cached(&self) -> usize {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.values().filter(|c| c.initialized()).count()
    }

    async fn fetch_key(&self, url: &str) -> Result<[u8; 16]> {
        tracing::debug!("Fetching key {}", url);

        let body = with_retry(&self.retry, "key", || self.fetcher.get_bytes(url))
            .await
            .map_err(|source| Error::KeyFetch {
                url: url.to_string(),
                source,
            })?;

        <[u8; 16]>::try_from(body.as_ref()).map_err(|_| Error::KeyFetch {
            url: url.to_string(),
            source: NetError::Other(format!("expected a 16-byte key, got {} bytes", body.len())),
        })
    }
}
