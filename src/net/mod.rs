//! Network module.
//!
//! Provides:
//! - The `Fetcher` capability and its reqwest implementation
//! - The shared retry/backoff policy

pub mod fetcher;
pub mod retry;

pub use fetcher::{BodyStream, FetchResponse, Fetcher, HttpFetcher};
pub use retry::{with_retry, RetryPolicy, Retryable};
