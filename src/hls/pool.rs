//! Bounded concurrent segment fetching.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::hls::playlist::Segment;
use crate::net::{with_retry, Fetcher, RetryPolicy};

/// Default number of segments fetched at once.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Raw (still encrypted) segment body tagged with its playlist index.
#[derive(Debug, Clone)]
pub struct FetchedSegment {
    pub index: usize,
    pub data: Bytes,
}

/// Fetch `segments` with at most `concurrency` requests in flight.
///
/// Items come out in completion order; consumers must reorder by `index`.
/// Dropping the stream abandons whatever is still in flight.
pub fn fetch_segments<'a>(
    fetcher: &'a dyn Fetcher,
    segments: &'a [Segment],
    concurrency: usize,
    retry: RetryPolicy,
) -> impl Stream<Item = Result<FetchedSegment>> + Send + 'a {
    stream::iter(segments.iter())
        .map(move |segment| fetch_segment(fetcher, segment, retry))
        .buffer_unordered(concurrency.max(1))
}

/// Download a single segment, retrying it whole.
async fn fetch_segment(
    fetcher: &dyn Fetcher,
    segment: &Segment,
    retry: RetryPolicy,
) -> Result<FetchedSegment> {
    let url = segment.url.as_str();
    let what = format!("segment #{}", segment.index);

    let data = with_retry(&retry, &what, || async move {
        fetcher.get(url).await?.bytes().await
    })
    .await
    .map_err(|source| Error::SegmentFetch {
        index: segment.index,
        source,
    })?;

    tracing::debug!("Fetched segment #{} ({} bytes)", segment.index, data.len());

    Ok(FetchedSegment {
        index: segment.index,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetError;
    use crate::testing::MockFetcher;
    use futures::TryStreamExt;

    fn segments(n: usize) -> Vec<Segment> {
        (0..n)
            .map(|i| Segment {
                index: i,
                url: format!("https://cdn/seg-{}.ts", i),
                key_url: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_results_are_index_tagged() {
        let fetcher = MockFetcher::new();
        let segs = segments(3);
        fetcher
            .serve_after("https://cdn/seg-0.ts", b"zero".to_vec(), 2)
            .serve("https://cdn/seg-1.ts", b"one".to_vec())
            .serve("https://cdn/seg-2.ts", b"two".to_vec());

        let fetched: Vec<FetchedSegment> =
            fetch_segments(&fetcher, &segs, 2, RetryPolicy::immediate(1))
                .try_collect()
                .await
                .unwrap();

        // Segment 0 was held back until the other two completed.
        let order: Vec<usize> = fetched.iter().map(|f| f.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert_eq!(fetched[2].data.as_ref(), b"zero");
    }

    #[tokio::test]
    async fn test_in_flight_requests_bounded() {
        let fetcher = MockFetcher::new();
        let segs = segments(10);
        for segment in &segs {
            fetcher.serve(&segment.url, vec![segment.index as u8; 32]);
        }

        let fetched: Vec<FetchedSegment> =
            fetch_segments(&fetcher, &segs, 3, RetryPolicy::immediate(1))
                .try_collect()
                .await
                .unwrap();

        assert_eq!(fetched.len(), 10);
        let peak = fetcher.peak_in_flight();
        assert!(peak <= 3, "peak of {} requests in flight", peak);
        assert!(peak >= 2, "requests never overlapped");
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let fetcher = MockFetcher::new();
        let segs = segments(2);
        fetcher
            .serve("https://cdn/seg-0.ts", b"zero".to_vec())
            .serve_after_failures("https://cdn/seg-1.ts", b"one".to_vec(), 2);

        let fetched: Vec<FetchedSegment> =
            fetch_segments(&fetcher, &segs, 2, RetryPolicy::immediate(3))
                .try_collect()
                .await
                .unwrap();

        assert_eq!(fetched.len(), 2);
        assert_eq!(fetcher.calls("https://cdn/seg-1.ts"), 3);
    }

    #[tokio::test]
    async fn test_exhausted_segment_reports_index() {
        let fetcher = MockFetcher::new();
        let segs = segments(3);
        fetcher
            .serve("https://cdn/seg-0.ts", b"zero".to_vec())
            .fail_with("https://cdn/seg-1.ts", 500)
            .serve("https://cdn/seg-2.ts", b"two".to_vec());

        let result: Result<Vec<FetchedSegment>> =
            fetch_segments(&fetcher, &segs, 1, RetryPolicy::immediate(4))
                .try_collect()
                .await;

        match result {
            Err(Error::SegmentFetch { index, source }) => {
                assert_eq!(index, 1);
                assert_eq!(source, NetError::Status(500));
            }
            other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
        }
        assert_eq!(fetcher.calls("https://cdn/seg-1.ts"), 4);
    }

    #[tokio::test]
    async fn test_missing_segment_not_retried() {
        let fetcher = MockFetcher::new();
        let segs = segments(1);

        let result: Result<Vec<FetchedSegment>> =
            fetch_segments(&fetcher, &segs, 1, RetryPolicy::immediate(4))
                .try_collect()
                .await;

        assert!(matches!(result, Err(Error::SegmentFetch { index: 0, .. })));
        assert_eq!(fetcher.calls("https://cdn/seg-0.ts"), 1);
    }
}
