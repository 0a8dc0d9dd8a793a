//! Decryption and in-order reassembly of fetched segments.

use std::collections::BTreeMap;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::hls::keys::KeyResolver;
use crate::hls::playlist::Segment;
use crate::hls::pool::FetchedSegment;

/// Decrypt a fetched segment with the key assigned to it.
///
/// Segments without a key are passed through untouched.
pub async fn decrypt_segment(
    keys: &KeyResolver<'_>,
    segment: &Segment,
    fetched: FetchedSegment,
) -> Result<Vec<u8>> {
    match &segment.key_url {
        Some(url) => keys.decryptor(url).await?.decrypt(fetched.index, &fetched.data),
        None => Ok(fetched.data.to_vec()),
    }
}

/// Writes segments to `sink` in ascending index order.
///
/// Segments can be pushed in any order. A segment is held back until every
/// lower index has been written, so the sink only ever sees a prefix of the
/// final stream.
pub struct Reassembler<W> {
    sink: W,
    total: usize,
    next: usize,
    pending: BTreeMap<usize, Vec<u8>>,
    written: u64,
}

impl<W: AsyncWrite + Unpin> Reassembler<W> {
    pub fn new(sink: W, total: usize) -> Self {
        Self {
            sink,
            total,
            next: 0,
            pending: BTreeMap::new(),
            written: 0,
        }
    }

    /// Accept the plaintext of segment `index`.
    pub async fn push(&mut self, index: usize, plaintext: Vec<u8>) -> Result<()> {
        if index >= self.total {
            return Err(Error::Reassembly(format!(
                "segment #{} out of range (playlist has {})",
                index, self.total
            )));
        }
        if index < self.next || self.pending.contains_key(&index) {
            return Err(Error::Reassembly(format!("segment #{} received twice", index)));
        }

        self.pending.insert(index, plaintext);

        while let Some(data) = self.pending.remove(&self.next) {
            self.sink.write_all(&data).await?;
            self.written += data.len() as u64;
            self.next += 1;
        }

        Ok(())
    }

    /// Number of segments already written to the sink.
    pub fn emitted(&self) -> usize {
        self.next
    }

    /// Flush and hand back the sink with the number of bytes written.
    ///
    /// Fails if any segment never arrived.
    pub async fn finish(mut self) -> Result<(W, u64)> {
        if self.next != self.total {
            return Err(Error::Reassembly(format!(
                "segment #{} missing ({} of {} written)",
                self.next, self.next, self.total
            )));
        }

        self.sink.flush().await?;
        Ok((self.sink, self.written))
    }
}
