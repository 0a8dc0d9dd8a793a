//! HLS module for encrypted segmented tracks.
//!
//! This module provides:
//! - Playlist parsing into ordered segments and key assignments
//! - A per-track key cache
//! - Fixed-IV AES-128-CBC segment decryption
//! - The bounded segment fetcher pool
//! - Ordered reassembly

pub mod decrypt;
pub mod keys;
pub mod playlist;
pub mod pool;
pub mod reassemble;

pub use decrypt::{SegmentDecryptor, ZERO_IV};
pub use keys::KeyResolver;
pub use playlist::{parse_playlist, resolve_url, ParsedPlaylist, Segment};
pub use pool::{fetch_segments, FetchedSegment, DEFAULT_CONCURRENCY};
pub use reassemble::{decrypt_segment, Reassembler};
