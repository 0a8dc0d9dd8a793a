//! Download module for track fetching.
//!
//! This module provides:
//! - Direct (single-file) downloads
//! - The whole-track pipeline (playlist or direct source, remux, tags)
//! - Run statistics

pub mod direct;
pub mod state;
pub mod track;

pub use direct::{download_direct, DirectOptions, DirectOutcome};
pub use state::RunStats;
pub use track::{FetchOptions, TrackFetcher, TrackOutcome};
