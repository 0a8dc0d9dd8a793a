//! Run statistics across tracks.

use crate::download::track::TrackOutcome;
use crate::error::TrackError;

/// Outcome counters for one invocation.
#[derive(Debug, Default)]
pub struct RunStats {
    pub fetched: u64,
    pub skipped: u64,
    pub failed: u64,
    /// Failed track IDs with a one-line reason, in processing order.
    pub failures: Vec<(String, String)>,
}

impl RunStats {
    /// Account for the result of one `fetch_track` call.
    pub fn record(&mut self, result: &Result<TrackOutcome, TrackError>) {
        match result {
            Ok(TrackOutcome::Fetched(_)) => self.fetched += 1,
            Ok(TrackOutcome::Skipped(_)) => self.skipped += 1,
            Err(e) => {
                self.failed += 1;
                self.failures.push((e.track_id.clone(), e.to_string()));
            }
        }
    }

    /// Total number of tracks seen.
    pub fn total(&self) -> u64 {
        self.fetched + self.skipped + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
