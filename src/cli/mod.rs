//! Command-line interface.

pub mod args;

pub use args::{load_tracks, Args};
