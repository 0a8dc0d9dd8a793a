//! Media module for track descriptors.

pub mod track;

pub use track::{truncate, SourceKind, TrackDescriptor};
