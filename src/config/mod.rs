//! Configuration module for audio-dumper.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Configuration validation
//!
//! CLI merging lives in `cli::args`.

pub mod loader;
pub mod validation;

pub use loader::{Config, DownloadConfig, NetworkConfig, RemuxConfig};
pub use validation::validate_config;
