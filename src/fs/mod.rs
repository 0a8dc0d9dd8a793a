//! Filesystem module.
//!
//! Provides:
//! - Output filename generation
//! - Temporary artifact paths and cleanup

pub mod naming;
pub mod paths;

pub use naming::{sanitize_filename, track_filename};
pub use paths::{
    ensure_dir, part_path, remove_dir_if_exists, remove_file_if_exists, work_dir, PART_SUFFIX,
};
