//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::download::FetchOptions;
use crate::error::{Error, Result};
use crate::hls::DEFAULT_CONCURRENCY;
use crate::net::RetryPolicy;
use crate::remux::Container;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub remux: RemuxConfig,
}

/// HTTP client and retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per key, segment or file, including the first one.
    #[serde(default = "default_retry_bound")]
    pub retry_bound: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            retry_bound: default_retry_bound(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

/// Download behaviour configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Output directory; the current directory when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Segments fetched at once per track.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Replace existing files instead of skipping them.
    #[serde(default)]
    pub overwrite: bool,

    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: None,
            concurrency: default_concurrency(),
            overwrite: false,
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

/// Remux step configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemuxConfig {
    /// ffmpeg binary, looked up in PATH when not absolute.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    #[serde(default)]
    pub container: Container,

    #[serde(default = "default_true")]
    pub embed_cover: bool,
}

impl Default for RemuxConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            container: Container::default(),
            embed_cover: true,
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_bound() -> u32 {
    5
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_progress_interval_ms() -> u64 {
    2000
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the effective download directory.
    pub fn download_directory(&self) -> PathBuf {
        self.download
            .directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.network.retry_bound,
            Duration::from_millis(self.network.retry_base_delay_ms),
            Duration::from_millis(self.network.retry_max_delay_ms),
        )
    }

    /// Per-track options derived from this configuration.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            concurrency: self.download.concurrency,
            overwrite: self.download.overwrite,
            retry: self.retry_policy(),
            progress_interval: Duration::from_millis(self.download.progress_interval_ms),
            embed_cover: self.remux.embed_cover,
        }
    }
}
