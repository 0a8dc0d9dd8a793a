//! Configuration validation logic.

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Bounds for segment concurrency.
const MIN_CONCURRENCY: usize = 1;
const MAX_CONCURRENCY: usize = 32;

/// Bounds for the per-request attempt budget.
const MIN_RETRY_BOUND: u32 = 1;
const MAX_RETRY_BOUND: u32 = 20;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_concurrency(config.download.concurrency)?;
    validate_retry_bound(config.network.retry_bound)?;
    validate_user_agent(&config.network.user_agent)?;
    validate_timeout(config.network.timeout_secs)?;
    validate_ffmpeg_path(&config.remux.ffmpeg_path.to_string_lossy())?;

    if config.network.retry_base_delay_ms > config.network.retry_max_delay_ms {
        return Err(Error::ConfigValidation {
            field: "retry_base_delay_ms".to_string(),
            message: format!(
                "Base delay ({} ms) exceeds maximum delay ({} ms)",
                config.network.retry_base_delay_ms, config.network.retry_max_delay_ms
            ),
        });
    }

    Ok(())
}

/// Validate the number of segments fetched at once.
pub fn validate_concurrency(concurrency: usize) -> Result<()> {
    if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
        return Err(Error::ConfigValidation {
            field: "concurrency".to_string(),
            message: format!(
                "Must be between {} and {} (got {})",
                MIN_CONCURRENCY, MAX_CONCURRENCY, concurrency
            ),
        });
    }

    Ok(())
}

/// Validate the attempt budget.
pub fn validate_retry_bound(retry_bound: u32) -> Result<()> {
    if !(MIN_RETRY_BOUND..=MAX_RETRY_BOUND).contains(&retry_bound) {
        return Err(Error::ConfigValidation {
            field: "retry_bound".to_string(),
            message: format!(
                "Must be between {} and {} (got {})",
                MIN_RETRY_BOUND, MAX_RETRY_BOUND, retry_bound
            ),
        });
    }

    Ok(())
}

/// Validate the user agent string.
pub fn validate_user_agent(user_agent: &str) -> Result<()> {
    if user_agent.trim().is_empty() {
        return Err(Error::MissingConfig("user_agent".to_string()));
    }

    Ok(())
}

pub fn validate_timeout(timeout_secs: u64) -> Result<()> {
    if timeout_secs == 0 {
        return Err(Error::ConfigValidation {
            field: "timeout_secs".to_string(),
            message: "Timeout must be at least 1 second".to_string(),
        });
    }

    Ok(())
}

/// Validate the ffmpeg binary path.
pub fn validate_ffmpeg_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(Error::MissingConfig("ffmpeg_path".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_concurrency_bounds() {
        assert!(validate_concurrency(1).is_ok());
        assert!(validate_concurrency(32).is_ok());
        assert!(validate_concurrency(0).is_err());
        assert!(validate_concurrency(33).is_err());
    }

    #[test]
    fn test_retry_bound() {
        assert!(validate_retry_bound(1).is_ok());
        assert!(validate_retry_bound(0).is_err());
        assert!(validate_retry_bound(21).is_err());
    }

    #[test]
    fn test_empty_ffmpeg_path() {
        let mut config = Config::default();
        config.remux.ffmpeg_path = PathBuf::new();
        assert!(matches!(
            validate_config(&config),
            Err(Error::MissingConfig(_))
        ));
    }

    #[test]
    fn test_delay_order() {
        let mut config = Config::default();
        config.network.retry_base_delay_ms = 60_000;
        match validate_config(&config) {
            Err(Error::ConfigValidation { field, .. }) => assert_eq!(field, "retry_base_delay_ms"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
