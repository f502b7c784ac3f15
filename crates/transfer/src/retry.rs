//! Per-chunk retry policy and backoff calculation

use std::time::Duration;

/// Retry configuration for chunk uploads
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts allowed after the first failure
    pub max_retries: u32,
    /// Initial backoff delay
    pub initial_delay: Duration,
    /// Maximum backoff delay
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Total attempts per chunk, the first one included
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Retry immediately, for tests and local backends
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }
}

/// Exponential backoff delay with jitter for the given retry number (1-based)
#[must_use]
pub fn calculate_backoff_delay(retry_config: &RetryConfig, attempt: u32) -> Duration {
    #[allow(clippy::cast_precision_loss)]
    let base_delay = retry_config
        .initial_delay
        .as_millis()
        .min(u128::from(u64::MAX)) as f64;
    #[allow(clippy::cast_precision_loss)]
    let max_delay = retry_config.max_delay.as_millis().min(u128::from(u64::MAX)) as f64;

    let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    let delay = (base_delay * retry_config.backoff_multiplier.powi(exponent)).min(max_delay);

    let jitter = delay * retry_config.jitter_factor * (rand::random::<f64>() - 0.5);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let final_delay = (delay + jitter).max(0.0).round() as u64;

    Duration::from_millis(final_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = RetryConfig {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        };
        assert_eq!(calculate_backoff_delay(&config, 1), Duration::from_millis(100));
        assert_eq!(calculate_backoff_delay(&config, 2), Duration::from_millis(200));
        assert_eq!(calculate_backoff_delay(&config, 3), Duration::from_millis(350));
        assert_eq!(calculate_backoff_delay(&config, 9), Duration::from_millis(350));
    }

    #[test]
    fn test_jitter_stays_within_factor() {
        let config = RetryConfig {
            initial_delay: Duration::from_millis(1000),
            jitter_factor: 0.2,
            ..RetryConfig::default()
        };
        for _ in 0..50 {
            let delay = calculate_backoff_delay(&config, 1).as_millis();
            assert!((900..=1100).contains(&delay), "delay {delay} out of range");
        }
    }

    #[test]
    fn test_immediate_has_no_delay() {
        let config = RetryConfig::immediate(3);
        assert_eq!(config.max_attempts(), 4);
        assert_eq!(calculate_backoff_delay(&config, 3), Duration::ZERO);
    }
}
