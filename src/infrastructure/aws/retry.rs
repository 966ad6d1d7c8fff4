//! Retry and timeout policy applied to every SDK client

use std::time::Duration;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;

pub const MAX_ATTEMPTS: u32 = 3;
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Backoff behaviour between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffMode {
    Standard,
    /// Standard backoff plus client-side rate limiting on throttling
    Adaptive,
}

/// Retry policy handed to the SDK's retry executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub mode: BackoffMode,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

/// The fixed policy used by the server
pub fn build_retry_config() -> RetryPolicy {
    RetryPolicy {
        max_attempts: MAX_ATTEMPTS,
        mode: BackoffMode::Adaptive,
        connect_timeout: CONNECT_TIMEOUT,
        read_timeout: READ_TIMEOUT,
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        build_retry_config()
    }
}

impl RetryPolicy {
    pub fn sdk_retry_config(&self) -> RetryConfig {
        let base = match self.mode {
            BackoffMode::Standard => RetryConfig::standard(),
            BackoffMode::Adaptive => RetryConfig::adaptive(),
        };

        base.with_max_attempts(self.max_attempts)
    }

    pub fn sdk_timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig::builder()
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use aws_smithy_types::retry::RetryMode;

    use super::*;

    #[test]
    fn test_fixed_policy() {
        let policy = build_retry_config();

        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.mode, BackoffMode::Adaptive);
        assert_eq!(policy.connect_timeout, Duration::from_secs(10));
        assert_eq!(policy.read_timeout, Duration::from_secs(30));
        assert_eq!(RetryPolicy::default(), policy);
    }

    #[test]
    fn test_sdk_retry_config() {
        let config = build_retry_config().sdk_retry_config();

        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.mode(), RetryMode::Adaptive);
    }

    #[test]
    fn test_standard_mode() {
        let policy = RetryPolicy {
            mode: BackoffMode::Standard,
            ..build_retry_config()
        };

        assert_eq!(policy.sdk_retry_config().mode(), RetryMode::Standard);
    }

    #[test]
    fn test_sdk_timeout_config() {
        let config = build_retry_config().sdk_timeout_config();

        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.read_timeout(), Some(Duration::from_secs(30)));
    }
}
