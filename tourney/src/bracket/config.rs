//! Engine configuration.

use crate::db::timeouts::DEFAULT_TRANSACTION_TIMEOUT;
use std::env;
use std::time::Duration;

/// Tuning for [`BracketManager`](super::BracketManager)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Attempts per operation when the store reports a transient conflict
    pub max_attempts: u32,

    /// Upper bound on one transaction, including lock waits
    pub transaction_timeout: Duration,
}

impl EngineConfig {
    /// Create configuration from environment variables
    ///
    /// - `BRACKET_MAX_ATTEMPTS`: attempts per operation (default: 3, minimum 1)
    /// - `BRACKET_TX_TIMEOUT_SECS`: transaction timeout in seconds (default: 10)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_attempts = lookup("BRACKET_MAX_ATTEMPTS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.max_attempts)
            .max(1);
        let transaction_timeout = lookup("BRACKET_TX_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.transaction_timeout);

        Self {
            max_attempts,
            transaction_timeout,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(|_| None);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.transaction_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides_are_clamped() {
        let config = EngineConfig::from_lookup(|key| match key {
            "BRACKET_MAX_ATTEMPTS" => Some("0".to_string()),
            "BRACKET_TX_TIMEOUT_SECS" => Some("2".to_string()),
            _ => None,
        });
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.transaction_timeout, Duration::from_secs(2));
    }
}
