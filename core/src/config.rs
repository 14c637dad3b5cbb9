//! Process-wide client configuration.
//!
//! The environment is consulted once, when a client is constructed, and the
//! result is injected into the executor. Nothing reads the environment on the
//! request path.

use std::env;
use std::time::Duration;

use crate::error::ConfigurationError;

/// Environment variable overriding the default per-attempt timeout.
pub const TIMEOUT_ENV_VAR: &str = "APIKIT_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Timeout used when a request does not specify one.
    pub default_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Read `APIKIT_REQUEST_TIMEOUT_SECS`, falling back to 5 seconds when it
    /// is unset. A value that is not a positive integer is rejected.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        match env::var(TIMEOUT_ENV_VAR) {
            Ok(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|&secs| secs > 0)
                    .ok_or_else(|| ConfigurationError::InvalidEnv {
                        var: TIMEOUT_ENV_VAR.to_string(),
                        value: raw.clone(),
                    })?;
                Ok(Self {
                    default_timeout_secs: secs,
                })
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Per-call timeout, where `None` and `Some(0)` both mean "use the default".
    pub fn resolve_timeout(&self, requested: Option<u64>) -> u64 {
        requested
            .filter(|&secs| secs > 0)
            .unwrap_or(self.default_timeout_secs)
    }

    pub fn timeout(&self, requested: Option<u64>) -> Duration {
        Duration::from_secs(self.resolve_timeout(requested))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_five_seconds() {
        assert_eq!(ClientConfig::default().default_timeout_secs, 5);
    }

    #[test]
    fn from_env_unset_uses_default() {
        temp_env::with_var_unset(TIMEOUT_ENV_VAR, || {
            assert_eq!(ClientConfig::from_env().unwrap(), ClientConfig::default());
        });
    }

    #[test]
    fn from_env_reads_override() {
        temp_env::with_var(TIMEOUT_ENV_VAR, Some("12"), || {
            assert_eq!(ClientConfig::from_env().unwrap().default_timeout_secs, 12);
        });
    }

    #[test]
    fn from_env_rejects_garbage_and_zero() {
        temp_env::with_var(TIMEOUT_ENV_VAR, Some("soon"), || {
            let err = ClientConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigurationError::InvalidEnv { ref value, .. } if value == "soon"));
        });
        temp_env::with_var(TIMEOUT_ENV_VAR, Some("0"), || {
            assert!(ClientConfig::from_env().is_err());
        });
    }

    #[test]
    fn explicit_timeout_wins_unless_zero() {
        let config = ClientConfig {
            default_timeout_secs: 7,
        };
        assert_eq!(config.resolve_timeout(Some(1)), 1);
        assert_eq!(config.resolve_timeout(Some(0)), 7);
        assert_eq!(config.resolve_timeout(None), 7);
        assert_eq!(config.timeout(None), Duration::from_secs(7));
    }
}
