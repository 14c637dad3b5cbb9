//! Retry eligibility.
//!
//! Every call carries its own retry budget and a fixed delay. This module
//! only decides whether a given failure may consume that budget.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::TransportError;

/// One failed attempt, as seen by the retry predicate.
#[derive(Debug, Clone, Copy)]
pub enum Failure<'a> {
    /// A response arrived with a non-2xx status.
    Status(u16),
    /// No usable response was obtained.
    Transport(&'a TransportError),
}

/// Which failures are worth another attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryOn {
    /// Any non-2xx status and any transport failure, 4xx included.
    #[default]
    AnyFailure,
    /// 5xx statuses and transport failures. A decode failure on a 4xx
    /// response is not retried.
    ServerErrorsAndTransport,
}

impl RetryOn {
    pub fn should_retry(self, failure: Failure<'_>) -> bool {
        match self {
            RetryOn::AnyFailure => true,
            RetryOn::ServerErrorsAndTransport => match failure {
                Failure::Status(status) => status >= 500,
                Failure::Transport(TransportError::Decode { status, .. }) => {
                    !(400..500).contains(status)
                }
                Failure::Transport(_) => true,
            },
        }
    }
}

/// Delay between attempts. Fixed; no backoff and no jitter.
pub fn retry_delay(secs: u64) -> Duration {
    Duration::from_secs(secs)
}
