//! Navigation failure classification and retry backoff

use std::time::Duration;

use crate::utils::MAX_RETRY_DELAY_MS;

/// Categorizes navigation failures for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, DNS, refused or reset connections
    Network,
    /// Crashed target, CDP error, lost session
    Browser,
    /// HTTP 429 or an explicit rate-limit page
    RateLimited,
    /// The response itself is unusable; retrying will not help
    Content,
    Unknown,
}

impl FailureKind {
    /// Classify a failure from its message
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let msg = message.to_lowercase();

        if msg.contains("429") || msg.contains("too many requests") || msg.contains("rate limit")
        {
            return Self::RateLimited;
        }

        if msg.contains("timeout")
            || msg.contains("timed out")
            || msg.contains("connection refused")
            || msg.contains("connection reset")
            || msg.contains("dns")
            || msg.contains("name_not_resolved")
            || msg.contains("network")
            || msg.contains("unreachable")
            || msg.contains("eof")
        {
            return Self::Network;
        }

        if msg.contains("browser")
            || msg.contains("chrome")
            || msg.contains("cdp")
            || msg.contains("target")
            || msg.contains("session")
        {
            return Self::Browser;
        }

        if msg.contains("invalid url")
            || msg.contains("unsupported")
            || msg.contains("content")
            || msg.contains("404")
            || msg.contains("not found")
        {
            return Self::Content;
        }

        Self::Unknown
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        !matches!(self, Self::Content)
    }

    #[must_use]
    pub const fn delay_multiplier(self) -> f64 {
        match self {
            Self::Browser => 1.5,
            Self::RateLimited => 3.0,
            Self::Network | Self::Content | Self::Unknown => 1.0,
        }
    }
}

/// Backoff before retry number `attempt` (1-based)
///
/// `base * 2^(attempt-1) * multiplier`, capped at 30 seconds.
#[must_use]
pub fn backoff_delay(base: Duration, attempt: u32, kind: FailureKind) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let factor = f64::from(1u32 << exponent) * kind.delay_multiplier();
    let millis = (base.as_secs_f64() * 1000.0 * factor).min(MAX_RETRY_DELAY_MS as f64);
    Duration::from_millis(millis as u64)
}
