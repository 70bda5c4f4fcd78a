use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of a crawl session
///
/// `idle -> initializing -> crawling -> processing -> saving -> completed`,
/// with `error` and `cancelled` as the other terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlPhase {
    #[default]
    Idle,
    Initializing,
    Crawling,
    Processing,
    Saving,
    Completed,
    Error,
    Cancelled,
}

impl CrawlPhase {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `next`
    ///
    /// Forward moves may skip phases (processing is skipped when AI is
    /// disabled). `cancelled` and `error` are reachable from any non-terminal
    /// phase; nothing leaves a terminal phase.
    #[must_use]
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Cancelled | Self::Error => true,
            Self::Idle => false,
            _ => next.ordinal() > self.ordinal(),
        }
    }

    const fn ordinal(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Initializing => 1,
            Self::Crawling => 2,
            Self::Processing => 3,
            Self::Saving => 4,
            Self::Completed => 5,
            Self::Error | Self::Cancelled => 6,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Crawling => "crawling",
            Self::Processing => "processing",
            Self::Saving => "saving",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::CrawlPhase::*;

    #[test]
    fn forward_transitions_only() {
        assert!(Idle.can_transition_to(Initializing));
        assert!(Crawling.can_transition_to(Saving));
        assert!(!Processing.can_transition_to(Crawling));
        assert!(!Saving.can_transition_to(Idle));
    }

    #[test]
    fn terminal_phases_are_sinks() {
        for terminal in [Completed, Error, Cancelled] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(Cancelled));
            assert!(!terminal.can_transition_to(Error));
        }
    }

    #[test]
    fn cancel_reachable_from_any_live_phase() {
        for phase in [Idle, Initializing, Crawling, Processing, Saving] {
            assert!(phase.can_transition_to(Cancelled));
            assert!(phase.can_transition_to(Error));
        }
    }
}
