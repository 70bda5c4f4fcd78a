//! Error types for progress broadcasting

/// Error types for event bus operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventBusError {
    /// The session already emitted its `complete`/`error` event
    #[error("terminal event already published for this session")]
    TerminalSent,

    /// Receiver couldn't keep up, missed messages
    #[error("Receiver lagged behind, missed {0} messages")]
    ReceiverLagged(u64),

    /// Broadcaster was dropped or the stream ended
    #[error("Event stream closed")]
    Closed,
}
