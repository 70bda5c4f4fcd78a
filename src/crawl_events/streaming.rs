//! Filtered receivers and `Stream` adapters over a session's updates

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use super::errors::EventBusError;
use super::types::CrawlUpdate;

/// Receiver that only yields updates passing a predicate
pub struct FilteredReceiver<F>
where
    F: Fn(&CrawlUpdate) -> bool + Send + Sync + 'static,
{
    receiver: broadcast::Receiver<CrawlUpdate>,
    filter: Arc<F>,
}

impl<F> FilteredReceiver<F>
where
    F: Fn(&CrawlUpdate) -> bool + Send + Sync + 'static,
{
    pub fn new(receiver: broadcast::Receiver<CrawlUpdate>, filter: F) -> Self {
        Self {
            receiver,
            filter: Arc::new(filter),
        }
    }

    /// Receive the next update that passes the filter
    ///
    /// Terminal updates are always delivered so a filtered observer still
    /// learns that the session ended.
    pub async fn recv(&mut self) -> Result<CrawlUpdate, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(update) => {
                    if update.is_terminal() || (self.filter)(&update) {
                        return Ok(update);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return Err(EventBusError::Closed),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    return Err(EventBusError::ReceiverLagged(skipped));
                }
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Result<Option<CrawlUpdate>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(update) => {
                    if update.is_terminal() || (self.filter)(&update) {
                        return Ok(Some(update));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => return Err(EventBusError::Closed),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    return Err(EventBusError::ReceiverLagged(skipped));
                }
            }
        }
    }
}

/// Turn a receiver into a stream that ends right after the terminal update
///
/// Lagged gaps are skipped with a warning; delivery is at-most-once.
pub fn update_stream(
    receiver: broadcast::Receiver<CrawlUpdate>,
) -> impl tokio_stream::Stream<Item = CrawlUpdate> + Send + 'static {
    let mut finished = false;
    BroadcastStream::new(receiver)
        .filter_map(|item| match item {
            Ok(update) => Some(update),
            Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(n)) => {
                log::warn!("Progress observer lagged, skipped {n} updates");
                None
            }
        })
        .take_while(move |update| {
            if finished {
                return false;
            }
            finished = update.is_terminal();
            true
        })
}
