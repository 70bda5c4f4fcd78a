//! Subscription operations for the ProgressBroadcaster

use tokio::sync::broadcast;

use crate::crawl_events::streaming::{FilteredReceiver, update_stream};
use crate::crawl_events::types::CrawlUpdate;

use super::core::ProgressBroadcaster;

impl ProgressBroadcaster {
    /// Subscribe to updates published from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlUpdate> {
        self.sender.subscribe()
    }

    /// Subscribe as a `Stream` that ends after the terminal update
    pub fn stream(&self) -> impl tokio_stream::Stream<Item = CrawlUpdate> + Send + 'static {
        update_stream(self.subscribe())
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let count = self.sender.receiver_count();
        if self.config.enable_metrics {
            self.metrics.update_subscriber_count(count);
        }
        count
    }

    /// Subscribe to a subset of update kinds; terminal updates always pass
    pub fn subscribe_filtered<F>(&self, filter: F) -> FilteredReceiver<F>
    where
        F: Fn(&CrawlUpdate) -> bool + Send + Sync + 'static,
    {
        FilteredReceiver::new(self.subscribe(), filter)
    }
}
