//! Configuration for the progress broadcaster

use crate::utils::constants::DEFAULT_EVENT_CAPACITY;

#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Events buffered per observer before the slowest one starts lagging
    pub capacity: usize,
    /// Whether to collect publish metrics
    pub enable_metrics: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_EVENT_CAPACITY,
            enable_metrics: true,
        }
    }
}
