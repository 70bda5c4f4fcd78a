use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Session-wide cap on page navigations, shared by every fetch worker
#[derive(Debug)]
pub struct RequestBudget {
    limit: usize,
    used: AtomicUsize,
    exhausted_reported: AtomicBool,
}

impl RequestBudget {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            used: AtomicUsize::new(0),
            exhausted_reported: AtomicBool::new(false),
        }
    }

    /// Reserve one navigation; returns its 1-based number, or `None` once spent
    pub fn try_reserve(&self) -> Option<usize> {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .ok()
            .map(|previous| previous + 1)
    }

    /// `true` for the first caller after exhaustion, so the warning is logged once
    pub fn mark_exhausted(&self) -> bool {
        !self.exhausted_reported.swap(true, Ordering::SeqCst)
    }

    #[must_use]
    pub fn used(&self) -> usize {
        self.used.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn reservations_stop_at_limit() {
        let budget = RequestBudget::new(2);
        assert_eq!(budget.try_reserve(), Some(1));
        assert_eq!(budget.try_reserve(), Some(2));
        assert_eq!(budget.try_reserve(), None);
        assert_eq!(budget.used(), 2);
        assert!(budget.mark_exhausted());
        assert!(!budget.mark_exhausted());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reservations_never_overshoot() {
        let budget = Arc::new(RequestBudget::new(50));
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let budget = Arc::clone(&budget);
                tokio::spawn(async move {
                    let mut won = 0;
                    while budget.try_reserve().is_some() {
                        won += 1;
                        tokio::task::yield_now().await;
                    }
                    won
                })
            })
            .collect();

        let mut total = 0;
        for task in tasks {
            total += task.await.unwrap();
        }
        assert_eq!(total, 50);
    }
}
