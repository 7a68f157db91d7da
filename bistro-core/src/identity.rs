use std::sync::atomic::{AtomicU64, Ordering};

use bistro_shared::OrderId;

/// Hands out order ids, one at a time, strictly increasing.
///
/// Owned by whichever component creates orders and passed in explicitly, so
/// two restaurants (or two tests) never share a counter.
#[derive(Debug)]
pub struct OrderIdGenerator {
    next: AtomicU64,
}

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: OrderId) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> OrderId {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> OrderId {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for OrderIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
