//! Bounded idempotency filter over brokerage order ids.

use std::collections::{HashSet, VecDeque};

pub const DEFAULT_CAPACITY: usize = 1000;

/// Insertion-ordered set of already-handled order ids. When full, the
/// oldest id is evicted, which bounds memory while keeping the fill
/// stream idempotent over any realistic replay window.
#[derive(Debug)]
pub struct ProcessedOrders {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl ProcessedOrders {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.seen.contains(order_id)
    }

    /// Insert an id, evicting the oldest entry when over capacity.
    /// Returns `false` if the id was already present.
    pub fn insert(&mut self, order_id: &str) -> bool {
        if !self.seen.insert(order_id.to_string()) {
            return false;
        }
        self.order.push_back(order_id.to_string());
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for ProcessedOrders {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
