//! Tracker for entry orders awaiting a fill/cancel decision.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

/// An outstanding entry order.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub order_id: String,
    pub symbol: String,
    pub submitted_at: DateTime<Utc>,
}

/// Entry orders that have not reached a terminal status. The sweep job
/// cancels entries older than the configured timeout; terminal status
/// notifications remove them first when they arrive in time.
#[derive(Debug, Default)]
pub struct PendingOrders {
    orders: HashMap<String, PendingEntry>,
}

impl PendingOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, order_id: &str, symbol: &str, submitted_at: DateTime<Utc>) {
        self.orders.insert(
            order_id.to_string(),
            PendingEntry {
                order_id: order_id.to_string(),
                symbol: symbol.to_string(),
                submitted_at,
            },
        );
    }

    /// Remove a tracked order, returning whether it was present.
    pub fn remove(&mut self, order_id: &str) -> bool {
        self.orders.remove(order_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Remove and return all entries older than `timeout`.
    pub fn drain_expired(&mut self, now: DateTime<Utc>, timeout: Duration) -> Vec<PendingEntry> {
        let expired: Vec<String> = self
            .orders
            .values()
            .filter(|e| now - e.submitted_at > timeout)
            .map(|e| e.order_id.clone())
            .collect();

        expired
            .iter()
            .filter_map(|id| self.orders.remove(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-07-01T14:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn expired_entries_drained_once() {
        let mut pending = PendingOrders::new();
        pending.insert("o1", "AAPL240705C250000.US", t0());

        // 31 seconds later with a 30 second timeout
        let now = t0() + Duration::seconds(31);
        let drained = pending.drain_expired(now, Duration::seconds(30));
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].order_id, "o1");

        // second sweep finds nothing
        assert!(pending.drain_expired(now, Duration::seconds(30)).is_empty());
    }

    #[test]
    fn fresh_entries_survive_the_sweep() {
        let mut pending = PendingOrders::new();
        pending.insert("o1", "X", t0());
        let drained = pending.drain_expired(t0() + Duration::seconds(5), Duration::seconds(30));
        assert!(drained.is_empty());
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn terminal_removal_beats_the_sweep() {
        let mut pending = PendingOrders::new();
        pending.insert("o1", "X", t0());
        assert!(pending.remove("o1"));
        let drained = pending.drain_expired(t0() + Duration::seconds(60), Duration::seconds(30));
        assert!(drained.is_empty());
    }
}
