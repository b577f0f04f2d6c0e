//! The shared mutable state aggregate.

use chrono::{DateTime, Utc};

use strikebot_core::SessionHours;

use crate::dedupe::ProcessedOrders;
use crate::ledger::DailyTradeLedger;
use crate::pending::PendingOrders;
use crate::types::Position;

/// Everything the dispatcher and the scheduled jobs mutate, gathered in
/// one place so a single lock covers all of it. The lock is held only
/// across in-memory transitions, never across broker I/O.
#[derive(Debug)]
pub struct TradingState {
    pub position: Option<Position>,
    pub ledger: DailyTradeLedger,
    pub processed: ProcessedOrders,
    pub pending: PendingOrders,
    pub last_entry_at: Option<DateTime<Utc>>,
    /// Refreshed daily for daylight-saving shifts of the target market.
    pub session_hours: SessionHours,
}

impl TradingState {
    pub fn new(session_hours: SessionHours) -> Self {
        Self {
            position: None,
            ledger: DailyTradeLedger::new(),
            processed: ProcessedOrders::default(),
            pending: PendingOrders::new(),
            last_entry_at: None,
            session_hours,
        }
    }
}
