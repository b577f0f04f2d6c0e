//! Daily trade ledger and entry-gating policy.
//!
//! The "day" boundary is the session-open instant (21:30 reference
//! time), not midnight. Rollover is detected lazily on each check, so
//! no timer races the scheduled jobs over the same bookkeeping.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use strikebot_core::{Direction, PolicyRejection};

use crate::types::TradeRecord;

#[derive(Debug, Default)]
pub struct DailyTradeLedger {
    day: Option<NaiveDate>,
    records: Vec<TradeRecord>,
}

impl DailyTradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the ledger when the trading day has advanced. Call before
    /// every policy check or mutation.
    pub fn roll_over(&mut self, today: NaiveDate) {
        if self.day != Some(today) {
            if !self.records.is_empty() {
                info!(
                    prior_day = ?self.day,
                    trades = self.records.len(),
                    "Trading day rolled over, ledger cleared"
                );
            }
            self.day = Some(today);
            self.records.clear();
        }
    }

    /// A trade already closed at or above its entry today.
    pub fn profit_locked(&self) -> bool {
        self.records.iter().any(|r| r.profitable == Some(true))
    }

    /// Entry-gating policy:
    /// - profit already locked in today: refuse everything;
    /// - two trades already opened: refuse (hard daily cap);
    /// - one trade opened: the next must reverse direction;
    /// - first trade of the day: always allowed.
    pub fn can_open(&self, direction: Direction) -> Result<(), PolicyRejection> {
        if self.profit_locked() {
            return Err(PolicyRejection::ProfitLockedToday);
        }
        if self.records.len() >= 2 {
            return Err(PolicyRejection::DailyCapReached);
        }
        if let Some(first) = self.records.first() {
            if first.direction == direction {
                return Err(PolicyRejection::SameDirectionRepeat);
            }
        }
        Ok(())
    }

    /// Append an in-flight record for a freshly filled entry.
    pub fn record_open(&mut self, direction: Direction, entry_price: Decimal) {
        debug!(?direction, %entry_price, "Ledger: trade opened");
        self.records.push(TradeRecord {
            direction,
            entry_price,
            exit_price: None,
            profitable: None,
        });
    }

    /// Fill in the exit of the most recent record. "Profit" is proceeds
    /// at or above cost, regardless of the bet's direction.
    pub fn record_close(&mut self, exit_price: Decimal) {
        if let Some(last) = self.records.last_mut() {
            last.exit_price = Some(exit_price);
            last.profitable = Some(exit_price >= last.entry_price);
            debug!(%exit_price, profitable = ?last.profitable, "Ledger: trade closed");
        }
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    #[test]
    fn first_trade_always_allowed() {
        let mut ledger = DailyTradeLedger::new();
        ledger.roll_over(day(1));
        assert!(ledger.can_open(Direction::Bullish).is_ok());
        assert!(ledger.can_open(Direction::Bearish).is_ok());
    }

    #[test]
    fn profitable_close_locks_the_day() {
        let mut ledger = DailyTradeLedger::new();
        ledger.roll_over(day(1));
        ledger.record_open(Direction::Bullish, dec!(1.00));
        ledger.record_close(dec!(1.20));

        assert_eq!(
            ledger.can_open(Direction::Bullish),
            Err(PolicyRejection::ProfitLockedToday)
        );
        assert_eq!(
            ledger.can_open(Direction::Bearish),
            Err(PolicyRejection::ProfitLockedToday)
        );
    }

    #[test]
    fn break_even_close_counts_as_profit() {
        let mut ledger = DailyTradeLedger::new();
        ledger.roll_over(day(1));
        ledger.record_open(Direction::Bullish, dec!(1.00));
        ledger.record_close(dec!(1.00));
        assert!(ledger.profit_locked());
    }

    #[test]
    fn second_trade_must_reverse_direction() {
        let mut ledger = DailyTradeLedger::new();
        ledger.roll_over(day(1));
        ledger.record_open(Direction::Bullish, dec!(1.00));
        ledger.record_close(dec!(0.80));

        assert_eq!(
            ledger.can_open(Direction::Bullish),
            Err(PolicyRejection::SameDirectionRepeat)
        );
        assert!(ledger.can_open(Direction::Bearish).is_ok());
    }

    #[test]
    fn two_trades_cap_the_day() {
        let mut ledger = DailyTradeLedger::new();
        ledger.roll_over(day(1));
        ledger.record_open(Direction::Bullish, dec!(1.00));
        ledger.record_close(dec!(0.80));
        ledger.record_open(Direction::Bearish, dec!(1.00));
        ledger.record_close(dec!(0.90));

        assert_eq!(
            ledger.can_open(Direction::Bullish),
            Err(PolicyRejection::DailyCapReached)
        );
        assert_eq!(
            ledger.can_open(Direction::Bearish),
            Err(PolicyRejection::DailyCapReached)
        );
    }

    #[test]
    fn rollover_clears_records_once() {
        let mut ledger = DailyTradeLedger::new();
        ledger.roll_over(day(1));
        ledger.record_open(Direction::Bullish, dec!(1.00));
        ledger.record_close(dec!(1.50));
        assert!(ledger.can_open(Direction::Bearish).is_err());

        ledger.roll_over(day(2));
        assert!(ledger.can_open(Direction::Bullish).is_ok());
        assert!(ledger.records().is_empty());

        // same-day roll_over is a no-op
        ledger.record_open(Direction::Bullish, dec!(1.00));
        ledger.roll_over(day(2));
        assert_eq!(ledger.records().len(), 1);
    }
}
