//! Position and trade-record types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use strikebot_core::Direction;

/// The single live position, if any.
///
/// `stop_order_id` / `take_profit_order_id` are weak references: they
/// identify brokerage-side orders we believe are live, but are an
/// informal cache, not authoritative brokerage state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub entry_price: Decimal,
    pub quantity: Decimal,
    pub stop_loss_price: Decimal,
    pub take_profit_price: Decimal,
    pub stop_order_id: Option<String>,
    pub take_profit_order_id: Option<String>,
    /// Once the contract prints above this, the stop is raised to entry.
    pub break_even_trigger_price: Decimal,
    pub stop_raised_to_break_even: bool,
    pub opened_at: DateTime<Utc>,
}

/// One entry in the daily trade ledger. `exit_price`/`profitable` stay
/// unset while the trade is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub direction: Direction,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub profitable: Option<bool>,
}

/// Classify a filled contract as bullish (call) or bearish (put) from
/// its naming convention: the last letter before the strike digits is
/// the call/put marker, e.g. `AAPL240705C250000.US`.
pub fn classify_contract(symbol: &str) -> Option<Direction> {
    let body = symbol.split('.').next().unwrap_or(symbol);
    let marker = body.chars().rev().find(|c| c.is_ascii_alphabetic())?;
    match marker {
        'C' => Some(Direction::Bullish),
        'P' => Some(Direction::Bearish),
        _ => None,
    }
}
