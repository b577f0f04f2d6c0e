//! Wire types shared by the brokerage and market-data seams.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use strikebot_core::OrderSide;

/// Order type accepted by the brokerage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    /// Stop-trigger market order (used for protective legs).
    MarketIfTouched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    Day,
    GoodTilCanceled,
}

/// An order submission. Optional fields mirror the brokerage API: a
/// limit order carries `limit_price`, a stop-trigger order carries
/// `trigger_price`, and a forced close sets `outside_rth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOrderRequest {
    pub symbol: String,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub time_in_force: TimeInForce,
    pub trigger_price: Option<Decimal>,
    pub limit_price: Option<Decimal>,
    /// Allow execution outside regular trading hours.
    pub outside_rth: bool,
    pub remark: String,
}

/// Best bid/ask snapshot from order-book depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDepth {
    pub symbol: String,
    pub bid: Decimal,
    pub ask: Decimal,
}

/// One strike row of an option chain: the strike plus the call and put
/// contract symbols listed at it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChainRow {
    pub strike: Decimal,
    pub call_symbol: String,
    pub put_symbol: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandlePeriod {
    OneMinute,
    FiveMinute,
    Day,
}

/// A historical price bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}
