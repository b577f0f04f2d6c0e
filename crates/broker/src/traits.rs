//! Collaborator traits the engine is written against.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use strikebot_core::OrderSide;

use crate::types::{BookDepth, Candle, CandlePeriod, OptionChainRow, OrderType, SubmitOrderRequest};

/// Order placement and account queries against the brokerage.
///
/// Calls have unbounded latency and independent failure modes; callers
/// must never hold the state lock across them.
#[async_trait]
pub trait Brokerage: Send + Sync {
    /// Submit an order, returning the brokerage order id.
    async fn submit_order(&self, req: &SubmitOrderRequest) -> Result<String>;

    /// Best-effort cancel. An already-settled order is an error here;
    /// callers treat cancel failure as non-fatal.
    async fn cancel_order(&self, order_id: &str) -> Result<()>;

    /// Replace a live order's trigger price (break-even stop raise).
    async fn replace_order(&self, order_id: &str, trigger_price: Decimal) -> Result<()>;

    /// Maximum quantity purchasable with current buying power.
    async fn estimate_max_purchase_quantity(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        price: Option<Decimal>,
    ) -> Result<Decimal>;
}

/// Market-data lookups. Empty results mean "no data", which callers
/// must treat as "skip this trade attempt", never as zero.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Latest trade price, `None` when the symbol has not printed.
    async fn last_trade_price(&self, symbol: &str) -> Result<Option<Decimal>>;

    /// Best bid/ask, `None` when the book is empty.
    async fn depth(&self, symbol: &str) -> Result<Option<BookDepth>>;

    /// Listed option expiry dates for an underlying, unordered.
    async fn option_expiry_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>>;

    /// Option chain for one expiry, one row per strike.
    async fn option_chain(&self, symbol: &str, expiry: NaiveDate) -> Result<Vec<OptionChainRow>>;

    /// Most recent historical bars, oldest first.
    async fn candlesticks(
        &self,
        symbol: &str,
        period: CandlePeriod,
        count: usize,
    ) -> Result<Vec<Candle>>;
}
