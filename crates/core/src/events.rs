use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Directional read of a signal: bullish buys calls, bearish buys puts.
/// Both open long option positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    /// Map a webhook action string to a direction.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "buy" => Some(Self::Bullish),
            "sell" => Some(Self::Bearish),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Brokerage order status as delivered by the push stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// Terminal states remove entries from the pending-order tracker.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Rejected | Self::Expired
        )
    }
}

/// An order-status push notification. Delivery may be duplicated or out
/// of order; the dispatcher is responsible for making it idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusEvent {
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub status: OrderStatus,
    pub submitted_price: Decimal,
    pub executed_quantity: Decimal,
    pub stock_name: String,
}

/// A validated inbound trade signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    pub ticker: String,
    pub direction: Direction,
}
