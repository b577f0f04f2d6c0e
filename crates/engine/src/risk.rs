//! Protective-order management.
//!
//! A filled entry gets two stop-trigger sell orders: the stop-loss at
//! `entry * stop_loss_ratio` and the take-profit at
//! `entry * take_profit_ratio`, both rounded down to the instrument
//! tick, both good-til-canceled, both for the full quantity. The legs
//! are independent: one failing never blocks the other.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{error, info, warn};

use strikebot_core::{OrderSide, TradingConfig};
use strikebot_broker::{Brokerage, OrderType, SubmitOrderRequest, TimeInForce};

use crate::types::Position;

pub const REMARK_STOP_LOSS: &str = "stop-loss";
pub const REMARK_TAKE_PROFIT: &str = "take-profit";

/// Round toward zero at tick precision. Both protective triggers round
/// down so the trigger never sits above the level the ratio implies.
pub fn round_to_tick(price: Decimal, tick_decimals: u32) -> Decimal {
    price.round_dp_with_strategy(tick_decimals, RoundingStrategy::ToZero)
}

/// Stop-loss and take-profit prices for an entry fill.
pub fn protective_prices(entry_price: Decimal, config: &TradingConfig) -> (Decimal, Decimal) {
    (
        round_to_tick(entry_price * config.stop_loss_ratio, config.tick_decimals),
        round_to_tick(entry_price * config.take_profit_ratio, config.tick_decimals),
    )
}

/// Price above which the stop is raised to break-even.
pub fn break_even_trigger(entry_price: Decimal, config: &TradingConfig) -> Decimal {
    round_to_tick(entry_price * config.break_even_ratio, config.tick_decimals)
}

fn protective_request(position: &Position, trigger_price: Decimal, remark: &str) -> SubmitOrderRequest {
    SubmitOrderRequest {
        symbol: position.symbol.clone(),
        order_type: OrderType::MarketIfTouched,
        side: OrderSide::Sell,
        quantity: position.quantity,
        time_in_force: TimeInForce::GoodTilCanceled,
        trigger_price: Some(trigger_price),
        limit_price: None,
        outside_rth: false,
        remark: remark.to_string(),
    }
}

/// Submit both protective orders. Each leg fails or succeeds on its
/// own; a failed leg is logged and its order id left unset.
pub async fn place_protective_orders(
    broker: &dyn Brokerage,
    position: &Position,
) -> (Option<String>, Option<String>) {
    let stop_id = match broker
        .submit_order(&protective_request(
            position,
            position.stop_loss_price,
            REMARK_STOP_LOSS,
        ))
        .await
    {
        Ok(id) => {
            info!(
                order_id = id,
                symbol = position.symbol,
                trigger = %position.stop_loss_price,
                "Stop-loss order placed"
            );
            Some(id)
        }
        Err(e) => {
            error!(symbol = position.symbol, error = %e, "Failed to place stop-loss order");
            None
        }
    };

    let take_profit_id = match broker
        .submit_order(&protective_request(
            position,
            position.take_profit_price,
            REMARK_TAKE_PROFIT,
        ))
        .await
    {
        Ok(id) => {
            info!(
                order_id = id,
                symbol = position.symbol,
                trigger = %position.take_profit_price,
                "Take-profit order placed"
            );
            Some(id)
        }
        Err(e) => {
            error!(symbol = position.symbol, error = %e, "Failed to place take-profit order");
            None
        }
    };

    (stop_id, take_profit_id)
}

/// Cancel whichever protective orders are set. Best effort: a missing
/// or already-settled order is logged and forgotten, not retried.
pub async fn cancel_protective_orders(broker: &dyn Brokerage, position: &Position) {
    for (order_id, leg) in [
        (&position.stop_order_id, REMARK_STOP_LOSS),
        (&position.take_profit_order_id, REMARK_TAKE_PROFIT),
    ] {
        if let Some(id) = order_id {
            match broker.cancel_order(id).await {
                Ok(()) => info!(order_id = id, leg, "Protective order canceled"),
                Err(e) => warn!(order_id = id, leg, error = %e, "Protective cancel failed"),
            }
        }
    }
}
