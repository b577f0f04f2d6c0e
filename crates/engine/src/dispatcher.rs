//! The serialized order-event dispatcher and signal path.
//!
//! All transitions of the position lifecycle (Flat → Open → Flat) run
//! through [`Engine`]. Order-status notifications may arrive duplicated
//! or out of order; the dispatcher serializes them behind the state
//! lock and makes fills idempotent through the processed-order set.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use strikebot_broker::{Brokerage, MarketData, OrderType, SubmitOrderRequest, TimeInForce};
use strikebot_core::{
    session, Direction, OrderSide, OrderStatus, OrderStatusEvent, PolicyRejection, SessionHours,
    TradeError, TradeSignal, TradingConfig,
};

use crate::risk;
use crate::selector;
use crate::state::TradingState;
use crate::types::{classify_contract, Position};

pub const REMARK_ENTRY: &str = "entry";

/// Result of a signal: either an entry order went out, or a typed
/// policy refusal. Collaborator faults surface as `TradeError` instead.
#[derive(Debug, Clone)]
pub enum SignalOutcome {
    Submitted { order_id: String, contract: String },
    Rejected(PolicyRejection),
}

/// Deferred broker work decided under the state lock but executed
/// after it is released.
enum Followup {
    None,
    PlaceProtective(Position),
    CancelProtective(Position),
}

pub struct Engine {
    trading: TradingConfig,
    broker: Arc<dyn Brokerage>,
    market: Arc<dyn MarketData>,
    state: Mutex<TradingState>,
    /// Serializes whole entry attempts (gate + selection + submission)
    /// so two concurrent webhooks cannot both pass the single-position
    /// gate. Distinct from the state lock, which never spans I/O.
    entry_gate: Mutex<()>,
}

impl Engine {
    pub fn new(
        trading: TradingConfig,
        session_hours: SessionHours,
        broker: Arc<dyn Brokerage>,
        market: Arc<dyn MarketData>,
    ) -> Self {
        Self {
            trading,
            broker,
            market,
            state: Mutex::new(TradingState::new(session_hours)),
            entry_gate: Mutex::new(()),
        }
    }

    pub(crate) async fn lock_state(&self) -> tokio::sync::MutexGuard<'_, TradingState> {
        self.state.lock().await
    }

    pub(crate) fn trading_config(&self) -> &TradingConfig {
        &self.trading
    }

    pub(crate) fn broker(&self) -> &dyn Brokerage {
        self.broker.as_ref()
    }

    pub(crate) fn market(&self) -> &dyn MarketData {
        self.market.as_ref()
    }

    /// Snapshot of the current position, for status surfaces and tests.
    pub async fn position(&self) -> Option<Position> {
        self.state.lock().await.position.clone()
    }

    /// Handle an inbound trade signal: gate on policy, select a
    /// contract, size the order, submit it, and track it as pending.
    ///
    /// # Errors
    /// Returns `TradeError::Collaborator` when a market-data or
    /// brokerage call fails; policy refusals are `Ok(Rejected(_))`.
    pub async fn handle_signal(
        &self,
        signal: &TradeSignal,
        now: DateTime<Utc>,
    ) -> Result<SignalOutcome, TradeError> {
        let _entry = self.entry_gate.lock().await;

        // Policy gate: in-memory checks only, lock released before any
        // collaborator call.
        {
            let mut st = self.state.lock().await;

            if let Err(r) = session::check_entry(now, &st.session_hours, self.trading.guard_minutes)
            {
                return Ok(SignalOutcome::Rejected(r));
            }
            if st.position.is_some() {
                return Ok(SignalOutcome::Rejected(PolicyRejection::PositionAlreadyOpen));
            }
            if !st.pending.is_empty() {
                return Ok(SignalOutcome::Rejected(PolicyRejection::EntryPending));
            }
            if let Some(last) = st.last_entry_at {
                if now - last < Duration::seconds(self.trading.cooldown_secs) {
                    return Ok(SignalOutcome::Rejected(PolicyRejection::CooldownActive));
                }
            }

            let today = session::trading_day(now, &st.session_hours);
            st.ledger.roll_over(today);
            if let Err(r) = st.ledger.can_open(signal.direction) {
                return Ok(SignalOutcome::Rejected(r));
            }
        }

        let market_today = now.with_timezone(&session::MARKET_TZ).date_naive();
        let Some(contract) = selector::select_contract(
            self.market.as_ref(),
            &signal.ticker,
            signal.direction,
            self.trading.strike_window,
            market_today,
        )
        .await?
        else {
            return Ok(SignalOutcome::Rejected(PolicyRejection::NoContractFound));
        };

        let Some(depth) = self.market.depth(&contract.symbol).await? else {
            debug!(contract = contract.symbol, "No depth for contract, skipping");
            return Ok(SignalOutcome::Rejected(PolicyRejection::NoContractFound));
        };

        let estimated = self
            .broker
            .estimate_max_purchase_quantity(
                &contract.symbol,
                OrderType::Limit,
                OrderSide::Buy,
                Some(depth.ask),
            )
            .await?;
        let quantity = (estimated * self.trading.quantity_fraction).floor();
        if quantity <= Decimal::ZERO {
            debug!(contract = contract.symbol, "No buying power, skipping");
            return Ok(SignalOutcome::Rejected(PolicyRejection::NoBuyingPower));
        }

        let order_id = self
            .broker
            .submit_order(&SubmitOrderRequest {
                symbol: contract.symbol.clone(),
                order_type: OrderType::Limit,
                side: OrderSide::Buy,
                quantity,
                time_in_force: TimeInForce::Day,
                trigger_price: None,
                limit_price: Some(depth.ask),
                outside_rth: false,
                remark: REMARK_ENTRY.to_string(),
            })
            .await?;

        {
            let mut st = self.state.lock().await;
            st.pending.insert(&order_id, &contract.symbol, now);
        }

        info!(
            order_id,
            ticker = signal.ticker,
            direction = ?signal.direction,
            contract = contract.symbol,
            strike = %contract.strike,
            limit = %depth.ask,
            %quantity,
            "Entry order submitted"
        );

        Ok(SignalOutcome::Submitted {
            order_id,
            contract: contract.symbol,
        })
    }

    /// Advance the state machine on an order-status notification.
    ///
    /// Terminal events clear the pending tracker; only fills go
    /// further; duplicates are dropped at the idempotency boundary; a
    /// buy fill while flat opens the position, a sell fill while open
    /// closes it, and everything else is a foreign or already-handled
    /// order, ignored.
    pub async fn handle_order_event(&self, event: &OrderStatusEvent, now: DateTime<Utc>) -> Result<()> {
        let followup = {
            let mut st = self.state.lock().await;

            if event.status.is_terminal() && st.pending.remove(&event.order_id) {
                debug!(
                    order_id = event.order_id,
                    status = ?event.status,
                    "Pending entry reached terminal status"
                );
            }

            if event.status != OrderStatus::Filled {
                return Ok(());
            }

            if st.processed.contains(&event.order_id) {
                debug!(order_id = event.order_id, "Duplicate fill dropped");
                return Ok(());
            }
            st.processed.insert(&event.order_id);

            match (event.side, st.position.is_some()) {
                (OrderSide::Buy, false) => self.open_position(&mut st, event, now),
                (OrderSide::Sell, true) => Self::close_position(&mut st, event),
                _ => {
                    debug!(
                        order_id = event.order_id,
                        side = ?event.side,
                        "Fill does not match position state, ignored"
                    );
                    Followup::None
                }
            }
        };

        match followup {
            Followup::None => {}
            Followup::PlaceProtective(position) => {
                let (stop_id, take_profit_id) =
                    risk::place_protective_orders(self.broker.as_ref(), &position).await;

                // The position may have closed while the protective
                // orders were in flight; only write the ids back onto
                // the position they were placed for.
                let mut st = self.state.lock().await;
                match st.position.as_mut() {
                    Some(current)
                        if current.symbol == position.symbol
                            && current.opened_at == position.opened_at =>
                    {
                        current.stop_order_id = stop_id;
                        current.take_profit_order_id = take_profit_id;
                    }
                    _ => {
                        warn!(
                            symbol = position.symbol,
                            "Position changed during protective placement, ids dropped"
                        );
                    }
                }
            }
            Followup::CancelProtective(position) => {
                risk::cancel_protective_orders(self.broker.as_ref(), &position).await;
            }
        }

        Ok(())
    }

    fn open_position(
        &self,
        st: &mut TradingState,
        event: &OrderStatusEvent,
        now: DateTime<Utc>,
    ) -> Followup {
        let Some(direction) = classify_contract(&event.symbol) else {
            warn!(
                order_id = event.order_id,
                symbol = event.symbol,
                "Buy fill without call/put marker, treated as foreign"
            );
            return Followup::None;
        };

        let today = session::trading_day(now, &st.session_hours);
        st.ledger.roll_over(today);
        st.ledger.record_open(direction, event.submitted_price);

        let (stop_loss_price, take_profit_price) =
            risk::protective_prices(event.submitted_price, &self.trading);
        let position = Position {
            symbol: event.symbol.clone(),
            entry_price: event.submitted_price,
            quantity: event.executed_quantity,
            stop_loss_price,
            take_profit_price,
            stop_order_id: None,
            take_profit_order_id: None,
            break_even_trigger_price: risk::break_even_trigger(event.submitted_price, &self.trading),
            stop_raised_to_break_even: false,
            opened_at: now,
        };

        info!(
            order_id = event.order_id,
            symbol = event.symbol,
            ?direction,
            entry = %position.entry_price,
            quantity = %position.quantity,
            stop = %position.stop_loss_price,
            take_profit = %position.take_profit_price,
            "Position opened"
        );

        st.position = Some(position.clone());
        st.last_entry_at = Some(now);
        Followup::PlaceProtective(position)
    }

    fn close_position(st: &mut TradingState, event: &OrderStatusEvent) -> Followup {
        st.ledger.record_close(event.submitted_price);

        let Some(position) = st.position.take() else {
            return Followup::None;
        };

        info!(
            order_id = event.order_id,
            symbol = position.symbol,
            entry = %position.entry_price,
            exit = %event.submitted_price,
            "Position closed"
        );

        Followup::CancelProtective(position)
    }

    /// Quote push for the traded contract: once it prints above the
    /// break-even trigger, raise the stop order to the entry price.
    /// Runs at most once per position.
    pub async fn handle_quote(&self, symbol: &str, last_price: Decimal) {
        let raise = {
            let mut st = self.state.lock().await;
            match st.position.as_mut() {
                Some(pos)
                    if pos.symbol == symbol
                        && !pos.stop_raised_to_break_even
                        && last_price > pos.break_even_trigger_price =>
                {
                    match pos.stop_order_id.clone() {
                        Some(stop_id) => {
                            // Marked before the broker call so a failed
                            // replace is not retried on every tick.
                            pos.stop_raised_to_break_even = true;
                            Some((stop_id, pos.entry_price))
                        }
                        None => None,
                    }
                }
                _ => None,
            }
        };

        if let Some((stop_id, entry_price)) = raise {
            match self.broker.replace_order(&stop_id, entry_price).await {
                Ok(()) => info!(
                    order_id = stop_id,
                    symbol,
                    trigger = %entry_price,
                    "Stop raised to break-even"
                ),
                Err(e) => warn!(
                    order_id = stop_id,
                    symbol,
                    error = %e,
                    "Break-even stop replace failed"
                ),
            }
        }
    }
}
