//! Scheduled job bodies: forced close, pending sweep, session refresh.
//!
//! The scheduler crate only owns the timers; the state discipline here
//! is the same as the dispatcher's: lock for in-memory transitions,
//! broker calls outside it.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};

use strikebot_broker::{CandlePeriod, OrderType, SubmitOrderRequest, TimeInForce};
use strikebot_core::{session, OrderSide, SessionHours};

use crate::dispatcher::Engine;

pub const REMARK_FORCED_CLOSE: &str = "forced-close";

impl Engine {
    /// Flatten the open position ahead of the session close so nothing
    /// carries into the illiquid or closed window. Logs the day's
    /// ledger for audit first; the sell fill notification performs the
    /// actual state reset through the dispatcher.
    ///
    /// # Errors
    /// Returns an error if the market-sell submission fails.
    pub async fn forced_close(&self, now: DateTime<Utc>) -> Result<()> {
        let position = {
            let st = self.lock_state().await;
            info!(
                trading_day = ?st.ledger.day(),
                trades = st.ledger.records().len(),
                ledger = ?st.ledger.records(),
                "End-of-session ledger"
            );
            st.position.clone()
        };

        let Some(position) = position else {
            return Ok(());
        };

        // Session range of the contract, logged alongside the ledger.
        match self
            .market()
            .candlesticks(&position.symbol, CandlePeriod::OneMinute, 390)
            .await
        {
            Ok(bars) if !bars.is_empty() => {
                let low = bars.iter().map(|b| b.low).min();
                let high = bars.iter().map(|b| b.high).max();
                info!(symbol = position.symbol, ?low, ?high, "Session range");
            }
            Ok(_) => {}
            Err(e) => warn!(symbol = position.symbol, error = %e, "Candle audit failed"),
        }

        let order_id = self
            .broker()
            .submit_order(&SubmitOrderRequest {
                symbol: position.symbol.clone(),
                order_type: OrderType::Market,
                side: OrderSide::Sell,
                quantity: position.quantity,
                time_in_force: TimeInForce::Day,
                trigger_price: None,
                limit_price: None,
                outside_rth: true,
                remark: REMARK_FORCED_CLOSE.to_string(),
            })
            .await
            .context("forced close submission failed")?;

        info!(
            order_id,
            symbol = position.symbol,
            quantity = %position.quantity,
            at = %now,
            "Forced close submitted"
        );

        Ok(())
    }

    /// Cancel entry orders stuck past the pending timeout. The entry is
    /// dropped from tracking whether or not the cancel succeeds; the
    /// order either fills (and arrives as a normal notification) or is
    /// already gone. Returns the number of entries swept.
    pub async fn sweep_pending(&self, now: DateTime<Utc>) -> usize {
        let timeout = Duration::seconds(self.trading_config().pending_timeout_secs);
        let expired = {
            let mut st = self.lock_state().await;
            st.pending.drain_expired(now, timeout)
        };

        for entry in &expired {
            warn!(
                order_id = entry.order_id,
                symbol = entry.symbol,
                age_secs = (now - entry.submitted_at).num_seconds(),
                "Entry order timed out, canceling"
            );
            if let Err(e) = self.broker().cancel_order(&entry.order_id).await {
                warn!(
                    order_id = entry.order_id,
                    error = %e,
                    "Timeout cancel failed, order dropped from tracking anyway"
                );
            }
        }

        expired.len()
    }

    /// Recompute the session hours for the market's current date,
    /// tracking daylight-saving transitions. On failure the previous
    /// hours stay in effect.
    pub async fn refresh_session_hours(&self, now: DateTime<Utc>) {
        let market_date = now.with_timezone(&session::MARKET_TZ).date_naive();
        match SessionHours::for_market_date(market_date) {
            Ok(hours) => {
                let mut st = self.lock_state().await;
                if st.session_hours != hours {
                    info!(old = ?st.session_hours, new = ?hours, "Session hours refreshed");
                }
                st.session_hours = hours;
            }
            Err(e) => error!(error = %e, "Session-hours refresh failed, keeping previous"),
        }
    }

    /// Current session hours, for status surfaces and tests.
    pub async fn session_hours(&self) -> SessionHours {
        self.lock_state().await.session_hours
    }
}
