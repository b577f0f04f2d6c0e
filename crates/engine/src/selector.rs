//! Option-contract selection.
//!
//! Picks the contract for a directional signal: nearest expiry that is
//! today or later, a symmetric strike window around the underlying's
//! last price, then the highest-strike call (bullish) or lowest-strike
//! put (bearish) in the window, the furthest out-of-the-money and
//! hence cheapest premium among the candidates.

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use strikebot_broker::MarketData;
use strikebot_core::Direction;

/// The contract chosen for an entry attempt.
#[derive(Debug, Clone)]
pub struct SelectedContract {
    pub symbol: String,
    pub strike: Decimal,
    pub expiry: NaiveDate,
    pub underlying_price: Decimal,
}

/// Select a contract, or `None` when any market-data lookup comes back
/// empty; the caller must skip the trade, not retry.
pub async fn select_contract(
    market: &dyn MarketData,
    underlying: &str,
    direction: Direction,
    window: usize,
    today: NaiveDate,
) -> Result<Option<SelectedContract>> {
    let Some(price) = market.last_trade_price(underlying).await? else {
        debug!(underlying, "No last price, skipping");
        return Ok(None);
    };

    let mut expiries = market.option_expiry_dates(underlying).await?;
    expiries.retain(|d| *d >= today);
    expiries.sort_unstable();
    let Some(expiry) = expiries.first().copied() else {
        debug!(underlying, "No usable expiry, skipping");
        return Ok(None);
    };

    let mut chain = market.option_chain(underlying, expiry).await?;
    if chain.is_empty() {
        debug!(underlying, %expiry, "Empty option chain, skipping");
        return Ok(None);
    }
    chain.sort_by(|a, b| a.strike.cmp(&b.strike));

    // Strike closest to the underlying, then a symmetric window around
    // it clamped to the chain bounds.
    let at_the_money = chain
        .iter()
        .enumerate()
        .min_by_key(|(_, row)| (row.strike - price).abs())
        .map(|(i, _)| i)
        .unwrap_or(0);
    let low = at_the_money.saturating_sub(window);
    let high = (at_the_money + window).min(chain.len() - 1);

    let (row, symbol) = match direction {
        Direction::Bullish => (&chain[high], chain[high].call_symbol.clone()),
        Direction::Bearish => (&chain[low], chain[low].put_symbol.clone()),
    };

    debug!(
        underlying,
        %price,
        %expiry,
        strike = %row.strike,
        contract = symbol,
        "Contract selected"
    );

    Ok(Some(SelectedContract {
        symbol,
        strike: row.strike,
        expiry,
        underlying_price: price,
    }))
}
