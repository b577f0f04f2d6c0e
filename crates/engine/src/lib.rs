//! The position lifecycle state machine.
//!
//! One position at a time: a webhook signal selects an option contract
//! and submits an entry order; the buy fill creates the position and
//! its two protective orders; the sell fill (protective trigger or
//! forced close) flattens it. All shared state lives in one
//! [`state::TradingState`] aggregate behind a single lock, and every
//! order-status notification passes through the serialized dispatcher.

pub mod dedupe;
pub mod dispatcher;
pub mod jobs;
pub mod ledger;
pub mod pending;
pub mod risk;
pub mod selector;
pub mod state;
pub mod types;

pub use dispatcher::{Engine, SignalOutcome};
pub use ledger::DailyTradeLedger;
pub use types::{Position, TradeRecord};
