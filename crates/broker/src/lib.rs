//! Brokerage and market-data collaborator seams.
//!
//! The controller never talks to a brokerage directly; it goes through
//! the [`Brokerage`] and [`MarketData`] traits. Live connectivity is
//! deliberately out of scope; [`paper::PaperBroker`] implements both
//! seams in memory and backs tests and paper mode.

pub mod paper;
pub mod traits;
pub mod types;

pub use paper::PaperBroker;
pub use traits::{Brokerage, MarketData};
pub use types::{
    BookDepth, Candle, CandlePeriod, OptionChainRow, OrderType, SubmitOrderRequest, TimeInForce,
};
