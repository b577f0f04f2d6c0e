//! Paper brokerage and market data.
//!
//! In-memory, deterministic implementation of both collaborator seams.
//! Tests seed it with fixed prices/chains and then inspect the orders
//! the engine submitted; paper mode runs against it directly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use strikebot_core::OrderSide;

use crate::traits::{Brokerage, MarketData};
use crate::types::{BookDepth, Candle, CandlePeriod, OptionChainRow, OrderType, SubmitOrderRequest};

/// A recorded paper order.
#[derive(Debug, Clone)]
pub struct PaperOrder {
    pub order_id: String,
    pub request: SubmitOrderRequest,
}

#[derive(Default)]
struct MarketBook {
    last_prices: HashMap<String, Decimal>,
    depths: HashMap<String, BookDepth>,
    expiries: HashMap<String, Vec<NaiveDate>>,
    chains: HashMap<(String, NaiveDate), Vec<OptionChainRow>>,
    candles: HashMap<String, Vec<Candle>>,
}

pub struct PaperBroker {
    next_id: AtomicU64,
    orders: Mutex<Vec<PaperOrder>>,
    canceled: Mutex<Vec<String>>,
    replaced: Mutex<Vec<(String, Decimal)>>,
    /// Submissions whose remark is listed here fail, for exercising
    /// independent protective-leg failure.
    fail_remarks: Mutex<Vec<String>>,
    fail_cancels: AtomicBool,
    book: Mutex<MarketBook>,
    max_quantity: Mutex<Decimal>,
}

impl PaperBroker {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            orders: Mutex::new(Vec::new()),
            canceled: Mutex::new(Vec::new()),
            replaced: Mutex::new(Vec::new()),
            fail_remarks: Mutex::new(Vec::new()),
            fail_cancels: AtomicBool::new(false),
            book: Mutex::new(MarketBook::default()),
            max_quantity: Mutex::new(Decimal::ONE),
        }
    }

    pub fn set_last_price(&self, symbol: &str, price: Decimal) {
        let mut book = self.book.lock().unwrap();
        book.last_prices.insert(symbol.to_string(), price);
    }

    pub fn set_depth(&self, symbol: &str, bid: Decimal, ask: Decimal) {
        let mut book = self.book.lock().unwrap();
        book.depths.insert(
            symbol.to_string(),
            BookDepth {
                symbol: symbol.to_string(),
                bid,
                ask,
            },
        );
    }

    pub fn set_expiries(&self, symbol: &str, expiries: Vec<NaiveDate>) {
        let mut book = self.book.lock().unwrap();
        book.expiries.insert(symbol.to_string(), expiries);
    }

    pub fn set_chain(&self, symbol: &str, expiry: NaiveDate, rows: Vec<OptionChainRow>) {
        let mut book = self.book.lock().unwrap();
        book.chains.insert((symbol.to_string(), expiry), rows);
    }

    pub fn set_candles(&self, symbol: &str, candles: Vec<Candle>) {
        let mut book = self.book.lock().unwrap();
        book.candles.insert(symbol.to_string(), candles);
    }

    pub fn set_max_quantity(&self, quantity: Decimal) {
        *self.max_quantity.lock().unwrap() = quantity;
    }

    /// Make submissions with this remark fail, e.g. to simulate one
    /// protective leg being rejected while the other goes through.
    pub fn fail_submits_with_remark(&self, remark: &str) {
        self.fail_remarks.lock().unwrap().push(remark.to_string());
    }

    pub fn fail_cancels(&self, fail: bool) {
        self.fail_cancels.store(fail, Ordering::SeqCst);
    }

    pub fn submitted_orders(&self) -> Vec<PaperOrder> {
        self.orders.lock().unwrap().clone()
    }

    pub fn canceled_orders(&self) -> Vec<String> {
        self.canceled.lock().unwrap().clone()
    }

    pub fn replaced_orders(&self) -> Vec<(String, Decimal)> {
        self.replaced.lock().unwrap().clone()
    }
}

impl Default for PaperBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Brokerage for PaperBroker {
    async fn submit_order(&self, req: &SubmitOrderRequest) -> Result<String> {
        if self
            .fail_remarks
            .lock()
            .unwrap()
            .iter()
            .any(|r| r == &req.remark)
        {
            bail!("paper broker rejected order ({})", req.remark);
        }

        let order_id = format!("PAPER-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        info!(
            order_id,
            symbol = req.symbol,
            side = ?req.side,
            quantity = %req.quantity,
            remark = req.remark,
            "Paper order accepted"
        );
        self.orders.lock().unwrap().push(PaperOrder {
            order_id: order_id.clone(),
            request: req.clone(),
        });
        Ok(order_id)
    }

    async fn cancel_order(&self, order_id: &str) -> Result<()> {
        if self.fail_cancels.load(Ordering::SeqCst) {
            bail!("paper broker refused cancel of {order_id}");
        }
        self.canceled.lock().unwrap().push(order_id.to_string());
        Ok(())
    }

    async fn replace_order(&self, order_id: &str, trigger_price: Decimal) -> Result<()> {
        self.replaced
            .lock()
            .unwrap()
            .push((order_id.to_string(), trigger_price));
        Ok(())
    }

    async fn estimate_max_purchase_quantity(
        &self,
        _symbol: &str,
        _order_type: OrderType,
        _side: OrderSide,
        _price: Option<Decimal>,
    ) -> Result<Decimal> {
        Ok(*self.max_quantity.lock().unwrap())
    }
}

#[async_trait]
impl MarketData for PaperBroker {
    async fn last_trade_price(&self, symbol: &str) -> Result<Option<Decimal>> {
        Ok(self.book.lock().unwrap().last_prices.get(symbol).copied())
    }

    async fn depth(&self, symbol: &str) -> Result<Option<BookDepth>> {
        Ok(self.book.lock().unwrap().depths.get(symbol).cloned())
    }

    async fn option_expiry_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>> {
        Ok(self
            .book
            .lock()
            .unwrap()
            .expiries
            .get(symbol)
            .cloned()
            .unwrap_or_default())
    }

    async fn option_chain(&self, symbol: &str, expiry: NaiveDate) -> Result<Vec<OptionChainRow>> {
        Ok(self
            .book
            .lock()
            .unwrap()
            .chains
            .get(&(symbol.to_string(), expiry))
            .cloned()
            .unwrap_or_default())
    }

    async fn candlesticks(
        &self,
        symbol: &str,
        _period: CandlePeriod,
        count: usize,
    ) -> Result<Vec<Candle>> {
        let book = self.book.lock().unwrap();
        let candles = book.candles.get(symbol).cloned().unwrap_or_default();
        let start = candles.len().saturating_sub(count);
        Ok(candles[start..].to_vec())
    }
}
