// External collaborator interfaces
//
// Transport, signing and retry policy belong to the implementations; the
// bootstrap core only calls these blocking methods.

pub mod paper;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::granularity::Granularity;
use crate::history::{HistoricalWindow, TimeRange};
use crate::market::{CurrencyCode, Market};

pub use paper::PaperExchange;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid trading pair: {0}")]
    InvalidPair(String),

    #[error("Order rejected: {0}")]
    OrderRejected(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub market: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub market: String,
    pub side: OrderSide,
    pub price: f64,
    /// Base currency filled
    pub filled: f64,
    /// Quote currency spent or received
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

pub trait MarketDataClient {
    /// Candles for `market`; `range == None` asks for the full history the
    /// exchange serves for this granularity.
    fn historical_data(
        &self,
        market: &Market,
        granularity: Granularity,
        range: Option<TimeRange>,
    ) -> Result<HistoricalWindow, ClientError>;

    fn ticker(&self, market: &Market) -> Result<PriceSnapshot, ClientError>;
}

pub trait AccountClient {
    /// Available (not on hold) balance of one currency.
    fn balance(&self, currency: &CurrencyCode) -> Result<f64, ClientError>;
}

pub trait TradeClient {
    /// Spend `quote_amount` of the quote currency.
    fn market_buy(&mut self, market: &Market, quote_amount: f64) -> Result<OrderResult, ClientError>;

    /// Sell the given base amount.
    fn market_sell(&mut self, market: &Market, base_amount: f64) -> Result<OrderResult, ClientError>;
}
