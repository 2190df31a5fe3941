// In-memory paper exchange
//
// Serves synthetic, deterministic candles and fills market orders at the
// current close. Backs the dummy exchange and the test suites.

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::debug;

use super::{
    AccountClient, ClientError, MarketDataClient, OrderResult, OrderSide, PriceSnapshot, TradeClient,
};
use crate::granularity::{Granularity, Interval};
use crate::history::{Candle, HistoricalWindow, TimeRange};
use crate::market::{CurrencyCode, Market};

/// Most exchanges cap a single history request at 300 candles.
pub const DEFAULT_HISTORY_LIMIT: usize = 300;

const BASE_PRICE: f64 = 100.0;
const VOLATILITY: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct PaperExchange {
    seed: u64,
    listed_at: DateTime<Utc>,
    clock: Option<DateTime<Utc>>,
    history_limit: usize,
    balances: HashMap<String, f64>,
}

impl PaperExchange {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            listed_at: Utc.timestamp_opt(0, 0).single().unwrap_or_else(Utc::now),
            clock: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            balances: HashMap::new(),
        }
    }

    /// No candles exist before this instant.
    pub fn listed_at(mut self, listed_at: DateTime<Utc>) -> Self {
        self.listed_at = listed_at;
        self
    }

    /// Freeze "now" instead of reading the system clock.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_balance(mut self, currency: &str, amount: f64) -> Self {
        self.balances.insert(currency.to_string(), amount);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    /// Close price of the candle opening at `timestamp`; a slow weekly wave
    /// plus per-candle noise seeded from the timestamp.
    fn close_at(&self, timestamp: i64) -> f64 {
        let mut rng = StdRng::seed_from_u64(self.seed ^ timestamp as u64);
        let wave = (timestamp as f64 / 604_800.0 * std::f64::consts::TAU).sin() * 0.1;
        let noise = rng.gen_range(-VOLATILITY..=VOLATILITY);
        BASE_PRICE * (1.0 + wave) * (1.0 + noise)
    }

    fn candle_at(&self, timestamp: i64, step: i64) -> Option<Candle> {
        let open = self.close_at(timestamp - step);
        let close = self.close_at(timestamp);
        let spread = BASE_PRICE * VOLATILITY * 0.5;

        Some(Candle {
            timestamp: Utc.timestamp_opt(timestamp, 0).single()?,
            open,
            high: open.max(close) + spread,
            low: (open.min(close) - spread).max(0.0),
            close,
            volume: 1.0 + (close - open).abs(),
        })
    }

    fn candles(&self, range: TimeRange, interval: Interval) -> Vec<Candle> {
        let step = i64::from(interval.seconds());
        let floor = range.start.max(self.listed_at).timestamp();
        let ceiling = range.end.min(self.now()).timestamp();
        let first = floor.div_euclid(step) * step + if floor.rem_euclid(step) == 0 { 0 } else { step };

        (0..)
            .map(|i| first + i * step)
            .take_while(|ts| *ts < ceiling)
            .take(self.history_limit)
            .filter_map(|ts| self.candle_at(ts, step))
            .collect()
    }
}

impl MarketDataClient for PaperExchange {
    fn historical_data(
        &self,
        market: &Market,
        granularity: Granularity,
        range: Option<TimeRange>,
    ) -> Result<HistoricalWindow, ClientError> {
        let range = range.unwrap_or_else(|| {
            TimeRange::ending_at(self.now(), granularity, self.history_limit)
        });
        let candles = self.candles(range, granularity.interval());
        debug!(
            "Paper history for {} at {}: {} candles",
            market, granularity, candles.len()
        );
        Ok(HistoricalWindow::new(market.display_pair(), granularity, candles))
    }

    fn ticker(&self, market: &Market) -> Result<PriceSnapshot, ClientError> {
        let now = self.now();
        let step = i64::from(Interval::OneMinute.seconds());
        let opened = now.timestamp().div_euclid(step) * step;
        Ok(PriceSnapshot {
            market: market.display_pair().to_string(),
            timestamp: now,
            price: self.close_at(opened),
        })
    }
}

impl AccountClient for PaperExchange {
    fn balance(&self, currency: &CurrencyCode) -> Result<f64, ClientError> {
        Ok(self.balances.get(currency.as_str()).copied().unwrap_or(0.0))
    }
}

impl PaperExchange {
    fn adjust(&mut self, currency: &CurrencyCode, delta: f64) {
        *self.balances.entry(currency.to_string()).or_insert(0.0) += delta;
    }

    fn available(&self, currency: &CurrencyCode) -> f64 {
        self.balances.get(currency.as_str()).copied().unwrap_or(0.0)
    }
}

impl TradeClient for PaperExchange {
    fn market_buy(&mut self, market: &Market, quote_amount: f64) -> Result<OrderResult, ClientError> {
        let available = self.available(market.quote());
        if quote_amount <= 0.0 || quote_amount > available {
            return Err(ClientError::OrderRejected(format!(
                "buy of {} {} with {} available",
                quote_amount,
                market.quote(),
                available
            )));
        }

        let price = self.ticker(market)?.price;
        let filled = quote_amount / price;
        self.adjust(market.quote(), -quote_amount);
        self.adjust(market.base(), filled);

        Ok(OrderResult {
            market: market.display_pair().to_string(),
            side: OrderSide::Buy,
            price,
            filled,
            value: quote_amount,
            timestamp: self.now(),
        })
    }

    fn market_sell(&mut self, market: &Market, base_amount: f64) -> Result<OrderResult, ClientError> {
        let available = self.available(market.base());
        if base_amount <= 0.0 || base_amount > available {
            return Err(ClientError::OrderRejected(format!(
                "sell of {} {} with {} available",
                base_amount,
                market.base(),
                available
            )));
        }

        let price = self.ticker(market)?.price;
        let value = base_amount * price;
        self.adjust(market.base(), -base_amount);
        self.adjust(market.quote(), value);

        Ok(OrderResult {
            market: market.display_pair().to_string(),
            side: OrderSide::Sell,
            price,
            filled: base_amount,
            value,
            timestamp: self.now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Exchange;
    use crate::market::normalize;
    use chrono::Duration;

    fn clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap()
    }

    fn hourly() -> Granularity {
        Granularity::new(Exchange::CoinbasePro, Interval::OneHour)
    }

    #[test]
    fn test_range_yields_aligned_candles() {
        let exchange = PaperExchange::new(7).with_clock(clock());
        let market = normalize(Exchange::CoinbasePro, "BTC-GBP").unwrap();
        let end = clock() - Duration::minutes(90);
        let range = TimeRange::ending_at(end, hourly(), 300);

        let window = exchange.historical_data(&market, hourly(), Some(range)).unwrap();
        assert_eq!(window.len(), 300);
        assert!(window.candles().iter().all(|c| c.timestamp.timestamp() % 3600 == 0));
        assert!(window.candles().iter().all(|c| range.contains(c.timestamp)));
    }

    #[test]
    fn test_history_is_deterministic() {
        let exchange = PaperExchange::new(7).with_clock(clock());
        let market = normalize(Exchange::CoinbasePro, "BTC-GBP").unwrap();

        let a = exchange.historical_data(&market, hourly(), None).unwrap();
        let b = exchange.historical_data(&market, hourly(), None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_no_candles_before_listing() {
        let exchange = PaperExchange::new(7)
            .with_clock(clock())
            .listed_at(clock() - Duration::hours(10));
        let market = normalize(Exchange::CoinbasePro, "BTC-GBP").unwrap();

        let window = exchange.historical_data(&market, hourly(), None).unwrap();
        assert_eq!(window.len(), 10);
    }

    #[test]
    fn test_market_orders_move_balances() {
        let mut exchange = PaperExchange::new(1)
            .with_clock(clock())
            .with_balance("GBP", 1000.0);
        let market = normalize(Exchange::CoinbasePro, "BTC-GBP").unwrap();

        let buy = exchange.market_buy(&market, 500.0).unwrap();
        assert_eq!(buy.side, OrderSide::Buy);
        assert!((exchange.balance(market.quote()).unwrap() - 500.0).abs() < 1e-9);
        assert!((exchange.balance(market.base()).unwrap() - buy.filled).abs() < 1e-9);

        assert!(exchange.market_sell(&market, buy.filled * 2.0).is_err());
        let sell = exchange.market_sell(&market, buy.filled).unwrap();
        assert!((sell.value - 500.0).abs() < 1e-6);
    }
}
