// Trend classification over moving-average crossovers
//
// One parametrized routine: fetch a window at a fixed timeframe, compute a
// fast and a slow average and compare their last values. Every failure maps
// to "not bullish".

use tracing::{debug, warn};

use crate::clients::{ClientError, MarketDataClient};
use crate::config::SessionConfiguration;
use crate::exchange::Exchange;
use crate::granularity::{Granularity, Interval};
use crate::indicators::{IndicatorEngine, IndicatorError, MovingAverage, MovingAverages};
use crate::market::Market;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrendTimeframe {
    OneHour,
    SixHours,
}

impl TrendTimeframe {
    pub fn interval(self) -> Interval {
        match self {
            TrendTimeframe::OneHour => Interval::OneHour,
            TrendTimeframe::SixHours => Interval::SixHours,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossoverPair {
    /// EMA12 over EMA26
    Ema12Over26,
    /// SMA50 over SMA200
    Sma50Over200,
}

impl CrossoverPair {
    pub fn fast(self) -> MovingAverage {
        match self {
            CrossoverPair::Ema12Over26 => MovingAverage::Exponential(12),
            CrossoverPair::Sma50Over200 => MovingAverage::Simple(50),
        }
    }

    pub fn slow(self) -> MovingAverage {
        match self {
            CrossoverPair::Ema12Over26 => MovingAverage::Exponential(26),
            CrossoverPair::Sma50Over200 => MovingAverage::Simple(200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrendError {
    #[error("Trend classification is not available on {0}")]
    Unsupported(Exchange),

    #[error("{fast}/{slow} crossover has no value over {available} candles")]
    InsufficientData {
        fast: MovingAverage,
        slow: MovingAverage,
        available: usize,
    },

    #[error("{0} produced a non-finite value")]
    NonFinite(MovingAverage),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Market data error: {0}")]
    MarketData(#[from] ClientError),
}

impl TrendError {
    /// Not enough (or unusable) data to say either way. Treated as bearish
    /// without a warning.
    pub fn is_indeterminate(&self) -> bool {
        matches!(
            self,
            TrendError::Unsupported(_)
                | TrendError::InsufficientData { .. }
                | TrendError::NonFinite(_)
                | TrendError::Indicator(IndicatorError::InsufficientData { .. })
        )
    }
}

pub struct TrendClassifier<'a, M: ?Sized, I = MovingAverages> {
    exchange: Exchange,
    market: &'a Market,
    client: &'a M,
    indicators: I,
}

impl<'a, M> TrendClassifier<'a, M, MovingAverages>
where
    M: MarketDataClient + ?Sized,
{
    pub fn new(config: &'a SessionConfiguration, client: &'a M) -> Self {
        Self {
            exchange: config.exchange(),
            market: config.market(),
            client,
            indicators: MovingAverages,
        }
    }
}

impl<'a, M, I> TrendClassifier<'a, M, I>
where
    M: MarketDataClient + ?Sized,
    I: IndicatorEngine,
{
    pub fn with_indicators<J: IndicatorEngine>(self, indicators: J) -> TrendClassifier<'a, M, J> {
        TrendClassifier {
            exchange: self.exchange,
            market: self.market,
            client: self.client,
            indicators,
        }
    }

    pub fn classify(&self, pair: CrossoverPair, timeframe: TrendTimeframe) -> Result<Trend, TrendError> {
        if self.exchange == Exchange::Dummy {
            return Err(TrendError::Unsupported(self.exchange));
        }

        let granularity = Granularity::new(self.exchange, timeframe.interval());
        let window = self.client.historical_data(self.market, granularity, None)?;
        let closes = window.closes().to_vec();

        let insufficient = || TrendError::InsufficientData {
            fast: pair.fast(),
            slow: pair.slow(),
            available: closes.len(),
        };
        if closes.is_empty() {
            return Err(insufficient());
        }

        let fast_series = self.indicators.series(&closes, pair.fast())?;
        let slow_series = self.indicators.series(&closes, pair.slow())?;
        let (Some(&fast), Some(&slow)) = (fast_series.last(), slow_series.last()) else {
            return Err(insufficient());
        };

        if !fast.is_finite() {
            return Err(TrendError::NonFinite(pair.fast()));
        }
        if !slow.is_finite() {
            return Err(TrendError::NonFinite(pair.slow()));
        }

        Ok(if fast > slow { Trend::Bullish } else { Trend::Bearish })
    }

    /// Never fails; any error reads as not bullish.
    pub fn is_bullish(&self, pair: CrossoverPair, timeframe: TrendTimeframe) -> bool {
        match self.classify(pair, timeframe) {
            Ok(trend) => trend == Trend::Bullish,
            Err(e) if e.is_indeterminate() => {
                debug!("Trend for {} indeterminate: {}", self.market, e);
                false
            }
            Err(e) => {
                warn!("⚠️  Trend classification for {} failed: {}", self.market, e);
                false
            }
        }
    }

    pub fn is_1h_ema1226_bull(&self) -> bool {
        self.is_bullish(CrossoverPair::Ema12Over26, TrendTimeframe::OneHour)
    }

    pub fn is_1h_sma50200_bull(&self) -> bool {
        self.is_bullish(CrossoverPair::Sma50Over200, TrendTimeframe::OneHour)
    }

    pub fn is_6h_ema1226_bull(&self) -> bool {
        self.is_bullish(CrossoverPair::Ema12Over26, TrendTimeframe::SixHours)
    }

    pub fn is_6h_sma50200_bull(&self) -> bool {
        self.is_bullish(CrossoverPair::Sma50Over200, TrendTimeframe::SixHours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::PriceSnapshot;
    use crate::config::{resolve, CliOptions, FileConfig, SessionDefaults};
    use crate::history::{Candle, HistoricalWindow, TimeRange};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::cell::RefCell;

    /// Serves the same closes for every request and remembers the widths asked for.
    struct FixedCloses {
        closes: Result<Vec<f64>, ClientError>,
        requested: RefCell<Vec<Interval>>,
    }

    impl FixedCloses {
        fn new(closes: Vec<f64>) -> Self {
            Self {
                closes: Ok(closes),
                requested: RefCell::new(Vec::new()),
            }
        }

        fn failing(err: ClientError) -> Self {
            Self {
                closes: Err(err),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl MarketDataClient for FixedCloses {
        fn historical_data(
            &self,
            market: &Market,
            granularity: Granularity,
            _range: Option<TimeRange>,
        ) -> Result<HistoricalWindow, ClientError> {
            self.requested.borrow_mut().push(granularity.interval());
            let closes = self.closes.clone()?;
            let candles = closes
                .iter()
                .enumerate()
                .map(|(i, &close)| Candle {
                    timestamp: Utc.timestamp_opt(i as i64 * 3600, 0).unwrap(),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1.0,
                })
                .collect();
            Ok(HistoricalWindow::new(market.display_pair(), granularity, candles))
        }

        fn ticker(&self, market: &Market) -> Result<PriceSnapshot, ClientError> {
            Err(ClientError::InvalidPair(market.to_string()))
        }
    }

    fn binance_session() -> SessionConfiguration {
        let file = FileConfig::from_value(json!({
            "binance": {
                "api_key": "a".repeat(64),
                "api_secret": "b".repeat(64),
                "api_url": "https://api.binance.com",
                "config": { "market": "BTCUSDT" }
            }
        }))
        .unwrap();
        resolve(&SessionDefaults::default(), &file, &CliOptions::default()).unwrap()
    }

    fn dummy_session() -> SessionConfiguration {
        let cli = CliOptions {
            exchange: Some("dummy".to_string()),
            ..Default::default()
        };
        resolve(&SessionDefaults::default(), &FileConfig::empty(), &cli).unwrap()
    }

    #[test]
    fn test_rising_market_is_bullish() {
        let session = binance_session();
        let client = FixedCloses::new((1..=300).map(f64::from).collect());
        let classifier = TrendClassifier::new(&session, &client);

        assert!(classifier.is_1h_ema1226_bull());
        assert!(classifier.is_6h_sma50200_bull());
        assert_eq!(
            *client.requested.borrow(),
            vec![Interval::OneHour, Interval::SixHours]
        );
    }

    #[test]
    fn test_falling_market_is_bearish() {
        let session = binance_session();
        let client = FixedCloses::new((1..=300).rev().map(f64::from).collect());
        let classifier = TrendClassifier::new(&session, &client);

        assert_eq!(
            classifier.classify(CrossoverPair::Sma50Over200, TrendTimeframe::OneHour),
            Ok(Trend::Bearish)
        );
        assert!(!classifier.is_6h_ema1226_bull());
    }

    #[test]
    fn test_empty_window_is_not_bullish() {
        let session = binance_session();
        let client = FixedCloses::new(Vec::new());
        let classifier = TrendClassifier::new(&session, &client);

        let err = classifier
            .classify(CrossoverPair::Ema12Over26, TrendTimeframe::OneHour)
            .unwrap_err();
        assert!(err.is_indeterminate());
        assert!(!classifier.is_1h_ema1226_bull());
    }

    #[test]
    fn test_short_window_for_sma200() {
        let session = binance_session();
        let client = FixedCloses::new((1..=150).map(f64::from).collect());
        let classifier = TrendClassifier::new(&session, &client);

        let err = classifier
            .classify(CrossoverPair::Sma50Over200, TrendTimeframe::OneHour)
            .unwrap_err();
        assert!(err.is_indeterminate());
        assert!(!classifier.is_1h_sma50200_bull());
        assert!(classifier.is_1h_ema1226_bull());
    }

    #[test]
    fn test_client_failure_is_not_indeterminate() {
        let session = binance_session();
        let client = FixedCloses::failing(ClientError::Http(503));
        let classifier = TrendClassifier::new(&session, &client);

        let err = classifier
            .classify(CrossoverPair::Ema12Over26, TrendTimeframe::SixHours)
            .unwrap_err();
        assert!(!err.is_indeterminate());
        assert!(!classifier.is_6h_ema1226_bull());
    }

    #[test]
    fn test_non_finite_closes() {
        let session = binance_session();
        let mut closes: Vec<f64> = (1..=300).map(f64::from).collect();
        closes[299] = f64::NAN;
        let client = FixedCloses::new(closes);
        let classifier = TrendClassifier::new(&session, &client);

        assert!(matches!(
            classifier.classify(CrossoverPair::Ema12Over26, TrendTimeframe::OneHour),
            Err(TrendError::NonFinite(_))
        ));
    }

    struct Flat;

    impl IndicatorEngine for Flat {
        fn series(&self, closes: &[f64], _average: MovingAverage) -> Result<Vec<f64>, IndicatorError> {
            Ok(vec![1.0; closes.len()])
        }
    }

    #[test]
    fn test_equal_averages_are_bearish() {
        let session = binance_session();
        let client = FixedCloses::new((1..=300).map(f64::from).collect());
        let classifier = TrendClassifier::new(&session, &client).with_indicators(Flat);

        assert_eq!(
            classifier.classify(CrossoverPair::Ema12Over26, TrendTimeframe::OneHour),
            Ok(Trend::Bearish)
        );
    }

    #[test]
    fn test_dummy_exchange_is_unsupported() {
        let session = dummy_session();
        let client = FixedCloses::new((1..=300).map(f64::from).collect());
        let classifier = TrendClassifier::new(&session, &client);

        assert_eq!(
            classifier.classify(CrossoverPair::Ema12Over26, TrendTimeframe::OneHour),
            Err(TrendError::Unsupported(Exchange::Dummy))
        );
        assert!(client.requested.borrow().is_empty());
    }
}
