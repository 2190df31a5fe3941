// Historical candle windows

use chrono::{DateTime, Utc};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::exchange::Notation;
use crate::granularity::Granularity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Ordered, immutable sequence of candles for one market and granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalWindow {
    market: String,
    granularity: Granularity,
    candles: Vec<Candle>,
}

impl HistoricalWindow {
    /// Candles are sorted chronologically on construction.
    pub fn new(market: impl Into<String>, granularity: Granularity, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|candle| candle.timestamp);
        Self {
            market: market.into(),
            granularity,
            candles,
        }
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.candles.first().map(|c| c.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.candles.last().map(|c| c.timestamp)
    }

    /// Close prices for vectorized indicator work.
    pub fn closes(&self) -> Array1<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }
}

/// Requested history range, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Range covering `count` candles of `granularity` that ends at `end`.
    pub fn ending_at(end: DateTime<Utc>, granularity: Granularity, count: usize) -> Self {
        let span = granularity.duration() * count as i32;
        Self { start: end - span, end }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    /// Start and end in the format the exchange's history endpoint expects:
    /// ISO-8601 for seconds notation, `%d %b, %Y` dates for label notation.
    pub fn render(&self, notation: Notation) -> (String, String) {
        match notation {
            Notation::Seconds => (
                self.start.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
                self.end.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            ),
            Notation::Label => (
                self.start.format("%d %b, %Y").to_string(),
                self.end.format("%d %b, %Y").to_string(),
            ),
        }
    }
}
