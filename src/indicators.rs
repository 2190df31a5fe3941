// Moving-average indicator engine

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovingAverage {
    Simple(usize),
    Exponential(usize),
}

impl MovingAverage {
    pub fn period(self) -> usize {
        match self {
            MovingAverage::Simple(p) | MovingAverage::Exponential(p) => p,
        }
    }
}

impl fmt::Display for MovingAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovingAverage::Simple(p) => write!(f, "sma{}", p),
            MovingAverage::Exponential(p) => write!(f, "ema{}", p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndicatorError {
    #[error("{indicator} needs {needed} closes, got {available}")]
    InsufficientData {
        indicator: MovingAverage,
        needed: usize,
        available: usize,
    },

    #[error("{0} has a zero period")]
    ZeroPeriod(MovingAverage),
}

/// Computes a derived series over close prices.
pub trait IndicatorEngine {
    fn series(&self, closes: &[f64], average: MovingAverage) -> Result<Vec<f64>, IndicatorError>;
}

/// Plain SMA/EMA arithmetic.
///
/// SMA yields one value per full window (`len - period + 1` values). EMA is
/// seeded with the first close and yields one value per close.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovingAverages;

impl MovingAverages {
    fn sma(closes: &[f64], period: usize) -> Vec<f64> {
        closes
            .windows(period)
            .map(|window| window.iter().sum::<f64>() / period as f64)
            .collect()
    }

    fn ema(closes: &[f64], period: usize) -> Vec<f64> {
        let alpha = 2.0 / (period as f64 + 1.0);
        let mut series = Vec::with_capacity(closes.len());
        let mut ema = closes[0];

        for &price in closes {
            ema = alpha * price + (1.0 - alpha) * ema;
            series.push(ema);
        }

        series
    }
}

impl IndicatorEngine for MovingAverages {
    fn series(&self, closes: &[f64], average: MovingAverage) -> Result<Vec<f64>, IndicatorError> {
        let period = average.period();
        if period == 0 {
            return Err(IndicatorError::ZeroPeriod(average));
        }

        let needed = match average {
            MovingAverage::Simple(p) => p,
            MovingAverage::Exponential(_) => 1,
        };
        if closes.len() < needed {
            return Err(IndicatorError::InsufficientData {
                indicator: average,
                needed,
                available: closes.len(),
            });
        }

        Ok(match average {
            MovingAverage::Simple(p) => Self::sma(closes, p),
            MovingAverage::Exponential(p) => Self::ema(closes, p),
        })
    }
}
