// Random-window historical sampling for sample simulations

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::clients::{ClientError, MarketDataClient};
use crate::granularity::Granularity;
use crate::history::{HistoricalWindow, TimeRange};
use crate::market::Market;

/// Candles in every sampled window.
pub const SAMPLE_CANDLES: usize = 300;

pub const MAX_SAMPLE_ATTEMPTS: usize = 10;

/// Sample windows end somewhere in the last three years.
pub const SAMPLE_LOOKBACK_HOURS: i64 = 3 * 8760;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    #[error("Unable to retrieve 300 random candles between {start} and {end} in {attempts} attempts")]
    Exhausted {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        attempts: usize,
        last_error: Option<ClientError>,
    },
}

/// A window drawn by the sampler together with the range it was asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledWindow {
    pub window: HistoricalWindow,
    pub range: TimeRange,
    pub attempts: usize,
}

pub struct HistoricalSampler<'a, M: ?Sized, R> {
    client: &'a M,
    rng: R,
}

impl<'a, M, R> HistoricalSampler<'a, M, R>
where
    M: MarketDataClient + ?Sized,
    R: Rng,
{
    pub fn new(client: &'a M, rng: R) -> Self {
        Self { client, rng }
    }

    pub fn sample(&mut self, market: &Market, granularity: Granularity) -> Result<SampledWindow, SamplingError> {
        self.sample_at(Utc::now(), market, granularity)
    }

    /// Draw up to `MAX_SAMPLE_ATTEMPTS` random ranges ending before `now`
    /// until one comes back with exactly `SAMPLE_CANDLES` candles. A failed
    /// fetch counts as a spent attempt.
    pub fn sample_at(
        &mut self,
        now: DateTime<Utc>,
        market: &Market,
        granularity: Granularity,
    ) -> Result<SampledWindow, SamplingError> {
        let mut range = TimeRange::ending_at(now, granularity, SAMPLE_CANDLES);
        let mut last_error = None;

        for attempt in 1..=MAX_SAMPLE_ATTEMPTS {
            let offset = self.rng.gen_range(0..=SAMPLE_LOOKBACK_HOURS);
            range = TimeRange::ending_at(now - Duration::hours(offset), granularity, SAMPLE_CANDLES);

            match self.client.historical_data(market, granularity, Some(range)) {
                Ok(window) if window.len() == SAMPLE_CANDLES => {
                    info!(
                        "🎲 Sampled {} candles of {} from {} to {} (attempt {})",
                        SAMPLE_CANDLES, market, range.start, range.end, attempt
                    );
                    return Ok(SampledWindow {
                        window,
                        range,
                        attempts: attempt,
                    });
                }
                Ok(window) => {
                    debug!(
                        "Sample attempt {} for {}: {} candles between {} and {}",
                        attempt,
                        market,
                        window.len(),
                        range.start,
                        range.end
                    );
                }
                Err(e) => {
                    warn!("Sample attempt {} for {} failed: {}", attempt, market, e);
                    last_error = Some(e);
                }
            }
        }

        Err(SamplingError::Exhausted {
            start: range.start,
            end: range.end,
            attempts: MAX_SAMPLE_ATTEMPTS,
            last_error,
        })
    }
}

/// Everything the exchange serves for this granularity, no sampling.
pub fn full_history<M>(client: &M, market: &Market, granularity: Granularity) -> Result<HistoricalWindow, ClientError>
where
    M: MarketDataClient + ?Sized,
{
    let window = client.historical_data(market, granularity, None)?;
    debug!("Fetched {} candles of full history for {}", window.len(), market);
    Ok(window)
}
