// Startup sequencing
//
// Simulation sessions get their historical window here; live and test
// sessions pass the balance preflight and get a handle for the polling loop.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::clients::{AccountClient, MarketDataClient};
use crate::config::SessionConfiguration;
use crate::error::{BootstrapError, BootstrapResult};
use crate::exchange::Notation;
use crate::granularity::Granularity;
use crate::history::{HistoricalWindow, TimeRange};
use crate::market::Market;
use crate::preflight::{self, LastAction, PreflightReport};
use crate::progress::Spinner;
use crate::sampler::{self, HistoricalSampler};

/// Label/value rows printed when a session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    rows: Vec<(&'static str, String)>,
}

impl Banner {
    pub fn new(config: &SessionConfiguration, started_at: DateTime<Utc>) -> Self {
        let mut rows = Vec::new();

        if config.is_verbose() {
            rows.push(("Market", config.market().to_string()));
            let granularity = config.granularity();
            let rendered = match granularity.notation() {
                Notation::Seconds => format!("{} seconds", granularity),
                Notation::Label => granularity.to_string(),
            };
            rows.push(("Granularity", rendered));
        }

        let mode = if config.is_live() {
            "LIVE - live trades using your funds!"
        } else {
            "TEST - test trades using dummy funds :)"
        };
        rows.push(("Bot Mode", mode.to_string()));
        rows.push(("Bot Started", started_at.format("%Y-%m-%d %H:%M:%S").to_string()));

        let guards = config.sell_guards();
        if let Some(upper) = guards.sell_upper_pct() {
            rows.push(("Sell Upper", format!("{}%", upper)));
        }
        if let Some(lower) = guards.sell_lower_pct() {
            rows.push(("Sell Lower", format!("{}%", lower)));
        }
        if !guards.allow_sell_at_loss() {
            rows.push(("Sell At Loss", "0".to_string()));
        }
        if config.smart_switch() {
            rows.push(("Smart Switch", "1".to_string()));
        }

        Self { rows }
    }

    pub fn with_sample_range(mut self, range: &TimeRange, notation: Notation) -> Self {
        let (start, end) = range.render(notation);
        self.rows.push(("Sampling start", start));
        self.rows.push(("Sampling end", end));
        self
    }

    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn display(&self) {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for (label, value) in &self.rows {
            info!("{:>16} : {}", label, value);
        }
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationData {
    pub window: HistoricalWindow,
    /// Set when a random window was sampled
    pub sample_range: Option<TimeRange>,
}

/// What the polling loop needs to start trading (or paper trading).
#[derive(Debug, Clone, PartialEq)]
pub struct LiveHandle {
    pub market: Market,
    pub granularity: Granularity,
    pub started_at: DateTime<Utc>,
    pub is_live: bool,
    pub preflight: PreflightReport,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionStart {
    Simulation(SimulationData),
    Live(LiveHandle),
}

pub struct StartupSequencer<'a, C: ?Sized, R = StdRng> {
    config: &'a SessionConfiguration,
    client: &'a C,
    rng: R,
    clock: Option<DateTime<Utc>>,
    show_progress: bool,
}

impl<'a, C> StartupSequencer<'a, C, StdRng>
where
    C: MarketDataClient + AccountClient + ?Sized,
{
    pub fn new(config: &'a SessionConfiguration, client: &'a C) -> Self {
        Self {
            config,
            client,
            rng: StdRng::from_entropy(),
            clock: None,
            show_progress: false,
        }
    }
}

impl<'a, C, R> StartupSequencer<'a, C, R>
where
    C: MarketDataClient + AccountClient + ?Sized,
    R: Rng,
{
    pub fn with_rng<S: Rng>(self, rng: S) -> StartupSequencer<'a, C, S> {
        StartupSequencer {
            config: self.config,
            client: self.client,
            rng,
            clock: self.clock,
            show_progress: self.show_progress,
        }
    }

    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn spinner(&self, message: &str) -> Spinner {
        if self.show_progress {
            Spinner::new(message)
        } else {
            Spinner::hidden()
        }
    }

    /// Simulation sessions return their window; everything else passes the
    /// balance preflight (live only) and returns a handle.
    pub fn bootstrap(&mut self, last_action: LastAction) -> BootstrapResult<SessionStart> {
        let config = self.config;
        let started_at = self.clock.unwrap_or_else(Utc::now);

        if config.is_simulation() {
            let data = self.load_simulation(started_at)?;
            let mut banner = Banner::new(config, started_at);
            if let Some(range) = &data.sample_range {
                banner = banner.with_sample_range(range, config.granularity().notation());
            }
            banner.display();
            return Ok(SessionStart::Simulation(data));
        }

        let spinner = self.spinner("Checking balances");
        let report = match preflight::run_preflight(config, self.client, last_action) {
            Ok(report) => {
                spinner.finish("Balances checked");
                report
            }
            Err(e) => {
                spinner.finish_with_error(&e.to_string());
                return Err(e);
            }
        };

        Banner::new(config, started_at).display();
        Ok(SessionStart::Live(LiveHandle {
            market: config.market().clone(),
            granularity: config.granularity(),
            started_at,
            is_live: config.is_live(),
            preflight: report,
        }))
    }

    fn load_simulation(&mut self, now: DateTime<Utc>) -> BootstrapResult<SimulationData> {
        let config = self.config;
        let market = config.market();
        let granularity = config.granularity();
        let spinner = self.spinner(&format!("Fetching {} history", market));

        let result = if config.sim_speed().is_sample() {
            HistoricalSampler::new(self.client, &mut self.rng)
                .sample_at(now, market, granularity)
                .map(|sampled| SimulationData {
                    window: sampled.window,
                    sample_range: Some(sampled.range),
                })
                .map_err(BootstrapError::from)
        } else {
            sampler::full_history(self.client, market, granularity)
                .map(|window| SimulationData {
                    window,
                    sample_range: None,
                })
                .map_err(BootstrapError::from)
        };

        match &result {
            Ok(data) => spinner.finish(&format!("Loaded {} candles", data.window.len())),
            Err(e) => spinner.finish_with_error(&e.to_string()),
        }
        result
    }
}

/// Bootstrap with a fresh random source and the system clock.
pub fn bootstrap<C>(config: &SessionConfiguration, client: &C, last_action: LastAction) -> BootstrapResult<SessionStart>
where
    C: MarketDataClient + AccountClient + ?Sized,
{
    StartupSequencer::new(config, client).bootstrap(last_action)
}
