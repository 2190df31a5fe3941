// Session Bootstrap Library
//
// Resolves a trading session from defaults, a JSON config file and CLI
// options, then loads history or checks balances before the decision loop.

pub mod clients;
pub mod config;
pub mod credentials;
pub mod error;       // Unified error handling
pub mod exchange;
pub mod granularity;
pub mod history;
pub mod indicators;
pub mod market;
pub mod preflight;   // Live balance checks
pub mod progress;
pub mod sampler;
pub mod startup;
pub mod trend;

// Re-export error types
pub use error::{BootstrapError, BootstrapResult};

// Re-export configuration
pub use config::{
    resolve, CliOptions, ConfigError, FileConfig, RunMode, SellGuards, SessionConfiguration,
    SessionDefaults, SimSpeed, TelegramConfig,
};

// Re-export exchange grammar
pub use credentials::{ApiCredentials, CredentialError};
pub use exchange::{Exchange, ExchangeRules, Notation, SymbolGrammar};
pub use granularity::{resolve_granularity, Granularity, GranularityError, Interval};
pub use market::{normalize, CurrencyCode, Market, MarketFormatError};

// Re-export client interfaces
pub use clients::{AccountClient, ClientError, MarketDataClient, PaperExchange, TradeClient};

// Re-export history and startup
pub use history::{Candle, HistoricalWindow, TimeRange};
pub use indicators::{IndicatorEngine, MovingAverage, MovingAverages};
pub use preflight::{LastAction, PreflightError, PreflightReport};
pub use progress::Spinner;
pub use sampler::{HistoricalSampler, SamplingError};
pub use startup::{bootstrap, Banner, LiveHandle, SessionStart, SimulationData, StartupSequencer};
pub use trend::{CrossoverPair, Trend, TrendClassifier, TrendError, TrendTimeframe};
