//! Unified error type for session bootstrap
//!
//! Each component keeps its own `thiserror` enum; `BootstrapError` wraps them
//! so callers can propagate with `?` and still print actionable hints.

use std::fmt;

use crate::clients::ClientError;
use crate::config::ConfigError;
use crate::credentials::CredentialError;
use crate::granularity::GranularityError;
use crate::market::MarketFormatError;
use crate::preflight::PreflightError;
use crate::sampler::SamplingError;

/// Main error type for configuration and startup
#[derive(Debug)]
pub enum BootstrapError {
    Config(ConfigError),
    Credential(CredentialError),
    MarketFormat(MarketFormatError),
    Granularity(GranularityError),
    Sampling(SamplingError),
    Preflight(PreflightError),
    Client(ClientError),
}

impl BootstrapError {
    /// Get a user-friendly error message with helpful context
    pub fn user_message(&self) -> String {
        match self {
            BootstrapError::Config(ConfigError::MissingCredentials(exchange)) => {
                format!(
                    "{}\n\n\
                    💡 Add a \"{}\" block to config.json with:\n\
                    - api_key\n\
                    - api_secret\n\
                    - api_url",
                    self, exchange
                )
            }
            BootstrapError::Config(ConfigError::UnknownExchange(_)) => {
                format!(
                    "{}\n\n\
                    💡 Pass --exchange coinbasepro, binance or dummy",
                    self
                )
            }
            BootstrapError::Credential(CredentialError::InvalidUrl { exchange, .. }) => {
                let allowed = exchange.rules().api_urls.join(", ");
                format!(
                    "{}\n\n\
                    💡 Allowed endpoints: {}",
                    self, allowed
                )
            }
            BootstrapError::Credential(_) => {
                format!(
                    "{}\n\n\
                    💡 Check config.json for:\n\
                    - Keys copied without surrounding whitespace\n\
                    - Keys from the same exchange as --exchange",
                    self
                )
            }
            BootstrapError::MarketFormat(_) => {
                format!(
                    "{}\n\n\
                    💡 Examples: --market BTC-GBP (coinbasepro), --market BTCUSDT (binance)",
                    self
                )
            }
            BootstrapError::Preflight(PreflightError::InsufficientBalance { currency, required, available }) => {
                format!(
                    "Insufficient funds!\n\
                    Required: {} {}\n\
                    Available: {} {}\n\n\
                    💡 Either:\n\
                    - Top up the {} balance\n\
                    - Pass --last-action to match your open position\n\
                    - Run with --sim to test without funds",
                    required, currency, available, currency, currency
                )
            }
            BootstrapError::Client(ClientError::RateLimited) => {
                format!(
                    "{}\n\n\
                    💡 Please wait before retrying",
                    self
                )
            }
            _ => self.to_string(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            BootstrapError::Config(_) => "config",
            BootstrapError::Credential(_) => "credentials",
            BootstrapError::MarketFormat(_) => "market",
            BootstrapError::Granularity(_) => "granularity",
            BootstrapError::Sampling(_) => "sampling",
            BootstrapError::Preflight(_) => "balance",
            BootstrapError::Client(_) => "api",
        }
    }
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::Config(err) => write!(f, "Configuration error: {}", err),
            BootstrapError::Credential(err) => write!(f, "Credential error: {}", err),
            BootstrapError::MarketFormat(err) => write!(f, "{}", err),
            BootstrapError::Granularity(err) => write!(f, "{}", err),
            BootstrapError::Sampling(err) => write!(f, "{}", err),
            BootstrapError::Preflight(err) => write!(f, "{}", err),
            BootstrapError::Client(err) => write!(f, "Exchange error: {}", err),
        }
    }
}

impl std::error::Error for BootstrapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BootstrapError::Config(err) => Some(err),
            BootstrapError::Credential(err) => Some(err),
            BootstrapError::MarketFormat(err) => Some(err),
            BootstrapError::Granularity(err) => Some(err),
            BootstrapError::Sampling(err) => Some(err),
            BootstrapError::Preflight(err) => Some(err),
            BootstrapError::Client(err) => Some(err),
        }
    }
}

impl From<ConfigError> for BootstrapError {
    fn from(err: ConfigError) -> Self {
        BootstrapError::Config(err)
    }
}

impl From<CredentialError> for BootstrapError {
    fn from(err: CredentialError) -> Self {
        BootstrapError::Credential(err)
    }
}

impl From<MarketFormatError> for BootstrapError {
    fn from(err: MarketFormatError) -> Self {
        BootstrapError::MarketFormat(err)
    }
}

impl From<GranularityError> for BootstrapError {
    fn from(err: GranularityError) -> Self {
        BootstrapError::Granularity(err)
    }
}

impl From<SamplingError> for BootstrapError {
    fn from(err: SamplingError) -> Self {
        BootstrapError::Sampling(err)
    }
}

impl From<PreflightError> for BootstrapError {
    fn from(err: PreflightError) -> Self {
        BootstrapError::Preflight(err)
    }
}

impl From<ClientError> for BootstrapError {
    fn from(err: ClientError) -> Self {
        BootstrapError::Client(err)
    }
}

/// Result type alias using BootstrapError
pub type BootstrapResult<T> = Result<T, BootstrapError>;
