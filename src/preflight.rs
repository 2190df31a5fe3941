//! Pre-flight balance checks before live trading resumes
//!
//! Given the last order the account placed, the next order goes the other
//! way; the currency it spends must hold the exchange minimum.

use std::fmt;
use std::str::FromStr;
use tracing::{error, info};

use crate::clients::{AccountClient, ClientError};
use crate::config::{ConfigError, SessionConfiguration};
use crate::error::BootstrapResult;
use crate::market::CurrencyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastAction {
    Buy,
    Sell,
    #[default]
    None,
}

impl fmt::Display for LastAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastAction::Buy => f.write_str("BUY"),
            LastAction::Sell => f.write_str("SELL"),
            LastAction::None => f.write_str("none"),
        }
    }
}

impl FromStr for LastAction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(LastAction::Buy),
            "sell" => Ok(LastAction::Sell),
            "none" | "" => Ok(LastAction::None),
            _ => Err(ConfigError::InvalidField {
                field: "last_action".to_string(),
                reason: format!("expected buy or sell, got '{}'", s),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreflightError {
    #[error("Insufficient funds: required {required} {currency}, available {available} {currency}")]
    InsufficientBalance {
        currency: CurrencyCode,
        required: f64,
        available: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Critical, // Must pass for live trading to start
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shortfall {
    pub currency: CurrencyCode,
    pub required: f64,
    pub available: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreflightCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub level: ValidationLevel,
    pub shortfall: Option<Shortfall>,
}

impl PreflightCheck {
    fn info(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.into(),
            level: ValidationLevel::Info,
            shortfall: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreflightReport {
    pub passed: bool,
    pub checks: Vec<PreflightCheck>,
}

impl Default for PreflightReport {
    fn default() -> Self {
        Self::new()
    }
}

impl PreflightReport {
    pub fn new() -> Self {
        Self {
            passed: true,
            checks: Vec::new(),
        }
    }

    pub fn add_check(&mut self, check: PreflightCheck) {
        if !check.passed && check.level == ValidationLevel::Critical {
            self.passed = false;
        }
        self.checks.push(check);
    }

    pub fn critical_failures(&self) -> Vec<&PreflightCheck> {
        self.checks
            .iter()
            .filter(|c| !c.passed && c.level == ValidationLevel::Critical)
            .collect()
    }

    pub fn display(&self) {
        info!("🔍 Pre-flight Checks");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        for check in &self.checks {
            let icon = if check.passed {
                "✅"
            } else {
                match check.level {
                    ValidationLevel::Critical => "❌",
                    ValidationLevel::Info => "ℹ️",
                }
            };
            info!("{} {} - {}", icon, check.name, check.message);
        }

        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if !self.passed {
            let failures = self.critical_failures();
            error!("❌ Pre-flight failed: {} critical issue(s)", failures.len());
            for failure in failures {
                error!("   • {}: {}", failure.name, failure.message);
            }
        } else {
            info!("✅ All critical checks passed");
        }
    }

    /// The first critical shortfall, if any.
    pub fn into_result(self) -> Result<Self, PreflightError> {
        let shortfall = self
            .checks
            .iter()
            .filter(|c| !c.passed && c.level == ValidationLevel::Critical)
            .find_map(|c| c.shortfall.clone());

        match shortfall {
            Some(Shortfall { currency, required, available }) => Err(PreflightError::InsufficientBalance {
                currency,
                required,
                available,
            }),
            None => Ok(self),
        }
    }
}

/// Collect balance checks for the session. Only balance lookups can fail.
pub fn check_balances<A>(
    config: &SessionConfiguration,
    account: &A,
    last_action: LastAction,
) -> Result<PreflightReport, ClientError>
where
    A: AccountClient + ?Sized,
{
    let mut report = PreflightReport::new();

    if !config.is_live() {
        report.add_check(PreflightCheck::info("Mode", "test mode, balance check skipped"));
        return Ok(report);
    }

    let Some(minimums) = config.exchange().rules().minimums else {
        report.add_check(PreflightCheck::info(
            "Balance",
            format!("{} has no balance requirements", config.exchange()),
        ));
        return Ok(report);
    };

    let (currency, required) = match last_action {
        LastAction::Sell => (config.quote_currency(), minimums.quote_before_buy),
        LastAction::Buy => (config.base_currency(), minimums.base_before_sell),
        LastAction::None => {
            report.add_check(PreflightCheck::info("Balance", "no previous order, nothing to check"));
            return Ok(report);
        }
    };

    let available = account.balance(currency)?;
    let passed = available >= required;
    report.add_check(PreflightCheck {
        name: format!("{} balance", currency),
        passed,
        message: format!("{} available, {} required after last {}", available, required, last_action),
        level: ValidationLevel::Critical,
        shortfall: (!passed).then(|| Shortfall {
            currency: currency.clone(),
            required,
            available,
        }),
    });

    Ok(report)
}

/// Run the checks, log the report and block startup on any shortfall.
pub fn run_preflight<A>(
    config: &SessionConfiguration,
    account: &A,
    last_action: LastAction,
) -> BootstrapResult<PreflightReport>
where
    A: AccountClient + ?Sized,
{
    let report = check_balances(config, account, last_action)?;
    report.display();
    Ok(report.into_result()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::PaperExchange;
    use crate::config::{resolve, CliOptions, FileConfig, SessionDefaults};
    use crate::error::BootstrapError;
    use serde_json::json;

    fn coinbase_live() -> SessionConfiguration {
        let file = FileConfig::from_value(json!({
            "api_key": "0123456789abcdef0123456789abcdef",
            "api_secret": "c2VjcmV0LXNlY3JldA+/==",
            "api_passphrase": "abc123def4",
            "api_url": "https://api.pro.coinbase.com",
            "config": { "live": 1 }
        }))
        .unwrap();
        resolve(&SessionDefaults::default(), &file, &CliOptions::default()).unwrap()
    }

    #[test]
    fn test_last_action_parsing() {
        assert_eq!("BUY".parse::<LastAction>().unwrap(), LastAction::Buy);
        assert_eq!("sell".parse::<LastAction>().unwrap(), LastAction::Sell);
        assert!("hold".parse::<LastAction>().is_err());
    }

    #[test]
    fn test_quote_minimum_after_sell() {
        let session = coinbase_live();
        let account = PaperExchange::new(1).with_balance("GBP", 49.0);

        let err = run_preflight(&session, &account, LastAction::Sell).unwrap_err();
        match err {
            BootstrapError::Preflight(PreflightError::InsufficientBalance { currency, required, available }) => {
                assert_eq!(currency.as_str(), "GBP");
                assert_eq!(required, 50.0);
                assert_eq!(available, 49.0);
            }
            other => panic!("unexpected error: {}", other),
        }

        let account = PaperExchange::new(1).with_balance("GBP", 50.0);
        assert!(run_preflight(&session, &account, LastAction::Sell).unwrap().passed);
    }

    #[test]
    fn test_base_minimum_after_buy() {
        let session = coinbase_live();
        let account = PaperExchange::new(1).with_balance("GBP", 1000.0);
        let report = check_balances(&session, &account, LastAction::Buy).unwrap();
        assert!(!report.passed);
        assert_eq!(report.critical_failures().len(), 1);
        assert_eq!(report.critical_failures()[0].name, "BTC balance");
    }

    #[test]
    fn test_test_mode_skips_balances() {
        let cli = CliOptions {
            exchange: Some("dummy".to_string()),
            live: Some(1),
            ..Default::default()
        };
        let dummy = resolve(&SessionDefaults::default(), &FileConfig::empty(), &cli).unwrap();
        let report = check_balances(&dummy, &PaperExchange::new(1), LastAction::Sell).unwrap();
        assert!(report.passed);
        assert_eq!(report.checks[0].level, ValidationLevel::Info);
    }
}
