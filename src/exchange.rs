// Exchange capability table
//
// Every exchange-specific format (granularity notation, symbol grammar,
// credential grammar, API allow-list, preflight minimums) lives in one static
// `ExchangeRules` entry selected by the `Exchange` variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::credentials::{self, CredentialGrammar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    CoinbasePro,
    Binance,
    Dummy,
}

/// How an exchange writes candle widths on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notation {
    /// Integer seconds, e.g. `3600`
    Seconds,
    /// Interval label, e.g. `1h`
    Label,
}

/// How an exchange writes a market symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolGrammar {
    /// `BASE-QUOTE`
    Hyphenated,
    /// `BASEQUOTE`, quote inferred from a known suffix list
    Concatenated,
}

/// Minimum balances the live preflight check requires before trading resumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceMinimums {
    /// Quote currency needed when the next order is a buy (last action was a sell)
    pub quote_before_buy: f64,
    /// Base currency needed when the next order is a sell (last action was a buy)
    pub base_before_sell: f64,
}

#[derive(Debug)]
pub struct ExchangeRules {
    pub name: &'static str,
    pub notation: Notation,
    pub symbol: SymbolGrammar,
    pub credentials: Option<CredentialGrammar>,
    pub api_urls: &'static [&'static str],
    pub minimums: Option<BalanceMinimums>,
}

static COINBASE_PRO: ExchangeRules = ExchangeRules {
    name: "coinbasepro",
    notation: Notation::Seconds,
    symbol: SymbolGrammar::Hyphenated,
    credentials: Some(CredentialGrammar {
        key: credentials::is_coinbase_key,
        secret: credentials::is_coinbase_secret,
        passphrase: Some(credentials::is_coinbase_passphrase),
    }),
    api_urls: &["https://api.pro.coinbase.com/"],
    minimums: Some(BalanceMinimums {
        quote_before_buy: 50.0,
        base_before_sell: 0.001,
    }),
};

static BINANCE: ExchangeRules = ExchangeRules {
    name: "binance",
    notation: Notation::Label,
    symbol: SymbolGrammar::Concatenated,
    credentials: Some(CredentialGrammar {
        key: credentials::is_binance_key,
        secret: credentials::is_binance_key,
        passphrase: None,
    }),
    api_urls: &[
        "https://api.binance.com/",
        "https://testnet.binance.vision/api/",
    ],
    minimums: Some(BalanceMinimums {
        quote_before_buy: 0.001,
        base_before_sell: 0.001,
    }),
};

static DUMMY: ExchangeRules = ExchangeRules {
    name: "dummy",
    notation: Notation::Seconds,
    symbol: SymbolGrammar::Hyphenated,
    credentials: None,
    api_urls: &[],
    minimums: None,
};

impl Exchange {
    pub const ALL: [Exchange; 3] = [Exchange::CoinbasePro, Exchange::Binance, Exchange::Dummy];

    pub fn rules(self) -> &'static ExchangeRules {
        match self {
            Exchange::CoinbasePro => &COINBASE_PRO,
            Exchange::Binance => &BINANCE,
            Exchange::Dummy => &DUMMY,
        }
    }

    pub fn name(self) -> &'static str {
        self.rules().name
    }

    pub fn notation(self) -> Notation {
        self.rules().notation
    }

    pub fn symbol_grammar(self) -> SymbolGrammar {
        self.rules().symbol
    }

    /// Whether the exchange needs an API credential block at all.
    pub fn requires_credentials(self) -> bool {
        self.rules().credentials.is_some()
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Exchange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Exchange::ALL
            .into_iter()
            .find(|exchange| exchange.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownExchange(s.to_string()))
    }
}
