// Market identifier normalization
//
// Coinbase Pro writes markets as `BASE-QUOTE`; Binance concatenates the two
// tickers and the quote currency has to be inferred from a suffix list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::exchange::{Exchange, SymbolGrammar};

/// Quote currencies recognised at the end of a concatenated symbol, tried in
/// this order; the first match wins. The order is inherited and kept as is:
/// overlapping endings mean a symbol can decompose differently than a human
/// would read it, so callers must not assume the split is unique.
pub const QUOTE_SUFFIXES: &[&str] = &[
    "BTC", "BNB", "ETH", "USDT", "TUSD", "BUSD", "DAX", "NGN", "RUB", "TRY", "EUR", "GBP", "ZAR",
    "UAH", "DAI", "BIDR", "AUD", "US", "NGN", "BRL", "BVND", "VAI",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketFormatError {
    #[error("Invalid currency code '{0}': expected 3-5 uppercase letters")]
    InvalidCurrency(String),

    #[error("Invalid {exchange} market '{symbol}': expected BASE-QUOTE with 3-5 uppercase letters each")]
    Hyphenated { exchange: Exchange, symbol: String },

    #[error("Invalid {exchange} market '{symbol}': expected 6-12 uppercase letters")]
    Concatenated { exchange: Exchange, symbol: String },

    #[error("Binance market error: '{symbol}' does not split into base and quote")]
    Decomposition { symbol: String },
}

/// 3-5 uppercase ASCII letters. Only constructed through `parse`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(raw: &str) -> Result<Self, MarketFormatError> {
        if (3..=5).contains(&raw.len()) && raw.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(MarketFormatError::InvalidCurrency(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for CurrencyCode {
    type Err = MarketFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = MarketFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated market: `display_pair` is the exchange's own spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Market {
    base: CurrencyCode,
    quote: CurrencyCode,
    display_pair: String,
}

impl Market {
    /// Build the exchange spelling from two validated currencies.
    pub fn from_parts(exchange: Exchange, base: CurrencyCode, quote: CurrencyCode) -> Self {
        let display_pair = match exchange.symbol_grammar() {
            SymbolGrammar::Hyphenated => format!("{}-{}", base, quote),
            SymbolGrammar::Concatenated => format!("{}{}", base, quote),
        };
        Self {
            base,
            quote,
            display_pair,
        }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn quote(&self) -> &CurrencyCode {
        &self.quote
    }

    pub fn display_pair(&self) -> &str {
        &self.display_pair
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_pair)
    }
}

/// Parse a raw symbol with the exchange's grammar.
pub fn normalize(exchange: Exchange, raw: &str) -> Result<Market, MarketFormatError> {
    match exchange.symbol_grammar() {
        SymbolGrammar::Hyphenated => {
            let (base, quote) = split_hyphenated(raw).ok_or_else(|| MarketFormatError::Hyphenated {
                exchange,
                symbol: raw.to_string(),
            })?;
            Ok(Market::from_parts(exchange, base, quote))
        }
        SymbolGrammar::Concatenated => {
            let (base, quote) = decompose_concatenated(raw)?;
            Ok(Market {
                base,
                quote,
                display_pair: raw.to_string(),
            })
        }
    }
}

fn split_hyphenated(raw: &str) -> Option<(CurrencyCode, CurrencyCode)> {
    let (base, quote) = raw.split_once('-')?;
    Some((CurrencyCode::parse(base).ok()?, CurrencyCode::parse(quote).ok()?))
}

/// Split a concatenated symbol using `QUOTE_SUFFIXES`.
///
/// The base is what remains after removing every occurrence of the matched
/// quote, so a symbol that repeats its quote ticker fails the length check
/// instead of producing a truncated base.
pub fn decompose_concatenated(symbol: &str) -> Result<(CurrencyCode, CurrencyCode), MarketFormatError> {
    if !(6..=12).contains(&symbol.len()) || !symbol.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(MarketFormatError::Concatenated {
            exchange: Exchange::Binance,
            symbol: symbol.to_string(),
        });
    }

    let decomposition_error = || MarketFormatError::Decomposition {
        symbol: symbol.to_string(),
    };

    let quote = QUOTE_SUFFIXES
        .iter()
        .copied()
        .find(|suffix| symbol.ends_with(suffix))
        .ok_or_else(decomposition_error)?;
    let base = symbol.replace(quote, "");

    if base.len() + quote.len() != symbol.len() {
        return Err(decomposition_error());
    }

    let base = CurrencyCode::parse(&base).map_err(|_| decomposition_error())?;
    let quote = CurrencyCode::parse(quote).map_err(|_| decomposition_error())?;
    Ok((base, quote))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    #[test]
    fn test_currency_code_bounds() {
        assert!(CurrencyCode::parse("BTC").is_ok());
        assert!(CurrencyCode::parse("USDT").is_ok());
        assert!(CurrencyCode::parse("MATIC").is_ok());
        assert!(CurrencyCode::parse("US").is_err());
        assert!(CurrencyCode::parse("ALPACA").is_err());
        assert!(CurrencyCode::parse("btc").is_err());
        assert!(CurrencyCode::parse("BT1").is_err());
    }

    #[test]
    fn test_currency_code_serde_validates() {
        let parsed: CurrencyCode = serde_json::from_str("\"ETH\"").unwrap();
        assert_eq!(parsed.as_str(), "ETH");
        assert!(serde_json::from_str::<CurrencyCode>("\"eth\"").is_err());
    }

    #[test]
    fn test_hyphenated_market() {
        let market = normalize(Exchange::CoinbasePro, "BTC-GBP").unwrap();
        assert_eq!(market.base().as_str(), "BTC");
        assert_eq!(market.quote().as_str(), "GBP");
        assert_eq!(market.display_pair(), "BTC-GBP");

        assert!(normalize(Exchange::CoinbasePro, "BTCGBP").is_err());
        assert!(normalize(Exchange::CoinbasePro, "BTC-GB").is_err());
        assert!(normalize(Exchange::CoinbasePro, "BTC-GBP-EUR").is_err());
        assert!(normalize(Exchange::Dummy, "ETH-EUR").is_ok());
    }

    #[test]
    fn test_concatenated_market() {
        let market = normalize(Exchange::Binance, "BTCUSDT").unwrap();
        assert_eq!(market.base(), &code("BTC"));
        assert_eq!(market.quote(), &code("USDT"));
        assert_eq!(market.display_pair(), "BTCUSDT");

        let market = normalize(Exchange::Binance, "BNBBTC").unwrap();
        assert_eq!(market.base(), &code("BNB"));
        assert_eq!(market.quote(), &code("BTC"));
    }

    #[test]
    fn test_hyphenated_round_trip_all_lengths() {
        let parts = ["ETH", "USDT", "MATIC"];
        for base in parts {
            for quote in parts {
                let raw = format!("{}-{}", base, quote);
                let market = normalize(Exchange::CoinbasePro, &raw).unwrap();

                assert_eq!(market.base().as_str(), base);
                assert_eq!(market.quote().as_str(), quote);
                assert_eq!(market.display_pair(), raw);
                assert_eq!(normalize(Exchange::CoinbasePro, market.display_pair()).unwrap(), market);
            }
        }
    }

    #[test]
    fn test_concatenated_split_for_every_suffix() {
        // Letters that appear in no suffix, so the base never hides a quote
        let bases = ["FJK", "FJKM", "FJKMO"];
        let mut checked = 0;

        for base in bases {
            for (i, quote) in QUOTE_SUFFIXES.iter().enumerate() {
                if !(3..=5).contains(&quote.len()) {
                    continue;
                }
                let symbol = format!("{}{}", base, quote);
                if !(6..=12).contains(&symbol.len())
                    || QUOTE_SUFFIXES[..i].iter().any(|earlier| symbol.ends_with(earlier))
                {
                    continue;
                }

                let (b, q) = decompose_concatenated(&symbol).unwrap();
                assert_eq!((b.as_str(), q.as_str()), (base, *quote), "split of {}", symbol);
                assert_eq!(b.len() + q.len(), symbol.len());

                let market = normalize(Exchange::Binance, &symbol).unwrap();
                assert_eq!(market.display_pair(), symbol);
                checked += 1;
            }
        }

        // 20 distinct 3-5 letter suffixes against three bases
        assert_eq!(checked, 60);
    }

    #[test]
    fn test_first_suffix_wins() {
        // ETH and USDT are tried before TUSD and neither is a suffix here.
        let (base, quote) = decompose_concatenated("ETHTUSD").unwrap();
        assert_eq!((base.as_str(), quote.as_str()), ("ETH", "TUSD"));
    }

    #[test]
    fn test_repeated_quote_is_rejected() {
        assert!(matches!(
            decompose_concatenated("BTCBTC"),
            Err(MarketFormatError::Decomposition { .. })
        ));
    }

    #[test]
    fn test_unknown_quote_is_rejected() {
        assert!(matches!(
            decompose_concatenated("BTCUSD"),
            Err(MarketFormatError::Decomposition { .. })
        ));
        assert!(matches!(
            decompose_concatenated("BTC-USDT"),
            Err(MarketFormatError::Concatenated { .. })
        ));
        assert!(decompose_concatenated("ETHBT").is_err());
    }

    #[test]
    fn test_from_parts_uses_exchange_spelling() {
        assert_eq!(
            Market::from_parts(Exchange::Binance, code("ETH"), code("GBP")).display_pair(),
            "ETHGBP"
        );
        assert_eq!(
            Market::from_parts(Exchange::CoinbasePro, code("ETH"), code("GBP")).display_pair(),
            "ETH-GBP"
        );
    }
}
