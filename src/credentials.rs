// Credential & endpoint validation
//
// Pure format checks against each exchange's grammar. No network calls.

use std::fmt;

use crate::exchange::Exchange;

/// Character-class predicates for one exchange's credentials.
#[derive(Debug, Clone, Copy)]
pub struct CredentialGrammar {
    pub key: fn(&str) -> bool,
    pub secret: fn(&str) -> bool,
    pub passphrase: Option<fn(&str) -> bool>,
}

/// 32 lowercase hex characters.
pub fn is_coinbase_key(key: &str) -> bool {
    key.len() == 32 && key.bytes().all(|b| matches!(b, b'a'..=b'f' | b'0'..=b'9'))
}

/// Base64 body terminated by `==` padding.
pub fn is_coinbase_secret(secret: &str) -> bool {
    match secret.strip_suffix("==") {
        Some(body) => {
            !body.is_empty()
                && body
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
        }
        None => false,
    }
}

/// 10 or 11 lowercase alphanumerics.
pub fn is_coinbase_passphrase(passphrase: &str) -> bool {
    (10..=11).contains(&passphrase.len())
        && passphrase
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// 64 alphanumerics, used for both key and secret.
pub fn is_binance_key(key: &str) -> bool {
    key.len() == 64 && key.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub api_passphrase: Option<String>,
    pub api_url: String,
}

// Secrets stay out of logs.
impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &"***")
            .field("api_passphrase", &self.api_passphrase.as_ref().map(|_| "***"))
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn redact(value: &str) -> String {
    match value.get(..4) {
        Some(prefix) if value.len() > 8 => format!("{}…", prefix),
        _ => "***".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("{0} API key is invalid")]
    InvalidKey(Exchange),

    #[error("{0} API secret is invalid")]
    InvalidSecret(Exchange),

    #[error("{0} API passphrase is invalid")]
    InvalidPassphrase(Exchange),

    #[error("{exchange} API URL is invalid: {url}")]
    InvalidUrl { exchange: Exchange, url: String },
}

/// Check credentials against the exchange grammar and return them with the
/// base URL normalized to end in `/`.
pub fn validate(exchange: Exchange, credentials: &ApiCredentials) -> Result<ApiCredentials, CredentialError> {
    let rules = exchange.rules();
    let mut normalized = credentials.clone();

    if !normalized.api_url.is_empty() && !normalized.api_url.ends_with('/') {
        normalized.api_url.push('/');
    }

    let Some(grammar) = rules.credentials else {
        return Ok(normalized);
    };

    if !rules.api_urls.contains(&normalized.api_url.as_str()) {
        return Err(CredentialError::InvalidUrl {
            exchange,
            url: normalized.api_url,
        });
    }

    if !(grammar.key)(&normalized.api_key) {
        return Err(CredentialError::InvalidKey(exchange));
    }

    if !(grammar.secret)(&normalized.api_secret) {
        return Err(CredentialError::InvalidSecret(exchange));
    }

    match grammar.passphrase {
        Some(check) => {
            let valid = normalized.api_passphrase.as_deref().map(check).unwrap_or(false);
            if !valid {
                return Err(CredentialError::InvalidPassphrase(exchange));
            }
        }
        None => normalized.api_passphrase = None,
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coinbase() -> ApiCredentials {
        ApiCredentials {
            api_key: "0123456789abcdef0123456789abcdef".to_string(),
            api_secret: "c2VjcmV0LXNlY3JldC1zZWNyZXQ+/w==".to_string(),
            api_passphrase: Some("abc123def4".to_string()),
            api_url: "https://api.pro.coinbase.com".to_string(),
        }
    }

    fn binance() -> ApiCredentials {
        ApiCredentials {
            api_key: "A".repeat(64),
            api_secret: "b1".repeat(32),
            api_passphrase: None,
            api_url: "https://testnet.binance.vision/api".to_string(),
        }
    }

    #[test]
    fn test_valid_coinbase_credentials_normalize_url() {
        let validated = validate(Exchange::CoinbasePro, &coinbase()).unwrap();
        assert_eq!(validated.api_url, "https://api.pro.coinbase.com/");
    }

    #[test]
    fn test_coinbase_grammar() {
        let mut creds = coinbase();
        creds.api_key = "0123456789ABCDEF0123456789ABCDEF".to_string();
        assert_eq!(
            validate(Exchange::CoinbasePro, &creds),
            Err(CredentialError::InvalidKey(Exchange::CoinbasePro))
        );

        let mut creds = coinbase();
        creds.api_secret = "c2VjcmV0".to_string();
        assert_eq!(
            validate(Exchange::CoinbasePro, &creds),
            Err(CredentialError::InvalidSecret(Exchange::CoinbasePro))
        );

        let mut creds = coinbase();
        creds.api_passphrase = Some("Abc123def4".to_string());
        assert_eq!(
            validate(Exchange::CoinbasePro, &creds),
            Err(CredentialError::InvalidPassphrase(Exchange::CoinbasePro))
        );

        let mut creds = coinbase();
        creds.api_passphrase = None;
        assert!(validate(Exchange::CoinbasePro, &creds).is_err());
    }

    #[test]
    fn test_url_allow_list() {
        let mut creds = coinbase();
        creds.api_url = "https://api-public.sandbox.pro.coinbase.com".to_string();
        assert!(matches!(
            validate(Exchange::CoinbasePro, &creds),
            Err(CredentialError::InvalidUrl { url, .. }) if url.ends_with(".com/")
        ));

        let validated = validate(Exchange::Binance, &binance()).unwrap();
        assert_eq!(validated.api_url, "https://testnet.binance.vision/api/");
    }

    #[test]
    fn test_binance_grammar() {
        let mut creds = binance();
        creds.api_secret = "x".repeat(63);
        assert_eq!(
            validate(Exchange::Binance, &creds),
            Err(CredentialError::InvalidSecret(Exchange::Binance))
        );

        let mut creds = binance();
        creds.api_passphrase = Some("ignored".to_string());
        assert_eq!(validate(Exchange::Binance, &creds).unwrap().api_passphrase, None);
    }

    #[test]
    fn test_dummy_accepts_anything() {
        let creds = ApiCredentials {
            api_key: String::new(),
            api_secret: String::new(),
            api_passphrase: None,
            api_url: String::new(),
        };
        assert!(validate(Exchange::Dummy, &creds).is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", coinbase());
        assert!(!rendered.contains("c2VjcmV0"));
        assert!(!rendered.contains("abc123def4"));
        assert!(rendered.contains("0123…"));
    }
}
