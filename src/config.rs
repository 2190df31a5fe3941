// Session configuration and three-layer resolution
//
// defaults -> persisted file config -> CLI options, field by field. The result
// is one validated `SessionConfiguration`; nothing partial leaves `resolve`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::credentials::{self, ApiCredentials};
use crate::error::BootstrapResult;
use crate::exchange::Exchange;
use crate::granularity::{self, Granularity, GranularityError, GranularitySelection};
use crate::market::{self, CurrencyCode, Market, MarketFormatError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Invalid exchange '{0}': expected coinbasepro, binance or dummy")]
    UnknownExchange(String),

    #[error("Missing exchange credentials for {0}")]
    MissingCredentials(Exchange),

    #[error("Invalid config field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl fmt::Display) -> Self {
        ConfigError::InvalidField {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimSpeed {
    Slow,
    Fast,
    SlowSample,
    FastSample,
}

impl SimSpeed {
    pub const ALL: [SimSpeed; 4] = [
        SimSpeed::Slow,
        SimSpeed::Fast,
        SimSpeed::SlowSample,
        SimSpeed::FastSample,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SimSpeed::Slow => "slow",
            SimSpeed::Fast => "fast",
            SimSpeed::SlowSample => "slow-sample",
            SimSpeed::FastSample => "fast-sample",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|speed| speed.as_str() == name)
    }

    /// Sample speeds run against a random 300-candle window.
    pub fn is_sample(self) -> bool {
        matches!(self, SimSpeed::SlowSample | SimSpeed::FastSample)
    }
}

impl fmt::Display for SimSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunMode {
    pub is_live: bool,
    pub is_verbose: bool,
    pub save_graphs: bool,
    pub is_simulation: bool,
    pub sim_speed: SimSpeed,
}

/// Percentage bounds on selling relative to the entry price.
///
/// Invariant: `allow_sell_at_loss == false` implies `sell_lower_pct == None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SellGuards {
    sell_upper_pct: Option<f64>,
    sell_lower_pct: Option<f64>,
    allow_sell_at_loss: bool,
}

impl Default for SellGuards {
    fn default() -> Self {
        Self {
            sell_upper_pct: None,
            sell_lower_pct: None,
            allow_sell_at_loss: true,
        }
    }
}

impl SellGuards {
    /// Out-of-range bounds are dropped rather than rejected.
    pub fn new(upper: Option<f64>, lower: Option<f64>, allow_sell_at_loss: bool) -> Self {
        let mut guards = Self {
            sell_upper_pct: upper.filter(|v| Self::is_valid_upper(*v)),
            sell_lower_pct: lower.filter(|v| Self::is_valid_lower(*v)),
            allow_sell_at_loss,
        };
        guards.enforce();
        guards
    }

    pub fn is_valid_upper(pct: f64) -> bool {
        pct > 0.0 && pct <= 100.0
    }

    pub fn is_valid_lower(pct: f64) -> bool {
        (-100.0..0.0).contains(&pct)
    }

    pub fn sell_upper_pct(&self) -> Option<f64> {
        self.sell_upper_pct
    }

    pub fn sell_lower_pct(&self) -> Option<f64> {
        self.sell_lower_pct
    }

    pub fn allow_sell_at_loss(&self) -> bool {
        self.allow_sell_at_loss
    }

    fn set_allow_sell_at_loss(&mut self, allow: bool) {
        self.allow_sell_at_loss = allow;
        self.enforce();
    }

    fn enforce(&mut self) {
        if !self.allow_sell_at_loss {
            self.sell_lower_pct = None;
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    token: String,
    client_id: String,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"***")
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl TelegramConfig {
    pub fn parse(token: &str, client_id: &str) -> Result<Self, ConfigError> {
        if !Self::is_valid_token(token) {
            return Err(ConfigError::invalid("telegram.token", "Telegram token is invalid"));
        }
        if !Self::is_valid_client_id(client_id) {
            return Err(ConfigError::invalid("telegram.client_id", "Telegram client_id is invalid"));
        }
        Ok(Self {
            token: token.to_string(),
            client_id: client_id.to_string(),
        })
    }

    /// `<1-10 digit bot id>:<35 chars>`
    pub fn is_valid_token(token: &str) -> bool {
        let Some((bot_id, secret)) = token.split_once(':') else {
            return false;
        };
        (1..=10).contains(&bot_id.len())
            && bot_id.bytes().all(|b| b.is_ascii_digit())
            && secret.len() == 35
            && secret
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    pub fn is_valid_client_id(client_id: &str) -> bool {
        (7..=10).contains(&client_id.len()) && client_id.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

/// Built-in defaults, optionally loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDefaults {
    #[serde(default = "default_exchange")]
    pub exchange: Exchange,
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,
    #[serde(default)]
    pub granularity: Option<String>,
    #[serde(default)]
    pub live: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub graphs: bool,
    #[serde(default)]
    pub sim: Option<SimSpeed>,
    #[serde(default)]
    pub sell_upper_pct: Option<f64>,
    #[serde(default)]
    pub sell_lower_pct: Option<f64>,
    #[serde(default = "default_true")]
    pub sell_at_loss: bool,
    #[serde(default = "default_true")]
    pub smart_switch: bool,
}

fn default_exchange() -> Exchange { Exchange::CoinbasePro }
fn default_base_currency() -> String { "BTC".to_string() }
fn default_quote_currency() -> String { "GBP".to_string() }
fn default_true() -> bool { true }

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            exchange: default_exchange(),
            base_currency: default_base_currency(),
            quote_currency: default_quote_currency(),
            granularity: None,
            live: false,
            verbose: false,
            graphs: false,
            sim: None,
            sell_upper_pct: None,
            sell_lower_pct: None,
            sell_at_loss: default_true(),
            smart_switch: default_true(),
        }
    }
}

impl SessionDefaults {
    /// Load defaults from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save defaults to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content).map_err(|e| ConfigError::FileWrite(e.to_string()))
    }
}

/// The persisted JSON config, either the flat legacy layout or nested
/// per-exchange blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    document: Map<String, Value>,
}

impl FileConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(document) => Ok(Self { document }),
            other => Err(ConfigError::Parse(format!(
                "expected a JSON object at the top level, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// A missing file behaves like an empty document.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match fs::read_to_string(path.as_ref()) {
            Ok(content) => Self::from_json_str(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("⚠️  Config file {} not found, using defaults", path.as_ref().display());
                Ok(Self::empty())
            }
            Err(e) => Err(ConfigError::FileRead(e.to_string())),
        }
    }

    pub fn has_exchange_block(&self, exchange: Exchange) -> bool {
        self.document.contains_key(exchange.name())
    }

    fn nested(&self, exchange: Exchange) -> Option<&Map<String, Value>> {
        self.document.get(exchange.name()).and_then(Value::as_object)
    }

    /// Credentials plus the `config` tuning block for the active exchange.
    /// A structurally complete nested block wins over the flat layout.
    fn select_block(&self, exchange: Exchange) -> Result<SelectedBlock<'_>, ConfigError> {
        if !exchange.requires_credentials() {
            let settings = self
                .nested(exchange)
                .and_then(settings_of)
                .or_else(|| settings_of(&self.document));
            return Ok(SelectedBlock {
                credentials: None,
                settings,
            });
        }

        if let Some(block) = self.nested(exchange) {
            if let Some(credentials) = read_credentials(block, exchange) {
                debug!("Using nested {} credential block", exchange);
                return Ok(SelectedBlock {
                    credentials: Some(credentials),
                    settings: settings_of(block),
                });
            }
        }

        if let Some(credentials) = read_credentials(&self.document, exchange) {
            debug!("Using flat legacy credential layout for {}", exchange);
            return Ok(SelectedBlock {
                credentials: Some(credentials),
                settings: settings_of(&self.document),
            });
        }

        Err(ConfigError::MissingCredentials(exchange))
    }

    /// An invalid block is logged and disables notifications; it never aborts.
    fn telegram(&self) -> Option<TelegramConfig> {
        let block = self.document.get("telegram")?.as_object()?;
        let token = block.get("token")?;
        let client_id = block.get("client_id")?;

        let token = token.as_str().unwrap_or_default();
        let client_id = match client_id {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };

        match TelegramConfig::parse(token, &client_id) {
            Ok(telegram) => Some(telegram),
            Err(e) => {
                error!("❌ {}", e);
                None
            }
        }
    }
}

struct SelectedBlock<'a> {
    credentials: Option<ApiCredentials>,
    settings: Option<&'a Map<String, Value>>,
}

fn settings_of(block: &Map<String, Value>) -> Option<&Map<String, Value>> {
    block.get("config").and_then(Value::as_object)
}

fn read_credentials(block: &Map<String, Value>, exchange: Exchange) -> Option<ApiCredentials> {
    let field = |name: &str| block.get(name).and_then(Value::as_str).map(str::to_string);
    let needs_passphrase = exchange
        .rules()
        .credentials
        .map(|grammar| grammar.passphrase.is_some())
        .unwrap_or(false);

    let api_passphrase = field("api_passphrase").or_else(|| field("api_pass"));
    if needs_passphrase && api_passphrase.is_none() {
        return None;
    }

    Some(ApiCredentials {
        api_key: field("api_key")?,
        api_secret: field("api_secret")?,
        api_passphrase,
        api_url: field("api_url")?,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Pre-parsed command line options; `None` inherits from the lower layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptions {
    pub exchange: Option<String>,
    pub market: Option<String>,
    pub granularity: Option<String>,
    pub smartswitch: Option<i64>,
    pub graphs: Option<i64>,
    pub verbose: Option<i64>,
    pub live: Option<i64>,
    pub sim: Option<String>,
    pub sellupperpcnt: Option<f64>,
    pub selllowerpcnt: Option<f64>,
    pub sellatloss: Option<i64>,
}

/// Replace `slot` with the parsed value, or keep it and log when the raw
/// value is rejected. Returns whether the slot changed.
fn parse_or_keep<V, T, F>(field: &str, raw: Option<V>, slot: &mut T, parse: F) -> bool
where
    V: Copy + fmt::Debug,
    F: FnOnce(V) -> Option<T>,
{
    let Some(raw) = raw else {
        return false;
    };
    match parse(raw) {
        Some(value) => {
            *slot = value;
            true
        }
        None => {
            warn!("⚠️  Ignoring invalid value for {}: {:?}", field, raw);
            false
        }
    }
}

fn json_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => int_flag(&n.as_i64()?),
        _ => None,
    }
}

fn int_flag(value: &i64) -> Option<bool> {
    match value {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

fn upper_bound(pct: f64) -> Option<Option<f64>> {
    SellGuards::is_valid_upper(pct).then_some(Some(pct))
}

fn lower_bound(pct: f64) -> Option<Option<f64>> {
    SellGuards::is_valid_lower(pct).then_some(Some(pct))
}

fn currency_field(field: &str, value: &Value) -> Result<CurrencyCode, ConfigError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ConfigError::invalid(field, format!("expected a string, found {}", json_kind(value))))?;
    CurrencyCode::parse(raw).map_err(|e| ConfigError::invalid(field, e))
}

/// Working state while layers are applied.
struct Draft {
    exchange: Exchange,
    base: CurrencyCode,
    quote: CurrencyCode,
    market: Market,
    selection: GranularitySelection,
    mode: RunMode,
    guards: SellGuards,
}

impl Draft {
    fn from_defaults(exchange: Exchange, defaults: &SessionDefaults) -> BootstrapResult<Self> {
        let base = CurrencyCode::parse(&defaults.base_currency)
            .map_err(|e| ConfigError::invalid("base_currency", e))?;
        let quote = CurrencyCode::parse(&defaults.quote_currency)
            .map_err(|e| ConfigError::invalid("quote_currency", e))?;

        let mut selection = GranularitySelection::new(exchange, defaults.smart_switch);
        if let Some(raw) = &defaults.granularity {
            selection.set_explicit(granularity::resolve_granularity(exchange, raw)?);
        }

        let mut draft = Self {
            exchange,
            market: Market::from_parts(exchange, base.clone(), quote.clone()),
            base,
            quote,
            selection,
            mode: RunMode {
                is_live: defaults.live,
                is_verbose: defaults.verbose,
                save_graphs: defaults.graphs,
                is_simulation: false,
                sim_speed: SimSpeed::Fast,
            },
            guards: SellGuards::new(defaults.sell_upper_pct, defaults.sell_lower_pct, defaults.sell_at_loss),
        };
        if let Some(speed) = defaults.sim {
            draft.enable_simulation(speed);
        }
        Ok(draft)
    }

    fn enable_simulation(&mut self, speed: SimSpeed) {
        self.mode.is_simulation = true;
        self.mode.is_live = false;
        self.mode.sim_speed = speed;
    }

    fn set_market(&mut self, market: Market) {
        self.base = market.base().clone();
        self.quote = market.quote().clone();
        self.market = market;
    }

    fn apply_file_settings(&mut self, settings: &Map<String, Value>) -> Result<(), ConfigError> {
        for (field, is_base) in [
            ("base_currency", true),
            ("cryptoMarket", true),
            ("quote_currency", false),
            ("fiatMarket", false),
        ] {
            if let Some(value) = settings.get(field) {
                let code = currency_field(field, value)?;
                if is_base {
                    self.base = code;
                } else {
                    self.quote = code;
                }
            }
        }

        if let Some(value) = settings.get("market") {
            let raw = value
                .as_str()
                .ok_or_else(|| ConfigError::invalid("market", format!("expected a string, found {}", json_kind(value))))?;
            let market = market::normalize(self.exchange, raw).map_err(|e| ConfigError::invalid("market", e))?;
            self.base = market.base().clone();
            self.quote = market.quote().clone();
        }
        self.market = Market::from_parts(self.exchange, self.base.clone(), self.quote.clone());

        parse_or_keep("live", settings.get("live"), &mut self.mode.is_live, json_flag);
        parse_or_keep("verbose", settings.get("verbose"), &mut self.mode.is_verbose, json_flag);
        parse_or_keep("graphs", settings.get("graphs"), &mut self.mode.save_graphs, json_flag);

        let mut sim = None;
        parse_or_keep("sim", settings.get("sim"), &mut sim, |v: &Value| {
            v.as_str().and_then(SimSpeed::from_name).map(Some)
        });
        if let Some(speed) = sim {
            self.enable_simulation(speed);
        }

        // Bounds in the file are whole percentages
        parse_or_keep("sellupperpcnt", settings.get("sellupperpcnt"), &mut self.guards.sell_upper_pct, |v: &Value| {
            v.as_i64().and_then(|pct| upper_bound(pct as f64))
        });
        parse_or_keep("selllowerpcnt", settings.get("selllowerpcnt"), &mut self.guards.sell_lower_pct, |v: &Value| {
            v.as_i64().and_then(|pct| lower_bound(pct as f64))
        });

        // `nosellatloss` is the legacy inverse, honoured only without `sellatloss`
        let mut allow = None;
        if settings.contains_key("sellatloss") {
            parse_or_keep("sellatloss", settings.get("sellatloss"), &mut allow, |v: &Value| {
                json_flag(v).map(Some)
            });
        } else {
            parse_or_keep("nosellatloss", settings.get("nosellatloss"), &mut allow, |v: &Value| {
                json_flag(v).map(|no| Some(!no))
            });
        }
        if let Some(allow) = allow {
            self.guards.set_allow_sell_at_loss(allow);
        }

        let mut smart_switch = None;
        parse_or_keep("smartswitch", settings.get("smartswitch"), &mut smart_switch, |v: &Value| {
            json_flag(v).map(Some)
        });
        if let Some(enabled) = smart_switch {
            self.selection.set_smart_switch(enabled);
        }

        if let Some(value) = settings.get("granularity") {
            match granularity::resolve_granularity_value(self.exchange, value) {
                Ok(g) => self.selection.set_explicit(g),
                Err(e) => warn!("⚠️  Ignoring granularity from config file: {}", e),
            }
        }

        Ok(())
    }

    fn apply_cli(&mut self, cli: &CliOptions) -> BootstrapResult<()> {
        if let Some(raw) = &cli.market {
            self.set_market(market::normalize(self.exchange, raw)?);
        }

        let mut smart_switch = None;
        parse_or_keep("--smartswitch", cli.smartswitch.as_ref(), &mut smart_switch, |v| {
            int_flag(v).map(Some)
        });
        if let Some(enabled) = smart_switch {
            self.selection.set_smart_switch(enabled);
        }

        if let Some(raw) = &cli.granularity {
            self.selection
                .set_explicit(granularity::resolve_granularity(self.exchange, raw)?);
        }

        parse_or_keep("--graphs", cli.graphs.as_ref(), &mut self.mode.save_graphs, int_flag);
        parse_or_keep("--verbose", cli.verbose.as_ref(), &mut self.mode.is_verbose, int_flag);
        parse_or_keep("--live", cli.live.as_ref(), &mut self.mode.is_live, int_flag);

        let mut sim = None;
        parse_or_keep("--sim", cli.sim.as_deref(), &mut sim, |v| SimSpeed::from_name(v).map(Some));
        if let Some(speed) = sim {
            self.enable_simulation(speed);
        }

        parse_or_keep("--sellupperpcnt", cli.sellupperpcnt, &mut self.guards.sell_upper_pct, upper_bound);
        parse_or_keep("--selllowerpcnt", cli.selllowerpcnt, &mut self.guards.sell_lower_pct, lower_bound);

        let mut allow = None;
        parse_or_keep("--sellatloss", cli.sellatloss.as_ref(), &mut allow, |v| int_flag(v).map(Some));
        if let Some(allow) = allow {
            self.guards.set_allow_sell_at_loss(allow);
        }

        Ok(())
    }
}

/// Requested exchange, unless its block is absent and a Binance block exists.
fn detect_exchange(requested: Exchange, file: &FileConfig) -> Exchange {
    let falls_back = requested == Exchange::CoinbasePro
        && !file.has_exchange_block(requested)
        && file.has_exchange_block(Exchange::Binance);

    if falls_back {
        info!("🔀 No {} block in config file, switching to binance", requested);
        Exchange::Binance
    } else {
        requested
    }
}

/// Merge the three layers into one validated configuration.
///
/// Credential and endpoint checks run only after every layer is merged.
pub fn resolve(defaults: &SessionDefaults, file: &FileConfig, cli: &CliOptions) -> BootstrapResult<SessionConfiguration> {
    let requested = match &cli.exchange {
        Some(name) => name.parse::<Exchange>()?,
        None => defaults.exchange,
    };
    let exchange = detect_exchange(requested, file);

    let mut draft = Draft::from_defaults(exchange, defaults)?;
    let block = file.select_block(exchange)?;
    if let Some(settings) = block.settings {
        draft.apply_file_settings(settings)?;
    }
    draft.apply_cli(cli)?;

    draft.guards.enforce();
    if draft.mode.is_simulation && draft.mode.is_live {
        warn!("⚠️  Simulation requested, live trading disabled");
        draft.mode.is_live = false;
    }
    let (granularity, smart_switch) = draft.selection.finish();

    let credentials = match block.credentials {
        Some(raw) => Some(credentials::validate(exchange, &raw)?),
        None => None,
    };

    let config = SessionConfiguration {
        exchange,
        credentials,
        market: draft.market,
        granularity,
        smart_switch,
        mode: draft.mode,
        sell_guards: draft.guards,
        telegram: file.telegram(),
    };

    info!(
        "⚙️  Session resolved: {} {} granularity {} (smart switch {})",
        config.exchange, config.market, config.granularity, config.smart_switch
    );
    Ok(config)
}

/// The validated session. Only `set_granularity` and `set_market` mutate it
/// after bootstrap; it has a single owner.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfiguration {
    exchange: Exchange,
    credentials: Option<ApiCredentials>,
    market: Market,
    granularity: Granularity,
    smart_switch: bool,
    mode: RunMode,
    sell_guards: SellGuards,
    telegram: Option<TelegramConfig>,
}

impl SessionConfiguration {
    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn credentials(&self) -> Option<&ApiCredentials> {
        self.credentials.as_ref()
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn base_currency(&self) -> &CurrencyCode {
        self.market.base()
    }

    pub fn quote_currency(&self) -> &CurrencyCode {
        self.market.quote()
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn smart_switch(&self) -> bool {
        self.smart_switch
    }

    pub fn mode(&self) -> &RunMode {
        &self.mode
    }

    pub fn is_live(&self) -> bool {
        self.mode.is_live
    }

    pub fn is_verbose(&self) -> bool {
        self.mode.is_verbose
    }

    pub fn save_graphs(&self) -> bool {
        self.mode.save_graphs
    }

    pub fn is_simulation(&self) -> bool {
        self.mode.is_simulation
    }

    pub fn sim_speed(&self) -> SimSpeed {
        self.mode.sim_speed
    }

    pub fn sell_guards(&self) -> &SellGuards {
        &self.sell_guards
    }

    pub fn telegram(&self) -> Option<&TelegramConfig> {
        self.telegram.as_ref()
    }

    pub fn is_telegram_enabled(&self) -> bool {
        self.telegram.is_some()
    }

    /// Runtime interval change driven by the decision loop (smart switching
    /// included), so the smart-switch flag is left alone. Invalid requests
    /// leave the session unchanged.
    pub fn set_granularity(&mut self, requested: &str) -> Result<Granularity, GranularityError> {
        let granularity = granularity::resolve_granularity(self.exchange, requested)?;
        self.granularity = granularity;
        Ok(granularity)
    }

    /// Re-target the session; invalid symbols leave it unchanged.
    pub fn set_market(&mut self, raw: &str) -> Result<&Market, MarketFormatError> {
        self.market = market::normalize(self.exchange, raw)?;
        Ok(&self.market)
    }
}
