// Granularity & smart-switch resolution
//
// Coinbase Pro (and the dummy exchange) express candle widths as integer
// seconds, Binance as interval labels. Both enumerate the same six widths.

use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::exchange::{Exchange, Notation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    OneHour,
    SixHours,
    OneDay,
}

impl Interval {
    pub const ALL: [Interval; 6] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::OneHour,
        Interval::SixHours,
        Interval::OneDay,
    ];

    pub fn seconds(self) -> u32 {
        match self {
            Interval::OneMinute => 60,
            Interval::FiveMinutes => 300,
            Interval::FifteenMinutes => 900,
            Interval::OneHour => 3600,
            Interval::SixHours => 21600,
            Interval::OneDay => 86400,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::OneHour => "1h",
            Interval::SixHours => "6h",
            Interval::OneDay => "1d",
        }
    }

    pub fn from_seconds(seconds: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|i| u64::from(i.seconds()) == seconds)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.label() == label)
    }

    pub fn duration(self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.seconds()))
    }
}

/// A candle width written in the notation of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Granularity {
    interval: Interval,
    notation: Notation,
}

impl Granularity {
    pub fn new(exchange: Exchange, interval: Interval) -> Self {
        Self {
            interval,
            notation: exchange.notation(),
        }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn notation(&self) -> Notation {
        self.notation
    }

    /// Seconds value, only for seconds-notation exchanges.
    pub fn as_seconds(&self) -> Option<u32> {
        match self.notation {
            Notation::Seconds => Some(self.interval.seconds()),
            Notation::Label => None,
        }
    }

    /// Label value, only for label-notation exchanges.
    pub fn as_label(&self) -> Option<&'static str> {
        match self.notation {
            Notation::Label => Some(self.interval.label()),
            Notation::Seconds => None,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.interval.duration()
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.notation {
            Notation::Seconds => write!(f, "{}", self.interval.seconds()),
            Notation::Label => f.write_str(self.interval.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GranularityError {
    #[error("Invalid granularity '{requested}' for {exchange}, options: {options}")]
    Unsupported {
        exchange: Exchange,
        requested: String,
        options: String,
    },

    #[error("Granularity for {exchange} must be {expected}, got {found}")]
    WrongType {
        exchange: Exchange,
        expected: &'static str,
        found: String,
    },
}

fn options(exchange: Exchange) -> String {
    Interval::ALL
        .iter()
        .map(|i| Granularity::new(exchange, *i).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn unsupported(exchange: Exchange, requested: impl Into<String>) -> GranularityError {
    GranularityError::Unsupported {
        exchange,
        requested: requested.into(),
        options: options(exchange),
    }
}

/// Map a textual request (CLI, defaults file, runtime setter) onto the
/// exchange's enumerated set.
pub fn resolve_granularity(exchange: Exchange, requested: &str) -> Result<Granularity, GranularityError> {
    let trimmed = requested.trim();
    let interval = match exchange.notation() {
        Notation::Seconds => trimmed
            .parse::<u64>()
            .ok()
            .and_then(Interval::from_seconds),
        Notation::Label => Interval::from_label(trimmed),
    };

    interval
        .map(|i| Granularity::new(exchange, i))
        .ok_or_else(|| unsupported(exchange, trimmed))
}

/// Map a JSON value from the persisted config. Seconds notation wants an
/// integer, label notation wants a string.
pub fn resolve_granularity_value(exchange: Exchange, requested: &Value) -> Result<Granularity, GranularityError> {
    match (exchange.notation(), requested) {
        (Notation::Seconds, Value::Number(n)) => n
            .as_u64()
            .and_then(Interval::from_seconds)
            .map(|i| Granularity::new(exchange, i))
            .ok_or_else(|| unsupported(exchange, n.to_string())),
        (Notation::Label, Value::String(s)) => Interval::from_label(s)
            .map(|i| Granularity::new(exchange, i))
            .ok_or_else(|| unsupported(exchange, s.as_str())),
        (Notation::Seconds, other) => Err(GranularityError::WrongType {
            exchange,
            expected: "an integer number of seconds",
            found: other.to_string(),
        }),
        (Notation::Label, other) => Err(GranularityError::WrongType {
            exchange,
            expected: "an interval label",
            found: other.to_string(),
        }),
    }
}

/// The interval smart switch starts on.
pub fn smart_switch_default(exchange: Exchange) -> Granularity {
    Granularity::new(exchange, Interval::OneHour)
}

/// Tracks the smart-switch flag against explicitly chosen granularities while
/// configuration layers are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GranularitySelection {
    exchange: Exchange,
    granularity: Option<Granularity>,
    smart_switch: bool,
    explicit: bool,
}

impl GranularitySelection {
    pub fn new(exchange: Exchange, smart_switch: bool) -> Self {
        Self {
            exchange,
            granularity: None,
            smart_switch,
            explicit: false,
        }
    }

    pub fn set_smart_switch(&mut self, enabled: bool) {
        self.smart_switch = enabled;
    }

    /// An explicit granularity turns smart switch off for good, whichever
    /// layer asked for smart switch before or after.
    pub fn set_explicit(&mut self, granularity: Granularity) {
        self.granularity = Some(granularity);
        self.smart_switch = false;
        self.explicit = true;
    }

    /// Returns `(granularity, smart_switch)` once all layers are applied.
    pub fn finish(self) -> (Granularity, bool) {
        let smart_switch = self.smart_switch && !self.explicit;
        match self.granularity {
            Some(g) => (g, smart_switch),
            None => {
                let g = smart_switch_default(self.exchange);
                if smart_switch {
                    debug!("Smart switch enabled, starting on {}", g);
                } else {
                    debug!("No granularity configured, falling back to {}", g);
                }
                (g, smart_switch)
            }
        }
    }
}
