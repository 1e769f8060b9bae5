// src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// One of the fixed tickers the dashboard tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    #[serde(rename = "GOOG")]
    Goog,
    #[serde(rename = "TSLA")]
    Tsla,
    #[serde(rename = "AMZN")]
    Amzn,
    #[serde(rename = "META")]
    Meta,
    #[serde(rename = "NVDA")]
    Nvda,
}

impl Symbol {
    pub const ALL: [Symbol; 5] = [
        Symbol::Goog,
        Symbol::Tsla,
        Symbol::Amzn,
        Symbol::Meta,
        Symbol::Nvda,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::Goog => "GOOG",
            Symbol::Tsla => "TSLA",
            Symbol::Amzn => "AMZN",
            Symbol::Meta => "META",
            Symbol::Nvda => "NVDA",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stock symbol {0:?}")]
pub struct UnknownSymbol(pub String);

impl FromStr for Symbol {
    type Err = UnknownSymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::ALL
            .into_iter()
            .find(|symbol| symbol.as_str() == s)
            .ok_or_else(|| UnknownSymbol(s.to_string()))
    }
}

/// A user's tracked holding of one symbol.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub symbol: Symbol,
    pub current_price: f64,
    pub last_observed_price: f64,
    /// Price step `current_price` was taken at.
    pub observed_tick: u64,
    /// Most recent prices first seen by this subscription, oldest at the front.
    pub history: VecDeque<f64>,
}

impl Subscription {
    pub fn new(symbol: Symbol, price: f64, tick: u64, history_capacity: usize) -> Self {
        let mut history = VecDeque::with_capacity(history_capacity);
        history.push_back(price);
        Subscription {
            symbol,
            current_price: price,
            last_observed_price: price,
            observed_tick: tick,
            history,
        }
    }

    /// Appends a price, dropping the oldest entries past `capacity`.
    pub fn record(&mut self, price: f64, tick: u64, capacity: usize) {
        self.current_price = price;
        self.observed_tick = tick;
        self.history.push_back(price);
        while self.history.len() > capacity {
            self.history.pop_front();
        }
    }
}

/// Price reading with the delta since the previous reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: Symbol,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

impl Quote {
    pub fn new(symbol: Symbol, price: f64, baseline: f64, timestamp: i64) -> Self {
        let change = price - baseline;
        Quote {
            symbol,
            price,
            change,
            change_percent: percent_change(change, baseline),
            timestamp,
        }
    }
}

/// `change / baseline * 100`, or 0 when the baseline is 0.
pub fn percent_change(change: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    let percent = change / baseline * 100.0;
    if percent.is_finite() {
        percent
    } else {
        0.0
    }
}

/// Watchlist row. The change fields are cosmetic and not tied to price history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistQuote {
    pub symbol: Symbol,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: u64,
    pub email: String,
    pub password: String,
}

/// Public view of an account; ids go over the wire as strings.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
}

impl From<&UserAccount> for UserView {
    fn from(account: &UserAccount) -> Self {
        UserView {
            id: account.id.to_string(),
            email: account.email.clone(),
        }
    }
}

// Body fields stay untyped so that a wrong JSON type is a validation
// failure in the handler rather than a decode failure of the whole body.

#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub password: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRequest {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub symbol: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Treats empty strings the same as absent fields.
pub fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

/// A non-empty JSON string; any other type counts as absent.
pub fn text_field(field: Option<Value>) -> Option<String> {
    match field {
        Some(Value::String(text)) => present(Some(text)),
        _ => None,
    }
}

/// A non-empty string or a non-zero number, rendered as text. Numeric user
/// ids and tickers are accepted as keys; `null`, booleans, `0`, arrays and
/// objects count as absent.
pub fn key_field(field: Option<Value>) -> Option<String> {
    match field {
        Some(Value::Number(number)) if number.as_f64() != Some(0.0) => Some(number.to_string()),
        other => text_field(other),
    }
}
