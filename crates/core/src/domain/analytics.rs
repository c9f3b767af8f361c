use anyhow::ensure;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Symbols fetched when none are given on the command line.
pub const DEFAULT_SYMBOLS: [&str; 6] = ["tsla", "aapl", "msft", "nvda", "amd", "tsm"];

/// Ticker symbol, stored upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let t = s.trim();
        ensure!(!t.is_empty(), "symbol must be non-empty");
        ensure!(
            !t.chars().any(|c| c.is_whitespace() || c == '/'),
            "symbol contains invalid characters: {t:?}"
        );
        Ok(Self(t.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-case form used in the request path.
    pub fn path_segment(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    pub fn defaults() -> Vec<Symbol> {
        DEFAULT_SYMBOLS
            .iter()
            .map(|s| Symbol(s.to_ascii_uppercase()))
            .collect()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One analytics row, as written to `STOCK_ANALYTICS`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsRecord {
    pub symbol: String,
    pub price: Option<f64>,
    pub target_high: Option<f64>,
    pub target_low: Option<f64>,
    pub target_mean: Option<f64>,
    pub recommendation: Option<String>,
    pub analyst_count: Option<i64>,
    pub fetched_at: DateTime<Utc>,
}
