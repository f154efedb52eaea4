use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Symbol, UtcDateTime, ValidationError};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Market segment an instrument is listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSegment {
    /// Domestic primary exchange.
    Kospi,
    /// Domestic secondary exchange.
    Kosdaq,
    International,
    Index,
}

impl MarketSegment {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kospi => "kospi",
            Self::Kosdaq => "kosdaq",
            Self::International => "international",
            Self::Index => "index",
        }
    }

    pub const fn is_domestic(self) -> bool {
        matches!(self, Self::Kospi | Self::Kosdaq)
    }

    /// Prefix used for display names of instruments missing from the catalog.
    pub const fn fallback_prefix(self) -> &'static str {
        match self {
            Self::Kospi | Self::Kosdaq => "Stock",
            Self::International => "US Stock",
            Self::Index => "Index",
        }
    }
}

impl Display for MarketSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketSegment {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "kospi" => Ok(Self::Kospi),
            "kosdaq" => Ok(Self::Kosdaq),
            "international" | "us" => Ok(Self::International),
            "index" => Ok(Self::Index),
            other => Err(ValidationError::InvalidSegment {
                value: other.to_owned(),
            }),
        }
    }
}

/// Market-wide index served by `QuoteResolver::get_market_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketIndex {
    Kospi,
    Kosdaq,
}

impl MarketIndex {
    pub const ALL: [Self; 2] = [Self::Kospi, Self::Kosdaq];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kospi => "KOSPI",
            Self::Kosdaq => "KOSDAQ",
        }
    }

    /// Reserved provider ticker for the index.
    pub const fn provider_symbol(self) -> &'static str {
        match self {
            Self::Kospi => "^KS11",
            Self::Kosdaq => "^KQ11",
        }
    }
}

impl Display for MarketIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketIndex {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "KOSPI" => Ok(Self::Kospi),
            "KOSDAQ" => Ok(Self::Kosdaq),
            _ => Err(ValidationError::UnsupportedMarket {
                value: value.trim().to_owned(),
            }),
        }
    }
}

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBar {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl DailyBar {
    pub fn new(
        date: Date,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Ascending daily bars for one symbol. Empty means the provider had no data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: Symbol,
    pub bars: Vec<DailyBar>,
}

impl BarSeries {
    pub fn new(symbol: Symbol, bars: Vec<DailyBar>) -> Self {
        Self { symbol, bars }
    }

    pub fn empty(symbol: Symbol) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Canonical quote for one symbol over one lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub name: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    /// Latest close.
    pub price: Decimal,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: u64,
    pub change: Decimal,
    /// Percentage change against `previous_close`; zero when that close is zero.
    pub change_rate: Decimal,
    pub previous_close: Decimal,
    pub segment: MarketSegment,
    /// When this quote was computed.
    pub timestamp: UtcDateTime,
}

/// Static catalog record for a listed instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub symbol: Symbol,
    pub name: String,
    pub market: MarketSegment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

fn validate_non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
