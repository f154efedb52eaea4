//! # Domain Models
//!
//! Canonical domain types for quotecache.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Quote`] | Latest close plus change metrics for one lookback window |
//! | [`DailyBar`] | One trading day of OHLCV data |
//! | [`BarSeries`] | Ascending bars for a symbol (empty = no data) |
//! | [`CatalogEntry`] | Static listing record (symbol, name, market, industry) |
//! | [`MarketSegment`] | Listing segment used in cache keys and name fallbacks |
//! | [`MarketIndex`] | Supported market-wide indices |
//! | [`Symbol`] | Validated provider-native identifier |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Prices are [`rust_decimal::Decimal`] so change arithmetic is exact.

mod models;
mod symbol;
mod timestamp;

pub use models::{BarSeries, CatalogEntry, DailyBar, MarketIndex, MarketSegment, Quote};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
