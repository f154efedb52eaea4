//! Provider adapters implementing [`TimeSeriesProvider`](crate::TimeSeriesProvider).
//!
//! - [`YahooAdapter`]: production adapter over the Yahoo Finance chart API
//! - [`FixtureAdapter`]: deterministic offline data

pub mod fixture;
pub mod yahoo;

pub use fixture::FixtureAdapter;
pub use yahoo::YahooAdapter;
