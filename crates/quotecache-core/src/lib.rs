//! # quotecache Core
//!
//! Quote resolution and caching for domestic (KOSPI/KOSDAQ) and international
//! equities and market indices.
//!
//! ## Overview
//!
//! - **Canonical domain models** for quotes, daily bars and catalog entries
//! - **Time-series provider trait** with a Yahoo Finance adapter and an
//!   offline fixture adapter
//! - **Normalizer** deriving change metrics from the two latest bars
//! - **TTL cache** with per-key single-flight
//! - **Resolver** composing the above behind one shared handle
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Yahoo, fixture) |
//! | [`cache`] | Generic TTL cache with single-flight |
//! | [`catalog`] | Symbol catalog and curated lists |
//! | [`config`] | Service configuration |
//! | [`data_source`] | Provider trait and request/error types |
//! | [`domain`] | Domain models (Quote, DailyBar, CatalogEntry) |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`normalizer`] | Bars-to-quote conversion |
//! | [`resolver`] | Quote resolution entry point |
//! | [`retry`] | Retry policy for transient upstream failures |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quotecache_core::{QuoteResolver, ServiceConfig, YahooAdapter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::from_env()?;
//!     let resolver = QuoteResolver::from_config(&config, Arc::new(YahooAdapter::default()))?;
//!
//!     let quote = resolver.get_quote("005930", None).await?;
//!     println!("{} {} ({}%)", quote.name, quote.price, quote.change_rate);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  HTTP / CLI     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  QuoteResolver  │────▶│ CacheStore       │
//! └────────┬────────┘     │ (TTL, per key)   │
//!          │ miss         └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ TimeSeries      │────▶│ HTTP Client      │
//! │ Provider        │     │ (reqwest)        │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Normalizer      │◀────│ SymbolCatalog    │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Quote lookups fail with a tagged [`QuoteError`]:
//!
//! ```rust
//! use quotecache_core::QuoteError;
//!
//! fn status_for(error: &QuoteError) -> u16 {
//!     match error {
//!         QuoteError::Validation(_) => 400,
//!         QuoteError::NotFound { .. } => 404,
//!         QuoteError::Upstream(_) => 502,
//!     }
//! }
//! ```

pub mod adapters;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod normalizer;
pub mod resolver;
pub mod retry;

// Adapter implementations
pub use adapters::{FixtureAdapter, YahooAdapter};

// Caching
pub use cache::CacheStore;

// Catalog
pub use catalog::SymbolCatalog;

// Configuration
pub use config::ServiceConfig;

// Provider trait and types
pub use data_source::{BarsRequest, SourceError, SourceErrorKind, TimeSeriesProvider};

// Domain models
pub use domain::{
    BarSeries, CatalogEntry, DailyBar, MarketIndex, MarketSegment, Quote, Symbol, UtcDateTime,
};

// Error types
pub use error::{CoreError, QuoteError, ValidationError};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Normalization
pub use normalizer::normalize;

// Resolution
pub use resolver::{QuoteKey, QuoteResolver};

// Retry logic
pub use retry::{Backoff, RetryConfig};
