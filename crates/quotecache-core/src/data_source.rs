//! Time-series provider trait and request/error types.
//!
//! This module defines the upstream contract (`TimeSeriesProvider`) that the
//! resolver fetches daily bars through. A provider answers with an ascending
//! [`BarSeries`]; an empty series means "no data for this symbol/range" and
//! is not an error. Transport failures, timeouts and malformed payloads are
//! reported as [`SourceError`].
//!
//! # Example
//!
//! ```rust,ignore
//! use quotecache_core::{BarsRequest, MarketSegment, Symbol, TimeSeriesProvider, YahooAdapter};
//!
//! async fn last_close(adapter: &YahooAdapter) -> Result<(), SourceError> {
//!     let request = BarsRequest::last_days(Symbol::parse("AAPL")?, MarketSegment::International, 30)?;
//!     let series = adapter.fetch(request).await?;
//!     if let Some(bar) = series.bars.last() {
//!         println!("{}: {}", bar.date, bar.close);
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use time::{Date, Duration};

use crate::{BarSeries, MarketSegment, Symbol, UtcDateTime};

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Transport failure, timeout or 5xx.
    Unavailable,
    RateLimited,
    InvalidRequest,
    /// Payload could not be decoded.
    InvalidResponse,
    Internal,
}

impl SourceErrorKind {
    /// Transient kinds are worth retrying.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Unavailable | Self::RateLimited)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::RateLimited => "rate_limited",
            Self::InvalidRequest => "invalid_request",
            Self::InvalidResponse => "invalid_response",
            Self::Internal => "internal",
        }
    }
}

impl Display for SourceErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured provider error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({kind})")]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::RateLimited, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidRequest, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidResponse, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Internal, message)
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.kind.is_transient()
    }

    /// Stable identifier for logs.
    pub const fn code(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// Request payload for a daily-bar fetch. Both dates are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarsRequest {
    pub symbol: Symbol,
    pub segment: MarketSegment,
    pub start: Date,
    pub end: Date,
}

impl BarsRequest {
    pub fn new(
        symbol: Symbol,
        segment: MarketSegment,
        start: Date,
        end: Date,
    ) -> Result<Self, SourceError> {
        if start > end {
            return Err(SourceError::invalid_request(format!(
                "bars request start {start} is after end {end}"
            )));
        }
        Ok(Self {
            symbol,
            segment,
            start,
            end,
        })
    }

    /// Window of `[today - days, today]` in UTC.
    pub fn last_days(
        symbol: Symbol,
        segment: MarketSegment,
        days: u32,
    ) -> Result<Self, SourceError> {
        let end = UtcDateTime::now().date();
        let start = end
            .checked_sub(Duration::days(i64::from(days)))
            .ok_or_else(|| SourceError::invalid_request("lookback window underflows"))?;
        Self::new(symbol, segment, start, end)
    }
}

/// Upstream daily time-series contract.
///
/// Implementations must be `Send + Sync`: one provider instance is shared by
/// every concurrent lookup.
pub trait TimeSeriesProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fetches ascending daily bars for the requested window.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the transport fails, the request times out,
    /// the upstream rejects the request, or the payload cannot be decoded.
    /// Missing data is an empty [`BarSeries`], not an error.
    fn fetch<'a>(
        &'a self,
        req: BarsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<BarSeries, SourceError>> + Send + 'a>>;
}
