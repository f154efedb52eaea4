use thiserror::Error;

use crate::data_source::SourceError;

/// Validation and contract errors exposed by `quotecache-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("lookback window {days} days is outside 1..={max}")]
    LookbackOutOfRange { days: u32, max: u32 },

    #[error("search keyword cannot be empty")]
    EmptyKeyword,

    #[error("unsupported market '{value}', expected one of KOSPI, KOSDAQ")]
    UnsupportedMarket { value: String },

    #[error("invalid market segment '{value}', expected one of kospi, kosdaq, international, index")]
    InvalidSegment { value: String },

    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("bar high must be >= low")]
    InvalidBarRange,

    #[error("catalog asset is invalid: {reason}")]
    InvalidCatalog { reason: String },

    #[error("invalid configuration value for {key}: '{value}'")]
    InvalidConfig { key: &'static str, value: String },

    #[error("invalid query parameters: {reason}")]
    InvalidQuery { reason: String },
}

/// Resolver-boundary failure for a single quote lookup.
///
/// `NotFound` and `Upstream` both mean "no quote available" to a caller, but
/// stay distinct so the boundary can log and report them differently.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("no quote data found for '{symbol}'")]
    NotFound { symbol: String },

    #[error("upstream provider failure: {0}")]
    Upstream(#[from] SourceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl QuoteError {
    pub fn not_found(symbol: impl Into<String>) -> Self {
        Self::NotFound {
            symbol: symbol.into(),
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Upstream(_) => "upstream_failure",
            Self::Validation(_) => "validation",
        }
    }
}

/// Top-level error type for core operations outside quote resolution.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_error_codes_are_stable() {
        assert_eq!(QuoteError::not_found("005930").code(), "not_found");
        assert_eq!(
            QuoteError::from(SourceError::unavailable("down")).code(),
            "upstream_failure"
        );
        assert_eq!(
            QuoteError::from(ValidationError::EmptyKeyword).code(),
            "validation"
        );
    }

    #[test]
    fn unsupported_market_message_names_the_input() {
        let error = ValidationError::UnsupportedMarket {
            value: String::from("NYSE"),
        };
        assert!(error.to_string().contains("NYSE"));
    }
}
