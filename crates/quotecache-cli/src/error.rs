use quotecache_core::{CoreError, QuoteError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Quote(QuoteError::Validation(_)) => 2,
            Self::Quote(QuoteError::NotFound { .. }) => 3,
            Self::Quote(QuoteError::Upstream(_)) => 6,
            Self::Core(CoreError::Validation(_)) => 2,
            Self::Core(CoreError::Serialization(_)) => 4,
            Self::Core(CoreError::Io(_)) => 10,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotecache_core::SourceError;

    #[test]
    fn exit_codes_follow_error_categories() {
        assert_eq!(CliError::from(ValidationError::EmptyKeyword).exit_code(), 2);
        assert_eq!(
            CliError::from(QuoteError::not_found("005930")).exit_code(),
            3
        );
        assert_eq!(
            CliError::from(QuoteError::from(SourceError::unavailable("down"))).exit_code(),
            6
        );
        assert_eq!(
            CliError::from(std::io::Error::other("disk")).exit_code(),
            10
        );
        assert_eq!(
            CliError::from(CoreError::from(ValidationError::EmptySymbol)).exit_code(),
            2
        );
    }
}
