use quotecache_core::QuoteResolver;
use serde_json::Value;

use crate::error::CliError;

pub fn run(resolver: &QuoteResolver) -> Result<Value, CliError> {
    Ok(serde_json::to_value(resolver.list_catalog())?)
}
