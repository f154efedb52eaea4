use quotecache_core::QuoteResolver;
use serde_json::Value;

use crate::cli::PopularArgs;
use crate::error::CliError;

pub async fn run(args: &PopularArgs, resolver: &QuoteResolver) -> Result<Value, CliError> {
    let quotes = if args.us {
        resolver.popular_international().await
    } else {
        resolver.popular_domestic().await
    };
    Ok(serde_json::to_value(quotes)?)
}
