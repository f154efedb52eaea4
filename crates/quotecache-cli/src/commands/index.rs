use quotecache_core::QuoteResolver;
use serde_json::Value;

use crate::cli::IndexArgs;
use crate::error::CliError;

pub async fn run(args: &IndexArgs, resolver: &QuoteResolver) -> Result<Value, CliError> {
    let quote = resolver.get_market_index(&args.market).await?;
    Ok(serde_json::to_value(quote.as_ref())?)
}
