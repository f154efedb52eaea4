use quotecache_core::QuoteResolver;
use serde_json::Value;

use crate::cli::QuoteArgs;
use crate::error::CliError;

pub async fn run(args: &QuoteArgs, resolver: &QuoteResolver) -> Result<Value, CliError> {
    let quote = resolver.get_quote(&args.symbol, args.days).await?;
    Ok(serde_json::to_value(quote.as_ref())?)
}
