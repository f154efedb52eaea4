use quotecache_core::QuoteResolver;
use serde_json::Value;

use crate::cli::LeadersArgs;
use crate::error::CliError;

pub async fn run(args: &LeadersArgs, resolver: &QuoteResolver) -> Result<Value, CliError> {
    let quotes = resolver.segment_leaders(args.segment, args.limit).await;
    Ok(serde_json::to_value(quotes)?)
}
