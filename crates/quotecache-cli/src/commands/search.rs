use quotecache_core::{CatalogEntry, QuoteResolver};
use serde::Serialize;
use serde_json::Value;

use crate::cli::SearchArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SearchResponseData {
    query: String,
    results: Vec<CatalogEntry>,
}

pub fn run(args: &SearchArgs, resolver: &QuoteResolver) -> Result<Value, CliError> {
    let results = resolver.search_catalog(&args.keyword)?;
    Ok(serde_json::to_value(SearchResponseData {
        query: args.keyword.trim().to_owned(),
        results,
    })?)
}
