mod index;
mod leaders;
mod list;
mod popular;
mod quote;
mod search;
mod serve;

use std::sync::Arc;
use std::time::Duration;

use quotecache_core::{
    FixtureAdapter, QuoteResolver, ReqwestHttpClient, ServiceConfig, TimeSeriesProvider,
    ValidationError, YahooAdapter,
};
use serde_json::Value;
use tracing::info;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let config = resolve_config(cli)?;
    let resolver = build_resolver(&config, cli.offline)?;

    let data: Value = match &cli.command {
        Command::Quote(args) => quote::run(args, &resolver).await?,
        Command::Index(args) => index::run(args, &resolver).await?,
        Command::Popular(args) => popular::run(args, &resolver).await?,
        Command::Leaders(args) => leaders::run(args, &resolver).await?,
        Command::Search(args) => search::run(args, &resolver)?,
        Command::List => list::run(&resolver)?,
        Command::Serve(args) => return serve::run(args, config, resolver).await,
    };

    output::render(&data, cli.pretty)
}

/// Environment configuration with command-line overrides applied.
pub fn resolve_config(cli: &Cli) -> Result<ServiceConfig, CliError> {
    let mut config = ServiceConfig::from_env()?;

    if let Some(timeout_ms) = cli.timeout_ms {
        if timeout_ms == 0 {
            return Err(ValidationError::InvalidConfig {
                key: "--timeout-ms",
                value: timeout_ms.to_string(),
            }
            .into());
        }
        config.request_timeout_ms = timeout_ms;
    }
    if let Some(ttl_secs) = cli.ttl_secs {
        config.cache_ttl = Duration::from_secs(ttl_secs);
    }
    if let Some(path) = &cli.catalog {
        config.catalog_path = Some(path.clone());
    }

    Ok(config)
}

pub fn build_resolver(config: &ServiceConfig, offline: bool) -> Result<QuoteResolver, CliError> {
    let provider: Arc<dyn TimeSeriesProvider> = if offline {
        Arc::new(FixtureAdapter::new())
    } else {
        Arc::new(
            YahooAdapter::new(Arc::new(ReqwestHttpClient::new()))
                .with_timeout_ms(config.request_timeout_ms)
                .with_retry(config.retry),
        )
    };

    let resolver = QuoteResolver::from_config(config, provider)?;
    info!(
        provider = resolver.provider_name(),
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "resolver ready"
    );
    Ok(resolver)
}
