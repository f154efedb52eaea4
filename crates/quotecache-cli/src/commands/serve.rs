use std::sync::Arc;

use quotecache_core::{QuoteResolver, ServiceConfig};

use crate::cli::ServeArgs;
use crate::error::CliError;
use crate::server;

pub async fn run(
    args: &ServeArgs,
    mut config: ServiceConfig,
    resolver: QuoteResolver,
) -> Result<(), CliError> {
    if let Some(addr) = args.addr {
        config.bind_addr = addr;
    }
    server::serve(&config, Arc::new(resolver)).await
}
