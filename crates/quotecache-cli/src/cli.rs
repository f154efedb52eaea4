//! CLI argument definitions for quotecache.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Latest quote for one symbol |
//! | `index` | Latest quote for a market index (KOSPI, KOSDAQ) |
//! | `popular` | Curated domestic or international list |
//! | `leaders` | First N catalog entries of a segment |
//! | `search` | Search the symbol catalog |
//! | `list` | List the domestic catalog |
//! | `serve` | Start the HTTP server |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--offline` | `false` | Use deterministic fixture data |
//! | `--timeout-ms` | `QUOTECACHE_TIMEOUT_MS` or `5000` | Upstream request timeout |
//! | `--ttl-secs` | `QUOTECACHE_CACHE_TTL_SECS` or `300` | Cache TTL (0 disables) |
//! | `--catalog` | embedded | Catalog asset path |
//!
//! # Examples
//!
//! ```bash
//! quotecache quote 005930 --days 7 --pretty
//! quotecache index kosdaq
//! quotecache popular --us
//! quotecache search 삼성
//! quotecache serve --addr 0.0.0.0:5000
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use quotecache_core::MarketSegment;

/// Cached stock quotes for KOSPI, KOSDAQ and US equities.
#[derive(Debug, Parser)]
#[command(
    name = "quotecache",
    author,
    version,
    about = "Cached stock quotes for KOSPI, KOSDAQ and US equities"
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Serve deterministic fixture data instead of calling Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Upstream request timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Quote cache TTL in seconds. Zero disables caching.
    #[arg(long, global = true)]
    pub ttl_secs: Option<u64>,

    /// Path to a catalog JSON asset replacing the embedded one.
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Latest quote for a symbol.
    ///
    ///   quotecache quote 005930
    ///   quotecache quote AAPL --days 7
    Quote(QuoteArgs),

    /// Latest quote for a market index.
    ///
    ///   quotecache index kospi
    Index(IndexArgs),

    /// Quotes for the curated popular list.
    Popular(PopularArgs),

    /// Quotes for the first catalog entries of a segment.
    Leaders(LeadersArgs),

    /// Search the catalog by name or code.
    Search(SearchArgs),

    /// List the domestic catalog.
    List,

    /// Start the HTTP server.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Symbol, e.g. 005930 or AAPL.
    pub symbol: String,

    /// Lookback window in days (1..=3650).
    #[arg(long)]
    pub days: Option<u32>,
}

#[derive(Debug, Args)]
pub struct IndexArgs {
    /// KOSPI or KOSDAQ (case-insensitive).
    pub market: String,
}

#[derive(Debug, Args)]
pub struct PopularArgs {
    /// Use the international list instead of the domestic one.
    #[arg(long, default_value_t = false)]
    pub us: bool,
}

#[derive(Debug, Args)]
pub struct LeadersArgs {
    /// Catalog segment (kospi, kosdaq, international).
    #[arg(long, default_value = "kospi", value_parser = parse_segment)]
    pub segment: MarketSegment,

    /// Number of entries (at most 50).
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Case-insensitive name or code fragment.
    pub keyword: String,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Bind address, overriding QUOTECACHE_ADDR.
    #[arg(long)]
    pub addr: Option<SocketAddr>,
}

fn parse_segment(value: &str) -> Result<MarketSegment, String> {
    value.parse().map_err(|error: quotecache_core::ValidationError| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_apply_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "quotecache",
            "quote",
            "005930",
            "--days",
            "7",
            "--offline",
            "--ttl-secs",
            "0",
        ])
        .expect("valid arguments");

        assert!(cli.offline);
        assert_eq!(cli.ttl_secs, Some(0));
        match cli.command {
            Command::Quote(args) => {
                assert_eq!(args.symbol, "005930");
                assert_eq!(args.days, Some(7));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn leaders_default_to_the_primary_exchange() {
        let cli = Cli::try_parse_from(["quotecache", "leaders"]).expect("valid arguments");
        match cli.command {
            Command::Leaders(args) => {
                assert_eq!(args.segment, MarketSegment::Kospi);
                assert_eq!(args.limit, 50);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_segments() {
        assert!(Cli::try_parse_from(["quotecache", "leaders", "--segment", "nyse"]).is_err());
    }
}
