//! Quote resolution: cache lookup, provider fetch, normalization.
//!
//! [`QuoteResolver`] is created once per process and shared (it is cheap to
//! clone). Every quote lookup goes through its [`CacheStore`], keyed by
//! [`QuoteKey`], so repeated lookups inside the TTL are served without
//! touching the provider and concurrent misses share one fetch.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::catalog::SymbolCatalog;
use crate::config::{ServiceConfig, DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS};
use crate::data_source::{BarsRequest, TimeSeriesProvider};
use crate::normalizer::normalize;
use crate::{
    BarSeries, CatalogEntry, CoreError, MarketIndex, MarketSegment, Quote, QuoteError, Symbol,
    ValidationError,
};

/// Upper bound on [`QuoteResolver::segment_leaders`].
pub const MAX_LEADERS: usize = 50;

/// Cache key for one resolved quote.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuoteKey {
    pub symbol: Symbol,
    pub lookback_days: u32,
    pub segment: MarketSegment,
}

/// Orchestrates catalog, cache, provider and normalizer.
#[derive(Clone)]
pub struct QuoteResolver {
    provider: Arc<dyn TimeSeriesProvider>,
    catalog: Arc<SymbolCatalog>,
    cache: CacheStore<QuoteKey, Quote>,
    default_lookback_days: u32,
}

impl QuoteResolver {
    pub fn new(
        provider: Arc<dyn TimeSeriesProvider>,
        catalog: Arc<SymbolCatalog>,
        cache: CacheStore<QuoteKey, Quote>,
    ) -> Self {
        Self {
            provider,
            catalog,
            cache,
            default_lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    /// Builds a resolver with the configured catalog asset and cache TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the catalog asset cannot be read or parsed.
    pub fn from_config(
        config: &ServiceConfig,
        provider: Arc<dyn TimeSeriesProvider>,
    ) -> Result<Self, CoreError> {
        let catalog = match &config.catalog_path {
            Some(path) => SymbolCatalog::from_path(path)?,
            None => SymbolCatalog::embedded()?,
        };

        Ok(Self::new(
            provider,
            Arc::new(catalog),
            CacheStore::new(config.cache_ttl),
        )
        .with_default_lookback_days(config.default_lookback_days))
    }

    pub fn with_default_lookback_days(mut self, days: u32) -> Self {
        self.default_lookback_days = days;
        self
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &CacheStore<QuoteKey, Quote> {
        &self.cache
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Resolves `symbol` over the last `lookback_days` days (default 30).
    ///
    /// # Errors
    ///
    /// - [`QuoteError::Validation`] for a malformed symbol or a lookback
    ///   outside `1..=3650`
    /// - [`QuoteError::NotFound`] when the provider has no data
    /// - [`QuoteError::Upstream`] when the provider fails
    pub async fn get_quote(
        &self,
        symbol: &str,
        lookback_days: Option<u32>,
    ) -> Result<Arc<Quote>, QuoteError> {
        let symbol = Symbol::parse(symbol)?;
        self.quote_for(symbol, lookback_days).await
    }

    /// Typed variant of [`get_quote`](Self::get_quote).
    pub async fn quote_for(
        &self,
        symbol: Symbol,
        lookback_days: Option<u32>,
    ) -> Result<Arc<Quote>, QuoteError> {
        let lookback_days = lookback_days.unwrap_or(self.default_lookback_days);
        if !(1..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
            return Err(ValidationError::LookbackOutOfRange {
                days: lookback_days,
                max: MAX_LOOKBACK_DAYS,
            }
            .into());
        }

        let segment = self.catalog.segment_for(&symbol);
        let key = QuoteKey {
            symbol: symbol.clone(),
            lookback_days,
            segment,
        };

        self.cache
            .get_or_compute(key, || self.fetch_quote(symbol, lookback_days, segment))
            .await
    }

    async fn fetch_quote(
        &self,
        symbol: Symbol,
        lookback_days: u32,
        segment: MarketSegment,
    ) -> Result<Quote, QuoteError> {
        let mut segment = segment;
        let mut series = self.fetch_bars(&symbol, segment, lookback_days).await?;

        // Uncatalogued domestic codes are guessed as primary-exchange listings;
        // an empty answer there means the code may trade on the secondary one.
        if series.is_empty()
            && segment == MarketSegment::Kospi
            && self.catalog.entry(&symbol).is_none()
        {
            debug!(
                target: "quotecache::resolver",
                %symbol,
                "no primary-exchange data, trying secondary exchange"
            );
            segment = MarketSegment::Kosdaq;
            series = self.fetch_bars(&symbol, segment, lookback_days).await?;
        }

        if series.is_empty() {
            return Err(QuoteError::not_found(symbol.as_str()));
        }

        let name = self.catalog.name_for(&symbol);
        normalize(&symbol, segment, &series.bars, name)
    }

    async fn fetch_bars(
        &self,
        symbol: &Symbol,
        segment: MarketSegment,
        lookback_days: u32,
    ) -> Result<BarSeries, QuoteError> {
        let request = BarsRequest::last_days(symbol.clone(), segment, lookback_days)?;
        debug!(
            target: "quotecache::resolver",
            provider = self.provider.name(),
            %symbol,
            %segment,
            start = %request.start,
            end = %request.end,
            "fetching bars"
        );

        Ok(self.provider.fetch(request).await?)
    }

    /// Resolves a market-wide index (`KOSPI` or `KOSDAQ`, any case).
    ///
    /// # Errors
    ///
    /// Unsupported names fail with [`ValidationError::UnsupportedMarket`],
    /// never [`QuoteError::NotFound`].
    pub async fn get_market_index(&self, market: &str) -> Result<Arc<Quote>, QuoteError> {
        let index: MarketIndex = market.parse()?;
        self.get_quote(index.provider_symbol(), None).await
    }

    /// Resolves each symbol concurrently with the default lookback.
    ///
    /// Failed lookups are logged and omitted; the rest keep input order.
    pub async fn get_popular(&self, symbols: &[Symbol]) -> Vec<Arc<Quote>> {
        let mut tasks = JoinSet::new();
        for (position, symbol) in symbols.iter().cloned().enumerate() {
            let resolver = self.clone();
            tasks.spawn(async move {
                let result = resolver.quote_for(symbol.clone(), None).await;
                (position, symbol, result)
            });
        }

        let mut resolved = Vec::with_capacity(symbols.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, _, Ok(quote))) => resolved.push((position, quote)),
                Ok((_, symbol, Err(error))) => {
                    warn!(
                        target: "quotecache::resolver",
                        %symbol,
                        code = error.code(),
                        %error,
                        "omitting quote from batch"
                    );
                }
                Err(error) => {
                    warn!(target: "quotecache::resolver", %error, "batch lookup task failed");
                }
            }
        }

        resolved.sort_by_key(|(position, _)| *position);
        resolved.into_iter().map(|(_, quote)| quote).collect()
    }

    /// Curated domestic list.
    pub async fn popular_domestic(&self) -> Vec<Arc<Quote>> {
        self.get_popular(self.catalog.popular_domestic()).await
    }

    /// Curated international list.
    pub async fn popular_international(&self) -> Vec<Arc<Quote>> {
        self.get_popular(self.catalog.popular_international()).await
    }

    /// Quotes for the first `limit` catalog entries of `segment`, capped at
    /// [`MAX_LEADERS`].
    pub async fn segment_leaders(&self, segment: MarketSegment, limit: usize) -> Vec<Arc<Quote>> {
        let symbols: Vec<Symbol> = self
            .catalog
            .list_segment(segment)
            .iter()
            .take(limit.min(MAX_LEADERS))
            .map(|entry| entry.symbol.clone())
            .collect();
        self.get_popular(&symbols).await
    }

    /// Catalog search.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyKeyword`] for an empty or blank keyword.
    pub fn search_catalog(&self, keyword: &str) -> Result<Vec<CatalogEntry>, ValidationError> {
        if keyword.trim().is_empty() {
            return Err(ValidationError::EmptyKeyword);
        }
        Ok(self.catalog.search(keyword))
    }

    pub fn list_catalog(&self) -> Vec<CatalogEntry> {
        self.catalog.list_all()
    }
}
