use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

use rust_decimal::Decimal;
use time::Weekday;

use crate::data_source::{BarsRequest, SourceError, TimeSeriesProvider};
use crate::{BarSeries, DailyBar, Symbol, ValidationError};

/// Deterministic offline provider.
///
/// Generates one bar per weekday in the requested window. Prices derive from
/// a hash of the symbol and the date, so repeated fetches agree. Symbols can
/// be scripted to return no data or to fail.
#[derive(Debug, Clone, Default)]
pub struct FixtureAdapter {
    missing: HashSet<Symbol>,
    failing: HashMap<Symbol, SourceError>,
}

impl FixtureAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `symbol` answers with an empty series.
    pub fn with_missing(mut self, symbol: Symbol) -> Self {
        self.missing.insert(symbol);
        self
    }

    /// `symbol` answers with `error`.
    pub fn with_failure(mut self, symbol: Symbol, error: SourceError) -> Self {
        self.failing.insert(symbol, error);
        self
    }

    fn generate(req: &BarsRequest) -> Result<BarSeries, ValidationError> {
        let seed = symbol_seed(&req.symbol);
        let base = base_price(&req.symbol, seed);
        let mut bars = Vec::new();

        let mut day = req.start;
        loop {
            if !matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday) {
                let day_seed = seed.wrapping_add(u64::from(day.ordinal()) * 7919);
                // Swing of +/- 4% around the base.
                let swing = Decimal::from(day_seed % 81) - Decimal::from(40);
                let close = (base + base * swing / Decimal::from(1_000)).round_dp(2);
                let open = (close - base / Decimal::from(200)).round_dp(2);
                let high = (close.max(open) + base / Decimal::from(100)).round_dp(2);
                let low = (close.min(open) - base / Decimal::from(100)).round_dp(2);
                let volume = 10_000 + day_seed % 90_000;

                bars.push(DailyBar::new(day, open, high, low, close, volume)?);
            }

            match day.next_day() {
                Some(next) if next <= req.end => day = next,
                _ => break,
            }
        }

        Ok(BarSeries::new(req.symbol.clone(), bars))
    }
}

impl TimeSeriesProvider for FixtureAdapter {
    fn name(&self) -> &'static str {
        "fixture"
    }

    fn fetch<'a>(
        &'a self,
        req: BarsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<BarSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(error) = self.failing.get(&req.symbol) {
                return Err(error.clone());
            }
            if self.missing.contains(&req.symbol) {
                return Ok(BarSeries::empty(req.symbol));
            }
            Self::generate(&req).map_err(|error| SourceError::internal(error.to_string()))
        })
    }
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(u64::from(byte))
    })
}

/// Domestic listings trade in won, so their base sits in the tens of
/// thousands; everything else sits in a dollar-like range.
fn base_price(symbol: &Symbol, seed: u64) -> Decimal {
    if symbol.is_domestic_code() {
        Decimal::from(20_000 + (seed % 800) * 100)
    } else if symbol.is_index() {
        Decimal::from(800 + seed % 2_000)
    } else {
        Decimal::from(90 + seed % 350)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MarketSegment;
    use time::macros::date;

    fn request(symbol: &str) -> BarsRequest {
        BarsRequest::new(
            Symbol::parse(symbol).expect("valid symbol"),
            MarketSegment::International,
            date!(2024 - 03 - 01),
            date!(2024 - 03 - 11),
        )
        .expect("valid request")
    }

    #[tokio::test]
    async fn generates_weekday_bars_inside_the_window() {
        let series = FixtureAdapter::new()
            .fetch(request("AAPL"))
            .await
            .expect("fixture data");

        // 03-01 (Fri), 03-04..03-08, 03-11 (Mon)
        assert_eq!(series.bars.len(), 7);
        assert_eq!(series.bars.first().map(|b| b.date), Some(date!(2024 - 03 - 01)));
        assert_eq!(series.bars.last().map(|b| b.date), Some(date!(2024 - 03 - 11)));
        assert!(series.bars.windows(2).all(|pair| pair[0].date < pair[1].date));
        assert!(series.bars.iter().all(|bar| bar.high >= bar.low));
    }

    #[tokio::test]
    async fn fetches_are_deterministic() {
        let adapter = FixtureAdapter::new();
        let first = adapter.fetch(request("005930")).await.expect("data");
        let second = adapter.fetch(request("005930")).await.expect("data");
        assert_eq!(first, second);
        assert!(first.bars[0].close > Decimal::from(10_000));
    }

    #[tokio::test]
    async fn scripted_symbols_miss_or_fail() {
        let adapter = FixtureAdapter::new()
            .with_missing(Symbol::parse("GONE").expect("valid"))
            .with_failure(
                Symbol::parse("DOWN").expect("valid"),
                SourceError::unavailable("scripted outage"),
            );

        let missing = adapter.fetch(request("GONE")).await.expect("empty series");
        assert!(missing.is_empty());

        let failed = adapter.fetch(request("DOWN")).await.expect_err("scripted failure");
        assert!(failed.retryable());
    }
}
