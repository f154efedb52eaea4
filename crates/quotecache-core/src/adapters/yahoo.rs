use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::{Date, Duration, OffsetDateTime, Time};
use tracing::debug;

use crate::data_source::{BarsRequest, SourceError, TimeSeriesProvider};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};
use crate::retry::RetryConfig;
use crate::{BarSeries, DailyBar, MarketSegment, Symbol};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const PRICE_DECIMALS: u32 = 4;

/// Daily bars from the Yahoo Finance v8 chart endpoint.
///
/// Transient failures (transport errors, timeouts, 429 and 5xx statuses) are
/// retried according to the adapter's [`RetryConfig`].
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    retry: RetryConfig,
    timeout_ms: u64,
    base_url: String,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            retry: RetryConfig::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Upstream ticker for `symbol`: domestic codes get an exchange suffix.
    pub fn provider_ticker(symbol: &Symbol, segment: MarketSegment) -> String {
        let raw = symbol.as_str();
        if !symbol.is_domestic_code() {
            return raw.to_owned();
        }
        match segment {
            MarketSegment::Kospi => format!("{raw}.KS"),
            MarketSegment::Kosdaq => format!("{raw}.KQ"),
            MarketSegment::International | MarketSegment::Index => raw.to_owned(),
        }
    }

    fn chart_url(&self, req: &BarsRequest) -> String {
        let ticker = Self::provider_ticker(&req.symbol, req.segment);
        // period2 is exclusive upstream; push it past the last requested day.
        let end = req.end.next_day().unwrap_or(req.end);
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url,
            urlencoding::encode(&ticker),
            unix_midnight(req.start),
            unix_midnight(end),
        )
    }

    async fn fetch_once(&self, req: &BarsRequest, url: &str) -> Result<BarSeries, SourceError> {
        let request = HttpRequest::get(url)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|error| {
            if error.is_timeout() {
                SourceError::unavailable(format!(
                    "yahoo request timed out after {} ms: {}",
                    self.timeout_ms,
                    error.message()
                ))
            } else {
                SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
            }
        })?;

        match response.status {
            404 => return Ok(BarSeries::empty(req.symbol.clone())),
            429 => return Err(SourceError::rate_limited("yahoo rate limit exceeded")),
            _ if !response.is_success() => {
                return Err(SourceError::unavailable(format!(
                    "yahoo returned status {}",
                    response.status
                )))
            }
            _ => {}
        }

        parse_chart(&req.symbol, &response.body)
    }
}

impl TimeSeriesProvider for YahooAdapter {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn fetch<'a>(
        &'a self,
        req: BarsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<BarSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let url = self.chart_url(&req);
            debug!(
                target: "quotecache::yahoo",
                symbol = %req.symbol,
                segment = %req.segment,
                start = %req.start,
                end = %req.end,
                "fetching daily chart"
            );
            let label = format!("yahoo chart {}", req.symbol);
            self.retry
                .run(&label, || self.fetch_once(&req, &url))
                .await
        })
    }
}

fn unix_midnight(date: Date) -> i64 {
    date.with_time(Time::MIDNIGHT).assume_utc().unix_timestamp()
}

fn parse_chart(symbol: &Symbol, body: &str) -> Result<BarSeries, SourceError> {
    let chart: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::invalid_response(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = chart.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Ok(BarSeries::empty(symbol.clone()));
        }
        return Err(SourceError::invalid_response(format!(
            "yahoo chart error {}: {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let Some(result) = chart.chart.result.and_then(|mut results| {
        if results.is_empty() {
            None
        } else {
            Some(results.swap_remove(0))
        }
    }) else {
        return Ok(BarSeries::empty(symbol.clone()));
    };

    let (Some(timestamps), Some(quote)) = (result.timestamp, result.indicators.quote.first())
    else {
        return Ok(BarSeries::empty(symbol.clone()));
    };

    let offset = Duration::seconds(result.meta.and_then(|meta| meta.gmtoffset).unwrap_or(0));

    let mut by_date = BTreeMap::new();
    for (i, &ts) in timestamps.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            price_at(&quote.open, i),
            price_at(&quote.high, i),
            price_at(&quote.low, i),
            price_at(&quote.close, i),
        ) else {
            continue;
        };

        let date = OffsetDateTime::from_unix_timestamp(ts)
            .map_err(|e| SourceError::invalid_response(format!("invalid chart timestamp: {e}")))?
            .saturating_add(offset)
            .date();
        let volume = quote
            .volume
            .get(i)
            .copied()
            .flatten()
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(0);

        match DailyBar::new(date, open, high, low, close, volume) {
            Ok(bar) => {
                by_date.insert(date, bar);
            }
            Err(error) => {
                debug!(target: "quotecache::yahoo", %symbol, %date, %error, "skipping chart row");
            }
        }
    }

    Ok(BarSeries::new(symbol.clone(), by_date.into_values().collect()))
}

fn price_at(values: &[Option<f64>], index: usize) -> Option<Decimal> {
    let value = values.get(index).copied().flatten()?;
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value).map(|price| price.round_dp(PRICE_DECIMALS))
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}
