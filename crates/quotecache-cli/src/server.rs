//! Axum router and HTTP handlers for `quotecache serve`.
//!
//! [`build_router`] wires the routes to a shared [`QuoteResolver`]; [`serve`]
//! adds CORS and request tracing and binds the listener. Tests drive the bare
//! router in-process.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use quotecache_core::{
    CacheStore, CatalogEntry, MarketSegment, Quote, QuoteError, QuoteKey, QuoteResolver,
    ServiceConfig, ValidationError,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Level};

use crate::error::CliError;

const SERVICE_NAME: &str = "quotecache";
const DEFAULT_LEADERS_LIMIT: usize = 50;

type SharedResolver = Arc<QuoteResolver>;

/// Build the application router. Middleware is attached by [`serve`].
pub fn build_router(resolver: SharedResolver) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stock/price/:symbol", get(stock_price))
        .route("/api/stocks/popular", get(popular_domestic))
        .route("/api/stocks/us", get(popular_international))
        .route("/api/stocks/kospi/all", get(kospi_leaders))
        .route("/api/market/:market", get(market_index))
        .route("/api/stock/search", get(search))
        .route("/api/stock/list", get(list))
        .with_state(resolver)
}

/// Serve until ctrl-c.
pub async fn serve(config: &ServiceConfig, resolver: SharedResolver) -> Result<(), CliError> {
    let sweeper = spawn_cache_sweeper(resolver.cache().clone());
    let app = build_router(resolver)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&config.allowed_origins));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("quotecache listening on http://{}", config.bind_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    served?;
    Ok(())
}

/// Drop expired quotes once per TTL period. Nothing runs when caching is off.
fn spawn_cache_sweeper(cache: CacheStore<QuoteKey, Quote>) -> Option<JoinHandle<()>> {
    if cache.is_disabled() {
        return None;
    }
    let period = cache.default_ttl();
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            cache.clear_expired();
            debug!(target: "quotecache::cache", "expired entries cleared");
        }
    }))
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

/// CORS restricted to the configured origins.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET])
        .allow_headers(tower_http::cors::Any)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

/// JSON error response: `{"error": ..., "code": ...}`.
#[derive(Debug)]
pub struct ApiError(QuoteError);

impl From<QuoteError> for ApiError {
    fn from(error: QuoteError) -> Self {
        Self(error)
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self(QuoteError::Validation(error))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            QuoteError::Validation(_) => StatusCode::BAD_REQUEST,
            QuoteError::NotFound { .. } => StatusCode::NOT_FOUND,
            QuoteError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        let message = match &self.0 {
            QuoteError::Upstream(source) => {
                warn!(code = source.code(), error = %source, "upstream failure");
                String::from("quote data is temporarily unavailable")
            }
            other => other.to_string(),
        };
        (
            status,
            Json(ErrorBody {
                error: message,
                code: self.0.code(),
            }),
        )
            .into_response()
    }
}

fn query_error(rejection: QueryRejection) -> ApiError {
    ApiError::from(ValidationError::InvalidQuery {
        reason: rejection.body_text(),
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
    })
}

#[derive(Debug, Deserialize)]
struct PriceParams {
    days: Option<u32>,
}

async fn stock_price(
    State(resolver): State<SharedResolver>,
    Path(symbol): Path<String>,
    params: Result<Query<PriceParams>, QueryRejection>,
) -> Result<Json<Arc<Quote>>, ApiError> {
    let Query(params) = params.map_err(query_error)?;
    Ok(Json(resolver.get_quote(&symbol, params.days).await?))
}

async fn popular_domestic(State(resolver): State<SharedResolver>) -> Json<Vec<Arc<Quote>>> {
    Json(resolver.popular_domestic().await)
}

async fn popular_international(State(resolver): State<SharedResolver>) -> Json<Vec<Arc<Quote>>> {
    Json(resolver.popular_international().await)
}

#[derive(Debug, Deserialize)]
struct LeadersParams {
    limit: Option<usize>,
}

async fn kospi_leaders(
    State(resolver): State<SharedResolver>,
    params: Result<Query<LeadersParams>, QueryRejection>,
) -> Result<Json<Vec<Arc<Quote>>>, ApiError> {
    let Query(params) = params.map_err(query_error)?;
    let limit = params.limit.unwrap_or(DEFAULT_LEADERS_LIMIT);
    Ok(Json(
        resolver.segment_leaders(MarketSegment::Kospi, limit).await,
    ))
}

async fn market_index(
    State(resolver): State<SharedResolver>,
    Path(market): Path<String>,
) -> Result<Json<Arc<Quote>>, ApiError> {
    Ok(Json(resolver.get_market_index(&market).await?))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search(
    State(resolver): State<SharedResolver>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError> {
    let Query(params) = params.map_err(query_error)?;
    let keyword = params.q.unwrap_or_default();
    Ok(Json(resolver.search_catalog(&keyword)?))
}

async fn list(State(resolver): State<SharedResolver>) -> Json<Vec<CatalogEntry>> {
    Json(resolver.list_catalog())
}
