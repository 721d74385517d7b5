pub mod error;
pub mod handlers;
pub mod params;

use crate::analyzer::AnalyzerImpl;
use crate::provider::MarketDataProvider;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Method, path and description of every route, served by `/` and logged at startup.
pub const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/", "Service description and endpoint list"),
    ("GET", "/health", "Liveness probe"),
    ("GET", "/company?symbol=SYMBOL", "Company profile, sector, industry and key metrics"),
    ("GET", "/news?symbol=SYMBOL", "Latest company news articles"),
    ("GET", "/financials?symbol=SYMBOL", "Reported income statement and balance sheet periods"),
    (
        "GET",
        "/historical?symbol=SYMBOL&start_date=YYYY-MM-DD&end_date=YYYY-MM-DD",
        "Daily price history",
    ),
    ("POST", "/historical", "Daily price history (JSON body)"),
    ("GET", "/analyze-financials?symbol=SYMBOL", "Financial statement ratios and recommendations"),
    ("POST", "/analyze-financials", "Financial statement analysis (JSON body)"),
    ("POST", "/analyze-historical", "Price history with trend analysis and insights"),
];

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MarketDataProvider>,
    pub analyzer: Arc<AnalyzerImpl>,
}

impl AppState {
    pub fn new(provider: Arc<dyn MarketDataProvider>, analyzer: AnalyzerImpl) -> Self {
        Self {
            provider,
            analyzer: Arc::new(analyzer),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/company", get(handlers::company))
        .route("/news", get(handlers::news))
        .route("/financials", get(handlers::financial_statements))
        .route(
            "/historical",
            get(handlers::historical_query).post(handlers::historical_json),
        )
        .route(
            "/analyze-financials",
            get(handlers::analyze_financials_query).post(handlers::analyze_financials_json),
        )
        .route("/analyze-historical", post(handlers::analyze_historical))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
