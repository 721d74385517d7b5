// HTTP handlers: validate, fetch, analyze, respond.
use crate::analyzer::{analyze_financials, AnalysisResult, Analyzer, FinancialAnalysis};
use crate::model::{
    CompanyInfo, HistoryRequest, NewsArticle, PriceBar, PriceSeries, StatementPeriod,
};
use crate::normalizer::normalize;
use crate::server::error::ApiError;
use crate::server::params::{validate_history, validate_symbol, HistoryParams, SymbolParams};
use crate::server::{AppState, ENDPOINTS};
use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub symbol: String,
    pub news_count: usize,
    pub news: Vec<NewsArticle>,
}

/// Reported statement periods, newest first.
#[derive(Debug, Serialize)]
pub struct FinancialsResponse {
    pub symbol: String,
    pub period_count: usize,
    pub periods: Vec<StatementPeriod>,
}

#[derive(Debug, Serialize)]
pub struct HistoricalData {
    pub symbol: String,
    pub period: String,
    pub data_count: usize,
    pub data: Vec<PriceBar>,
}

impl HistoricalData {
    fn new(req: &HistoryRequest, series: &PriceSeries) -> Self {
        Self {
            symbol: req.symbol.clone(),
            period: req.period(),
            data_count: series.len(),
            data: series.bars().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoricalAnalysis {
    pub symbol: String,
    pub period: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeHistoricalResponse {
    pub historical_data: HistoricalData,
    pub analysis: HistoricalAnalysis,
}

pub async fn index() -> Json<Value> {
    let endpoints: Vec<Value> = ENDPOINTS
        .iter()
        .map(|(method, path, description)| {
            json!({ "method": method, "path": path, "description": description })
        })
        .collect();

    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn company(
    State(state): State<AppState>,
    Query(params): Query<SymbolParams>,
) -> Result<Json<CompanyInfo>, ApiError> {
    let symbol = validate_symbol(params.symbol.as_deref())?;
    let info = state.provider.fetch_company_info(&symbol).await?;
    Ok(Json(info))
}

pub async fn news(
    State(state): State<AppState>,
    Query(params): Query<SymbolParams>,
) -> Result<Json<NewsResponse>, ApiError> {
    let symbol = validate_symbol(params.symbol.as_deref())?;
    let news = state.provider.fetch_news(&symbol).await?;
    Ok(Json(NewsResponse {
        symbol,
        news_count: news.len(),
        news,
    }))
}

pub async fn financial_statements(
    State(state): State<AppState>,
    Query(params): Query<SymbolParams>,
) -> Result<Json<FinancialsResponse>, ApiError> {
    let symbol = validate_symbol(params.symbol.as_deref())?;
    let statements = state.provider.fetch_financials(&symbol).await?;
    Ok(Json(FinancialsResponse {
        symbol,
        period_count: statements.periods.len(),
        periods: statements.periods,
    }))
}

/// Fetches and normalizes the bars for a validated request.
async fn load_series(state: &AppState, req: &HistoryRequest) -> Result<PriceSeries, ApiError> {
    let raw = state.provider.fetch_history(req).await?;
    let series = normalize(&raw)?;
    if series.is_empty() {
        info!("No bars for {} in {}", req.symbol, req.period());
    }
    Ok(series)
}

async fn historical(state: &AppState, params: &HistoryParams) -> Result<Json<HistoricalData>, ApiError> {
    let req = validate_history(params)?;
    let series = load_series(state, &req).await?;
    Ok(Json(HistoricalData::new(&req, &series)))
}

pub async fn historical_query(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoricalData>, ApiError> {
    historical(&state, &params).await
}

/// A missing or unparsable JSON body is treated as an empty one, so the
/// client gets the usual "required" messages.
pub async fn historical_json(
    State(state): State<AppState>,
    body: Option<Json<HistoryParams>>,
) -> Result<Json<HistoricalData>, ApiError> {
    let params = body.map(|Json(p)| p).unwrap_or_default();
    historical(&state, &params).await
}

pub async fn analyze_historical(
    State(state): State<AppState>,
    body: Option<Json<HistoryParams>>,
) -> Result<Json<AnalyzeHistoricalResponse>, ApiError> {
    let params = body.map(|Json(p)| p).unwrap_or_default();
    let req = validate_history(&params)?;
    let series = load_series(&state, &req).await?;

    let result = state.analyzer.analyze(&series);
    info!(
        "🔍 Analyzed {} bars for {}: {} insights, {} recommendations",
        series.len(),
        req.symbol,
        result.insights.len(),
        result.recommendations.len()
    );

    Ok(Json(AnalyzeHistoricalResponse {
        historical_data: HistoricalData::new(&req, &series),
        analysis: HistoricalAnalysis {
            symbol: req.symbol.clone(),
            period: req.period(),
            result,
        },
    }))
}

async fn financials(state: &AppState, params: &SymbolParams) -> Result<Json<FinancialAnalysis>, ApiError> {
    let symbol = validate_symbol(params.symbol.as_deref())?;
    let (company, statements) = futures::try_join!(
        state.provider.fetch_company_info(&symbol),
        state.provider.fetch_financials(&symbol),
    )?;
    Ok(Json(analyze_financials(&company, &statements)))
}

pub async fn analyze_financials_query(
    State(state): State<AppState>,
    Query(params): Query<SymbolParams>,
) -> Result<Json<FinancialAnalysis>, ApiError> {
    financials(&state, &params).await
}

pub async fn analyze_financials_json(
    State(state): State<AppState>,
    body: Option<Json<SymbolParams>>,
) -> Result<Json<FinancialAnalysis>, ApiError> {
    let params = body.map(|Json(p)| p).unwrap_or_default();
    financials(&state, &params).await
}
