//! Yahoo Finance payloads and their conversion into provider records.
//!
//! Yahoo has no official API; these structs only name the fields we read and
//! default everything else, so additive format changes do not break parsing.

use crate::model::{
    CompanyInfo, FinancialStatements, NewsArticle, ProviderError, RawBar, StatementPeriod,
};
use crate::utils::date_from_unix;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    description: String,
}

fn api_error(symbol: &str, err: ApiError) -> ProviderError {
    if err.code == "Not Found" {
        ProviderError::NotFound(symbol.to_string())
    } else {
        ProviderError::Api(format!("{}: {}", err.code, err.description))
    }
}

/// Yahoo wraps most numbers as `{"raw": 1.0, "fmt": "1.00"}`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(value: Option<RawValue>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// v8 chart
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Turns a chart response into raw bars.
///
/// Rows with every OHLCV value null are non-trading days and are dropped;
/// partially null rows are kept so the normalizer can reject them.
pub fn parse_chart(symbol: &str, body: &str) -> Result<Vec<RawBar>, ProviderError> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        return Err(api_error(symbol, err));
    }

    let Some(data) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let Some(timestamps) = data.timestamp else {
        // Yahoo omits timestamps when the range holds no trading days
        return Ok(Vec::new());
    };
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = data.meta.gmtoffset;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();

        if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none() {
            continue;
        }

        let date = date_from_unix(ts + offset)
            .ok_or_else(|| ProviderError::Parse(format!("invalid timestamp: {ts}")))?;

        bars.push(RawBar {
            date: Some(json!(date.to_string())),
            open: open.map(|v| json!(v)),
            high: high.map(|v| json!(v)),
            low: low.map(|v| json!(v)),
            close: close.map(|v| json!(v)),
            volume: volume.map(|v| json!(v)),
        });
    }

    Ok(bars)
}

// ---------------------------------------------------------------------------
// v10 quoteSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QuoteSummaryResult {
    price: Option<PriceModule>,
    summary_profile: Option<ProfileModule>,
    summary_detail: Option<DetailModule>,
    financial_data: Option<FinancialDataModule>,
    income_statement_history: Option<IncomeHistoryModule>,
    balance_sheet_history: Option<BalanceHistoryModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    short_name: Option<String>,
    long_name: Option<String>,
    regular_market_price: Option<RawValue>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileModule {
    sector: Option<String>,
    industry: Option<String>,
    country: Option<String>,
    website: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DetailModule {
    fifty_two_week_high: Option<RawValue>,
    fifty_two_week_low: Option<RawValue>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FinancialDataModule {
    current_price: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IncomeHistoryModule {
    income_statement_history: Vec<IncomeStatement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IncomeStatement {
    end_date: Option<RawValue>,
    total_revenue: Option<RawValue>,
    net_income: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BalanceHistoryModule {
    balance_sheet_statements: Vec<BalanceSheet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BalanceSheet {
    total_assets: Option<RawValue>,
    total_stockholder_equity: Option<RawValue>,
    total_current_assets: Option<RawValue>,
    total_current_liabilities: Option<RawValue>,
    short_long_term_debt: Option<RawValue>,
    long_term_debt: Option<RawValue>,
}

fn parse_quote_summary(symbol: &str, body: &str) -> Result<QuoteSummaryResult, ProviderError> {
    let response: QuoteSummaryResponse = serde_json::from_str(body)?;

    if let Some(err) = response.quote_summary.error {
        return Err(api_error(symbol, err));
    }

    response
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
}

pub fn parse_company_info(symbol: &str, body: &str) -> Result<CompanyInfo, ProviderError> {
    let result = parse_quote_summary(symbol, body)?;
    let price = result.price.unwrap_or_default();
    let profile = result.summary_profile.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let financial = result.financial_data.unwrap_or_default();

    Ok(CompanyInfo {
        symbol: symbol.to_string(),
        name: price.short_name.or(price.long_name),
        sector: profile.sector,
        industry: profile.industry,
        country: profile.country,
        website: profile.website,
        market_cap: raw(price.market_cap).or(raw(detail.market_cap)),
        current_price: raw(financial.current_price).or(raw(price.regular_market_price)),
        fifty_two_week_high: raw(detail.fifty_two_week_high),
        fifty_two_week_low: raw(detail.fifty_two_week_low),
    })
}

/// Merges income statements and balance sheets period by period, newest first.
pub fn parse_financials(symbol: &str, body: &str) -> Result<FinancialStatements, ProviderError> {
    let result = parse_quote_summary(symbol, body)?;
    let income = result
        .income_statement_history
        .map(|m| m.income_statement_history)
        .unwrap_or_default();
    let balance = result
        .balance_sheet_history
        .map(|m| m.balance_sheet_statements)
        .unwrap_or_default();

    let periods = income
        .iter()
        .enumerate()
        .map(|(i, stmt)| {
            let sheet = balance.get(i);
            let debt_parts = sheet
                .map(|s| [raw(s.short_long_term_debt), raw(s.long_term_debt)])
                .unwrap_or_default();
            let total_debt = if debt_parts.iter().all(Option::is_none) {
                None
            } else {
                Some(debt_parts.iter().flatten().sum())
            };

            StatementPeriod {
                end_date: raw(stmt.end_date).and_then(|ts| date_from_unix(ts as i64)),
                total_revenue: raw(stmt.total_revenue),
                net_income: raw(stmt.net_income),
                total_assets: sheet.and_then(|s| raw(s.total_assets)),
                total_equity: sheet.and_then(|s| raw(s.total_stockholder_equity)),
                current_assets: sheet.and_then(|s| raw(s.total_current_assets)),
                current_liabilities: sheet.and_then(|s| raw(s.total_current_liabilities)),
                total_debt,
            }
        })
        .collect();

    Ok(FinancialStatements { periods })
}

// ---------------------------------------------------------------------------
// v1 search (news)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNewsItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNewsItem {
    title: Option<String>,
    publisher: Option<String>,
    link: Option<String>,
    #[serde(default)]
    provider_publish_time: i64,
}

pub fn parse_news(body: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError> {
    let response: SearchResponse = serde_json::from_str(body)?;

    Ok(response
        .news
        .into_iter()
        .take(limit)
        .map(|item| NewsArticle {
            title: item.title.unwrap_or_else(|| "No title".into()),
            publisher: item.publisher.unwrap_or_else(|| "Unknown".into()),
            published: DateTime::from_timestamp(item.provider_publish_time, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            link: item.link.unwrap_or_else(|| "#".into()),
        })
        .collect())
}
