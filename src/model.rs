// Core structs: PriceBar, PriceSeries, provider records and error types
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One trading day of a symbol, as produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars of one symbol, ascending by date. Built once per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Callers must hand in bars already sorted by date.
    pub(crate) fn from_sorted(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<u64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

/// A bar record as the provider hands it over: every field optional and loosely typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub open: Option<Value>,
    #[serde(default)]
    pub high: Option<Value>,
    #[serde(default)]
    pub low: Option<Value>,
    #[serde(default)]
    pub close: Option<Value>,
    #[serde(default)]
    pub volume: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl HistoryRequest {
    pub fn period(&self) -> String {
        format!("{} to {}", self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyInfo {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub market_cap: Option<f64>,
    pub current_price: Option<f64>,
    #[serde(rename = "52_week_high")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(rename = "52_week_low")]
    pub fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsArticle {
    pub title: String,
    pub publisher: String,
    pub published: String,
    pub link: String,
}

/// One reporting period of the income statement and balance sheet, newest first in
/// [`FinancialStatements::periods`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatementPeriod {
    pub end_date: Option<NaiveDate>,
    pub total_revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_equity: Option<f64>,
    pub current_assets: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub total_debt: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialStatements {
    pub periods: Vec<StatementPeriod>,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("malformed bar #{index}: {reason}")]
pub struct MalformedDataError {
    pub index: usize,
    pub reason: String,
}

impl MalformedDataError {
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider error: {0}")]
    Api(String),

    #[error("symbol not found: {0}")]
    NotFound(String),

    #[error("unexpected provider payload: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Parse(e.to_string())
    }
}
