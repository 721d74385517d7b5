// Request parameter parsing and validation
use crate::model::HistoryRequest;
use crate::server::error::ApiError;
use crate::utils::parse_date;
use serde::Deserialize;

const MAX_SYMBOL_LEN: usize = 15;

#[derive(Debug, Default, Deserialize)]
pub struct SymbolParams {
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Trims and upper-cases a ticker, rejecting anything outside `[A-Z0-9.^=-]`.
pub fn validate_symbol(symbol: Option<&str>) -> Result<String, ApiError> {
    let symbol = symbol.map(str::trim).unwrap_or_default();
    if symbol.is_empty() {
        return Err(ApiError::BadRequest("Symbol is required".into()));
    }

    let symbol = symbol.to_ascii_uppercase();
    let valid_chars = symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'));
    if symbol.len() > MAX_SYMBOL_LEN || !valid_chars {
        return Err(ApiError::BadRequest(format!("Invalid symbol: {symbol}")));
    }
    Ok(symbol)
}

pub fn validate_history(params: &HistoryParams) -> Result<HistoryRequest, ApiError> {
    let symbol = validate_symbol(params.symbol.as_deref())?;

    let (Some(start), Some(end)) = (
        params.start_date.as_deref().filter(|s| !s.trim().is_empty()),
        params.end_date.as_deref().filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Both start_date and end_date are required".into(),
        ));
    };

    let start_date = parse_date(start)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid start_date (expected YYYY-MM-DD): {start}")))?;
    let end_date = parse_date(end)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid end_date (expected YYYY-MM-DD): {end}")))?;

    if start_date >= end_date {
        return Err(ApiError::BadRequest("start_date must be before end_date".into()));
    }

    Ok(HistoryRequest {
        symbol,
        start_date,
        end_date,
    })
}
