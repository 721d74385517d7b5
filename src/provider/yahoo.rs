use crate::config::ProviderConfig;
use crate::model::{
    CompanyInfo, FinancialStatements, HistoryRequest, NewsArticle, ProviderError, RawBar,
};
use crate::provider::response::{parse_chart, parse_company_info, parse_financials, parse_news};
use crate::provider::traits::MarketDataProvider;
use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const COMPANY_MODULES: &str = "price,summaryProfile,summaryDetail,financialData";
const FINANCIAL_MODULES: &str = "incomeStatementHistory,balanceSheetHistory";

/// Yahoo Finance client for the chart, quoteSummary and search endpoints.
pub struct YahooProvider {
    client: Client,
    config: ProviderConfig,
    /// quoteSummary wants a crumb tied to the session cookie kept in the client's jar.
    crumb: RwLock<Option<String>>,
}

impl YahooProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            config,
            crumb: RwLock::new(None),
        })
    }

    fn unix_midnight(date: NaiveDate) -> i64 {
        date.and_time(NaiveTime::MIN).and_utc().timestamp()
    }

    /// `period2` is exclusive; a range ending today is stretched one day so
    /// today's bar is included.
    fn period_end(end_date: NaiveDate, today: NaiveDate) -> NaiveDate {
        if end_date == today {
            end_date.succ_opt().unwrap_or(end_date)
        } else {
            end_date
        }
    }

    fn chart_url(&self, req: &HistoryRequest) -> String {
        self.chart_url_as_of(req, Utc::now().date_naive())
    }

    fn chart_url_as_of(&self, req: &HistoryRequest, today: NaiveDate) -> String {
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.config.chart_base_url,
            req.symbol,
            Self::unix_midnight(req.start_date),
            Self::unix_midnight(Self::period_end(req.end_date, today)),
        )
    }

    fn summary_url(&self, symbol: &str, modules: &str, crumb: &str) -> String {
        format!(
            "{}/v10/finance/quoteSummary/{}?modules={}&crumb={}",
            self.config.summary_base_url, symbol, modules, crumb
        )
    }

    fn search_url(&self, symbol: &str) -> String {
        format!(
            "{}/v1/finance/search?q={}&newsCount={}&quotesCount=0",
            self.config.chart_base_url, symbol, self.config.news_limit
        )
    }

    /// GETs a URL and returns status and body. Rate limiting is surfaced as an error
    /// right away; other statuses are left to the caller since Yahoo reports
    /// "not found" as a JSON body on a 404.
    async fn get(&self, url: &str) -> Result<(StatusCode, String), ProviderError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("⏳ Yahoo rate limit hit");
            return Err(ProviderError::Api("rate limited by Yahoo Finance".into()));
        }
        let body = response.text().await?;
        Ok((status, body))
    }

    async fn crumb(&self) -> Result<String, ProviderError> {
        if let Some(crumb) = self.crumb.read().await.clone() {
            return Ok(crumb);
        }
        self.refresh_crumb().await
    }

    async fn refresh_crumb(&self) -> Result<String, ProviderError> {
        info!("🔑 Refreshing Yahoo session crumb");
        // fc.yahoo.com answers 404 but still sets the session cookie
        if let Err(e) = self.client.get(&self.config.cookie_url).send().await {
            warn!("Cookie request failed: {}", e);
        }

        let url = format!("{}/v1/test/getcrumb", self.config.summary_base_url);
        let (status, body) = self.get(&url).await?;
        let crumb = body.trim();
        if !status.is_success() || crumb.is_empty() || crumb.contains(' ') || crumb.contains('<') {
            return Err(ProviderError::Api(format!(
                "failed to obtain Yahoo crumb (status {status})"
            )));
        }

        *self.crumb.write().await = Some(crumb.to_string());
        Ok(crumb.to_string())
    }

    /// Calls quoteSummary, renewing the crumb once if Yahoo rejects it.
    async fn quote_summary(&self, symbol: &str, modules: &str) -> Result<String, ProviderError> {
        let crumb = self.crumb().await?;
        let (status, body) = self.get(&self.summary_url(symbol, modules, &crumb)).await?;
        if status != StatusCode::UNAUTHORIZED {
            return Ok(body);
        }

        warn!("Crumb rejected for {}, retrying with a fresh one", symbol);
        *self.crumb.write().await = None;
        let crumb = self.refresh_crumb().await?;
        let (status, body) = self.get(&self.summary_url(symbol, modules, &crumb)).await?;
        if status == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Api("Yahoo rejected the session crumb".into()));
        }
        Ok(body)
    }
}

/// Parses a body, falling back to a status error when a failed response is not
/// the JSON error payload Yahoo usually sends.
fn parse_or_status<T>(
    status: StatusCode,
    parsed: Result<T, ProviderError>,
) -> Result<T, ProviderError> {
    match parsed {
        Err(ProviderError::Parse(_)) if !status.is_success() => Err(ProviderError::Api(format!(
            "Yahoo Finance returned status {status}"
        ))),
        other => other,
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_history(&self, req: &HistoryRequest) -> Result<Vec<RawBar>, ProviderError> {
        info!("📈 Fetching history for {} ({})", req.symbol, req.period());
        let (status, body) = self.get(&self.chart_url(req)).await?;
        let bars = parse_or_status(status, parse_chart(&req.symbol, &body))?;
        info!("Received {} bars for {}", bars.len(), req.symbol);
        Ok(bars)
    }

    async fn fetch_company_info(&self, symbol: &str) -> Result<CompanyInfo, ProviderError> {
        info!("🏢 Fetching company info for {}", symbol);
        let body = self.quote_summary(symbol, COMPANY_MODULES).await?;
        parse_company_info(symbol, &body)
    }

    async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsArticle>, ProviderError> {
        info!("📰 Fetching news for {}", symbol);
        let (status, body) = self.get(&self.search_url(symbol)).await?;
        parse_or_status(status, parse_news(&body, self.config.news_limit))
    }

    async fn fetch_financials(&self, symbol: &str) -> Result<FinancialStatements, ProviderError> {
        info!("📊 Fetching financial statements for {}", symbol);
        let body = self.quote_summary(symbol, FINANCIAL_MODULES).await?;
        parse_financials(symbol, &body)
    }
}
