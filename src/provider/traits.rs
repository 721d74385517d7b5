use crate::model::{
    CompanyInfo, FinancialStatements, HistoryRequest, NewsArticle, ProviderError, RawBar,
};

/// Upstream source of market data. Implementations own retries and timeouts;
/// the analysis core only sees the finished records.
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_history(&self, req: &HistoryRequest) -> Result<Vec<RawBar>, ProviderError>;
    async fn fetch_company_info(&self, symbol: &str) -> Result<CompanyInfo, ProviderError>;
    async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsArticle>, ProviderError>;
    async fn fetch_financials(&self, symbol: &str) -> Result<FinancialStatements, ProviderError>;
}
