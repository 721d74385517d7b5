use crate::model::{CompanyInfo, FinancialStatements, StatementPeriod};
use crate::utils::round2;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialMetrics {
    pub net_profit_margin: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialTrends {
    pub revenue_growth: Option<f64>,
    pub net_income_growth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialAnalysis {
    pub symbol: String,
    pub company_name: Option<String>,
    pub current_price: Option<f64>,
    pub metrics: FinancialMetrics,
    pub trends: FinancialTrends,
    pub recommendations: Vec<String>,
    pub error_details: Option<String>,
}

/// A metric with one message above `high` and another below `low`.
struct MetricRule {
    metric: fn(&FinancialMetrics) -> Option<f64>,
    high: f64,
    high_message: &'static str,
    low: f64,
    low_message: &'static str,
}

const METRIC_RULES: &[MetricRule] = &[
    MetricRule {
        metric: |m| m.return_on_equity,
        high: 15.0,
        high_message: "Strong ROE indicates efficient use of shareholder equity",
        low: 5.0,
        low_message: "Low ROE may indicate inefficient use of capital",
    },
    MetricRule {
        metric: |m| m.net_profit_margin,
        high: 20.0,
        high_message: "High profit margin indicates strong pricing power",
        low: 5.0,
        low_message: "Low profit margin may indicate operational inefficiencies",
    },
    MetricRule {
        metric: |m| m.current_ratio,
        high: 2.0,
        high_message: "Strong liquidity position",
        low: 1.0,
        low_message: "Potential liquidity concerns",
    },
    MetricRule {
        metric: |m| m.debt_to_equity,
        high: 2.0,
        high_message: "High debt levels may increase financial risk",
        low: 0.5,
        low_message: "Conservative debt levels",
    },
];

/// Ratio analysis on the latest reporting period, with year-over-year trends
/// when a previous period is available.
pub fn analyze_financials(company: &CompanyInfo, statements: &FinancialStatements) -> FinancialAnalysis {
    let mut analysis = FinancialAnalysis {
        symbol: company.symbol.clone(),
        company_name: company.name.clone(),
        current_price: company.current_price,
        metrics: FinancialMetrics::default(),
        trends: FinancialTrends::default(),
        recommendations: Vec::new(),
        error_details: None,
    };

    let latest = match statements.periods.first() {
        Some(p) if p.total_revenue.is_some() || p.net_income.is_some() => p,
        _ => {
            analysis.error_details = Some("Insufficient financial data available".into());
            return analysis;
        }
    };

    analysis.metrics = calculate_metrics(latest);
    if let Some(previous) = statements.periods.get(1) {
        analysis.trends = calculate_trends(latest, previous);
    }
    analysis.recommendations = recommend(&analysis.metrics);
    analysis
}

fn calculate_metrics(p: &StatementPeriod) -> FinancialMetrics {
    let percent_of = |num: Option<f64>, den: Option<f64>| ratio(num, den).map(|r| round2(r * 100.0));

    FinancialMetrics {
        net_profit_margin: percent_of(p.net_income, p.total_revenue),
        return_on_assets: percent_of(p.net_income, p.total_assets),
        return_on_equity: percent_of(p.net_income, p.total_equity),
        current_ratio: ratio(p.current_assets, p.current_liabilities).map(round2),
        debt_to_equity: ratio(p.total_debt, p.total_equity).map(round2),
    }
}

fn calculate_trends(latest: &StatementPeriod, previous: &StatementPeriod) -> FinancialTrends {
    FinancialTrends {
        revenue_growth: growth(latest.total_revenue, previous.total_revenue),
        net_income_growth: growth(latest.net_income, previous.net_income),
    }
}

/// `num / den`, only for a positive denominator.
fn ratio(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    match (num, den) {
        (Some(n), Some(d)) if d > 0.0 => Some(n / d),
        _ => None,
    }
}

fn growth(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(c), Some(p)) if p > 0.0 => Some(round2((c - p) / p * 100.0)),
        _ => None,
    }
}

fn recommend(metrics: &FinancialMetrics) -> Vec<String> {
    METRIC_RULES
        .iter()
        .filter_map(|rule| {
            let value = (rule.metric)(metrics)?;
            if value > rule.high {
                Some(rule.high_message.to_string())
            } else if value < rule.low {
                Some(rule.low_message.to_string())
            } else {
                None
            }
        })
        .collect()
}
