// Analyzer module: aggregates submodules for different aspects of analysis.

pub mod financials;
pub mod insights;
pub mod market_indicators;
pub mod price_analysis;

// Re-export the main Analyzer implementation for ease of use.
pub use financials::{analyze_financials, FinancialAnalysis};
pub use price_analysis::{AnalysisResult, Analyzer, AnalyzerImpl};
