use crate::analyzer::insights::generate_insights;
use crate::analyzer::market_indicators::{MarketAnalyzer, VolumeTrend};
use crate::config::AnalysisConfig;
use crate::model::PriceSeries;
use crate::utils::round2;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Price statistics over the whole series. Every field is `None` for an empty series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub latest_price: Option<f64>,
    pub price_change: Option<f64>,
    pub price_change_percent: Option<f64>,
    pub highest_price: Option<f64>,
    pub lowest_price: Option<f64>,
    pub average_price: Option<f64>,
    pub volatility: Option<f64>,
}

/// A simple moving average together with the window it was computed over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmaReading {
    pub window: usize,
    pub value: Option<f64>,
}

/// Moving averages for the configured short, medium and long windows.
///
/// Serialized as `sma_<window>` keys, e.g. `sma_20`.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalIndicators {
    pub short: SmaReading,
    pub medium: SmaReading,
    pub long: SmaReading,
}

impl TechnicalIndicators {
    pub fn readings(&self) -> [SmaReading; 3] {
        [self.short, self.medium, self.long]
    }

    /// Looks up the average for a window, if that window is configured.
    #[cfg(test)]
    pub fn sma(&self, window: usize) -> Option<f64> {
        self.readings()
            .into_iter()
            .find(|r| r.window == window)
            .and_then(|r| r.value)
    }
}

impl Serialize for TechnicalIndicators {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        for reading in self.readings() {
            map.serialize_entry(&format!("sma_{}", reading.window), &reading.value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VolumeAnalysis {
    pub average_volume: Option<u64>,
    pub latest_volume: Option<u64>,
    pub volume_trend: Option<VolumeTrend>,
}

/// Everything derived from one price series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub summary: AnalysisSummary,
    pub technical_indicators: TechnicalIndicators,
    pub volume_analysis: VolumeAnalysis,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Trait defining the interface for a price series analyzer.
pub trait Analyzer {
    fn calculate_summary(&self, series: &PriceSeries) -> AnalysisSummary;
    fn calculate_indicators(&self, series: &PriceSeries) -> TechnicalIndicators;
    fn analyze_volume(&self, series: &PriceSeries) -> VolumeAnalysis;
    /// Runs the full pipeline: summary, indicators, volume, then insights.
    fn analyze(&self, series: &PriceSeries) -> AnalysisResult;
}

/// Implementation of the price series analyzer.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerImpl {
    config: AnalysisConfig,
}

impl AnalyzerImpl {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }
}

impl Analyzer for AnalyzerImpl {
    fn calculate_summary(&self, series: &PriceSeries) -> AnalysisSummary {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return AnalysisSummary::default();
        };

        let closes = series.closes();
        let price_change = last.close - first.close;
        let price_change_percent = if first.close == 0.0 {
            None
        } else {
            Some(price_change / first.close * 100.0)
        };
        let highest = series.bars().iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lowest = series.bars().iter().map(|b| b.low).fold(f64::MAX, f64::min);

        AnalysisSummary {
            latest_price: Some(round2(last.close)),
            price_change: Some(round2(price_change)),
            price_change_percent: price_change_percent.map(round2),
            highest_price: Some(round2(highest)),
            lowest_price: Some(round2(lowest)),
            average_price: MarketAnalyzer::mean(&closes).map(round2),
            volatility: MarketAnalyzer::volatility(&closes).map(round2),
        }
    }

    fn calculate_indicators(&self, series: &PriceSeries) -> TechnicalIndicators {
        let closes = series.closes();
        let windows = self.config.sma_windows;
        let reading = |window: usize| SmaReading {
            window,
            value: MarketAnalyzer::simple_moving_average(&closes, window).map(round2),
        };

        TechnicalIndicators {
            short: reading(windows.short),
            medium: reading(windows.medium),
            long: reading(windows.long),
        }
    }

    fn analyze_volume(&self, series: &PriceSeries) -> VolumeAnalysis {
        let Some(last) = series.last() else {
            return VolumeAnalysis::default();
        };

        let volumes = series.volumes();
        let total: f64 = volumes.iter().map(|&v| v as f64).sum();
        let average = (total / volumes.len() as f64).round() as u64;

        VolumeAnalysis {
            average_volume: Some(average),
            latest_volume: Some(last.volume),
            volume_trend: Some(MarketAnalyzer::volume_trend(
                &volumes,
                self.config.volume_trend_window,
                self.config.volume_trend_threshold_percent,
            )),
        }
    }

    fn analyze(&self, series: &PriceSeries) -> AnalysisResult {
        let summary = self.calculate_summary(series);
        let technical_indicators = self.calculate_indicators(series);
        let volume_analysis = self.analyze_volume(series);

        let generated =
            generate_insights(&summary, &technical_indicators, &volume_analysis, &self.config);

        AnalysisResult {
            summary,
            technical_indicators,
            volume_analysis,
            insights: generated.insights,
            recommendations: generated.recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawBar;
    use crate::normalizer::normalize;
    use chrono::{Duration, NaiveDate};
    use serde_json::json;

    fn series_from(closes: &[f64], volumes: &[u64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let raw: Vec<RawBar> = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| RawBar {
                date: Some(json!((start + Duration::days(i as i64)).to_string())),
                open: Some(json!(close)),
                high: Some(json!(close + 2.0)),
                low: Some(json!(close - 3.0)),
                close: Some(json!(close)),
                volume: Some(json!(volume)),
            })
            .collect();
        normalize(&raw).unwrap()
    }

    fn analyzer() -> AnalyzerImpl {
        AnalyzerImpl::new(AnalysisConfig::default())
    }

    #[test]
    fn summary_for_five_day_series() {
        let series = series_from(&[100.0, 102.0, 101.0, 105.0, 110.0], &[1_000; 5]);
        let summary = analyzer().calculate_summary(&series);

        assert_eq!(summary.latest_price, Some(110.0));
        assert_eq!(summary.price_change, Some(10.0));
        assert_eq!(summary.price_change_percent, Some(10.0));
        // high/low come from the high and low fields, not the closes
        assert_eq!(summary.highest_price, Some(112.0));
        assert_eq!(summary.lowest_price, Some(97.0));
        assert_eq!(summary.average_price, Some(103.6));
        assert!(summary.volatility.unwrap() > 0.0);
    }

    #[test]
    fn constant_series_is_flat() {
        let series = series_from(&[50.0; 4], &[700; 4]);
        let result = analyzer().analyze(&series);

        assert_eq!(result.summary.volatility, Some(0.0));
        assert_eq!(result.summary.price_change_percent, Some(0.0));
        assert_eq!(result.volume_analysis.volume_trend, Some(VolumeTrend::Stable));
        assert_eq!(result.volume_analysis.average_volume, Some(700));
    }

    #[test]
    fn empty_series_yields_all_null_result() {
        let result = analyzer().analyze(&PriceSeries::default());

        assert_eq!(result.summary, AnalysisSummary::default());
        assert_eq!(result.volume_analysis, VolumeAnalysis::default());
        assert!(result.technical_indicators.readings().iter().all(|r| r.value.is_none()));
        assert!(result.insights.is_empty());
        assert!(result.recommendations.is_empty());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["summary"]["latest_price"], serde_json::Value::Null);
        assert_eq!(json["technical_indicators"]["sma_200"], serde_json::Value::Null);
        assert_eq!(json["volume_analysis"]["volume_trend"], serde_json::Value::Null);
    }

    #[test]
    fn sma_20_requires_twenty_bars() {
        let closes: Vec<f64> = (10..=28).map(f64::from).collect();
        let short = series_from(&closes, &[1; 19]);
        assert_eq!(analyzer().calculate_indicators(&short).sma(20), None);

        let closes: Vec<f64> = (10..=30).map(f64::from).collect();
        let enough = series_from(&closes, &[1; 21]);
        let indicators = analyzer().calculate_indicators(&enough);
        // mean of 11..=30
        assert_eq!(indicators.sma(20), Some(20.5));
        assert_eq!(indicators.sma(50), None);
    }

    #[test]
    fn rising_series_with_rising_volume() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let volumes: Vec<u64> = (0..25)
            .map(|i| if i < 13 { 1_000 } else { 1_000 + 200 * (i - 12) })
            .collect();
        let result = analyzer().analyze(&series_from(&closes, &volumes));

        assert!(result.technical_indicators.sma(20).is_some());
        assert_eq!(result.volume_analysis.volume_trend, Some(VolumeTrend::Increasing));
        assert!(
            result
                .insights
                .iter()
                .any(|i| i.contains("upward") || i.contains("Bullish"))
        );
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn latest_price_ignores_input_order() {
        let raw = vec![
            RawBar {
                date: Some(json!("2024-02-03")),
                open: Some(json!(9.0)),
                high: Some(json!(10.0)),
                low: Some(json!(8.0)),
                close: Some(json!(9.5)),
                volume: Some(json!(10)),
            },
            RawBar {
                date: Some(json!("2024-02-01")),
                open: Some(json!(7.0)),
                high: Some(json!(8.0)),
                low: Some(json!(6.0)),
                close: Some(json!(7.5)),
                volume: Some(json!(10)),
            },
        ];
        let summary = analyzer().calculate_summary(&normalize(&raw).unwrap());
        assert_eq!(summary.latest_price, Some(9.5));
        assert_eq!(summary.price_change, Some(2.0));
    }

    #[test]
    fn analyze_is_idempotent() {
        let series = series_from(&[10.0, 12.0, 11.0, 13.0, 9.0, 14.0], &[5, 6, 7, 8, 9, 10]);
        let a = analyzer();
        assert_eq!(a.analyze(&series), a.analyze(&series));
    }

    #[test]
    fn indicator_keys_follow_configured_windows() {
        let mut config = AnalysisConfig::default();
        config.sma_windows.short = 5;
        let series = series_from(&[10.0, 11.0, 12.0, 13.0, 14.0], &[1; 5]);
        let indicators = AnalyzerImpl::new(config).calculate_indicators(&series);

        let json = serde_json::to_value(&indicators).unwrap();
        assert_eq!(json["sma_5"], json!(12.0));
        assert!(json.get("sma_20").is_none());
        assert_eq!(json["sma_50"], serde_json::Value::Null);
    }
}
