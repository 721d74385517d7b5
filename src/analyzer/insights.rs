// Threshold rules turning analysis numbers into insights and recommendations.
use crate::analyzer::market_indicators::VolumeTrend;
use crate::analyzer::price_analysis::{AnalysisSummary, TechnicalIndicators, VolumeAnalysis};
use crate::config::AnalysisConfig;

/// What an insight rule observed; recommendation rules match on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    UpTrend,
    DownTrend,
    Sideways,
    HighVolatility,
    LowVolatility,
    BullishCrossover,
    BearishCrossover,
    RisingVolume,
    FallingVolume,
    SteadyVolume,
    KeyLevels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub signal: Signal,
    pub message: String,
}

/// Read-only view shared by all insight rules.
pub struct InsightContext<'a> {
    pub summary: &'a AnalysisSummary,
    pub indicators: &'a TechnicalIndicators,
    pub volume: &'a VolumeAnalysis,
    pub config: &'a AnalysisConfig,
}

type InsightRule = fn(&InsightContext) -> Option<Insight>;

/// Evaluated in this order, each at most once.
const INSIGHT_RULES: &[InsightRule] = &[
    price_trend,
    volatility,
    sma_crossover,
    volume_interest,
    key_levels,
];

struct RecommendationRule {
    /// Every one of these signals must be present.
    all: &'static [Signal],
    /// At least one of these must be present, unless empty.
    any: &'static [Signal],
    message: &'static str,
}

impl RecommendationRule {
    fn matches(&self, signals: &[Signal]) -> bool {
        self.all.iter().all(|s| signals.contains(s))
            && (self.any.is_empty() || self.any.iter().any(|s| signals.contains(s)))
    }
}

const RECOMMENDATION_RULES: &[RecommendationRule] = &[
    RecommendationRule {
        all: &[Signal::UpTrend, Signal::RisingVolume],
        any: &[],
        message: "Consider monitoring for continuation: the advance is backed by rising volume",
    },
    RecommendationRule {
        all: &[Signal::DownTrend, Signal::RisingVolume],
        any: &[],
        message: "Selling pressure is building; consider reducing exposure or hedging",
    },
    RecommendationRule {
        all: &[Signal::UpTrend, Signal::BullishCrossover],
        any: &[],
        message: "Consider long positions with appropriate risk management",
    },
    RecommendationRule {
        all: &[Signal::DownTrend, Signal::BearishCrossover],
        any: &[],
        message: "Consider protective stops while price and moving averages point lower",
    },
    RecommendationRule {
        all: &[Signal::HighVolatility],
        any: &[Signal::UpTrend, Signal::DownTrend],
        message: "Use tighter stop-loss orders due to increased price volatility",
    },
    RecommendationRule {
        all: &[Signal::Sideways, Signal::LowVolatility],
        any: &[],
        message: "Range-bound trading; consider waiting for a breakout before adding exposure",
    },
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedInsights {
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

pub fn generate_insights(
    summary: &AnalysisSummary,
    indicators: &TechnicalIndicators,
    volume: &VolumeAnalysis,
    config: &AnalysisConfig,
) -> GeneratedInsights {
    let ctx = InsightContext {
        summary,
        indicators,
        volume,
        config,
    };

    let found: Vec<Insight> = INSIGHT_RULES.iter().filter_map(|rule| rule(&ctx)).collect();
    let signals: Vec<Signal> = found.iter().map(|i| i.signal).collect();

    let recommendations = RECOMMENDATION_RULES
        .iter()
        .filter(|rule| rule.matches(&signals))
        .map(|rule| rule.message.to_string())
        .collect();

    GeneratedInsights {
        insights: found.into_iter().map(|i| i.message).collect(),
        recommendations,
    }
}

fn price_trend(ctx: &InsightContext) -> Option<Insight> {
    let pct = ctx.summary.price_change_percent?;
    let threshold = ctx.config.trend_threshold_percent;

    let insight = if pct > threshold {
        Insight {
            signal: Signal::UpTrend,
            message: format!("Strong upward trend: price rose {pct:.2}% over the period"),
        }
    } else if pct < -threshold {
        Insight {
            signal: Signal::DownTrend,
            message: format!(
                "Strong downward trend: price fell {:.2}% over the period",
                pct.abs()
            ),
        }
    } else {
        Insight {
            signal: Signal::Sideways,
            message: format!("Relatively stable: price moved {pct:+.2}% over the period"),
        }
    };
    Some(insight)
}

fn volatility(ctx: &InsightContext) -> Option<Insight> {
    let vol = ctx.summary.volatility?;

    if vol > ctx.config.volatility_high_threshold {
        Some(Insight {
            signal: Signal::HighVolatility,
            message: format!("High volatility: daily returns swing {vol:.2}% on average"),
        })
    } else if vol < ctx.config.volatility_low_threshold {
        Some(Insight {
            signal: Signal::LowVolatility,
            message: format!("Low volatility: daily returns vary only {vol:.2}% on average"),
        })
    } else {
        None
    }
}

fn sma_crossover(ctx: &InsightContext) -> Option<Insight> {
    let short = ctx.indicators.short;
    let medium = ctx.indicators.medium;
    let (s, m) = (short.value?, medium.value?);

    if s > m {
        Some(Insight {
            signal: Signal::BullishCrossover,
            message: format!(
                "Bullish signal: {}-day SMA ({s:.2}) is above the {}-day SMA ({m:.2})",
                short.window, medium.window
            ),
        })
    } else if s < m {
        Some(Insight {
            signal: Signal::BearishCrossover,
            message: format!(
                "Bearish signal: {}-day SMA ({s:.2}) is below the {}-day SMA ({m:.2})",
                short.window, medium.window
            ),
        })
    } else {
        None
    }
}

fn volume_interest(ctx: &InsightContext) -> Option<Insight> {
    let insight = match ctx.volume.volume_trend? {
        VolumeTrend::Increasing => Insight {
            signal: Signal::RisingVolume,
            message: "Increasing interest: recent trading volume is above the prior window".into(),
        },
        VolumeTrend::Decreasing => Insight {
            signal: Signal::FallingVolume,
            message: "Decreasing interest: recent trading volume is below the prior window".into(),
        },
        VolumeTrend::Stable => Insight {
            signal: Signal::SteadyVolume,
            message: "Steady interest: trading volume is roughly unchanged".into(),
        },
    };
    Some(insight)
}

fn key_levels(ctx: &InsightContext) -> Option<Insight> {
    let support = ctx.summary.lowest_price?;
    let resistance = ctx.summary.highest_price?;
    Some(Insight {
        signal: Signal::KeyLevels,
        message: format!("Key levels: support at ${support:.2}, resistance at ${resistance:.2}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::price_analysis::SmaReading;

    fn indicators(short: Option<f64>, medium: Option<f64>) -> TechnicalIndicators {
        TechnicalIndicators {
            short: SmaReading { window: 20, value: short },
            medium: SmaReading { window: 50, value: medium },
            long: SmaReading { window: 200, value: None },
        }
    }

    fn summary(pct: f64, vol: f64) -> AnalysisSummary {
        AnalysisSummary {
            latest_price: Some(100.0),
            price_change: Some(pct),
            price_change_percent: Some(pct),
            highest_price: Some(120.0),
            lowest_price: Some(80.0),
            average_price: Some(100.0),
            volatility: Some(vol),
        }
    }

    fn volume(trend: VolumeTrend) -> VolumeAnalysis {
        VolumeAnalysis {
            average_volume: Some(1_000),
            latest_volume: Some(1_000),
            volume_trend: Some(trend),
        }
    }

    fn run(s: &AnalysisSummary, i: &TechnicalIndicators, v: &VolumeAnalysis) -> GeneratedInsights {
        generate_insights(s, i, v, &AnalysisConfig::default())
    }

    #[test]
    fn bullish_setup_emits_insights_in_rule_order() {
        let out = run(
            &summary(12.0, 2.0),
            &indicators(Some(110.0), Some(100.0)),
            &volume(VolumeTrend::Increasing),
        );

        assert_eq!(out.insights.len(), 4);
        assert!(out.insights[0].starts_with("Strong upward trend"));
        assert!(out.insights[1].starts_with("Bullish signal"));
        assert!(out.insights[2].starts_with("Increasing interest"));
        assert!(out.insights[3].starts_with("Key levels"));
        assert_eq!(
            out.recommendations,
            vec![
                RECOMMENDATION_RULES[0].message.to_string(),
                RECOMMENDATION_RULES[2].message.to_string(),
            ]
        );
    }

    #[test]
    fn bearish_and_volatile() {
        let out = run(
            &summary(-8.0, 4.5),
            &indicators(Some(90.0), Some(100.0)),
            &volume(VolumeTrend::Increasing),
        );

        assert!(out.insights[0].contains("fell 8.00%"));
        assert!(out.insights[1].starts_with("High volatility"));
        assert!(out.insights[2].starts_with("Bearish signal"));
        assert_eq!(out.recommendations.len(), 3);
        assert!(out.recommendations[0].starts_with("Selling pressure"));
        assert!(out.recommendations[2].starts_with("Use tighter stop-loss"));
    }

    #[test]
    fn thresholds_are_strict() {
        let out = run(&summary(5.0, 3.0), &indicators(None, None), &volume(VolumeTrend::Stable));
        assert!(out.insights[0].starts_with("Relatively stable"));
        // 3.0 is neither above the high nor below the low threshold
        assert!(!out.insights.iter().any(|i| i.contains("volatility")));
    }

    #[test]
    fn quiet_market_suggests_waiting() {
        let out = run(&summary(0.5, 0.4), &indicators(None, None), &volume(VolumeTrend::Stable));
        assert!(out.insights.iter().any(|i| i.starts_with("Low volatility")));
        assert!(out.insights.iter().any(|i| i.starts_with("Steady interest")));
        assert_eq!(out.recommendations.len(), 1);
        assert!(out.recommendations[0].starts_with("Range-bound"));
    }

    #[test]
    fn missing_inputs_produce_nothing() {
        let out = run(
            &AnalysisSummary::default(),
            &indicators(None, None),
            &VolumeAnalysis::default(),
        );
        assert_eq!(out, GeneratedInsights::default());
    }

    #[test]
    fn equal_averages_give_no_crossover() {
        let out = run(
            &summary(1.0, 2.0),
            &indicators(Some(100.0), Some(100.0)),
            &volume(VolumeTrend::Decreasing),
        );
        assert!(!out.insights.iter().any(|i| i.contains("signal")));
        assert!(out.insights.iter().any(|i| i.starts_with("Decreasing interest")));
        assert!(out.recommendations.is_empty());
    }
}
