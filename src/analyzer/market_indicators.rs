use serde::Serialize;

/// Direction of recent trading volume relative to the window before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
    Stable,
}

pub struct MarketAnalyzer;

impl MarketAnalyzer {
    /// Arithmetic mean, `None` for an empty slice.
    pub fn mean(data: &[f64]) -> Option<f64> {
        if data.is_empty() {
            return None;
        }
        Some(data.iter().sum::<f64>() / data.len() as f64)
    }

    /// Population standard deviation, `None` for an empty slice.
    pub fn std_dev(data: &[f64]) -> Option<f64> {
        let mean = Self::mean(data)?;
        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / data.len() as f64;
        Some(variance.sqrt())
    }

    /// Mean of the last `window` values; `None` when fewer values exist.
    pub fn simple_moving_average(data: &[f64], window: usize) -> Option<f64> {
        if window == 0 || data.len() < window {
            return None;
        }
        Self::mean(&data[data.len() - window..])
    }

    /// Day-over-day percent changes: `(p[i] - p[i-1]) / p[i-1] * 100`.
    pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
        prices
            .windows(2)
            .map(|w| (w[1] - w[0]) / w[0] * 100.0)
            .collect()
    }

    /// Standard deviation of daily percent returns; needs at least two prices.
    pub fn volatility(prices: &[f64]) -> Option<f64> {
        if prices.len() < 2 {
            return None;
        }
        Self::std_dev(&Self::daily_returns(prices))
    }

    /// Compares the mean of the last `min(max_window, len / 2)` volumes with the
    /// equally sized window just before it.
    pub fn volume_trend(volumes: &[u64], max_window: usize, threshold_percent: f64) -> VolumeTrend {
        let window = max_window.min(volumes.len() / 2);
        if window == 0 {
            return VolumeTrend::Stable;
        }

        let split = volumes.len() - window;
        let recent = Self::mean_volume(&volumes[split..]);
        let previous = Self::mean_volume(&volumes[split - window..split]);

        if previous == 0.0 {
            return if recent > 0.0 {
                VolumeTrend::Increasing
            } else {
                VolumeTrend::Stable
            };
        }

        let change_percent = (recent - previous) / previous * 100.0;
        if change_percent > threshold_percent {
            VolumeTrend::Increasing
        } else if change_percent < -threshold_percent {
            VolumeTrend::Decreasing
        } else {
            VolumeTrend::Stable
        }
    }

    fn mean_volume(volumes: &[u64]) -> f64 {
        volumes.iter().map(|&v| v as f64).sum::<f64>() / volumes.len() as f64
    }
}
