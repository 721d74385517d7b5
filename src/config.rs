use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub chart_base_url: String,
    pub summary_base_url: String,
    pub cookie_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub news_limit: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            chart_base_url: "https://query2.finance.yahoo.com".into(),
            summary_base_url: "https://query1.finance.yahoo.com".into(),
            cookie_url: "https://fc.yahoo.com".into(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) StockInsight/0.1".into(),
            timeout_seconds: 10,
            news_limit: 10,
        }
    }
}

/// Moving-average windows, shortest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SmaWindows {
    pub short: usize,
    pub medium: usize,
    pub long: usize,
}

impl Default for SmaWindows {
    fn default() -> Self {
        Self {
            short: 20,
            medium: 50,
            long: 200,
        }
    }
}

/// Thresholds and windows used by the analysis engine and the insight rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sma_windows: SmaWindows,
    /// Daily-return standard deviation (in %) above which volatility is "high".
    pub volatility_high_threshold: f64,
    /// Daily-return standard deviation (in %) below which volatility is "low".
    pub volatility_low_threshold: f64,
    /// Period change (in %) beyond which the price trend counts as strong.
    pub trend_threshold_percent: f64,
    /// Relative change (in %) between volume windows that counts as a trend.
    pub volume_trend_threshold_percent: f64,
    /// Upper bound on the bars per volume comparison window.
    pub volume_trend_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sma_windows: SmaWindows::default(),
            volatility_high_threshold: 3.0,
            volatility_low_threshold: 1.0,
            trend_threshold_percent: 5.0,
            volume_trend_threshold_percent: 5.0,
            volume_trend_window: 10,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = self.sma_windows;
        if w.short == 0 || w.short >= w.medium || w.medium >= w.long {
            return Err(ConfigError::Invalid(format!(
                "sma_windows must be non-zero and strictly increasing, got {}/{}/{}",
                w.short, w.medium, w.long
            )));
        }
        if self.volume_trend_window == 0 {
            return Err(ConfigError::Invalid("volume_trend_window must be positive".into()));
        }
        let thresholds = [
            self.volatility_high_threshold,
            self.volatility_low_threshold,
            self.trend_threshold_percent,
            self.volume_trend_threshold_percent,
        ];
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(ConfigError::Invalid("thresholds must be finite and non-negative".into()));
        }
        if self.volatility_low_threshold > self.volatility_high_threshold {
            return Err(ConfigError::Invalid(
                "volatility_low_threshold exceeds volatility_high_threshold".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub analysis: AnalysisConfig,
}

/// Loads the config file if it exists, falling back to defaults, then applies
/// `HOST`/`PORT` from the environment.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let mut config = read_config(path)?;
    apply_overrides(
        &mut config,
        std::env::var("HOST").ok(),
        std::env::var("PORT").ok(),
    )?;
    Ok(config)
}

fn read_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

fn apply_overrides(
    config: &mut AppConfig,
    host: Option<String>,
    port: Option<String>,
) -> Result<(), ConfigError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("PORT is not a valid port: {port}")))?;
    }
    Ok(())
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.analysis.validate()?;
    Ok(config)
}
