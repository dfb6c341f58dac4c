//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! [data]
//! path = "data/spy_1min.csv"
//! symbol = "SPY"
//! timezone = "America/New_York"
//! start_date = "2025-01-02"
//! end_date = "2025-03-31"
//!
//! [aggregation]
//! interval_minutes = 15
//!
//! [indicators]
//! atr_period = 14
//!
//! [strategy]
//! variant = "long_bracket"
//! stop_loss_atr = 1.0
//! take_profit_atr = 1.5
//!
//! [backtest]
//! initial_capital = 100000.0
//! ```
//!
//! Every field except `data.path` has a default.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use vwaplab_core::components::{
    IndicatorSpec, LongBracket, LongBracketParams, ShortReversal, ShortReversalParams, Strategy,
    DEFAULT_ATR_PERIOD,
};
use vwaplab_core::data::{BarAggregator, DEFAULT_INTERVAL_MINUTES};
use vwaplab_core::indicators::PriceMode;
use vwaplab_core::session::{ExchangeClock, SessionError, DEFAULT_TIMEZONE};

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    UnknownTimezone(#[from] SessionError),

    #[error("unknown strategy variant '{0}' (expected long_bracket or short_reversal)")]
    UnknownVariant(String),

    #[error("aggregation.interval_minutes must be > 0")]
    ZeroInterval,

    #[error("indicators.atr_period must be >= 1")]
    ZeroAtrPeriod,

    #[error("strategy.{field} must be finite and >= 0, got {value}")]
    InvalidMultiple { field: &'static str, value: f64 },

    #[error("backtest.initial_capital must be finite and > 0, got {0}")]
    InvalidCapital(f64),

    #[error("data.start_date {start} is after data.end_date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
}

/// Which decision machine a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyVariant {
    #[default]
    LongBracket,
    ShortReversal,
}

impl StrategyVariant {
    /// VWAP price used when the config does not override it.
    pub fn default_price_mode(&self) -> PriceMode {
        match self {
            Self::LongBracket => PriceMode::Close,
            Self::ShortReversal => PriceMode::Typical,
        }
    }
}

impl fmt::Display for StrategyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LongBracket => f.write_str("long_bracket"),
            Self::ShortReversal => f.write_str("short_reversal"),
        }
    }
}

impl std::str::FromStr for StrategyVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long_bracket" | "long" => Ok(Self::LongBracket),
            "short_reversal" | "short" => Ok(Self::ShortReversal),
            other => Err(ConfigError::UnknownVariant(other.to_string())),
        }
    }
}

/// Complete configuration for a single run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// CSV file of 1-minute bars.
    pub path: PathBuf,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// IANA name of the exchange timezone.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// First session to evaluate (inclusive). Defaults to the first session in the data.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Last session to evaluate (inclusive).
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AggregationConfig {
    #[serde(default = "default_interval")]
    pub interval_minutes: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IndicatorConfig {
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    #[serde(default)]
    pub variant: StrategyVariant,
    /// Overrides the variant's VWAP price.
    #[serde(default)]
    pub price_mode: Option<PriceMode>,
    /// Long variant only.
    #[serde(default = "default_stop_loss_atr")]
    pub stop_loss_atr: f64,
    /// Long variant only.
    #[serde(default = "default_take_profit_atr")]
    pub take_profit_atr: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
}

fn default_symbol() -> String {
    "SPY".to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL_MINUTES
}

fn default_atr_period() -> usize {
    DEFAULT_ATR_PERIOD
}

fn default_stop_loss_atr() -> f64 {
    1.0
}

fn default_take_profit_atr() -> f64 {
    1.5
}

fn default_initial_capital() -> f64 {
    100_000.0
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval(),
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            atr_period: default_atr_period(),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            variant: StrategyVariant::default(),
            price_mode: None,
            stop_loss_atr: default_stop_loss_atr(),
            take_profit_atr: default_take_profit_atr(),
        }
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
        }
    }
}

impl DataConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            symbol: default_symbol(),
            timezone: default_timezone(),
            start_date: None,
            end_date: None,
        }
    }

    /// True when `date` falls inside the configured session range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |s| date >= s) && self.end_date.map_or(true, |e| date <= e)
    }
}

impl RunConfig {
    /// Defaults for everything except the data path.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            data: DataConfig::new(path),
            aggregation: AggregationConfig::default(),
            indicators: IndicatorConfig::default(),
            strategy: StrategyConfig::default(),
            backtest: BacktestConfig::default(),
        }
    }

    /// Load and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field that the rest of the pipeline would otherwise assert on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clock()?;
        if self.aggregation.interval_minutes == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.indicators.atr_period == 0 {
            return Err(ConfigError::ZeroAtrPeriod);
        }
        for (field, value) in [
            ("stop_loss_atr", self.strategy.stop_loss_atr),
            ("take_profit_atr", self.strategy.take_profit_atr),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidMultiple { field, value });
            }
        }
        let capital = self.backtest.initial_capital;
        if !capital.is_finite() || capital <= 0.0 {
            return Err(ConfigError::InvalidCapital(capital));
        }
        if let (Some(start), Some(end)) = (self.data.start_date, self.data.end_date) {
            if start > end {
                return Err(ConfigError::InvertedDateRange { start, end });
            }
        }
        Ok(())
    }

    pub fn clock(&self) -> Result<ExchangeClock, ConfigError> {
        Ok(ExchangeClock::from_name(&self.data.timezone)?)
    }

    pub fn aggregator(&self) -> Result<BarAggregator, ConfigError> {
        BarAggregator::minutes(self.aggregation.interval_minutes)
            .map_err(|_| ConfigError::ZeroInterval)
    }

    pub fn price_mode(&self) -> PriceMode {
        self.strategy
            .price_mode
            .unwrap_or_else(|| self.strategy.variant.default_price_mode())
    }

    pub fn indicator_spec(&self) -> IndicatorSpec {
        IndicatorSpec {
            price_mode: self.price_mode(),
            atr_period: self.indicators.atr_period,
        }
    }

    /// Instantiate the configured decision machine.
    ///
    /// Call `validate` first; invalid parameters panic inside the constructors.
    pub fn build_strategy(&self) -> Box<dyn Strategy> {
        match self.strategy.variant {
            StrategyVariant::LongBracket => Box::new(LongBracket::new(LongBracketParams {
                stop_loss_atr: self.strategy.stop_loss_atr,
                take_profit_atr: self.strategy.take_profit_atr,
                price_mode: self.price_mode(),
                atr_period: self.indicators.atr_period,
            })),
            StrategyVariant::ShortReversal => Box::new(ShortReversal::new(ShortReversalParams {
                price_mode: self.price_mode(),
                atr_period: self.indicators.atr_period,
            })),
        }
    }
}
