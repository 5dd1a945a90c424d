//! Configuration file support for the vitals tools.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/vitals/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub forecast: ForecastConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Bounded history configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_len")]
    pub max_len: usize,

    #[serde(default = "default_subject")]
    pub default_subject: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_len: default_max_len(),
            default_subject: default_subject(),
        }
    }
}

/// Forecast engine parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ForecastConfig {
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Peak of the synthetic sine wave added to every forecast
    #[serde(default = "default_seasonal_amplitude")]
    pub seasonal_amplitude: f64,

    /// Multiplier on volatility for the synthetic linear trend
    #[serde(default = "default_trend_weight")]
    pub trend_weight: f64,

    /// Lower bound on the fallback noise standard deviation
    #[serde(default = "default_fallback_noise_floor")]
    pub fallback_noise_floor: f64,

    /// Volatility above which ARIMA(2,1,2) is used
    #[serde(default = "default_high_volatility")]
    pub high_volatility: f64,

    /// Volatility above which ARIMA(1,1,1) is used
    #[serde(default = "default_moderate_volatility")]
    pub moderate_volatility: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            seasonal_amplitude: default_seasonal_amplitude(),
            trend_weight: default_trend_weight(),
            fallback_noise_floor: default_fallback_noise_floor(),
            high_volatility: default_high_volatility(),
            moderate_volatility: default_moderate_volatility(),
        }
    }
}

/// Random generation configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct SimulationConfig {
    /// Fixed RNG seed; entropy-seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

// Default value functions
fn default_max_len() -> usize {
    20
}

fn default_subject() -> String {
    "default".into()
}

fn default_horizon() -> usize {
    10
}

fn default_seasonal_amplitude() -> f64 {
    2.0
}

fn default_trend_weight() -> f64 {
    0.5
}

fn default_fallback_noise_floor() -> f64 {
    0.5
}

fn default_high_volatility() -> f64 {
    2.0
}

fn default_moderate_volatility() -> f64 {
    1.0
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            other => {
                tracing::info!("No config file found at {:?}, using defaults", other);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path, if a config directory can be found
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("vitals").join("config.toml"))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values the simulator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.history.max_len == 0 {
            return Err(Error::Config("history.max_len must be at least 1".into()));
        }
        if self.history.default_subject.trim().is_empty() {
            return Err(Error::Config("history.default_subject must not be empty".into()));
        }

        let f = &self.forecast;
        if f.horizon == 0 {
            return Err(Error::Config("forecast.horizon must be at least 1".into()));
        }
        let finite = [
            f.seasonal_amplitude,
            f.trend_weight,
            f.fallback_noise_floor,
            f.high_volatility,
            f.moderate_volatility,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(Error::Config("forecast parameters must be finite".into()));
        }
        if f.fallback_noise_floor <= 0.0 {
            return Err(Error::Config(
                "forecast.fallback_noise_floor must be positive".into(),
            ));
        }
        if f.moderate_volatility > f.high_volatility {
            return Err(Error::Config(format!(
                "forecast.moderate_volatility ({}) exceeds forecast.high_volatility ({})",
                f.moderate_volatility, f.high_volatility
            )));
        }
        Ok(())
    }
}
