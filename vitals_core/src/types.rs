//! Core domain types for the vitals simulator.
//!
//! This module defines the fundamental types used throughout the system:
//! - Physiological channels and their generation/clamping parameters
//! - Readings and per-tick triplets
//! - Forecast provenance and the per-channel payload returned to callers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Channels
// ============================================================================

/// One of the three tracked physiological measurements
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Systolic blood pressure proxy (mmHg)
    #[serde(rename = "BP")]
    Pressure,
    /// Peripheral oxygen saturation (%)
    #[serde(rename = "Oxygen_Level")]
    Oxygen,
    /// Pulse rate (beats per minute)
    #[serde(rename = "Pulse")]
    Pulse,
}

/// Generation and clamping parameters for a channel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelSpec {
    /// Centre of the initial reading
    pub base: f64,
    /// Half-width of the initial uniform perturbation
    pub variation: f64,
    /// Half-width of the random walk step from the previous reading
    pub step_variation: f64,
    pub min: f64,
    pub max: f64,
}

impl ChannelSpec {
    /// Clamp a value into this channel's valid range
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

const PRESSURE_SPEC: ChannelSpec = ChannelSpec {
    base: 120.0,
    variation: 5.0,
    step_variation: 3.0,
    min: 90.0,
    max: 180.0,
};

const OXYGEN_SPEC: ChannelSpec = ChannelSpec {
    base: 97.0,
    variation: 1.0,
    step_variation: 0.5,
    min: 85.0,
    max: 100.0,
};

const PULSE_SPEC: ChannelSpec = ChannelSpec {
    base: 75.0,
    variation: 5.0,
    step_variation: 2.0,
    min: 60.0,
    max: 100.0,
};

impl Channel {
    /// All channels in payload order
    pub const ALL: [Channel; 3] = [Channel::Pressure, Channel::Oxygen, Channel::Pulse];

    pub fn spec(self) -> &'static ChannelSpec {
        match self {
            Channel::Pressure => &PRESSURE_SPEC,
            Channel::Oxygen => &OXYGEN_SPEC,
            Channel::Pulse => &PULSE_SPEC,
        }
    }

    /// Name used on the wire (matches the serde representation)
    pub fn wire_name(self) -> &'static str {
        match self {
            Channel::Pressure => "BP",
            Channel::Oxygen => "Oxygen_Level",
            Channel::Pulse => "Pulse",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Channel {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "bp" | "pressure" => Ok(Channel::Pressure),
            "oxygen" | "oxygen_level" | "spo2" => Ok(Channel::Oxygen),
            "pulse" | "hr" => Ok(Channel::Pulse),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown channel '{}' (expected bp, oxygen or pulse)",
                other
            ))),
        }
    }
}

// ============================================================================
// Readings
// ============================================================================

/// One value per channel, generated together for a single tick
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct VitalTriplet {
    #[serde(rename = "BP")]
    pub pressure: f64,
    #[serde(rename = "Oxygen_Level")]
    pub oxygen: f64,
    #[serde(rename = "Pulse")]
    pub pulse: f64,
}

impl VitalTriplet {
    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Pressure => self.pressure,
            Channel::Oxygen => self.oxygen,
            Channel::Pulse => self.pulse,
        }
    }
}

/// A single timestamped measurement on one channel
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    pub channel: Channel,
    pub value: f64,
    /// Wall-clock time formatted as `%H:%M:%S`
    pub timestamp: String,
}

// ============================================================================
// Forecast payload
// ============================================================================

/// Which forecasting path produced a series
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForecastModel {
    /// Fewer than three observations: last value repeated
    FlatLine,
    /// Fitted ARIMA(p, d, q) plus seasonal/trend overlay
    Arima { p: usize, d: usize, q: usize },
    /// Trend + seasonal + noise extrapolation after a failed fit
    Fallback,
}

impl fmt::Display for ForecastModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastModel::FlatLine => write!(f, "flat-line"),
            ForecastModel::Arima { p, d, q } => write!(f, "ARIMA({},{},{})", p, d, q),
            ForecastModel::Fallback => write!(f, "fallback"),
        }
    }
}

/// Historical values, forecast and shared timestamps for one channel
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelSeries {
    pub historical: Vec<f64>,
    pub forecast: Vec<f64>,
    pub timestamps: Vec<String>,
    pub model: ForecastModel,
}

/// Per-channel payload for one subject
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "BP")]
    pub pressure: ChannelSeries,
    #[serde(rename = "Oxygen_Level")]
    pub oxygen: ChannelSeries,
    #[serde(rename = "Pulse")]
    pub pulse: ChannelSeries,
}

impl Snapshot {
    pub fn channel(&self, channel: Channel) -> &ChannelSeries {
        match channel {
            Channel::Pressure => &self.pressure,
            Channel::Oxygen => &self.oxygen,
            Channel::Pulse => &self.pulse,
        }
    }
}
