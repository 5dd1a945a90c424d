//! Short-horizon forecasting of a vital-sign series.
//!
//! This module implements the forecast pipeline:
//! - Flat-line projection when fewer than three observations exist
//! - ARIMA base forecast with order chosen from recent volatility
//! - Synthetic seasonal wave and volatility-scaled trend on top of the fit
//! - Trend + seasonal + noise extrapolation when the fit fails
//! - Optional clamp to the channel's physiological range

use crate::arima::{self, ArimaOrder, FitError};
use crate::config::ForecastConfig;
use crate::optimize::NelderMead;
use crate::{Channel, Error, ForecastModel, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// Minimum number of observations before a model is attempted
pub const MIN_HISTORY: usize = 3;

/// Offset from the simulation seed to the forecaster's seed, so the
/// forecaster and the reading generator never share a stream
pub const FORECAST_SEED_OFFSET: u64 = 1;

/// A forecast together with how it was produced
#[derive(Clone, Debug)]
pub struct Forecast {
    pub values: Vec<f64>,
    pub model: ForecastModel,
    /// Standard deviation of first differences of the input history
    pub volatility: f64,
}

/// Forecast engine; owns the RNG used for fallback noise
#[derive(Clone, Debug)]
pub struct Forecaster {
    config: ForecastConfig,
    solver: NelderMead,
    rng: StdRng,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self {
            config,
            solver: NelderMead::default(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic fallback noise for reproducible runs and tests
    pub fn with_seed(config: ForecastConfig, seed: u64) -> Self {
        Self {
            config,
            solver: NelderMead::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Forecaster for a simulation run seeded with `seed`
    ///
    /// Every entry point that shares a simulation seed builds its forecaster
    /// here, so the same seed gives the same fallback noise everywhere.
    pub fn for_simulation(config: ForecastConfig, seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(config, seed.wrapping_add(FORECAST_SEED_OFFSET)),
            None => Self::new(config),
        }
    }

    /// Replace the optimizer settings used for ARIMA estimation
    pub fn with_solver(mut self, solver: NelderMead) -> Self {
        self.solver = solver;
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast `horizon` future values of `history`
    ///
    /// When `channel` is given, every value is clamped into that channel's
    /// range. Errors only for a zero horizon or a non-finite history value.
    pub fn forecast(
        &mut self,
        history: &[f64],
        horizon: usize,
        channel: Option<Channel>,
    ) -> Result<Vec<f64>> {
        Ok(self.forecast_detailed(history, horizon, channel)?.values)
    }

    /// Like [`Forecaster::forecast`], also reporting the path taken
    pub fn forecast_detailed(
        &mut self,
        history: &[f64],
        horizon: usize,
        channel: Option<Channel>,
    ) -> Result<Forecast> {
        if horizon == 0 {
            return Err(Error::InvalidHorizon(horizon));
        }
        if let Some((index, &value)) = history.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(Error::NonFiniteHistory { index, value });
        }

        let volatility = volatility(history);

        let (mut values, model) = if history.len() < MIN_HISTORY {
            let last = history.last().copied().unwrap_or(0.0);
            (vec![last; horizon], ForecastModel::FlatLine)
        } else {
            let order = self.select_order(volatility);
            match self.arima_forecast(history, horizon, order, volatility) {
                Ok(values) => (
                    values,
                    ForecastModel::Arima {
                        p: order.p,
                        d: order.d,
                        q: order.q,
                    },
                ),
                Err(e) => {
                    tracing::debug!(
                        "ARIMA{} failed on {} points ({}), using fallback extrapolation",
                        order,
                        history.len(),
                        e
                    );
                    (
                        self.fallback_forecast(history, horizon, volatility),
                        ForecastModel::Fallback,
                    )
                }
            }
        };

        if let Some(channel) = channel {
            let spec = channel.spec();
            for v in values.iter_mut() {
                *v = spec.clamp(*v);
            }
        }

        tracing::trace!(
            "Forecast {} steps via {} (volatility {:.3}, channel {:?})",
            horizon,
            model,
            volatility,
            channel
        );

        Ok(Forecast {
            values,
            model,
            volatility,
        })
    }

    /// Model order for a given volatility
    pub fn select_order(&self, volatility: f64) -> ArimaOrder {
        if volatility > self.config.high_volatility {
            ArimaOrder::new(2, 1, 2)
        } else if volatility > self.config.moderate_volatility {
            ArimaOrder::new(1, 1, 1)
        } else {
            ArimaOrder::new(1, 0, 1)
        }
    }

    fn arima_forecast(
        &self,
        history: &[f64],
        horizon: usize,
        order: ArimaOrder,
        volatility: f64,
    ) -> std::result::Result<Vec<f64>, FitError> {
        let model = arima::fit_with(history, order, &self.solver)?;
        let base = model.forecast(horizon)?;
        Ok(apply_overlay(
            &base,
            volatility,
            self.config.seasonal_amplitude,
            self.config.trend_weight,
        ))
    }

    /// Chained extrapolation: each step builds on the previous synthetic value
    pub(crate) fn fallback_forecast(
        &mut self,
        history: &[f64],
        horizon: usize,
        volatility: f64,
    ) -> Vec<f64> {
        let tail = &history[history.len().saturating_sub(MIN_HISTORY)..];
        let trend = mean(&arima::difference(tail));
        let sigma = self.config.fallback_noise_floor.max(volatility / 2.0);
        let noise = match Normal::new(0.0, sigma) {
            Ok(noise) => Some(noise),
            Err(e) => {
                tracing::warn!("Invalid fallback noise scale {}: {}", sigma, e);
                None
            }
        };

        let amplitude = self.config.seasonal_amplitude;
        let mut last = history.last().copied().unwrap_or(0.0);
        let mut out = Vec::with_capacity(horizon);
        for i in 0..horizon {
            let seasonal = amplitude * (2.0 * PI * i as f64 / horizon as f64).sin();
            let shock = noise.map_or(0.0, |n| n.sample(&mut self.rng));
            let next = last + trend + seasonal + shock;
            out.push(next);
            last = next;
        }
        out
    }
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new(ForecastConfig::default())
    }
}

/// Population standard deviation of first differences; 0 for fewer than two points
pub fn volatility(series: &[f64]) -> f64 {
    let diffs = arima::difference(series);
    if diffs.is_empty() {
        return 0.0;
    }
    let m = mean(&diffs);
    let variance = diffs.iter().map(|d| (d - m).powi(2)).sum::<f64>() / diffs.len() as f64;
    variance.sqrt()
}

/// Add the seasonal sine wave and linear trend to a base forecast
///
/// `time_factor` runs from 0 to 1 across the horizon (0 for a single step).
pub fn apply_overlay(base: &[f64], volatility: f64, amplitude: f64, trend_weight: f64) -> Vec<f64> {
    let last_index = base.len().saturating_sub(1);
    base.iter()
        .enumerate()
        .map(|(i, b)| {
            let time_factor = if last_index == 0 {
                0.0
            } else {
                i as f64 / last_index as f64
            };
            let seasonal = amplitude * (2.0 * PI * time_factor).sin();
            let trend = trend_weight * time_factor * volatility;
            b + seasonal + trend
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
