#![forbid(unsafe_code)]

//! Core domain model and forecasting logic for the vitals simulator.
//!
//! This crate provides:
//! - Domain types (channels, readings, snapshots)
//! - Bounded per-subject history
//! - Random-walk reading generation
//! - ARIMA estimation and the forecast pipeline built on it
//! - Risk assessment and the update/evaluate orchestrator

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod history;
pub mod generator;
pub mod optimize;
pub mod arima;
pub mod forecast;
pub mod assessment;
pub mod monitor;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use history::{HistoryStore, SubjectHistory};
pub use generator::ReadingGenerator;
pub use arima::{ArimaOrder, FitError};
pub use forecast::{Forecast, Forecaster};
pub use assessment::{assess, Assessment, BmiCategory, Measurements, RiskLevel};
pub use monitor::{Evaluation, VitalsMonitor};
