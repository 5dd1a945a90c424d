//! BMI and rule-based health risk classification.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurements submitted for an evaluation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Measurements {
    #[serde(rename = "Height")]
    pub height_cm: f64,
    #[serde(rename = "Weight")]
    pub weight_kg: f64,
    #[serde(rename = "BP")]
    pub bp: f64,
    #[serde(rename = "Oxygen_Level")]
    pub oxygen: f64,
    #[serde(rename = "Pulse")]
    pub pulse: f64,
}

/// Body mass index band
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else {
            BmiCategory::Overweight
        }
    }
}

/// Overall risk level
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Number of risk factors present mapped to a level
    pub fn from_score(score: u8) -> Self {
        match score {
            0 => RiskLevel::Low,
            1 | 2 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        f.write_str(s)
    }
}

/// Result of classifying one set of measurements
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Assessment {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
}

impl Measurements {
    fn validate(&self) -> Result<()> {
        if !(self.height_cm.is_finite() && self.height_cm > 0.0) {
            return Err(Error::InvalidInput(format!(
                "height must be a positive number of centimetres, got {}",
                self.height_cm
            )));
        }
        if !(self.weight_kg.is_finite() && self.weight_kg > 0.0) {
            return Err(Error::InvalidInput(format!(
                "weight must be a positive number of kilograms, got {}",
                self.weight_kg
            )));
        }
        for (name, value) in [("BP", self.bp), ("Oxygen_Level", self.oxygen), ("Pulse", self.pulse)] {
            if !value.is_finite() {
                return Err(Error::InvalidInput(format!("{} must be finite, got {}", name, value)));
            }
        }
        Ok(())
    }

    /// Body mass index in kg/m²
    pub fn bmi(&self) -> f64 {
        let height_m = self.height_cm / 100.0;
        self.weight_kg / (height_m * height_m)
    }
}

/// Classify measurements into a BMI band and risk level
///
/// One point each for: BP above 140, oxygen below 95, pulse outside
/// 60..=100, BMI above 30. Three or more points is high risk.
pub fn assess(measurements: &Measurements) -> Result<Assessment> {
    measurements.validate()?;

    let bmi = measurements.bmi();
    let factors = [
        measurements.bp > 140.0,
        measurements.oxygen < 95.0,
        measurements.pulse > 100.0 || measurements.pulse < 60.0,
        bmi > 30.0,
    ];
    let risk_score = factors.iter().filter(|&&f| f).count() as u8;

    Ok(Assessment {
        bmi,
        bmi_category: BmiCategory::from_bmi(bmi),
        risk_score,
        risk_level: RiskLevel::from_score(risk_score),
    })
}
