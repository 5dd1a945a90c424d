//! Subject update orchestration.
//!
//! `VitalsMonitor` ties the pieces together: it draws the next readings,
//! appends them to the subject's bounded history, and assembles historical
//! series plus forecasts for every channel.

use crate::assessment::{self, Assessment, BmiCategory, Measurements, RiskLevel};
use crate::{
    Channel, ChannelSeries, Config, Error, Forecaster, HistoryStore, ReadingGenerator, Result,
    Snapshot, VitalTriplet,
};
use chrono::{Local, NaiveTime};
use serde::{Deserialize, Serialize};

/// Timestamp format shared by every channel of a subject
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Response to an evaluation request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Evaluation {
    pub health_risk: RiskLevel,
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub vital_predictions: Snapshot,
}

/// Owns the history store and the generators that feed and read it
#[derive(Debug)]
pub struct VitalsMonitor {
    store: HistoryStore,
    generator: ReadingGenerator,
    forecaster: Forecaster,
    default_subject: String,
}

impl VitalsMonitor {
    /// Build a monitor from configuration
    ///
    /// A configured seed drives both the reading generator and the fallback
    /// noise, making whole runs reproducible.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let seed = config.simulation.seed;
        let generator = seed.map_or_else(ReadingGenerator::new, ReadingGenerator::with_seed);
        let forecaster = Forecaster::for_simulation(config.forecast.clone(), seed);

        Ok(Self::from_parts(
            HistoryStore::new(config.history.max_len)?,
            generator,
            forecaster,
            &config.history.default_subject,
        ))
    }

    /// Assemble a monitor from explicit parts; the default subject is
    /// registered if the store does not already hold it
    pub fn from_parts(
        mut store: HistoryStore,
        generator: ReadingGenerator,
        forecaster: Forecaster,
        default_subject: &str,
    ) -> Self {
        store.create(default_subject);
        Self {
            store,
            generator,
            forecaster,
            default_subject: default_subject.to_string(),
        }
    }

    pub fn default_subject(&self) -> &str {
        &self.default_subject
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut HistoryStore {
        &mut self.store
    }

    /// Record the next tick for `subject` at the current local time
    pub fn advance(&mut self, subject: &str) -> VitalTriplet {
        self.advance_at(subject, Local::now().time())
    }

    /// Record the next tick for `subject` stamped with `at`
    ///
    /// Unknown subjects are created on first advance.
    pub fn advance_at(&mut self, subject: &str, at: NaiveTime) -> VitalTriplet {
        let previous = self.store.latest(subject);
        let triplet = self.generator.readings_after(previous.as_ref());
        self.store
            .append(subject, triplet, at.format(TIMESTAMP_FORMAT).to_string());

        tracing::debug!(
            "Advanced {}: BP={:.1} O2={:.1} pulse={:.1}",
            subject,
            triplet.pressure,
            triplet.oxygen,
            triplet.pulse
        );
        triplet
    }

    /// Historical series, forecast and timestamps for every channel
    ///
    /// Reads the subject's history without modifying it.
    pub fn snapshot(&mut self, subject: &str) -> Result<Snapshot> {
        let history = self
            .store
            .get(subject)
            .ok_or_else(|| Error::UnknownSubject(subject.to_string()))?;
        let horizon = self.forecaster.config().horizon;
        let timestamps = history.timestamps();

        let mut series_for = |channel: Channel| -> Result<ChannelSeries> {
            let historical = history.values(channel);
            let forecast = self
                .forecaster
                .forecast_detailed(&historical, horizon, Some(channel))?;
            Ok(ChannelSeries {
                historical,
                forecast: forecast.values,
                timestamps: timestamps.clone(),
                model: forecast.model,
            })
        };

        Ok(Snapshot {
            pressure: series_for(Channel::Pressure)?,
            oxygen: series_for(Channel::Oxygen)?,
            pulse: series_for(Channel::Pulse)?,
        })
    }

    /// Advance `subject` (or the default subject) and return its snapshot
    pub fn update(&mut self, subject: Option<&str>) -> Result<Snapshot> {
        let subject = subject.unwrap_or(self.default_subject.as_str()).to_string();
        self.advance(&subject);
        self.snapshot(&subject)
    }

    /// Classify `measurements` and update the default subject
    pub fn evaluate(&mut self, measurements: &Measurements) -> Result<Evaluation> {
        let Assessment {
            bmi,
            bmi_category,
            risk_score,
            risk_level,
        } = assessment::assess(measurements)?;
        tracing::info!(
            "Evaluated measurements: BMI {:.1} ({:?}), risk {} (score {})",
            bmi,
            bmi_category,
            risk_level,
            risk_score
        );

        let vital_predictions = self.update(None)?;
        Ok(Evaluation {
            health_risk: risk_level,
            bmi,
            bmi_category,
            vital_predictions,
        })
    }
}
