//! Synthetic vital-sign generation.
//!
//! Readings follow a bounded random walk: the first tick is drawn around each
//! channel's nominal base, later ticks wander from the previous value by a
//! smaller step. Every result is clamped into the channel range.

use crate::{Channel, VitalTriplet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random-walk reading source
#[derive(Debug, Clone)]
pub struct ReadingGenerator {
    rng: StdRng,
}

impl ReadingGenerator {
    /// Generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for reproducible runs and tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// `base` plus a uniform perturbation in `[-variation, variation]`,
    /// clamped into `[min_val, max_val]`
    pub fn next_value(&mut self, base: f64, variation: f64, min_val: f64, max_val: f64) -> f64 {
        let variation = variation.abs();
        let perturbation = if variation > 0.0 {
            self.rng.gen_range(-variation..=variation)
        } else {
            0.0
        };
        (base + perturbation).max(min_val).min(max_val)
    }

    /// First readings for a subject with no history
    pub fn initial_readings(&mut self) -> VitalTriplet {
        VitalTriplet {
            pressure: self.initial_value(Channel::Pressure),
            oxygen: self.initial_value(Channel::Oxygen),
            pulse: self.initial_value(Channel::Pulse),
        }
    }

    /// Readings one step on from `previous`
    pub fn next_readings(&mut self, previous: &VitalTriplet) -> VitalTriplet {
        VitalTriplet {
            pressure: self.step_value(Channel::Pressure, previous.pressure),
            oxygen: self.step_value(Channel::Oxygen, previous.oxygen),
            pulse: self.step_value(Channel::Pulse, previous.pulse),
        }
    }

    /// Initial readings when there is no previous tick, otherwise a step
    pub fn readings_after(&mut self, previous: Option<&VitalTriplet>) -> VitalTriplet {
        match previous {
            Some(previous) => self.next_readings(previous),
            None => self.initial_readings(),
        }
    }

    fn initial_value(&mut self, channel: Channel) -> f64 {
        let spec = channel.spec();
        self.next_value(spec.base, spec.variation, spec.min, spec.max)
    }

    fn step_value(&mut self, channel: Channel, previous: f64) -> f64 {
        let spec = channel.spec();
        self.next_value(previous, spec.step_variation, spec.min, spec.max)
    }
}

impl Default for ReadingGenerator {
    fn default() -> Self {
        Self::new()
    }
}
