//! Bounded per-subject vital history.
//!
//! Each subject keeps one value sequence per channel plus a shared timestamp
//! sequence. All four are advanced together and trimmed to the same capacity,
//! so their lengths never diverge.

use crate::{Channel, Error, Reading, Result, VitalTriplet};
use std::collections::{HashMap, VecDeque};

/// Retained readings for one subject, oldest first
#[derive(Clone, Debug, Default)]
pub struct SubjectHistory {
    pressure: VecDeque<f64>,
    oxygen: VecDeque<f64>,
    pulse: VecDeque<f64>,
    timestamps: VecDeque<String>,
}

impl SubjectHistory {
    fn push(&mut self, triplet: VitalTriplet, timestamp: String, max_len: usize) {
        self.pressure.push_back(triplet.pressure);
        self.oxygen.push_back(triplet.oxygen);
        self.pulse.push_back(triplet.pulse);
        self.timestamps.push_back(timestamp);

        while self.timestamps.len() > max_len {
            self.pressure.pop_front();
            self.oxygen.pop_front();
            self.pulse.pop_front();
            self.timestamps.pop_front();
        }
    }

    fn series(&self, channel: Channel) -> &VecDeque<f64> {
        match channel {
            Channel::Pressure => &self.pressure,
            Channel::Oxygen => &self.oxygen,
            Channel::Pulse => &self.pulse,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Most recent value of every channel, if any tick has been recorded
    pub fn latest(&self) -> Option<VitalTriplet> {
        Some(VitalTriplet {
            pressure: *self.pressure.back()?,
            oxygen: *self.oxygen.back()?,
            pulse: *self.pulse.back()?,
        })
    }

    /// Copy of the value sequence for a channel
    pub fn values(&self, channel: Channel) -> Vec<f64> {
        self.series(channel).iter().copied().collect()
    }

    pub fn timestamps(&self) -> Vec<String> {
        self.timestamps.iter().cloned().collect()
    }

    /// Values of a channel paired with their timestamps
    pub fn readings(&self, channel: Channel) -> Vec<Reading> {
        self.series(channel)
            .iter()
            .zip(self.timestamps.iter())
            .map(|(&value, timestamp)| Reading {
                channel,
                value,
                timestamp: timestamp.clone(),
            })
            .collect()
    }
}

/// Registry of subject histories with a fixed per-subject capacity
#[derive(Clone, Debug)]
pub struct HistoryStore {
    subjects: HashMap<String, SubjectHistory>,
    max_len: usize,
}

impl HistoryStore {
    /// Create an empty store keeping at most `max_len` readings per subject
    pub fn new(max_len: usize) -> Result<Self> {
        if max_len == 0 {
            return Err(Error::InvalidInput(
                "history capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            subjects: HashMap::new(),
            max_len,
        })
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Register a subject with empty histories
    ///
    /// Returns `false` if the subject already existed (its history is kept).
    pub fn create(&mut self, subject: &str) -> bool {
        if self.subjects.contains_key(subject) {
            return false;
        }
        self.subjects
            .insert(subject.to_string(), SubjectHistory::default());
        tracing::debug!("Created history for subject {}", subject);
        true
    }

    /// Remove a subject and hand back its history
    pub fn drop_subject(&mut self, subject: &str) -> Option<SubjectHistory> {
        let removed = self.subjects.remove(subject);
        if removed.is_some() {
            tracing::debug!("Dropped history for subject {}", subject);
        }
        removed
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.subjects.contains_key(subject)
    }

    pub fn get(&self, subject: &str) -> Option<&SubjectHistory> {
        self.subjects.get(subject)
    }

    /// Known subject ids, sorted
    pub fn subjects(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.subjects.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Append one tick for a subject, creating it if needed, and evict the
    /// oldest entries beyond capacity
    pub fn append(&mut self, subject: &str, triplet: VitalTriplet, timestamp: impl Into<String>) {
        let max_len = self.max_len;
        let history = self.subjects.entry(subject.to_string()).or_default();
        history.push(triplet, timestamp.into(), max_len);
        tracing::trace!(
            "Appended tick for {} ({} retained)",
            subject,
            history.len()
        );
    }

    /// Latest triplet for a subject, `None` if unknown or empty
    pub fn latest(&self, subject: &str) -> Option<VitalTriplet> {
        self.get(subject).and_then(SubjectHistory::latest)
    }
}
