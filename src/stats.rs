//! Population snapshots and the sinks that receive them.

use crate::agent::{DeathCause, Kind};
use crate::schedule::Scheduler;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Live counts per breed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationCounts {
    pub prey: usize,
    pub predators: usize,
    pub patches: usize,
    pub grown_patches: usize,
}

impl PopulationCounts {
    /// Count the live registry
    pub fn from_scheduler(scheduler: &Scheduler) -> Self {
        let grown_patches = scheduler
            .ids_of(Kind::ResourcePatch)
            .iter()
            .filter(|&&id| scheduler.get(id).is_some_and(|a| a.is_grown_patch()))
            .count();
        Self {
            prey: scheduler.count(Kind::Prey),
            predators: scheduler.count(Kind::Predator),
            patches: scheduler.count(Kind::ResourcePatch),
            grown_patches,
        }
    }

    pub fn get(&self, kind: Kind) -> usize {
        match kind {
            Kind::Prey => self.prey,
            Kind::Predator => self.predators,
            Kind::ResourcePatch => self.patches,
        }
    }
}

/// What happened during one step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvents {
    pub births: usize,
    pub starved: usize,
    pub died_of_age: usize,
    pub eaten: usize,
    pub patches_grazed: usize,
}

impl StepEvents {
    pub fn record_death(&mut self, cause: DeathCause) {
        match cause {
            DeathCause::Starvation => self.starved += 1,
            DeathCause::OldAge => self.died_of_age += 1,
            DeathCause::Predation => self.eaten += 1,
        }
    }

    pub fn deaths(&self) -> usize {
        self.starved + self.died_of_age + self.eaten
    }
}

/// Immutable record of one completed step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    /// 1-based index of the step that produced this snapshot
    pub step: u64,
    pub counts: PopulationCounts,
    pub events: StepEvents,
}

impl PopulationSnapshot {
    /// Format as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "T:{:6} | Prey:{:5} | Pred:{:5} | Grass:{:5}/{:<5} | Born:{:4} | Died:{:4}",
            self.step,
            self.counts.prey,
            self.counts.predators,
            self.counts.grown_patches,
            self.counts.patches,
            self.events.births,
            self.events.deaths(),
        )
    }
}

/// Receives one snapshot per completed step
pub trait MetricsSink {
    fn record(&mut self, snapshot: &PopulationSnapshot);
}

/// In-memory time series of snapshots
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationSeries {
    pub snapshots: Vec<PopulationSnapshot>,
}

impl PopulationSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn last(&self) -> Option<&PopulationSnapshot> {
        self.snapshots.last()
    }

    /// Counts of one breed over time
    pub fn kind_series(&self, kind: Kind) -> Vec<usize> {
        self.snapshots.iter().map(|s| s.counts.get(kind)).collect()
    }

    pub fn prey_series(&self) -> Vec<usize> {
        self.kind_series(Kind::Prey)
    }

    pub fn predator_series(&self) -> Vec<usize> {
        self.kind_series(Kind::Predator)
    }

    /// Save the series to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

impl MetricsSink for PopulationSeries {
    fn record(&mut self, snapshot: &PopulationSnapshot) {
        self.snapshots.push(*snapshot);
    }
}

/// Logs a summary line every `interval` steps
#[derive(Clone, Debug)]
pub struct LogSink {
    interval: u64,
}

impl LogSink {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
        }
    }
}

impl MetricsSink for LogSink {
    fn record(&mut self, snapshot: &PopulationSnapshot) {
        if snapshot.step % self.interval == 0 {
            log::info!("{}", snapshot.summary());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(step: u64, prey: usize, predators: usize) -> PopulationSnapshot {
        PopulationSnapshot {
            step,
            counts: PopulationCounts {
                prey,
                predators,
                patches: 4,
                grown_patches: 2,
            },
            events: StepEvents::default(),
        }
    }

    #[test]
    fn test_series_records_in_order() {
        let mut series = PopulationSeries::new();
        series.record(&snapshot(1, 10, 3));
        series.record(&snapshot(2, 12, 2));
        series.record(&snapshot(3, 9, 4));

        assert_eq!(series.len(), 3);
        assert_eq!(series.prey_series(), vec![10, 12, 9]);
        assert_eq!(series.predator_series(), vec![3, 2, 4]);
        assert_eq!(series.kind_series(Kind::ResourcePatch), vec![4, 4, 4]);
        assert_eq!(series.last().map(|s| s.step), Some(3));
    }

    #[test]
    fn test_death_accounting() {
        let mut events = StepEvents::default();
        events.record_death(DeathCause::Starvation);
        events.record_death(DeathCause::Predation);
        events.record_death(DeathCause::Predation);
        events.record_death(DeathCause::OldAge);

        assert_eq!(events.starved, 1);
        assert_eq!(events.eaten, 2);
        assert_eq!(events.died_of_age, 1);
        assert_eq!(events.deaths(), 4);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let line = snapshot(7, 42, 5).summary();
        assert!(line.contains("42"));
        assert!(line.contains("Pred:    5"));
    }

    #[test]
    fn test_series_json_roundtrip() {
        let mut series = PopulationSeries::new();
        series.record(&snapshot(1, 1, 1));
        let json = serde_json::to_string(&series).unwrap();
        let loaded: PopulationSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, series);
    }

    #[test]
    fn test_save_json_to_path() {
        let mut series = PopulationSeries::new();
        series.record(&snapshot(1, 8, 2));
        series.record(&snapshot(2, 9, 1));

        let path = std::env::temp_dir().join("predprey_test_series.json");
        series.save_json(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let loaded: PopulationSeries = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded, series);

        std::fs::remove_file(&path).ok();
    }
}
