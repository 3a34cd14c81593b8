use super::{RegimeState, Transition};
use crate::util::{BoundedHistory, helpers};
use serde::Serialize;

/// A completed stay in the creative chaos zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Episode {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    /// The regime the zone was left for.
    pub exit_state: RegimeState,
}

/// Counters exposed with every classified tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub samples_processed: u64,
    pub ccz_entries: u64,
    pub ccz_total_time: f64,
    pub max_exponent: f64,
    pub max_deviation: f64,
    pub chaos_entries: u64,
    pub alerts: u64,
}

/// Aggregates of the bounded latency history, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LatencyStats {
    pub average_ms: f64,
    pub max_ms: f64,
    pub p99_ms: f64,
    pub samples: usize,
}

/// Run statistics of one supervisor.
///
/// Counters only grow until [`RunMetrics::reset`]. Episode, recovery and latency logs are
/// capped, the running totals next to them keep averages exact after eviction.
#[derive(Debug, Clone)]
pub struct RunMetrics {
    samples_processed: u64,
    ccz_entries: u64,
    ccz_total_time: f64,
    chaos_entries: u64,
    max_exponent: f64,
    max_deviation: f64,
    alerts: u64,
    faults: u64,
    episodes: BoundedHistory<Episode>,
    episode_count: u64,
    recovery_times: BoundedHistory<f64>,
    recovery_count: u64,
    recovery_time_total: f64,
    latencies_ms: BoundedHistory<f64>,
}

impl RunMetrics {
    /// p99 latency is only interpolated above this many samples, below it the maximum is reported.
    const P99_MIN_SAMPLES: usize = 100;

    /// Creates empty metrics.
    ///
    /// # Arguments
    /// * `latency_history` - Number of latency samples kept.
    /// * `episode_capacity` - Number of episodes and recovery times kept.
    pub fn new(latency_history: usize, episode_capacity: usize) -> Self {
        Self {
            samples_processed: 0,
            ccz_entries: 0,
            ccz_total_time: 0.0,
            chaos_entries: 0,
            max_exponent: 0.0,
            max_deviation: 0.0,
            alerts: 0,
            faults: 0,
            episodes: BoundedHistory::new(episode_capacity),
            episode_count: 0,
            recovery_times: BoundedHistory::new(episode_capacity),
            recovery_count: 0,
            recovery_time_total: 0.0,
            latencies_ms: BoundedHistory::new(latency_history),
        }
    }

    /// Zeroes every counter and clears all logs, keeping the capacities.
    pub fn reset(&mut self) { *self = Self::new(self.latencies_ms.size(), self.episodes.size()); }

    pub fn record_sample(&mut self) { self.samples_processed += 1; }

    /// Tracks the largest exponent magnitude seen. Non-finite values are ignored.
    pub fn observe_exponent(&mut self, exponent: f64) {
        if exponent.is_finite() {
            self.max_exponent = self.max_exponent.max(exponent.abs());
        }
    }

    /// Tracks the largest normalized deviation seen. Non-finite values are ignored.
    pub fn observe_deviation(&mut self, deviation: f64) {
        if deviation.is_finite() {
            self.max_deviation = self.max_deviation.max(deviation);
        }
    }

    /// Applies the bookkeeping of a regime change.
    ///
    /// # Returns
    /// The closed episode if the transition left the creative chaos zone.
    pub fn record_transition(&mut self, transition: &Transition) -> Option<Episode> {
        match transition.to {
            RegimeState::CreativeChaosZone => self.ccz_entries += 1,
            RegimeState::Chaos => self.chaos_entries += 1,
            _ => {}
        }
        if transition.from != RegimeState::CreativeChaosZone {
            return None;
        }
        let episode = Episode {
            start: transition.at - transition.dwell,
            end: transition.at,
            duration: transition.dwell,
            exit_state: transition.to,
        };
        self.ccz_total_time += episode.duration;
        self.episodes.push(episode);
        self.episode_count += 1;
        if episode.exit_state == RegimeState::StableCycle {
            self.recovery_times.push(episode.duration);
            self.recovery_count += 1;
            self.recovery_time_total += episode.duration;
        }
        Some(episode)
    }

    pub fn record_alert(&mut self) { self.alerts += 1; }

    pub fn record_fault(&mut self) { self.faults += 1; }

    pub fn record_latency(&mut self, latency_ms: f64) { self.latencies_ms.push(latency_ms); }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples_processed: self.samples_processed,
            ccz_entries: self.ccz_entries,
            ccz_total_time: self.ccz_total_time,
            max_exponent: self.max_exponent,
            max_deviation: self.max_deviation,
            chaos_entries: self.chaos_entries,
            alerts: self.alerts,
        }
    }

    pub fn latency_stats(&self) -> LatencyStats {
        let samples = self.latencies_ms.to_vec();
        let max_ms = samples.iter().copied().fold(0.0, f64::max);
        let p99_ms = if samples.len() > Self::P99_MIN_SAMPLES {
            helpers::percentile(&samples, 99.0).unwrap_or(max_ms)
        } else {
            max_ms
        };
        LatencyStats { average_ms: helpers::mean(&samples).unwrap_or(0.0), max_ms, p99_ms, samples: samples.len() }
    }

    /// Mean duration over every recorded episode.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_episode_duration(&self) -> f64 {
        if self.episode_count == 0 { 0.0 } else { self.ccz_total_time / self.episode_count as f64 }
    }

    /// Mean duration over every recorded recovery.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_recovery_time(&self) -> f64 {
        if self.recovery_count == 0 { 0.0 } else { self.recovery_time_total / self.recovery_count as f64 }
    }

    pub fn samples_processed(&self) -> u64 { self.samples_processed }

    pub fn ccz_entries(&self) -> u64 { self.ccz_entries }

    pub fn chaos_entries(&self) -> u64 { self.chaos_entries }

    pub fn alerts(&self) -> u64 { self.alerts }

    pub fn faults(&self) -> u64 { self.faults }

    pub fn recovery_count(&self) -> u64 { self.recovery_count }

    pub fn episode_count(&self) -> u64 { self.episode_count }

    /// Retained episodes, oldest first.
    pub fn episodes(&self) -> Vec<Episode> { self.episodes.to_vec() }

    /// Retained recovery times, oldest first.
    pub fn recovery_times(&self) -> Vec<f64> { self.recovery_times.to_vec() }

    pub fn latency_samples(&self) -> usize { self.latencies_ms.len() }
}
