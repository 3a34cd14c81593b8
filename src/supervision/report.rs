use super::RegimeState;
use crate::dynamics::ModelSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_samples: u64,
    /// `total_samples` divided by the nominal sampling rate.
    pub monitored_time: f64,
    pub current_state: RegimeState,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CczStatistics {
    pub entries: u64,
    pub total_time: f64,
    pub average_duration: f64,
    pub recoveries: u64,
    pub average_recovery_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StabilityStatistics {
    pub max_exponent: f64,
    pub max_deviation: f64,
    pub chaos_entries: u64,
    pub current_exponent: f64,
    pub current_deviation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceStatistics {
    pub average_latency_ms: f64,
    pub max_latency_ms: f64,
    pub p99_latency_ms: f64,
    /// Average latency below the configured target.
    pub meets_realtime_target: bool,
}

/// Aggregate view of a supervisor run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub generated_at: DateTime<Utc>,
    pub summary: RunSummary,
    pub ccz: CczStatistics,
    pub stability: StabilityStatistics,
    pub performance: PerformanceStatistics,
    pub total_alerts: u64,
    pub numeric_faults: u64,
    pub model: ModelSummary,
}
