use super::{AlertPolicy, GuidanceGains, RegimeThresholds};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Display, Clone, PartialEq)]
pub enum ConfigError {
    #[strum(to_string = "window size must be at least 2, got {size}")]
    WindowTooSmall { size: usize },
    #[strum(to_string = "sampling rate must be positive, got {rate}")]
    InvalidSamplingRate { rate: f64 },
    #[strum(to_string = "regime thresholds must be finite and ordered")]
    InvalidThresholds,
    #[strum(to_string = "{field} must be positive")]
    NonPositive { field: &'static str },
}

impl std::error::Error for ConfigError {}

/// Tuning of a single [`super::Supervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Number of samples in the sliding window.
    pub window_size: usize,
    /// Nominal input rate in Hz, used to convert sample counts to monitored time.
    pub sampling_rate: f64,
    pub enable_guidance: bool,
    pub thresholds: RegimeThresholds,
    pub gains: GuidanceGains,
    pub alerts: AlertPolicy,
    /// Soft per-tick deadline, in milliseconds.
    pub target_latency_ms: f64,
    /// Number of latency samples kept for the report.
    pub latency_history: usize,
    /// Number of episodes and recovery times kept for export.
    pub episode_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            sampling_rate: 8.0,
            enable_guidance: true,
            thresholds: RegimeThresholds::default(),
            gains: GuidanceGains::default(),
            alerts: AlertPolicy::default(),
            target_latency_ms: 10.0,
            latency_history: 1000,
            episode_capacity: 10_000,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size < 2 {
            return Err(ConfigError::WindowTooSmall { size: self.window_size });
        }
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(ConfigError::InvalidSamplingRate { rate: self.sampling_rate });
        }
        if !self.thresholds.is_valid() {
            return Err(ConfigError::InvalidThresholds);
        }
        if self.target_latency_ms.is_nan() || self.target_latency_ms <= 0.0 {
            return Err(ConfigError::NonPositive { field: "target_latency_ms" });
        }
        if self.latency_history == 0 {
            return Err(ConfigError::NonPositive { field: "latency_history" });
        }
        if self.episode_capacity == 0 {
            return Err(ConfigError::NonPositive { field: "episode_capacity" });
        }
        Ok(())
    }

    /// Nominal time between two samples.
    pub fn sample_period(&self) -> f64 { 1.0 / self.sampling_rate }
}
