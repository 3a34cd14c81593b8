mod alert;
mod config;
mod diagnostics;
mod divergence;
mod fault;
mod guidance;
mod metrics;
mod regime;
pub mod report;
mod sliding_window;
mod supervisor;

pub use alert::{Alert, AlertCode, AlertGate, AlertPolicy, AlertSeverity};
pub use config::{ConfigError, MonitorConfig};
pub use diagnostics::{ConsoleSink, Diagnostic, DiagnosticsSink, RecordingSink, SilentSink};
pub use divergence::{DivergenceEstimator, EmbeddingParams};
pub use fault::NumericFault;
pub use guidance::{Guidance, GuidanceError, GuidanceGains, GuidanceGenerator};
pub use metrics::{Episode, LatencyStats, MetricsSnapshot, RunMetrics};
pub use regime::{RegimeClassifier, RegimeState, RegimeThresholds, RegimeTracker, StabilityBand, Transition};
pub use report::SummaryReport;
pub use sliding_window::SlidingWindow;
pub use supervisor::{SetupError, Supervisor, TickResult};

#[cfg(test)]
mod tests;
