use super::{
    Alert, AlertGate, ConfigError, ConsoleSink, DiagnosticsSink, DivergenceEstimator, Episode, Guidance,
    GuidanceError, GuidanceGenerator, MetricsSnapshot, MonitorConfig, NumericFault, RegimeClassifier,
    RegimeState, RegimeTracker, RunMetrics, SlidingWindow,
    report::{CczStatistics, PerformanceStatistics, RunSummary, StabilityStatistics, SummaryReport},
};
use crate::dynamics::{ModelError, ReferenceTrajectoryModel};
use crate::util::Vec3D;
use chrono::Utc;
use serde::Serialize;
use std::{sync::Arc, time::Instant};
use strum_macros::Display;

#[derive(Debug, Display, Clone, PartialEq)]
pub enum SetupError {
    #[strum(to_string = "reference model unusable: {source}")]
    Model { source: ModelError },
    #[strum(to_string = "invalid monitor configuration: {source}")]
    Config { source: ConfigError },
}

impl std::error::Error for SetupError {}

impl From<ModelError> for SetupError {
    fn from(source: ModelError) -> Self { Self::Model { source } }
}

impl From<ConfigError> for SetupError {
    fn from(source: ConfigError) -> Self { Self::Config { source } }
}

/// Outcome of one call to [`Supervisor::process`].
///
/// While the window is filling the result carries `Initializing` and no estimates.
/// From then on every optional field except `alert` (and `guidance` if disabled) is set,
/// even on ticks that recovered from a numeric fault. A sample with a non-finite component
/// never enters the window; its result repeats the held regime and the last estimates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickResult {
    pub timestamp: f64,
    pub state: RegimeState,
    pub exponent: Option<f64>,
    /// Deviation normalized by the spread of the reference cycle.
    pub deviation: Option<f64>,
    pub absolute_deviation: Option<f64>,
    pub guidance: Option<Guidance>,
    pub alert: Option<Alert>,
    pub time_in_state: f64,
    pub latency_ms: f64,
    pub position: Vec3D<f64>,
    pub nearest: Option<Vec3D<f64>>,
    /// Fill ratio of the sliding window.
    pub buffer_fill: f64,
    pub metrics: MetricsSnapshot,
}

/// Drives estimator, classifier, guidance and alerting for a single monitored flight.
///
/// A supervisor exclusively owns its window, regime and metrics. The reference model is
/// shared read-only, so independent supervisors run in parallel without synchronization.
pub struct Supervisor {
    id: String,
    model: Arc<ReferenceTrajectoryModel>,
    config: MonitorConfig,
    spread_norm: f64,
    window: SlidingWindow,
    classifier: RegimeClassifier,
    tracker: RegimeTracker,
    guidance: GuidanceGenerator,
    alerts: AlertGate,
    metrics: RunMetrics,
    current_exponent: Option<f64>,
    current_deviation: Option<f64>,
    current_abs_deviation: Option<f64>,
    sink: Box<dyn DiagnosticsSink>,
}

impl Supervisor {
    /// Keeps normalized deviations finite for degenerate reference cycles.
    const SPREAD_EPSILON: f64 = 1e-6;

    /// Creates a supervisor over a computed reference model.
    ///
    /// # Arguments
    /// * `id` - Name used in diagnostics, e.g. the flight number.
    /// * `model` - The shared reference model, already computed.
    /// * `config` - Monitor tuning.
    /// * `sink` - Receiver of transitions, alerts and faults.
    ///
    /// # Returns
    /// The supervisor, or why it cannot operate on the given model and configuration.
    pub fn new(
        id: impl Into<String>,
        model: Arc<ReferenceTrajectoryModel>,
        config: MonitorConfig,
        sink: Box<dyn DiagnosticsSink>,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        let spread_norm = model.trajectory()?.spread_norm();
        Ok(Self {
            id: id.into(),
            model,
            spread_norm,
            window: SlidingWindow::new(config.window_size),
            classifier: RegimeClassifier::new(config.thresholds),
            tracker: RegimeTracker::default(),
            guidance: GuidanceGenerator::new(config.gains),
            alerts: AlertGate::new(config.alerts),
            metrics: RunMetrics::new(config.latency_history, config.episode_capacity),
            current_exponent: None,
            current_deviation: None,
            current_abs_deviation: None,
            sink,
            config,
        })
    }

    /// Creates a supervisor with default tuning that logs to the console.
    pub fn with_defaults(id: impl Into<String>, model: Arc<ReferenceTrajectoryModel>) -> Result<Self, SetupError> {
        let config = MonitorConfig::default();
        Self::new(id, model, config, Box::new(ConsoleSink::new(config.target_latency_ms)))
    }

    /// Processes one sample.
    ///
    /// # Arguments
    /// * `t` - Sample time in seconds.
    /// * `pitch` - Pitch-equivalent `P`.
    /// * `bank` - Bank-equivalent `B`.
    /// * `power` - Power/memory proxy `W`.
    ///
    /// # Returns
    /// The classification of this tick.
    pub fn process(&mut self, t: f64, pitch: f64, bank: f64, power: f64) -> TickResult {
        let start = Instant::now();
        let position = Vec3D::new(pitch, bank, power);
        self.metrics.record_sample();

        if !position.is_finite() {
            self.report_fault(t, &NumericFault::NonFiniteSample { position });
            return self.held_result(t, position, start);
        }
        self.window.push(t, position);
        if !self.window.is_full() {
            return self.held_result(t, position, start);
        }

        let exponent = match DivergenceEstimator::estimate(self.window.states()) {
            Ok(exponent) => exponent,
            Err(fault) => {
                self.report_fault(t, &fault);
                self.current_exponent.unwrap_or(DivergenceEstimator::NEUTRAL)
            }
        };
        self.current_exponent = Some(exponent);
        self.metrics.observe_exponent(exponent);

        let (nearest, absolute_deviation, deviation) = self.locate(t, &position);
        self.current_abs_deviation = Some(absolute_deviation);
        self.current_deviation = Some(deviation);
        self.metrics.observe_deviation(deviation);

        let next = self.classifier.classify(exponent, deviation);
        if let Some(transition) = self.tracker.update(next, t) {
            self.metrics.record_transition(&transition);
            self.sink.transition(&self.id, &transition);
        }
        let state = self.tracker.state();
        let time_in_state = self.tracker.time_in_state(t);

        let guidance =
            self.config.enable_guidance.then(|| self.guidance.guide(&position, &nearest, state, deviation));

        let alert = self.alerts.offer(state, time_in_state, exponent, deviation, t);
        if let Some(alert) = &alert {
            self.metrics.record_alert();
            self.sink.alert(&self.id, alert);
        }

        let latency_ms = start.elapsed().as_secs_f64() * 1e3;
        self.metrics.record_latency(latency_ms);
        self.sink.latency(&self.id, t, latency_ms);

        TickResult {
            timestamp: t,
            state,
            exponent: Some(exponent),
            deviation: Some(deviation),
            absolute_deviation: Some(absolute_deviation),
            guidance,
            alert,
            time_in_state,
            latency_ms,
            position,
            nearest: Some(nearest),
            buffer_fill: self.window.fill_ratio(),
            metrics: self.metrics.snapshot(),
        }
    }

    /// Finds the nearest reference point and the absolute and normalized deviation from it.
    /// Faults fall back to the previous deviation (or zero) and the live position as nearest point.
    fn locate(&mut self, t: f64, position: &Vec3D<f64>) -> (Vec3D<f64>, f64, f64) {
        let fault = match self.model.closest_point(position) {
            Ok((nearest, _)) => {
                let absolute = position.euclid_distance(&nearest);
                let normalized = absolute / (self.spread_norm + Self::SPREAD_EPSILON);
                if normalized.is_finite() {
                    return (nearest, absolute, normalized);
                }
                NumericFault::NonFiniteDeviation { value: normalized }
            }
            Err(e) => NumericFault::ReferenceLookup { reason: e.to_string() },
        };
        self.report_fault(t, &fault);
        (
            *position,
            self.current_abs_deviation.unwrap_or(0.0),
            self.current_deviation.unwrap_or(0.0),
        )
    }

    /// Result of a tick that produced no new estimates: the held regime and the last known values.
    fn held_result(&self, t: f64, position: Vec3D<f64>, start: Instant) -> TickResult {
        let state = self.tracker.state();
        TickResult {
            timestamp: t,
            state,
            exponent: self.current_exponent,
            deviation: self.current_deviation,
            absolute_deviation: self.current_abs_deviation,
            guidance: None,
            alert: None,
            time_in_state: if state.is_classified() { self.tracker.time_in_state(t) } else { 0.0 },
            latency_ms: start.elapsed().as_secs_f64() * 1e3,
            position,
            nearest: None,
            buffer_fill: self.window.fill_ratio(),
            metrics: self.metrics.snapshot(),
        }
    }

    fn report_fault(&mut self, t: f64, fault: &NumericFault) {
        self.metrics.record_fault();
        self.sink.fault(&self.id, t, fault);
    }

    /// Aggregates the run so far.
    #[allow(clippy::cast_precision_loss)]
    pub fn summary_report(&self) -> SummaryReport {
        let m = &self.metrics;
        let latency = m.latency_stats();
        SummaryReport {
            generated_at: Utc::now(),
            summary: RunSummary {
                total_samples: m.samples_processed(),
                monitored_time: m.samples_processed() as f64 / self.config.sampling_rate,
                current_state: self.tracker.state(),
            },
            ccz: CczStatistics {
                entries: m.ccz_entries(),
                total_time: m.snapshot().ccz_total_time,
                average_duration: m.average_episode_duration(),
                recoveries: m.recovery_count(),
                average_recovery_time: m.average_recovery_time(),
            },
            stability: StabilityStatistics {
                max_exponent: m.snapshot().max_exponent,
                max_deviation: m.snapshot().max_deviation,
                chaos_entries: m.chaos_entries(),
                current_exponent: self.current_exponent.unwrap_or(0.0),
                current_deviation: self.current_deviation.unwrap_or(0.0),
            },
            performance: PerformanceStatistics {
                average_latency_ms: latency.average_ms,
                max_latency_ms: latency.max_ms,
                p99_latency_ms: latency.p99_ms,
                meets_realtime_target: latency.average_ms < self.config.target_latency_ms,
            },
            total_alerts: m.alerts(),
            numeric_faults: m.faults(),
            model: self.model.summary(),
        }
    }

    /// Clears counters, episodes and latency history. Window, regime, alert cooldown
    /// and the reference model are left untouched.
    pub fn reset_metrics(&mut self) { self.metrics.reset(); }

    /// Snapshot of the retained creative chaos zone episodes, oldest first.
    pub fn export_episodes(&self) -> Vec<Episode> { self.metrics.episodes() }

    /// Overrides the guidance gain of one regime at runtime.
    pub fn set_guidance_gain(&mut self, state_name: &str, gain: f64) -> Result<(), GuidanceError> {
        self.guidance.set_gain(state_name, gain)
    }

    pub fn id(&self) -> &str { &self.id }

    pub fn state(&self) -> RegimeState { self.tracker.state() }

    pub fn config(&self) -> &MonitorConfig { &self.config }

    pub fn metrics(&self) -> &RunMetrics { &self.metrics }

    pub fn window(&self) -> &SlidingWindow { &self.window }

    pub fn model(&self) -> &Arc<ReferenceTrajectoryModel> { &self.model }

    pub fn guidance(&self) -> &GuidanceGenerator { &self.guidance }

    pub fn last_alert(&self) -> Option<f64> { self.alerts.last_alert() }

    pub fn current_exponent(&self) -> Option<f64> { self.current_exponent }

    pub fn current_deviation(&self) -> Option<f64> { self.current_deviation }
}
