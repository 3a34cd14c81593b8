use super::{Alert, AlertSeverity, NumericFault, Transition};
use crate::util::BoundedHistory;
use crate::{error, event, info, regime, warn};
use std::sync::{Arc, Mutex};

/// Receiver of everything a supervisor wants to tell an operator.
///
/// Each supervisor owns its sink, there is no process-wide logging state.
pub trait DiagnosticsSink: Send {
    fn transition(&mut self, id: &str, transition: &Transition);

    fn alert(&mut self, id: &str, alert: &Alert);

    fn fault(&mut self, id: &str, t: f64, fault: &NumericFault);

    fn latency(&mut self, _id: &str, _t: f64, _latency_ms: f64) {}
}

/// Prints through the crate's logger macros.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsoleSink {
    /// Ticks slower than this are tagged as delayed.
    target_latency_ms: f64,
}

impl ConsoleSink {
    pub fn new(target_latency_ms: f64) -> Self { Self { target_latency_ms } }

    /// Tag printed next to a tick latency.
    pub fn latency_tag(&self, latency_ms: f64) -> &'static str {
        if latency_ms < self.target_latency_ms { "OK" } else { "DELAY" }
    }
}

impl DiagnosticsSink for ConsoleSink {
    fn transition(&mut self, id: &str, tr: &Transition) {
        regime!("[{id}] t={:.2}s {} -> {} after {:.2}s", tr.at, tr.from, tr.to, tr.dwell);
    }

    fn alert(&mut self, id: &str, alert: &Alert) {
        match alert.severity {
            AlertSeverity::Info => info!("[{id}] {}: {}", alert.code, alert.message),
            AlertSeverity::Caution => warn!("[{id}] {}: {}", alert.code, alert.message),
            AlertSeverity::Warning => error!("[{id}] {}: {}", alert.code, alert.message),
        }
    }

    fn fault(&mut self, id: &str, t: f64, fault: &NumericFault) {
        warn!("[{id}] t={t:.2}s recovered from numeric fault: {fault}");
    }

    fn latency(&mut self, id: &str, t: f64, latency_ms: f64) {
        let tag = self.latency_tag(latency_ms);
        event!("[{id}] t={t:.2}s tick took {latency_ms:.3}ms [{tag}]");
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl DiagnosticsSink for SilentSink {
    fn transition(&mut self, _id: &str, _transition: &Transition) {}

    fn alert(&mut self, _id: &str, _alert: &Alert) {}

    fn fault(&mut self, _id: &str, _t: f64, _fault: &NumericFault) {}
}

/// One entry captured by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    Transition(Transition),
    Alert(Alert),
    Fault { t: f64, fault: NumericFault },
}

/// Keeps the most recent diagnostics in memory. Clones share the same log, so a handle
/// can be kept while the sink itself is handed to a supervisor.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    entries: Arc<Mutex<BoundedHistory<Diagnostic>>>,
}

impl Default for RecordingSink {
    fn default() -> Self { Self::with_capacity(Self::DEFAULT_CAPACITY) }
}

impl RecordingSink {
    pub const DEFAULT_CAPACITY: usize = 10_000;

    pub fn new() -> Self { Self::default() }

    /// Creates a sink that keeps at most `capacity` entries, evicting the oldest.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Arc::new(Mutex::new(BoundedHistory::new(capacity))) }
    }

    /// Copies the retained entries, oldest first.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().map(|log| log.to_vec()).unwrap_or_default()
    }

    fn push(&self, entry: Diagnostic) {
        if let Ok(mut log) = self.entries.lock() {
            log.push(entry);
        }
    }
}

impl DiagnosticsSink for RecordingSink {
    fn transition(&mut self, _id: &str, transition: &Transition) { self.push(Diagnostic::Transition(*transition)); }

    fn alert(&mut self, _id: &str, alert: &Alert) { self.push(Diagnostic::Alert(alert.clone())); }

    fn fault(&mut self, _id: &str, t: f64, fault: &NumericFault) {
        self.push(Diagnostic::Fault { t, fault: fault.clone() });
    }
}
