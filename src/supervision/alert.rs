use super::RegimeState;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Urgency of an alert, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum AlertSeverity {
    Info,
    Caution,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCode {
    CczEntry,
    CczExtended,
    ChaosDetected,
    LargeDeviation,
    Converging,
}

/// An operator-facing notice produced by a single tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub code: AlertCode,
    pub message: String,
    pub timestamp: f64,
}

/// When alerts fire, independent of throttling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
    /// Minimum time between two emitted alerts, in seconds.
    pub cooldown: f64,
    /// CCZ dwell below which an entry notice is raised.
    pub ccz_entry_window: f64,
    /// CCZ dwell above which the extended-dwell caution is raised.
    pub ccz_extended_after: f64,
    /// Converging deviation above which the large-deviation caution is raised.
    pub large_deviation: f64,
    /// Converging deviation above which a convergence notice is raised.
    pub converging_deviation: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            cooldown: 5.0,
            ccz_entry_window: 10.0,
            ccz_extended_after: 120.0,
            large_deviation: 1.5,
            converging_deviation: 0.5,
        }
    }
}

impl AlertPolicy {
    /// Decides which alert, if any, the tick deserves. Ignores the cooldown.
    ///
    /// # Arguments
    /// * `state` - The held regime after classification.
    /// * `time_in_state` - Dwell in `state` so far.
    /// * `exponent` - The divergence estimate of the tick.
    /// * `deviation` - The normalized deviation of the tick.
    /// * `now` - The tick timestamp.
    pub fn evaluate(
        &self,
        state: RegimeState,
        time_in_state: f64,
        exponent: f64,
        deviation: f64,
        now: f64,
    ) -> Option<Alert> {
        let (severity, code, message) = match state {
            RegimeState::Initializing | RegimeState::StableCycle => return None,
            RegimeState::CreativeChaosZone if time_in_state < self.ccz_entry_window => (
                AlertSeverity::Info,
                AlertCode::CczEntry,
                "Entering Creative Chaos Zone - Enhanced workload expected".to_string(),
            ),
            RegimeState::CreativeChaosZone if time_in_state > self.ccz_extended_after => (
                AlertSeverity::Caution,
                AlertCode::CczExtended,
                format!("Extended CCZ duration ({time_in_state:.0}s) - Consider LC recovery actions"),
            ),
            RegimeState::CreativeChaosZone => return None,
            RegimeState::Chaos => (
                AlertSeverity::Warning,
                AlertCode::ChaosDetected,
                format!("High instability detected (λ={exponent:.2}) - Immediate corrective action recommended"),
            ),
            RegimeState::Converging if deviation > self.large_deviation => (
                AlertSeverity::Caution,
                AlertCode::LargeDeviation,
                format!("Significant deviation from LC (d={deviation:.2}) - Monitor trajectory"),
            ),
            RegimeState::Converging if deviation > self.converging_deviation => (
                AlertSeverity::Info,
                AlertCode::Converging,
                format!("Converging to stable LC (d={deviation:.2})"),
            ),
            RegimeState::Converging => return None,
        };
        Some(Alert { severity, code, message, timestamp: now })
    }
}

/// Applies an [`AlertPolicy`] with cooldown suppression.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertGate {
    policy: AlertPolicy,
    last_alert: Option<f64>,
}

impl AlertGate {
    pub fn new(policy: AlertPolicy) -> Self { Self { policy, last_alert: None } }

    pub fn policy(&self) -> &AlertPolicy { &self.policy }

    /// Timestamp of the last emitted alert.
    pub fn last_alert(&self) -> Option<f64> { self.last_alert }

    /// Evaluates the policy unless the previous alert is younger than the cooldown.
    /// Only emitted alerts restart the cooldown.
    pub fn offer(
        &mut self,
        state: RegimeState,
        time_in_state: f64,
        exponent: f64,
        deviation: f64,
        now: f64,
    ) -> Option<Alert> {
        if self.last_alert.is_some_and(|last| now - last < self.policy.cooldown) {
            return None;
        }
        let alert = self.policy.evaluate(state, time_in_state, exponent, deviation, now)?;
        self.last_alert = Some(now);
        Some(alert)
    }
}
