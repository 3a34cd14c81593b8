use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Operating regime of a monitored flight.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum RegimeState {
    /// The sliding window is still filling.
    Initializing,
    /// On the reference cycle and contracting.
    #[strum(to_string = "StableCycle", serialize = "Stable_LC")]
    StableCycle,
    /// Bounded instability inside the threshold band.
    #[strum(to_string = "CreativeChaosZone", serialize = "CCZ", serialize = "Creative_Chaos_Zone")]
    CreativeChaosZone,
    /// Divergence above the upper exponent threshold.
    Chaos,
    /// Anything else, typically drifting back towards the cycle.
    #[strum(to_string = "Converging", serialize = "Converging_to_LC")]
    Converging,
}

impl RegimeState {
    /// Whether this state can be the output of [`RegimeClassifier::classify`].
    pub fn is_classified(self) -> bool { self != RegimeState::Initializing }
}

/// Threshold band of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    pub lambda_min: f64,
    pub lambda_max: f64,
    pub deviation_min: f64,
    pub deviation_max: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self { Self { lambda_min: 0.01, lambda_max: 0.5, deviation_min: 0.2, deviation_max: 0.8 } }
}

impl RegimeThresholds {
    /// Strict band membership on both metrics.
    pub fn in_creative_chaos(&self, exponent: f64, deviation: f64) -> bool {
        self.lambda_min < exponent
            && exponent < self.lambda_max
            && self.deviation_min < deviation
            && deviation < self.deviation_max
    }

    /// Whether both bands are well ordered and finite.
    pub fn is_valid(&self) -> bool {
        [self.lambda_min, self.lambda_max, self.deviation_min, self.deviation_max].iter().all(|v| v.is_finite())
            && self.lambda_min < self.lambda_max
            && self.deviation_min < self.deviation_max
    }
}

/// Maps (stability exponent, normalized deviation) to a regime.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegimeClassifier {
    thresholds: RegimeThresholds,
}

impl RegimeClassifier {
    pub fn new(thresholds: RegimeThresholds) -> Self { Self { thresholds } }

    pub fn thresholds(&self) -> &RegimeThresholds { &self.thresholds }

    /// Classifies a tick. First matching rule wins, every comparison is strict, so values
    /// sitting exactly on a threshold fall through to the next rule. `NaN` ends up as `Converging`.
    ///
    /// # Arguments
    /// * `exponent` - The local divergence estimate.
    /// * `deviation` - The normalized distance to the reference cycle.
    ///
    /// # Returns
    /// One of the four post-initialization states.
    pub fn classify(&self, exponent: f64, deviation: f64) -> RegimeState {
        let th = &self.thresholds;
        if th.in_creative_chaos(exponent, deviation) {
            RegimeState::CreativeChaosZone
        } else if exponent < th.lambda_min && deviation < th.deviation_min {
            RegimeState::StableCycle
        } else if exponent > th.lambda_max {
            RegimeState::Chaos
        } else {
            RegimeState::Converging
        }
    }
}

/// Coarse label derived from the exponent alone, used for offline trajectory assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum StabilityBand {
    #[strum(to_string = "Over-damped")]
    OverDamped,
    #[strum(to_string = "Stable LC")]
    StableCycle,
    #[strum(to_string = "Creative Chaos Zone")]
    CreativeChaos,
    Chaotic,
}

impl StabilityBand {
    pub fn from_exponent(exponent: f64) -> Self {
        if exponent < 0.01 {
            Self::OverDamped
        } else if exponent < 0.1 {
            Self::StableCycle
        } else if exponent < 0.5 {
            Self::CreativeChaos
        } else {
            Self::Chaotic
        }
    }
}

/// A change of the held regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    pub from: RegimeState,
    pub to: RegimeState,
    /// Time of the tick that caused the change.
    pub at: f64,
    /// Time spent in `from`.
    pub dwell: f64,
}

/// Holds the active regime and the time it was entered.
#[derive(Debug, Clone, Copy)]
pub struct RegimeTracker {
    state: RegimeState,
    entered_at: f64,
}

impl Default for RegimeTracker {
    fn default() -> Self { Self { state: RegimeState::Initializing, entered_at: 0.0 } }
}

impl RegimeTracker {
    pub fn state(&self) -> RegimeState { self.state }

    pub fn time_in_state(&self, now: f64) -> f64 { now - self.entered_at }

    /// Adopts `next` if it differs from the held state.
    ///
    /// # Returns
    /// The transition, if one happened.
    pub fn update(&mut self, next: RegimeState, now: f64) -> Option<Transition> {
        if next == self.state {
            return None;
        }
        let transition = Transition { from: self.state, to: next, at: now, dwell: now - self.entered_at };
        self.state = next;
        self.entered_at = now;
        Some(transition)
    }
}
