use super::RegimeState;
use crate::util::{Axis, Vec3D};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::Display;

/// Errors of the runtime gain configuration.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum GuidanceError {
    #[strum(to_string = "unknown regime state '{name}'")]
    UnknownState { name: String },
}

impl std::error::Error for GuidanceError {}

/// Per-regime scaling of the correction vector, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceGains {
    pub stable_cycle: f64,
    pub creative_chaos: f64,
    pub chaos: f64,
    pub converging: f64,
}

impl Default for GuidanceGains {
    fn default() -> Self { Self { stable_cycle: 0.0, creative_chaos: 0.5, chaos: 1.0, converging: 0.7 } }
}

impl GuidanceGains {
    /// Gain configured for `state`, `None` for states without a table entry.
    pub fn get(&self, state: RegimeState) -> Option<f64> {
        match state {
            RegimeState::StableCycle => Some(self.stable_cycle),
            RegimeState::CreativeChaosZone => Some(self.creative_chaos),
            RegimeState::Chaos => Some(self.chaos),
            RegimeState::Converging => Some(self.converging),
            RegimeState::Initializing => None,
        }
    }

    fn slot(&mut self, state: RegimeState) -> Option<&mut f64> {
        match state {
            RegimeState::StableCycle => Some(&mut self.stable_cycle),
            RegimeState::CreativeChaosZone => Some(&mut self.creative_chaos),
            RegimeState::Chaos => Some(&mut self.chaos),
            RegimeState::Converging => Some(&mut self.converging),
            RegimeState::Initializing => None,
        }
    }
}

/// A bounded correction towards the reference cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Guidance {
    /// Unit vector from the live state towards the nearest reference point.
    pub direction: Vec3D<f64>,
    /// `gain(state) * deviation`.
    pub magnitude: f64,
    /// Scaled correction, per axis.
    pub components: Vec3D<f64>,
    pub recommendation: String,
}

impl Guidance {
    fn hold() -> Self {
        Self {
            direction: Vec3D::zero(),
            magnitude: 0.0,
            components: Vec3D::zero(),
            recommendation: GuidanceGenerator::HOLD.to_string(),
        }
    }
}

/// Converts the deviation from the reference cycle into a corrective vector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GuidanceGenerator {
    gains: GuidanceGains,
}

impl GuidanceGenerator {
    /// Offsets shorter than this count as being on the cycle.
    pub const ON_CYCLE_TOLERANCE: f64 = 1e-6;
    /// Axis components above this magnitude produce an action.
    pub const ACTION_THRESHOLD: f64 = 0.1;
    /// Gain of states without an entry in the gain table.
    pub const DEFAULT_GAIN: f64 = 0.5;
    pub const HOLD: &'static str = "Maintain current trajectory";

    pub fn new(gains: GuidanceGains) -> Self { Self { gains } }

    pub fn gains(&self) -> GuidanceGains { self.gains }

    /// Looks up the gain applied in `state`.
    pub fn gain(&self, state: RegimeState) -> f64 { self.gains.get(state).unwrap_or(Self::DEFAULT_GAIN) }

    /// Overrides the gain of one regime.
    ///
    /// # Arguments
    /// * `state_name` - The regime name, matched case-insensitively.
    /// * `gain` - The new gain, clamped to `[0, 1]`. `NaN` becomes `0`.
    ///
    /// # Returns
    /// `GuidanceError::UnknownState` if the name maps to no gain table entry.
    pub fn set_gain(&mut self, state_name: &str, gain: f64) -> Result<(), GuidanceError> {
        let unknown = || GuidanceError::UnknownState { name: state_name.to_string() };
        let state = RegimeState::from_str(state_name).map_err(|_| unknown())?;
        let slot = self.gains.slot(state).ok_or_else(unknown)?;
        *slot = gain.max(0.0).min(1.0);
        Ok(())
    }

    /// Computes the correction for one tick.
    ///
    /// # Arguments
    /// * `current` - The live state.
    /// * `nearest` - The nearest reference point.
    /// * `state` - The classified regime.
    /// * `deviation` - The normalized deviation.
    ///
    /// # Returns
    /// The correction vector and its recommendation.
    pub fn guide(&self, current: &Vec3D<f64>, nearest: &Vec3D<f64>, state: RegimeState, deviation: f64) -> Guidance {
        let offset = current.to(nearest);
        let norm = offset.abs();
        if norm.is_nan() || norm < Self::ON_CYCLE_TOLERANCE {
            return Guidance::hold();
        }
        let direction = offset / norm;
        let magnitude = self.gain(state) * deviation;
        let components = direction * magnitude;
        Guidance {
            direction,
            magnitude,
            components,
            recommendation: Self::recommendation(&components, state),
        }
    }

    fn recommendation(components: &Vec3D<f64>, state: RegimeState) -> String {
        let actions = Axis::iter()
            .filter_map(|axis| {
                let c = components.axis(axis);
                if c > Self::ACTION_THRESHOLD {
                    Some(format!("increase {axis}"))
                } else if c < -Self::ACTION_THRESHOLD {
                    Some(format!("decrease {axis}"))
                } else {
                    None
                }
            })
            .join(", ");
        if actions.is_empty() {
            return Self::HOLD.to_string();
        }
        let prefix = match state {
            RegimeState::Chaos => "URGENT: ",
            RegimeState::CreativeChaosZone => "Consider: ",
            _ => "Suggested: ",
        };
        format!("{prefix}{actions}")
    }
}
