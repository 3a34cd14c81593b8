use super::ModelError;
use serde::{Deserialize, Serialize};

/// Coefficients of the coupled limit cycle system.
///
/// The defaults are the approach-phase calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Van der Pol nonlinearity `mu`; positive values give self-sustained oscillation.
    nonlinearity: f64,
    /// Natural angular frequency `omega_0`.
    natural_frequency: f64,
    /// Coupling of bank into the pitch oscillator (`k_B`).
    bank_coupling: f64,
    /// Coupling of pitch into the bank oscillator (`k_P`).
    pitch_coupling: f64,
    /// Exponential decay rate `lambda` of the memory state `W`.
    memory_decay: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            nonlinearity: 0.47,
            natural_frequency: 1.23,
            bank_coupling: 0.12,
            pitch_coupling: 0.09,
            memory_decay: 0.031,
        }
    }
}

impl ModelParameters {
    /// Creates a validated parameter set.
    ///
    /// # Arguments
    /// * `nonlinearity` - `mu`, any finite value.
    /// * `natural_frequency` - `omega_0`, strictly positive.
    /// * `bank_coupling` - `k_B`, any finite value.
    /// * `pitch_coupling` - `k_P`, any finite value.
    /// * `memory_decay` - `lambda`, non-negative.
    ///
    /// # Returns
    /// The parameter set or `ModelError::InvalidParameters`.
    pub fn new(
        nonlinearity: f64,
        natural_frequency: f64,
        bank_coupling: f64,
        pitch_coupling: f64,
        memory_decay: f64,
    ) -> Result<Self, ModelError> {
        let params = Self { nonlinearity, natural_frequency, bank_coupling, pitch_coupling, memory_decay };
        params.validate()?;
        Ok(params)
    }

    /// Checks the invariants `new` enforces. Deserialized parameter sets should be run through this.
    pub fn validate(&self) -> Result<(), ModelError> {
        let all = [
            self.nonlinearity,
            self.natural_frequency,
            self.bank_coupling,
            self.pitch_coupling,
            self.memory_decay,
        ];
        if all.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::InvalidParameters { reason: "coefficients must be finite".into() });
        }
        if self.natural_frequency <= 0.0 {
            return Err(ModelError::InvalidParameters {
                reason: format!("natural frequency must be positive, got {}", self.natural_frequency),
            });
        }
        if self.memory_decay < 0.0 {
            return Err(ModelError::InvalidParameters {
                reason: format!("memory decay must be non-negative, got {}", self.memory_decay),
            });
        }
        Ok(())
    }

    pub fn nonlinearity(&self) -> f64 { self.nonlinearity }

    pub fn natural_frequency(&self) -> f64 { self.natural_frequency }

    pub fn bank_coupling(&self) -> f64 { self.bank_coupling }

    pub fn pitch_coupling(&self) -> f64 { self.pitch_coupling }

    pub fn memory_decay(&self) -> f64 { self.memory_decay }
}
