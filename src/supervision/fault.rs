use crate::util::Vec3D;
use strum_macros::Display;

/// Numeric faults of the estimators and of single ticks.
///
/// Tick faults never abort monitoring, the supervisor substitutes a recovered value and reports them.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum NumericFault {
    #[strum(to_string = "sample {position} is not finite and was dropped")]
    NonFiniteSample { position: Vec3D<f64> },
    #[strum(to_string = "divergence slope is not finite ({value})")]
    NonFiniteExponent { value: f64 },
    #[strum(to_string = "deviation is not finite ({value})")]
    NonFiniteDeviation { value: f64 },
    #[strum(to_string = "reference lookup failed: {reason}")]
    ReferenceLookup { reason: String },
    #[strum(to_string = "phase space reconstruction failed: {reason}")]
    Embedding { reason: String },
    #[strum(to_string = "need at least {needed} samples, got {got}")]
    InsufficientSamples { got: usize, needed: usize },
}

impl std::error::Error for NumericFault {}
