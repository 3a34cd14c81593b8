use super::{
    CoupledOscillator, ModelParameters, ReferenceTrajectory,
    ode::{DormandPrince, IntegrationError, IntegrationStats, Tolerances},
};
use crate::util::{Vec3D, helpers};
use crate::{info, log};
use serde::Serialize;
use strum_macros::Display;

/// Errors surfaced while building or querying a [`ReferenceTrajectoryModel`].
#[derive(Debug, Display, Clone, PartialEq)]
pub enum ModelError {
    #[strum(to_string = "integration failed: {reason}")]
    Integration { reason: String },
    #[strum(to_string = "reference trajectory has not been computed")]
    NotComputed,
    #[strum(to_string = "reference trajectory is already computed")]
    AlreadyComputed,
    #[strum(to_string = "invalid model parameters: {reason}")]
    InvalidParameters { reason: String },
    #[strum(to_string = "invalid integration request: {reason}")]
    InvalidRequest { reason: String },
}

impl std::error::Error for ModelError {}

impl From<IntegrationError> for ModelError {
    fn from(value: IntegrationError) -> Self { Self::Integration { reason: value.to_string() } }
}

/// Dense output of a free integration run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulatedRun {
    pub times: Vec<f64>,
    pub states: Vec<[f64; CoupledOscillator::DIM]>,
}

impl SimulatedRun {
    /// Projects the full states onto the reduced (P, B, W) space.
    pub fn reduced(&self) -> Vec<Vec3D<f64>> {
        self.states.iter().map(|s| Vec3D::new(s[0], s[2], s[4])).collect()
    }
}

/// Parameters and derived scalars of a computed model, as embedded in reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelSummary {
    pub params: ModelParameters,
    pub period: Option<f64>,
    pub centroid: Option<Vec3D<f64>>,
    pub spread: Option<Vec3D<f64>>,
    pub reference_points: usize,
}

/// Characterizes the expected periodic attractor of the flight state.
///
/// The model starts out uncomputed. After a successful [`Self::compute`] the trajectory is
/// fixed for the lifetime of the model, which can then be shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ReferenceTrajectoryModel {
    params: ModelParameters,
    trajectory: Option<ReferenceTrajectory>,
    stats: Option<IntegrationStats>,
}

impl ReferenceTrajectoryModel {
    pub const DEFAULT_DURATION: f64 = 1000.0;
    pub const DEFAULT_SAMPLE_COUNT: usize = 10_000;
    pub const DEFAULT_INITIAL_STATE: [f64; CoupledOscillator::DIM] = [0.1, 0.0, 0.1, 0.0, 0.5];
    /// Fraction of the integrated samples kept as the steady-state tail.
    pub const STEADY_STATE_FRACTION: f64 = 0.1;
    /// Period assumed when the spectrum has no positive-frequency peak.
    pub const FALLBACK_PERIOD: f64 = 5.1;
    const TOLERANCES: Tolerances = Tolerances { rtol: 1e-6, atol: 1e-9 };
    const MIN_TAIL: usize = 2;

    pub fn new(params: ModelParameters) -> Self { Self { params, trajectory: None, stats: None } }

    pub fn params(&self) -> &ModelParameters { &self.params }

    pub fn is_computed(&self) -> bool { self.trajectory.is_some() }

    /// Solver statistics of the reference integration, if computed.
    pub fn integration_stats(&self) -> Option<IntegrationStats> { self.stats }

    /// Returns the computed trajectory.
    ///
    /// # Returns
    /// The trajectory or `ModelError::NotComputed`.
    pub fn trajectory(&self) -> Result<&ReferenceTrajectory, ModelError> {
        self.trajectory.as_ref().ok_or(ModelError::NotComputed)
    }

    /// Computes the reference trajectory with default duration, sampling and initial state.
    pub fn compute_default(&mut self) -> Result<&ReferenceTrajectory, ModelError> {
        self.compute(Self::DEFAULT_DURATION, Self::DEFAULT_SAMPLE_COUNT, None)
    }

    /// Integrates the coupled system and keeps the steady-state tail as reference.
    ///
    /// # Arguments
    /// * `duration` - Integration horizon in seconds.
    /// * `sample_count` - Number of evenly spaced samples over `[0, duration]`.
    /// * `initial_state` - Starting state, defaults to a small perturbation near the origin.
    ///
    /// # Returns
    /// The computed trajectory, or the reason no trajectory could be produced.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn compute(
        &mut self,
        duration: f64,
        sample_count: usize,
        initial_state: Option<[f64; CoupledOscillator::DIM]>,
    ) -> Result<&ReferenceTrajectory, ModelError> {
        if self.trajectory.is_some() {
            return Err(ModelError::AlreadyComputed);
        }
        self.params.validate()?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ModelError::InvalidRequest { reason: format!("duration must be positive, got {duration}") });
        }
        let tail_len = (Self::STEADY_STATE_FRACTION * sample_count as f64).floor() as usize;
        if tail_len < Self::MIN_TAIL {
            return Err(ModelError::InvalidRequest {
                reason: format!("{sample_count} samples leave fewer than {} steady-state points", Self::MIN_TAIL),
            });
        }

        let y0 = initial_state.unwrap_or(Self::DEFAULT_INITIAL_STATE);
        let times = helpers::linspace(0.0, duration, sample_count);
        let mut solver = DormandPrince::new(Self::TOLERANCES);
        let states = solver.integrate(&CoupledOscillator::new(self.params), y0, &times)?;
        let stats = solver.stats();
        log!(
            "Reference integration finished: {} accepted, {} rejected steps",
            stats.accepted,
            stats.rejected
        );

        let skip = sample_count - tail_len;
        let tail_times = times[skip..].to_vec();
        let tail_points = states[skip..].iter().map(|s| Vec3D::new(s[0], s[2], s[4])).collect();
        let spacing = duration / (sample_count - 1) as f64;
        let trajectory = ReferenceTrajectory::from_tail(tail_times, tail_points, spacing, Self::FALLBACK_PERIOD);
        info!(
            "Reference trajectory ready: {} points, period {:.3}s, spread norm {:.3}",
            trajectory.len(),
            trajectory.period(),
            trajectory.spread_norm()
        );

        self.stats = Some(stats);
        Ok(self.trajectory.insert(trajectory))
    }

    /// Finds the reference point closest to `state`.
    ///
    /// # Arguments
    /// * `state` - The live (P, B, W) state.
    ///
    /// # Returns
    /// The nearest reference point and its index, or `ModelError::NotComputed`.
    pub fn closest_point(&self, state: &Vec3D<f64>) -> Result<(Vec3D<f64>, usize), ModelError> {
        let (point, index, _) = self.trajectory()?.nearest(state);
        Ok((point, index))
    }

    /// Integrates the system freely from an arbitrary state without touching the reference.
    ///
    /// # Arguments
    /// * `t_span` - Start and end time.
    /// * `initial_state` - Full 5-D starting state.
    /// * `n_points` - Number of evenly spaced output samples, at least 2.
    pub fn simulate(
        &self,
        t_span: (f64, f64),
        initial_state: [f64; CoupledOscillator::DIM],
        n_points: usize,
    ) -> Result<SimulatedRun, ModelError> {
        self.params.validate()?;
        let (start, end) = t_span;
        if !(start.is_finite() && end.is_finite() && end > start) || n_points < 2 {
            return Err(ModelError::InvalidRequest {
                reason: format!("cannot sample {n_points} points over [{start}, {end}]"),
            });
        }
        let times = helpers::linspace(start, end, n_points);
        let states = DormandPrince::new(Self::TOLERANCES).integrate(
            &CoupledOscillator::new(self.params),
            initial_state,
            &times,
        )?;
        Ok(SimulatedRun { times, states })
    }

    pub fn summary(&self) -> ModelSummary {
        let traj = self.trajectory.as_ref();
        ModelSummary {
            params: self.params,
            period: traj.map(ReferenceTrajectory::period),
            centroid: traj.map(ReferenceTrajectory::centroid),
            spread: traj.map(ReferenceTrajectory::spread),
            reference_points: traj.map_or(0, ReferenceTrajectory::len),
        }
    }
}
