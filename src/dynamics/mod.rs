mod limit_cycle;
mod model_parameters;
pub mod ode;
mod reference_model;
mod reference_trajectory;

pub use limit_cycle::CoupledOscillator;
pub use model_parameters::ModelParameters;
pub use reference_model::{ModelError, ModelSummary, ReferenceTrajectoryModel, SimulatedRun};
pub use reference_trajectory::ReferenceTrajectory;
