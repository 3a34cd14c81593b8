#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
pub mod dynamics;
pub mod supervision;
pub mod util;

#[doc(hidden)]
pub use chrono;

pub use dynamics::{ModelParameters, ReferenceTrajectoryModel};
pub use supervision::{MonitorConfig, RegimeState, Supervisor, TickResult};
