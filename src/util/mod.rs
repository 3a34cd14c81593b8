mod bounded_history;
pub mod logger;
mod math;

pub use bounded_history::BoundedHistory;
pub use math::helpers;
pub use math::spectrum;
pub use math::{Axis, Vec3D};
