pub mod helpers;
pub mod spectrum;
mod vec3d;

pub use vec3d::{Axis, Vec3D};
