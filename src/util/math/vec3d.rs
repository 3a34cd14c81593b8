use num::Float;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::{Add, AddAssign, Div, Mul};
use strum_macros::{Display as StrumDisplay, EnumIter};

/// The three axes of the reduced flight state.
///
/// `Pitch` maps to the `x`-component, `Bank` to `y` and `Power` to `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Axis {
    Pitch,
    Bank,
    Power,
}

/// A 3D vector generic over any floating point type.
///
/// This struct represents a point in the reduced (P, B, W) state space and provides
/// the operations needed for distance, normalization and spread calculations.
///
/// # Type Parameters
/// * `T` - The functionality for the vector depends on traits implemented by `T`.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vec3D<T> {
    /// The x-component (pitch-equivalent).
    x: T,
    /// The y-component (bank-equivalent).
    y: T,
    /// The z-component (power/memory proxy).
    z: T,
}

impl<T: Copy> Vec3D<T> {
    /// Creates a new vector with the given components.
    ///
    /// # Arguments
    /// * `x` - The x-component of the vector.
    /// * `y` - The y-component of the vector.
    /// * `z` - The z-component of the vector.
    ///
    /// # Returns
    /// A new `Vec3D` object.
    pub const fn new(x: T, y: T, z: T) -> Self { Self { x, y, z } }

    pub const fn x(&self) -> T { self.x }

    pub const fn y(&self) -> T { self.y }

    pub const fn z(&self) -> T { self.z }

    /// Returns the component along the given axis.
    pub const fn axis(&self, axis: Axis) -> T {
        match axis {
            Axis::Pitch => self.x,
            Axis::Bank => self.y,
            Axis::Power => self.z,
        }
    }
}

impl<T: Float> Vec3D<T> {
    /// Returns the zero vector.
    pub fn zero() -> Self { Self::new(T::zero(), T::zero(), T::zero()) }

    /// Computes the magnitude (absolute value) of the vector.
    ///
    /// # Returns
    /// The magnitude of the vector as a scalar of type `T`.
    pub fn abs(&self) -> T { self.abs_sq().sqrt() }

    /// Computes the squared magnitude of the vector.
    pub fn abs_sq(&self) -> T { self.x * self.x + self.y * self.y + self.z * self.z }

    /// Creates a vector pointing from the current vector (`self`) to another vector (`other`).
    ///
    /// # Arguments
    /// * `other` - The target vector.
    ///
    /// # Returns
    /// A new vector representing the direction from `self` to `other`.
    pub fn to(&self, other: &Vec3D<T>) -> Vec3D<T> {
        Vec3D::new(other.x - self.x, other.y - self.y, other.z - self.z)
    }

    /// Normalizes the vector to have a magnitude of 1.
    /// If the magnitude is zero, the original vector is returned unmodified.
    ///
    /// # Returns
    /// A normalized vector.
    pub fn normalize(self) -> Self {
        let magnitude = self.abs();
        if magnitude.is_zero() { self } else { self / magnitude }
    }

    /// Computes the Euclidean distance between the current vector and another vector.
    ///
    /// # Arguments
    /// * `other` - The other vector to compute the distance to.
    ///
    /// # Returns
    /// The Euclidean distance as a scalar of type `T`.
    pub fn euclid_distance(&self, other: &Self) -> T { self.to(other).abs() }

    /// Computes the squared Euclidean distance, avoiding the square root.
    pub fn euclid_distance_sq(&self, other: &Self) -> T { self.to(other).abs_sq() }

    /// Checks that every component is neither `NaN` nor infinite.
    pub fn is_finite(&self) -> bool { self.x.is_finite() && self.y.is_finite() && self.z.is_finite() }
}

impl<T: Float> Add for Vec3D<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output { Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z) }
}

impl<T: Float> AddAssign for Vec3D<T> {
    fn add_assign(&mut self, rhs: Self) { *self = *self + rhs; }
}

impl<T: Float> Mul<T> for Vec3D<T> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self::Output { Self::new(self.x * rhs, self.y * rhs, self.z * rhs) }
}

impl<T: Float> Div<T> for Vec3D<T> {
    type Output = Self;

    fn div(self, rhs: T) -> Self::Output { Self::new(self.x / rhs, self.y / rhs, self.z / rhs) }
}

impl<T: Display> Display for Vec3D<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}
