use crate::util::{Vec3D, helpers, spectrum};
use serde::Serialize;

/// The steady-state tail of the integrated limit cycle, projected onto (P, B, W).
///
/// Instances are only produced by [`super::ReferenceTrajectoryModel::compute`] and expose no mutators.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceTrajectory {
    /// Points of the attractor, in integration order.
    points: Vec<Vec3D<f64>>,
    /// Integration time of every point.
    times: Vec<f64>,
    /// Oscillation period in seconds.
    period: f64,
    /// Per-axis mean of `points`.
    centroid: Vec3D<f64>,
    /// Per-axis population standard deviation of `points`.
    spread: Vec3D<f64>,
}

impl ReferenceTrajectory {
    /// Derives period, centroid and spread from a sampled tail.
    ///
    /// # Arguments
    /// * `times` - Sample times of the tail.
    /// * `points` - The tail itself, at least one point.
    /// * `spacing` - Time between two consecutive samples.
    /// * `fallback_period` - Period used if the spectrum has no positive peak.
    pub(super) fn from_tail(
        times: Vec<f64>,
        points: Vec<Vec3D<f64>>,
        spacing: f64,
        fallback_period: f64,
    ) -> Self {
        let axis = |f: fn(&Vec3D<f64>) -> f64| points.iter().map(f).collect::<Vec<_>>();
        let (xs, ys, zs) = (axis(Vec3D::x), axis(Vec3D::y), axis(Vec3D::z));

        let centroid = Vec3D::new(
            helpers::mean(&xs).unwrap_or(0.0),
            helpers::mean(&ys).unwrap_or(0.0),
            helpers::mean(&zs).unwrap_or(0.0),
        );
        let spread = Vec3D::new(
            helpers::population_std(&xs).unwrap_or(0.0),
            helpers::population_std(&ys).unwrap_or(0.0),
            helpers::population_std(&zs).unwrap_or(0.0),
        );
        let period = spectrum::dominant_frequency(&xs, spacing)
            .map(|f| 1.0 / f)
            .filter(|p| p.is_finite() && *p > 0.0)
            .unwrap_or(fallback_period);

        Self { points, times, period, centroid, spread }
    }

    /// Exhaustive nearest neighbour search.
    ///
    /// # Arguments
    /// * `state` - The query point.
    ///
    /// # Returns
    /// The closest point, its index and the Euclidean distance to it.
    /// Ties resolve to the lowest index.
    pub fn nearest(&self, state: &Vec3D<f64>) -> (Vec3D<f64>, usize, f64) {
        let mut best = (self.points[0], 0, f64::INFINITY);
        for (i, p) in self.points.iter().enumerate() {
            let d_sq = p.euclid_distance_sq(state);
            if d_sq < best.2 {
                best = (*p, i, d_sq);
            }
        }
        (best.0, best.1, best.2.sqrt())
    }

    pub fn points(&self) -> &[Vec3D<f64>] { &self.points }

    pub fn times(&self) -> &[f64] { &self.times }

    pub fn period(&self) -> f64 { self.period }

    pub fn centroid(&self) -> Vec3D<f64> { self.centroid }

    pub fn spread(&self) -> Vec3D<f64> { self.spread }

    /// Norm of the per-axis spread, the scale of normalized deviations.
    pub fn spread_norm(&self) -> f64 { self.spread.abs() }

    pub fn len(&self) -> usize { self.points.len() }

    pub fn is_empty(&self) -> bool { self.points.is_empty() }
}
