use super::NumericFault;
use crate::util::{Vec3D, helpers};
use crate::warn;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Phase space reconstruction settings of [`DivergenceEstimator::embedded`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingParams {
    /// Dimension of the delay vectors.
    pub embedding_dim: usize,
    /// Lag between two coordinates of a delay vector, in samples.
    pub delay: usize,
    /// Neighbours at most this many samples apart in time are ignored.
    pub min_separation: usize,
    /// Neighbours further apart in time than this are ignored, unbounded if `None`.
    pub max_separation: Option<usize>,
    /// Number of steps each neighbour pair is followed.
    pub horizon: usize,
}

impl Default for EmbeddingParams {
    fn default() -> Self {
        Self { embedding_dim: 3, delay: 1, min_separation: 10, max_separation: None, horizon: 6 }
    }
}

/// Cheap local proxy for the largest Lyapunov exponent.
///
/// Positive output means neighbouring samples separate over the window, zero or
/// negative output means they contract.
pub struct DivergenceEstimator;

impl DivergenceEstimator {
    /// Distances are floored here before taking the logarithm.
    pub const DISTANCE_FLOOR: f64 = 1e-10;
    /// Fewer log-distances than this yield the neutral exponent.
    pub const MIN_LOG_DISTANCES: usize = 11;
    /// Estimates are clamped to `[-BOUND, BOUND]`.
    pub const BOUND: f64 = 2.0;
    /// Exponent substituted whenever no meaningful estimate exists.
    pub const NEUTRAL: f64 = 0.0;
    const VARIANCE_SEGMENTS: usize = 5;
    pub const MIN_OFFLINE_SAMPLES: usize = 100;

    /// Estimates the local divergence rate of a window of states.
    ///
    /// The log of the consecutive Euclidean distances is regressed against the sample
    /// index, the slope is the estimate.
    ///
    /// # Arguments
    /// * `window` - The states, oldest first.
    ///
    /// # Returns
    /// The clamped slope, [`Self::NEUTRAL`] for short windows, or a fault if the regression is not finite.
    pub fn estimate<'a>(window: impl IntoIterator<Item = &'a Vec3D<f64>>) -> Result<f64, NumericFault> {
        let log_distances = window
            .into_iter()
            .tuple_windows()
            .map(|(a, b)| {
                let d = a.euclid_distance(b);
                if d.is_nan() { d } else { d.max(Self::DISTANCE_FLOOR).ln() }
            })
            .collect_vec();

        if log_distances.len() < Self::MIN_LOG_DISTANCES {
            return Ok(Self::NEUTRAL);
        }
        let slope = helpers::index_slope(&log_distances).unwrap_or(Self::NEUTRAL);
        if slope.is_finite() {
            Ok(slope.clamp(-Self::BOUND, Self::BOUND))
        } else {
            Err(NumericFault::NonFiniteExponent { value: slope })
        }
    }

    /// Offline estimate of the largest exponent from the pitch series alone.
    ///
    /// The series is delay-embedded, every delay vector is paired with its nearest neighbour
    /// outside the temporal exclusion window, and the mean log separation of the pairs is
    /// followed for `horizon` steps. The slope of that curve is the exponent per sample.
    /// If no usable curve exists the estimate falls back to [`Self::variance_growth`].
    ///
    /// # Arguments
    /// * `points` - A long trajectory, at least [`Self::MIN_OFFLINE_SAMPLES`] states.
    /// * `params` - Embedding and neighbour selection settings.
    ///
    /// # Returns
    /// The exponent per sample step, or `InsufficientSamples` for short trajectories.
    pub fn embedded(points: &[Vec3D<f64>], params: &EmbeddingParams) -> Result<f64, NumericFault> {
        if points.len() < Self::MIN_OFFLINE_SAMPLES {
            return Err(NumericFault::InsufficientSamples {
                got: points.len(),
                needed: Self::MIN_OFFLINE_SAMPLES,
            });
        }
        let series = points.iter().map(Vec3D::x).collect_vec();
        Self::neighbour_divergence(&series, params).or_else(|fault| {
            warn!("Embedded exponent unavailable ({fault}), falling back to variance growth");
            Self::variance_growth(points)
        })
    }

    fn neighbour_divergence(series: &[f64], params: &EmbeddingParams) -> Result<f64, NumericFault> {
        let EmbeddingParams { embedding_dim, delay, min_separation, max_separation, horizon } = *params;
        if embedding_dim == 0 || delay == 0 || horizon == 0 {
            return Err(NumericFault::Embedding {
                reason: "dimension, delay and horizon must be positive".to_string(),
            });
        }
        let usable = series
            .len()
            .checked_sub((embedding_dim - 1) * delay + horizon)
            .filter(|n| *n >= 2)
            .ok_or_else(|| NumericFault::Embedding {
                reason: format!("{} samples are too few to embed", series.len()),
            })?;

        let distance = |a: usize, b: usize| {
            (0..embedding_dim).map(|j| (series[a + j * delay] - series[b + j * delay]).powi(2)).sum::<f64>().sqrt()
        };
        let mut log_sums = vec![0.0; horizon + 1];
        let mut counts = vec![0_usize; horizon + 1];
        for i in 0..usable {
            let neighbour = (0..usable)
                .filter(|&j| {
                    let sep = i.abs_diff(j);
                    sep > min_separation && max_separation.is_none_or(|max| sep <= max)
                })
                .map(|j| (j, distance(i, j)))
                .filter(|(_, d)| *d > 0.0)
                .min_by(|a, b| a.1.total_cmp(&b.1));
            let Some((j, _)) = neighbour else { continue };
            for (k, (sum, count)) in log_sums.iter_mut().zip(counts.iter_mut()).enumerate() {
                let d = distance(i + k, j + k);
                if d > 0.0 && d.is_finite() {
                    *sum += d.ln();
                    *count += 1;
                }
            }
        }
        if counts.contains(&0) {
            return Err(NumericFault::Embedding { reason: "no neighbour pairs to follow".to_string() });
        }

        #[allow(clippy::cast_precision_loss)]
        let curve = log_sums.iter().zip(&counts).map(|(sum, count)| sum / *count as f64).collect_vec();
        let slope = helpers::index_slope(&curve).unwrap_or(f64::NAN);
        if slope.is_finite() { Ok(slope) } else { Err(NumericFault::NonFiniteExponent { value: slope }) }
    }

    /// Offline estimate from the growth of the per-segment variance.
    ///
    /// The series is cut into five equal segments, the slope of the log of their mean
    /// per-axis variance is halved (variance scales with the squared amplitude).
    ///
    /// # Arguments
    /// * `points` - A long trajectory, at least [`Self::MIN_OFFLINE_SAMPLES`] states.
    ///
    /// # Returns
    /// The clamped growth rate per segment.
    pub fn variance_growth(points: &[Vec3D<f64>]) -> Result<f64, NumericFault> {
        if points.len() < Self::MIN_OFFLINE_SAMPLES {
            return Err(NumericFault::InsufficientSamples {
                got: points.len(),
                needed: Self::MIN_OFFLINE_SAMPLES,
            });
        }
        let segment_len = points.len() / Self::VARIANCE_SEGMENTS;
        let log_variances = points
            .chunks_exact(segment_len)
            .take(Self::VARIANCE_SEGMENTS)
            .map(|seg| {
                let axis_var = |f: fn(&Vec3D<f64>) -> f64| {
                    helpers::population_std(&seg.iter().map(f).collect_vec()).map_or(0.0, |s| s * s)
                };
                let var = (axis_var(Vec3D::x) + axis_var(Vec3D::y) + axis_var(Vec3D::z)) / 3.0;
                if var.is_nan() { var } else { var.max(Self::DISTANCE_FLOOR).ln() }
            })
            .collect_vec();

        let slope = helpers::index_slope(&log_variances).unwrap_or(Self::NEUTRAL) / 2.0;
        if slope.is_finite() {
            Ok(slope.clamp(-Self::BOUND, Self::BOUND))
        } else {
            Err(NumericFault::NonFiniteExponent { value: slope })
        }
    }
}
