use itertools::Itertools;

/// Computes the arithmetic mean of a slice.
///
/// # Arguments
/// - `values`: The samples.
///
/// # Returns
/// - `None` for an empty slice, the mean otherwise.
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Computes the population standard deviation (divisor `n`) of a slice.
///
/// # Arguments
/// - `values`: The samples.
///
/// # Returns
/// - `None` for an empty slice, the standard deviation otherwise.
#[allow(clippy::cast_precision_loss)]
pub fn population_std(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let var = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Fits `y = slope * i + intercept` by ordinary least squares, where `i` is the sample index.
///
/// # Arguments
/// - `values`: The `y` samples, indexed `0..n`.
///
/// # Returns
/// - `None` if fewer than two samples are given, the fitted slope otherwise.
#[allow(clippy::cast_precision_loss)]
pub fn index_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values)?;
    let (num, den) = values.iter().enumerate().fold((0.0, 0.0), |(num, den), (i, y)| {
        let dx = i as f64 - x_mean;
        (num + dx * (y - y_mean), den + dx * dx)
    });
    Some(num / den)
}

/// Computes the `q`-th percentile using linear interpolation between closest ranks.
///
/// # Arguments
/// - `values`: The samples in arbitrary order.
/// - `q`: The percentile in `[0, 100]`.
///
/// # Returns
/// - `None` for an empty slice, the interpolated percentile otherwise.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = values.iter().copied().sorted_by(f64::total_cmp).collect_vec();
    let rank = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Generates `n` evenly spaced samples over `[start, end]`, both ends included.
#[allow(clippy::cast_precision_loss)]
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| if i == n - 1 { end } else { start + step * i as f64 }).collect()
        }
    }
}
