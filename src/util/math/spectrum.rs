use rustfft::{FftPlanner, num_complex::Complex};

/// Finds the dominant positive frequency of a real-valued, evenly sampled signal.
///
/// The signal is zero-meaned and run through a forward FFT. Only bins `1..n/2` are
/// inspected, so the zero-frequency bin never wins. Ties resolve to the lowest bin.
///
/// # Arguments
/// - `samples`: The evenly spaced signal.
/// - `spacing`: The time between two samples in seconds.
///
/// # Returns
/// - `Some(frequency)` in Hz if a positive peak exists, `None` otherwise.
#[allow(clippy::cast_precision_loss)]
pub fn dominant_frequency(samples: &[f64], spacing: f64) -> Option<f64> {
    let n = samples.len();
    if n < 4 || spacing <= 0.0 || !spacing.is_finite() {
        return None;
    }
    let mean = samples.iter().sum::<f64>() / n as f64;
    let mut buffer: Vec<Complex<f64>> = samples.iter().map(|s| Complex::new(s - mean, 0.0)).collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buffer);

    let mut best: Option<(usize, f64)> = None;
    for (k, bin) in buffer.iter().enumerate().take(n / 2).skip(1) {
        let magnitude = bin.norm();
        if magnitude.is_finite() && best.is_none_or(|(_, m)| magnitude > m) {
            best = Some((k, magnitude));
        }
    }

    let (k, magnitude) = best?;
    if magnitude <= 0.0 {
        return None;
    }
    Some(k as f64 / (n as f64 * spacing))
}
