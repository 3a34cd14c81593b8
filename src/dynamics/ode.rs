use strum_macros::Display;

/// A first order system `dy/dt = f(t, y)` of fixed dimension `N`.
pub trait OdeSystem<const N: usize> {
    /// Writes `f(t, y)` into `dydt`.
    fn rhs(&self, t: f64, y: &[f64; N], dydt: &mut [f64; N]);
}

/// Mixed error tolerances of the step size controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
}

/// Reasons an integration run can fail.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum IntegrationError {
    #[strum(to_string = "step size underflow at t = {t}")]
    StepSizeUnderflow { t: f64 },
    #[strum(to_string = "step limit exhausted at t = {t}")]
    MaxStepsExceeded { t: f64 },
    #[strum(to_string = "state diverged to a non-finite value at t = {t}")]
    NonFiniteState { t: f64 },
    #[strum(to_string = "output times must be finite and non-decreasing")]
    InvalidOutputTimes,
}

impl std::error::Error for IntegrationError {}

/// Step counters of the last integration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrationStats {
    pub accepted: usize,
    pub rejected: usize,
    pub rhs_evaluations: usize,
}

/// Embedded Dormand–Prince 5(4) integrator with adaptive step size control.
///
/// Steps are always clipped to land exactly on the requested output times, the
/// solution at those times is therefore a full-order step result, not an interpolant.
#[derive(Debug, Clone)]
pub struct DormandPrince {
    tol: Tolerances,
    max_steps: usize,
    stats: IntegrationStats,
}

impl DormandPrince {
    const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];
    const A: [[f64; 6]; 7] = [
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
        [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
        [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0],
        [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0],
        [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
    ];
    /// Difference between the 5th and the embedded 4th order weights.
    const E: [f64; 7] = [
        71.0 / 57600.0,
        0.0,
        -71.0 / 16695.0,
        71.0 / 1920.0,
        -17253.0 / 339_200.0,
        22.0 / 525.0,
        -1.0 / 40.0,
    ];
    const SAFETY: f64 = 0.9;
    const MIN_FACTOR: f64 = 0.2;
    const MAX_FACTOR: f64 = 10.0;
    const DEFAULT_MAX_STEPS: usize = 5_000_000;

    /// Creates an integrator with the given tolerances.
    pub fn new(tol: Tolerances) -> Self { Self { tol, max_steps: Self::DEFAULT_MAX_STEPS, stats: IntegrationStats::default() } }

    /// Limits the total number of attempted steps per run.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn stats(&self) -> IntegrationStats { self.stats }

    /// Integrates `system` from `y0` at `t_eval[0]` and samples the state at every entry of `t_eval`.
    ///
    /// # Arguments
    /// * `system` - The right-hand side.
    /// * `y0` - The state at `t_eval[0]`.
    /// * `t_eval` - Non-decreasing output times.
    ///
    /// # Returns
    /// One state per output time or the reason the solver gave up.
    pub fn integrate<S: OdeSystem<N>, const N: usize>(
        &mut self,
        system: &S,
        y0: [f64; N],
        t_eval: &[f64],
    ) -> Result<Vec<[f64; N]>, IntegrationError> {
        self.stats = IntegrationStats::default();
        let Some(&t0) = t_eval.first() else { return Ok(Vec::new()) };
        if t_eval.iter().any(|t| !t.is_finite()) || t_eval.windows(2).any(|w| w[1] < w[0]) {
            return Err(IntegrationError::InvalidOutputTimes);
        }
        if y0.iter().any(|v| !v.is_finite()) {
            return Err(IntegrationError::NonFiniteState { t: t0 });
        }

        let mut out = Vec::with_capacity(t_eval.len());
        out.push(y0);
        let mut t = t0;
        let mut y = y0;
        let mut f = [0.0; N];
        system.rhs(t, &y, &mut f);
        self.stats.rhs_evaluations += 1;
        let span = t_eval.last().map_or(0.0, |end| end - t0);
        let mut h = self.initial_step(&y, &f, span);

        for &target in &t_eval[1..] {
            while t < target {
                if self.stats.accepted + self.stats.rejected >= self.max_steps {
                    return Err(IntegrationError::MaxStepsExceeded { t });
                }
                if h <= f64::EPSILON * t.abs().max(1.0) {
                    return Err(IntegrationError::StepSizeUnderflow { t });
                }
                let remaining = target - t;
                let clipped = remaining <= h;
                let step = if clipped { remaining } else { h };
                let (y_new, f_new, err) = self.step(system, t, &y, &f, step);

                if !err.is_finite() || y_new.iter().any(|v| !v.is_finite()) {
                    self.stats.rejected += 1;
                    h = step * Self::MIN_FACTOR;
                    continue;
                }

                let factor = if err == 0.0 {
                    Self::MAX_FACTOR
                } else {
                    (Self::SAFETY * err.powf(-0.2)).clamp(Self::MIN_FACTOR, Self::MAX_FACTOR)
                };
                if err <= 1.0 {
                    self.stats.accepted += 1;
                    t = if clipped { target } else { t + step };
                    y = y_new;
                    f = f_new;
                    // a clipped step says nothing about the step size the controller wanted
                    if !clipped || factor < 1.0 {
                        h = step * factor;
                    }
                } else {
                    self.stats.rejected += 1;
                    h = step * factor.min(1.0);
                }
            }
            out.push(y);
        }
        Ok(out)
    }

    /// Performs one trial step, returning the 5th order result, its derivative and the scaled error norm.
    #[allow(clippy::cast_precision_loss, clippy::needless_range_loop)]
    fn step<S: OdeSystem<N>, const N: usize>(
        &mut self,
        system: &S,
        t: f64,
        y: &[f64; N],
        f0: &[f64; N],
        h: f64,
    ) -> ([f64; N], [f64; N], f64) {
        let mut k = [[0.0; N]; 7];
        k[0] = *f0;
        let mut stage = [0.0; N];
        for s in 1..7 {
            for i in 0..N {
                let incr: f64 = (0..s).map(|j| Self::A[s][j] * k[j][i]).sum();
                stage[i] = y[i] + h * incr;
            }
            let mut ks = [0.0; N];
            system.rhs(t + Self::C[s] * h, &stage, &mut ks);
            k[s] = ks;
        }
        self.stats.rhs_evaluations += 6;

        // the last stage is evaluated at the 5th order solution (FSAL)
        let y_new = stage;
        let mut err_sq = 0.0;
        for i in 0..N {
            let err_i = h * (0..7).map(|j| Self::E[j] * k[j][i]).sum::<f64>();
            let scale = self.tol.atol + self.tol.rtol * y[i].abs().max(y_new[i].abs());
            err_sq += (err_i / scale).powi(2);
        }
        (y_new, k[6], (err_sq / N as f64).sqrt())
    }

    /// Picks a starting step from the scaled magnitudes of state and derivative.
    #[allow(clippy::cast_precision_loss)]
    fn initial_step<const N: usize>(&self, y: &[f64; N], f: &[f64; N], span: f64) -> f64 {
        let norm = |v: &[f64; N]| {
            let sum: f64 = v
                .iter()
                .zip(y)
                .map(|(vi, yi)| (vi / (self.tol.atol + self.tol.rtol * yi.abs())).powi(2))
                .sum();
            (sum / N as f64).sqrt()
        };
        let (d0, d1) = (norm(y), norm(f));
        let h = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
        if span > 0.0 { h.min(span) } else { h }
    }
}
