use super::{ModelParameters, ode::OdeSystem};

/// Two cross-coupled Van der Pol oscillators (pitch and bank) driving a leaky memory state.
///
/// State layout: `[P, dP/dt, B, dB/dt, W]`.
#[derive(Debug, Clone, Copy)]
pub struct CoupledOscillator {
    params: ModelParameters,
}

impl CoupledOscillator {
    pub const DIM: usize = 5;
    /// Gain of the `|P| + |B|` forcing on the memory state.
    pub const FORCING_GAIN: f64 = 0.1;

    pub fn new(params: ModelParameters) -> Self { Self { params } }
}

impl OdeSystem<5> for CoupledOscillator {
    fn rhs(&self, _t: f64, y: &[f64; 5], dydt: &mut [f64; 5]) {
        let [p, v_p, b, v_b, w] = *y;
        let mu = self.params.nonlinearity();
        let omega_sq = self.params.natural_frequency().powi(2);

        dydt[0] = v_p;
        dydt[1] = mu * (1.0 - p * p) * v_p - omega_sq * p + self.params.bank_coupling() * b;
        dydt[2] = v_b;
        dydt[3] = mu * (1.0 - b * b) * v_b - omega_sq * b + self.params.pitch_coupling() * p;
        dydt[4] = -self.params.memory_decay() * w + Self::FORCING_GAIN * (p.abs() + b.abs());
    }
}
