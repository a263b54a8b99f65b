// Discrete-time LQG observer and static state feedback

use crate::config::RegulatorGains;

/// Third-order observer/regulator driven by the velocity error
///
/// The state estimate is owned here and never read by the commutation side;
/// only the scalar control output leaves this struct.
#[derive(Debug, Clone)]
pub struct LqgRegulator {
    gains: RegulatorGains,
    x_hat: [f32; 3],
}

impl LqgRegulator {
    /// Create a regulator with a zero state estimate
    pub const fn new(gains: RegulatorGains) -> Self {
        Self::with_state(gains, [0.0; 3])
    }

    /// Create a regulator starting from a given state estimate
    pub const fn with_state(gains: RegulatorGains, x_hat: [f32; 3]) -> Self {
        Self { gains, x_hat }
    }

    /// Run one sampling interval
    ///
    /// # Arguments
    /// * `measured_speed` - Speed from the sampler [rad/s]
    /// * `target_speed` - Commanded speed [rad/s]
    ///
    /// # Returns
    /// New control output `u` (signed, 1.0 = full duty)
    pub fn step(&mut self, measured_speed: f32, target_speed: f32) -> f32 {
        let error = measured_speed - target_speed;
        self.observe(error);
        self.control_output()
    }

    /// Advance the observer by one interval
    ///
    /// All three rows are computed from the pre-update estimate and then
    /// replace it together. Terms are accumulated left to right so results
    /// are bit-reproducible for a given input history.
    pub fn observe(&mut self, error: f32) {
        let a = &self.gains.observer;
        let taps = &self.gains.observer_taps;
        let x = self.x_hat;

        let mut next = [0.0f32; 3];
        for (i, row) in next.iter_mut().enumerate() {
            let mut acc = x[taps[i][0]] * a[i][0];
            acc += x[taps[i][1]] * a[i][1];
            acc += x[taps[i][2]] * a[i][2];
            acc += self.gains.innovation[i] * error;
            *row = acc;
        }

        self.x_hat = next;
    }

    /// Static state feedback `u = -K x̂`
    pub fn control_output(&self) -> f32 {
        let k = &self.gains.feedback;
        -((k[0] * self.x_hat[0]) + (k[1] * self.x_hat[1]) + (k[2] * self.x_hat[2]))
    }

    /// Current state estimate
    pub fn state(&self) -> [f32; 3] {
        self.x_hat
    }

    pub fn gains(&self) -> &RegulatorGains {
        &self.gains
    }

    /// Zero the state estimate
    pub fn reset(&mut self) {
        self.x_hat = [0.0; 3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_abs(x: [f32; 3]) -> f32 {
        x.iter().fold(0.0f32, |m, v| m.max(v.abs()))
    }

    #[test]
    fn test_zero_error_from_zero_state_stays_zero() {
        let mut regulator = LqgRegulator::new(RegulatorGains::lqg_3khz());
        for _ in 0..10 {
            assert_eq!(regulator.step(0.0, 0.0), 0.0);
        }
        assert_eq!(regulator.state(), [0.0; 3]);
    }

    #[test]
    fn test_first_step_is_innovation_times_error() {
        let gains = RegulatorGains::lqg_3khz();
        let mut regulator = LqgRegulator::new(gains);
        let u = regulator.step(1.0, 0.0);

        assert_eq!(
            regulator.state(),
            [gains.innovation[0], gains.innovation[1], gains.innovation[2]]
        );
        // -(K . L) = 0.00096633...
        assert!((u - 0.000_966_33).abs() < 1e-7);
    }

    #[test]
    fn test_error_sign_is_measured_minus_target() {
        let mut a = LqgRegulator::new(RegulatorGains::lqg_3khz());
        let mut b = LqgRegulator::new(RegulatorGains::lqg_3khz());
        let ua = a.step(10.0, 0.0);
        let ub = b.step(0.0, 10.0);
        assert_eq!(ua, -ub);
    }

    #[test]
    fn test_delivered_taps_differ_from_matrix_product() {
        let gains = RegulatorGains::lqg_3khz();

        let mut delivered = LqgRegulator::with_state(gains, [1.0, 0.0, 0.0]);
        delivered.observe(0.0);
        assert_eq!(delivered.state(), [0.7639, 0.0, 0.0]);

        let mut matrix = LqgRegulator::with_state(
            gains.with_taps(RegulatorGains::MATRIX_TAPS),
            [1.0, 0.0, 0.0],
        );
        matrix.observe(0.0);
        assert_eq!(matrix.state(), [0.7639, 0.2752, -0.2592]);
    }

    #[test]
    fn test_update_is_synchronous() {
        // Row 2 must see the pre-update x̂[1], not the value row 1 just wrote.
        let gains = RegulatorGains::lqg_3khz();
        let x0 = [0.5, -0.25, 0.125];
        let mut regulator = LqgRegulator::with_state(gains, x0);
        regulator.observe(0.0);

        let a = gains.observer;
        let row2 = x0[2] * a[2][0] + x0[1] * a[2][1] + x0[2] * a[2][2];
        assert_eq!(regulator.state()[2], row2);
    }

    #[test]
    fn test_identical_history_is_bit_reproducible() {
        let errors = [3.0, -1.5, 0.25, 1e3, -7.75, 0.0, 42.0];
        let run = || {
            let mut regulator =
                LqgRegulator::with_state(RegulatorGains::lqg_3khz(), [0.1, -0.2, 0.3]);
            errors.map(|e| regulator.step(e, 0.0).to_bits())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_zero_input_decays_with_delivered_gains() {
        let mut regulator =
            LqgRegulator::with_state(RegulatorGains::lqg_3khz(), [1.0, -1.0, 1.0]);
        for _ in 0..200 {
            regulator.observe(0.0);
        }
        assert!(max_abs(regulator.state()) < 1e-6);
    }

    #[test]
    fn test_zero_input_grows_when_dynamics_not_contractive() {
        let mut gains = RegulatorGains::lqg_3khz().with_taps(RegulatorGains::MATRIX_TAPS);
        gains.observer = [[1.05, 0.0, 0.0], [0.0, 1.05, 0.0], [0.0, 0.0, 1.05]];

        let mut regulator = LqgRegulator::with_state(gains, [1.0, -1.0, 1.0]);
        for _ in 0..200 {
            regulator.observe(0.0);
        }
        assert!(max_abs(regulator.state()) > 1e3);
    }

    #[test]
    fn test_reset() {
        let mut regulator = LqgRegulator::with_state(RegulatorGains::lqg_3khz(), [1.0, 2.0, 3.0]);
        regulator.reset();
        assert_eq!(regulator.state(), [0.0; 3]);
        assert_eq!(regulator.control_output(), 0.0);
    }
}
