//! Design-time constants and the regulator gain table
//!
//! Everything here is fixed when the LQG design is exported offline. The
//! control path only ever reads these tables; swapping motors means swapping
//! a `RegulatorGains` value, not touching the loop.

/// Control loop design parameters
pub mod params {
    /// Sampling period the gains were designed for [s]
    ///
    /// Kept at the design value rather than `1.0 / 3000.0`; the observer was
    /// tuned against this number.
    pub const DEFAULT_SAMPLE_PERIOD_S: f32 = 0.0003333;

    /// Nominal control loop rate [Hz]
    pub const DEFAULT_CONTROL_FREQUENCY_HZ: u32 = 3_000;

    /// Quadrature encoder counts per mechanical revolution
    pub const DEFAULT_COUNTS_PER_REV: f32 = 512.0;

    /// Full-scale duty used when no PWM peripheral reports its own
    pub const DEFAULT_MAX_DUTY: u16 = 100;

    /// Scale applied to the last state component in the telemetry line
    pub const TELEMETRY_STATE_SCALE: f32 = 10_000.0;
}

/// Row-wise state index used for each observer coefficient
///
/// `taps[i][j]` names the component of `x̂` that multiplies `observer[i][j]`.
pub type ObserverTaps = [[usize; 3]; 3];

/// Fixed LQG regulator coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegulatorGains {
    /// Observer dynamics matrix (3x3)
    pub observer: [[f32; 3]; 3],
    /// State index feeding each observer coefficient
    pub observer_taps: ObserverTaps,
    /// Innovation gain applied to the velocity error (3x1)
    pub innovation: [f32; 3],
    /// State feedback gain (1x3)
    pub feedback: [f32; 3],
}

impl RegulatorGains {
    /// Taps of the update the delivered gains were tuned against.
    ///
    /// Row 1 reads `x̂[1]` for both its first and second coefficient and row 2
    /// reads `x̂[2]` for its first. This differs from a plain matrix product
    /// but the gains below were tuned with it, so it is the default.
    pub const DELIVERED_TAPS: ObserverTaps = [[0, 1, 2], [1, 1, 2], [2, 1, 2]];

    /// Plain matrix-vector product taps
    pub const MATRIX_TAPS: ObserverTaps = [[0, 1, 2], [0, 1, 2], [0, 1, 2]];

    /// Third-order design sampled at 3 kHz
    pub const fn lqg_3khz() -> Self {
        Self {
            observer: [
                [0.7639, -0.358, -0.5243],
                [0.2752, -0.1471, -0.55],
                [-0.2592, 0.4365, 0.6546],
            ],
            observer_taps: Self::DELIVERED_TAPS,
            innovation: [0.0002849, -0.00008373, -0.001217],
            feedback: [-0.4137, -0.6805, 0.744],
        }
    }

    /// Same coefficients with a different tap table
    pub const fn with_taps(mut self, taps: ObserverTaps) -> Self {
        self.observer_taps = taps;
        self
    }
}

/// Complete configuration of the control core
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlConfig {
    pub gains: RegulatorGains,
    /// Sampling period [s]
    pub sample_period_s: f32,
    /// Encoder counts per revolution
    pub counts_per_rev: f32,
    /// Duty value corresponding to 100 %
    pub max_duty: u16,
}

impl ControlConfig {
    pub const fn default() -> Self {
        Self {
            gains: RegulatorGains::lqg_3khz(),
            sample_period_s: params::DEFAULT_SAMPLE_PERIOD_S,
            counts_per_rev: params::DEFAULT_COUNTS_PER_REV,
            max_duty: params::DEFAULT_MAX_DUTY,
        }
    }

    /// Replace the full-scale duty, typically with the PWM timer's period
    pub const fn with_max_duty(mut self, max_duty: u16) -> Self {
        self.max_duty = max_duty;
        self
    }

    pub const fn with_gains(mut self, gains: RegulatorGains) -> Self {
        self.gains = gains;
        self
    }
}
