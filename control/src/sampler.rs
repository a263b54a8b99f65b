// Encoder displacement sampling and speed conversion

use core::f32::consts::PI;

/// Signed encoder pulse counter
///
/// One count per encoder edge, signed by direction.
pub trait PulseCounter {
    /// Return the net displacement since the previous call and restart the count
    ///
    /// A displacement outside the `i16` range within one interval wraps and
    /// is not corrected.
    fn take_displacement(&mut self) -> i16;
}

/// One sampling interval worth of encoder data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    /// Raw signed displacement [counts]
    pub displacement: i16,
    /// Angular velocity [rad/s]
    pub speed_rad_s: f32,
}

/// Convert a per-interval displacement into angular velocity
///
/// # Arguments
/// * `displacement` - Net encoder counts over one interval
/// * `counts_per_rev` - Encoder counts per revolution
/// * `sample_period_s` - Interval length [s]
///
/// # Returns
/// Angular velocity [rad/s]
#[inline(always)]
pub fn counts_to_rad_per_s(displacement: i16, counts_per_rev: f32, sample_period_s: f32) -> f32 {
    ((displacement as f32 / counts_per_rev) * 2.0 * PI) / sample_period_s
}

/// Position/speed sampler running once per control interval
pub struct SpeedSampler<C> {
    counter: C,
    counts_per_rev: f32,
    sample_period_s: f32,
}

impl<C: PulseCounter> SpeedSampler<C> {
    pub fn new(counter: C, counts_per_rev: f32, sample_period_s: f32) -> Self {
        Self {
            counter,
            counts_per_rev,
            sample_period_s,
        }
    }

    /// Read-and-clear the counter and convert the displacement to speed
    pub fn sample(&mut self) -> SpeedSample {
        let displacement = self.counter.take_displacement();
        SpeedSample {
            displacement,
            speed_rad_s: counts_to_rad_per_s(displacement, self.counts_per_rev, self.sample_period_s),
        }
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    pub fn counter_mut(&mut self) -> &mut C {
        &mut self.counter
    }
}
