// Conversion of the signed control output into a commutation call

use libm::fabsf;

use crate::commutation::{
    commutate, Direction, PhaseOutputSink, PhaseOutputs, SectorCode, SectorIndicator,
};

/// Source of the current hall sector code
pub trait SectorSensor {
    /// Sample the three hall inputs now
    fn read_sector(&mut self) -> SectorCode;
}

/// Unsigned duty plus direction derived from `u`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyCommand {
    pub magnitude: u16,
    pub direction: Direction,
}

impl DutyCommand {
    /// Split a signed control output into magnitude and direction
    ///
    /// `u >= 0` (including zero) is forward. The magnitude is `|u| * max_duty`
    /// clamped to `[0, max_duty]` before conversion.
    ///
    /// # Returns
    /// `None` when `u` is NaN
    pub fn from_control(u: f32, max_duty: u16) -> Option<Self> {
        let direction = if u >= 0.0 {
            Direction::Forward
        } else if u < 0.0 {
            Direction::Reverse
        } else {
            return None;
        };

        let full_scale = max_duty as f32;
        let magnitude = (fabsf(u) * full_scale).clamp(0.0, full_scale) as u16;

        Some(Self {
            magnitude,
            direction,
        })
    }
}

/// Commutation dispatcher shared by the sampling tick and hall edges
pub struct CommutationDispatcher<H, S, I> {
    sensor: H,
    sink: S,
    indicator: I,
    max_duty: u16,
}

impl<H, S, I> CommutationDispatcher<H, S, I>
where
    H: SectorSensor,
    S: PhaseOutputSink,
    I: SectorIndicator,
{
    pub fn new(sensor: H, sink: S, indicator: I, max_duty: u16) -> Self {
        Self {
            sensor,
            sink,
            indicator,
            max_duty,
        }
    }

    /// Commutate for the current sector using control output `u`
    ///
    /// # Returns
    /// The outputs written, or `None` if the sector is indeterminate or `u` is NaN
    pub fn dispatch(&mut self, u: f32) -> Option<PhaseOutputs> {
        let command = DutyCommand::from_control(u, self.max_duty)?;
        let code = self.sensor.read_sector();
        commutate(
            code,
            command.direction,
            command.magnitude,
            self.max_duty,
            &mut self.sink,
            &mut self.indicator,
        )
    }

    pub fn max_duty(&self) -> u16 {
        self.max_duty
    }

    pub fn sensor_mut(&mut self) -> &mut H {
        &mut self.sensor
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }
}
