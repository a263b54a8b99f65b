//! Speed loop composition
//!
//! `MotorCore` wires the sampler, regulator and dispatcher together and owns
//! the two entry points the board calls:
//!
//! * [`MotorCore::update`] on every sampling tick: sample, regulate, publish
//!   `u`, commutate, queue telemetry
//! * [`MotorCore::on_sector_change`] on every hall edge: commutate with the
//!   last published `u`
//!
//! Both go through the same dispatcher, so the caller must not run them
//! concurrently. On the target this holds because both interrupts share one
//! priority and the core sits behind a critical-section mutex.

use crate::commutation::{PhaseOutputSink, PhaseOutputs, SectorIndicator};
use crate::config::ControlConfig;
use crate::control_cell::ControlCell;
use crate::dispatcher::{CommutationDispatcher, SectorSensor};
use crate::regulator::LqgRegulator;
use crate::sampler::{PulseCounter, SpeedSample, SpeedSampler};
use crate::telemetry::{format_line, TelemetrySink};

/// What one sampling tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub sample: SpeedSample,
    /// Control output published this tick
    pub control: f32,
    /// Outputs written, `None` when the sector was indeterminate
    pub outputs: Option<PhaseOutputs>,
    /// False when the telemetry line was dropped
    pub telemetry_sent: bool,
}

/// Complete speed loop for one motor
pub struct MotorCore<'a, C, H, S, I, T> {
    sampler: SpeedSampler<C>,
    regulator: LqgRegulator,
    dispatcher: CommutationDispatcher<H, S, I>,
    control: &'a ControlCell,
    telemetry: T,
    dropped_lines: u32,
}

impl<'a, C, H, S, I, T> MotorCore<'a, C, H, S, I, T>
where
    C: PulseCounter,
    H: SectorSensor,
    S: PhaseOutputSink,
    I: SectorIndicator,
    T: TelemetrySink,
{
    /// Build the loop with a zero state estimate
    ///
    /// # Arguments
    /// * `config` - Gains, sampling period, encoder resolution and full-scale duty
    /// * `control` - Cell the control output is published to
    pub fn new(
        config: &ControlConfig,
        counter: C,
        sensor: H,
        sink: S,
        indicator: I,
        control: &'a ControlCell,
        telemetry: T,
    ) -> Self {
        Self {
            sampler: SpeedSampler::new(counter, config.counts_per_rev, config.sample_period_s),
            regulator: LqgRegulator::new(config.gains),
            dispatcher: CommutationDispatcher::new(sensor, sink, indicator, config.max_duty),
            control,
            telemetry,
            dropped_lines: 0,
        }
    }

    /// Run one sampling interval
    ///
    /// # Arguments
    /// * `target_speed` - Commanded speed [rad/s]
    pub fn update(&mut self, target_speed: f32) -> StepReport {
        let sample = self.sampler.sample();
        let control = self.regulator.step(sample.speed_rad_s, target_speed);
        self.control.store(control);

        let outputs = self.dispatcher.dispatch(control);

        let line = format_line(sample.displacement, self.regulator.state()[2]);
        let telemetry_sent = match self.telemetry.enqueue(line) {
            Ok(()) => true,
            Err(_) => {
                self.dropped_lines = self.dropped_lines.wrapping_add(1);
                false
            }
        };

        StepReport {
            sample,
            control,
            outputs,
            telemetry_sent,
        }
    }

    /// Re-commutate after a hall transition using the last published output
    ///
    /// Does not sample the encoder or advance the regulator.
    pub fn on_sector_change(&mut self) -> Option<PhaseOutputs> {
        self.dispatcher.dispatch(self.control.load())
    }

    /// Telemetry lines dropped because the queue was full
    pub fn dropped_telemetry(&self) -> u32 {
        self.dropped_lines
    }

    pub fn state_estimate(&self) -> [f32; 3] {
        self.regulator.state()
    }

    pub fn regulator_mut(&mut self) -> &mut LqgRegulator {
        &mut self.regulator
    }

    pub fn sampler_mut(&mut self) -> &mut SpeedSampler<C> {
        &mut self.sampler
    }

    pub fn dispatcher(&self) -> &CommutationDispatcher<H, S, I> {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut CommutationDispatcher<H, S, I> {
        &mut self.dispatcher
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commutation::tests::{RecordingIndicator, RecordingSink};
    use crate::commutation::SectorCode;
    use crate::dispatcher::tests::FixedSector;
    use crate::sampler::tests::ManualCounter;
    use crate::telemetry::tests::CollectingSink;

    type TestMotor<'a> =
        MotorCore<'a, ManualCounter, FixedSector, RecordingSink, RecordingIndicator, CollectingSink>;

    fn motor(cell: &ControlCell, bits: u8, telemetry: CollectingSink) -> TestMotor<'_> {
        MotorCore::new(
            &ControlConfig::default().with_max_duty(1000),
            ManualCounter::default(),
            FixedSector(SectorCode::from_bits(bits)),
            RecordingSink::default(),
            RecordingIndicator::default(),
            cell,
            telemetry,
        )
    }

    #[test]
    fn test_standstill_tick() {
        let cell = ControlCell::zero();
        let mut motor = motor(&cell, 0b110, CollectingSink::default());

        let report = motor.update(0.0);

        assert_eq!(report.sample.displacement, 0);
        assert_eq!(report.sample.speed_rad_s, 0.0);
        assert_eq!(report.control, 0.0);
        assert_eq!(report.outputs, Some(PhaseOutputs::OFF));
        assert!(report.telemetry_sent);
        assert_eq!(motor.dispatcher().sink().outputs, PhaseOutputs::OFF);
        assert_eq!(motor.telemetry().lines[0].as_slice(), b"0,0\r\n");
    }

    #[test]
    fn test_tick_publishes_control_output() {
        let cell = ControlCell::zero();
        let mut motor = motor(&cell, 0b110, CollectingSink::default());
        motor.sampler_mut().counter_mut().pulse(4);

        let report = motor.update(0.0);

        assert_eq!(report.sample.displacement, 4);
        assert_eq!(cell.load().to_bits(), report.control.to_bits());
        assert_eq!(report.control, motor.regulator_mut().control_output());
        let line = &motor.telemetry().lines[0];
        assert!(line.starts_with(b"4,"));
    }

    #[test]
    fn test_sector_change_follows_table_at_fixed_output() {
        let cell = ControlCell::new(0.5);
        let mut motor = motor(&cell, 0b110, CollectingSink::default());

        let outputs = motor.on_sector_change().unwrap();
        assert_eq!(outputs.high, [0, 500, 0]);
        assert_eq!(outputs.low, [0, 0, 500]);

        motor.dispatcher_mut().sensor_mut().0 = SectorCode::from_bits(0b010);
        let outputs = motor.on_sector_change().unwrap();
        assert_eq!(outputs.high, [0, 500, 0]);
        assert_eq!(outputs.low, [500, 0, 0]);
        assert_eq!(motor.dispatcher().indicator().shown, Some(SectorCode::from_bits(0b010)));
    }

    #[test]
    fn test_sector_change_reuses_cached_output() {
        let cell = ControlCell::zero();
        let mut motor = motor(&cell, 0b011, CollectingSink::default());
        motor.sampler_mut().counter_mut().pulse(-300);
        let first = motor.update(0.0);
        let state = motor.state_estimate();

        // Pulses arriving between ticks must not be consumed by a hall edge.
        motor.sampler_mut().counter_mut().pulse(7);
        let outputs = motor.on_sector_change();

        assert_eq!(outputs, first.outputs);
        assert_eq!(motor.state_estimate(), state);
        assert_eq!(motor.telemetry().lines.len(), 1);
        assert_eq!(motor.update(0.0).sample.displacement, 7);
    }

    #[test]
    fn test_indeterminate_sector_on_tick() {
        let cell = ControlCell::zero();
        let mut motor = motor(&cell, 0b111, CollectingSink::default());
        motor.sampler_mut().counter_mut().pulse(100);

        let report = motor.update(0.0);

        assert_eq!(report.outputs, None);
        assert_eq!(motor.dispatcher().sink().writes, 0);
        assert_eq!(motor.dispatcher().indicator().shown, None);
        // The loop still ran and reported.
        assert_ne!(cell.load(), 0.0);
        assert!(report.telemetry_sent);
    }

    #[test]
    fn test_full_queue_drops_lines_without_blocking() {
        let cell = ControlCell::zero();
        let telemetry = CollectingSink {
            capacity: Some(1),
            ..Default::default()
        };
        let mut motor = motor(&cell, 0b101, telemetry);

        assert!(motor.update(0.0).telemetry_sent);
        let report = motor.update(0.0);
        assert!(!report.telemetry_sent);
        assert_eq!(report.outputs, Some(PhaseOutputs::OFF));
        motor.update(0.0);

        assert_eq!(motor.dropped_telemetry(), 2);
        assert_eq!(motor.telemetry().lines.len(), 1);
    }
}
