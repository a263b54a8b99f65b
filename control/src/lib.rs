//! LQG speed regulation and hall six-step commutation for a BLDC motor
//!
//! Hardware-independent core of the drive. The board crate supplies the
//! encoder counter, hall inputs, gate driver, indicators and telemetry
//! transmitter through the traits below and calls [`motor::MotorCore`] from
//! its interrupt handlers.
#![cfg_attr(not(test), no_std)]

// Must stay first so the logging macros are in scope for every module.
mod fmt;

pub mod can_protocol;
pub mod commutation;
pub mod config;
pub mod control_cell;
pub mod dispatcher;
pub mod motor;
pub mod regulator;
pub mod sampler;
pub mod telemetry;

pub use commutation::{
    Direction, Leg, Phase, PhaseOutputSink, PhaseOutputs, SectorCode, SectorIndicator,
};
pub use config::{ControlConfig, RegulatorGains};
pub use control_cell::ControlCell;
pub use dispatcher::{CommutationDispatcher, DutyCommand, SectorSensor};
pub use motor::{MotorCore, StepReport};
pub use regulator::LqgRegulator;
pub use sampler::{PulseCounter, SpeedSample, SpeedSampler};
pub use telemetry::{TelemetryError, TelemetryLine, TelemetrySink};
