// Per-interval diagnostic line and the fire-and-forget transmit seam

use core::fmt::Write;

use heapless::{String, Vec};

use crate::config::params::TELEMETRY_STATE_SCALE;

/// Longest line is "-32768,65535\r\n" (14 bytes)
pub const LINE_CAPACITY: usize = 16;

/// One formatted telemetry line
pub type TelemetryLine = Vec<u8, LINE_CAPACITY>;

/// Telemetry hand-off failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Transmit queue has no free slot; the line was dropped
    QueueFull,
}

/// Asynchronous byte transmitter
pub trait TelemetrySink {
    /// Queue a line for transmission without blocking
    fn enqueue(&mut self, line: TelemetryLine) -> Result<(), TelemetryError>;
}

/// Scale a state component into the unsigned 16-bit telemetry field
///
/// The scaled value saturates to `i32` and is then truncated to 16 bits, so
/// negative states appear as their two's complement.
#[inline(always)]
pub fn scaled_state(state: f32) -> u16 {
    (state * TELEMETRY_STATE_SCALE) as i32 as u16
}

/// Format `"<displacement>,<scaled state>\r\n"`
pub fn format_line(displacement: i16, state: f32) -> TelemetryLine {
    let mut text: String<LINE_CAPACITY> = String::new();
    // Cannot overflow: both fields are bounded to 6 and 5 characters.
    let _ = write!(text, "{},{}\r\n", displacement, scaled_state(state));
    text.into_bytes()
}
