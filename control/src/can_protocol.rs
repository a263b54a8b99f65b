// CAN communication protocol definitions for the speed loop

/// CAN message IDs
pub mod can_ids {
    /// Speed command (f32 rad/s, 4 bytes)
    pub const SPEED_CMD: u32 = 0x100;

    /// Motor status feedback (speed: f32 rad/s, control output: f32, 8 bytes)
    pub const STATUS: u32 = 0x200;

    /// Emergency stop (any data length)
    pub const EMERGENCY_STOP: u32 = 0x000;
}

/// Received command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CanCommand {
    /// New target speed [rad/s]
    SetSpeed(f32),
    /// Force the target speed to zero
    EmergencyStop,
}

/// Motor status structure
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorStatus {
    /// Last sampled speed [rad/s]
    pub speed_rad_s: f32,
    /// Last published control output
    pub control_output: f32,
}

impl MotorStatus {
    pub const fn new() -> Self {
        Self {
            speed_rad_s: 0.0,
            control_output: 0.0,
        }
    }
}

impl Default for MotorStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpret a received frame
///
/// # Arguments
/// * `id` - Raw frame identifier
/// * `data` - Frame payload
///
/// # Returns
/// * `Some(command)` for a known ID with a valid payload
/// * `None` otherwise
pub fn parse_command(id: u32, data: &[u8]) -> Option<CanCommand> {
    match id {
        can_ids::SPEED_CMD => parse_speed_command(data).map(CanCommand::SetSpeed),
        can_ids::EMERGENCY_STOP => {
            info!("Emergency stop received!");
            Some(CanCommand::EmergencyStop)
        }
        _ => {
            debug!("Unknown CAN ID: 0x{:03X}", id);
            None
        }
    }
}

/// Parse speed command from CAN data
///
/// # Arguments
/// * `data` - CAN frame data (should be 4 bytes)
///
/// # Returns
/// * `Some(speed_rad_s)` if parsing successful
/// * `None` if data length is incorrect or the value is not finite
pub fn parse_speed_command(data: &[u8]) -> Option<f32> {
    if data.len() < 4 {
        error!("Speed command: invalid data length {}", data.len());
        return None;
    }

    let speed_rad_s = f32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    if !speed_rad_s.is_finite() {
        error!("Speed command: non-finite value rejected");
        return None;
    }

    info!("Speed command received: {} rad/s", speed_rad_s);
    Some(speed_rad_s)
}

/// Encode motor status into CAN data
///
/// # Returns
/// 8-byte array: speed (bytes 0-3) and control output (bytes 4-7), little-endian
pub fn encode_status(status: &MotorStatus) -> [u8; 8] {
    let mut data = [0u8; 8];
    data[0..4].copy_from_slice(&status.speed_rad_s.to_le_bytes());
    data[4..8].copy_from_slice(&status.control_output.to_le_bytes());
    data
}

/// Decode motor status from CAN data
///
/// # Returns
/// * `Some(MotorStatus)` if parsing successful
/// * `None` if data length is incorrect
pub fn decode_status(data: &[u8]) -> Option<MotorStatus> {
    if data.len() < 8 {
        return None;
    }

    Some(MotorStatus {
        speed_rad_s: f32::from_le_bytes([data[0], data[1], data[2], data[3]]),
        control_output: f32::from_le_bytes([data[4], data[5], data[6], data[7]]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_speed_command() {
        let speed = 314.159f32;
        assert_eq!(parse_speed_command(&speed.to_le_bytes()), Some(speed));
        assert_eq!(parse_speed_command(&[0, 0, 0]), None);
    }

    #[test]
    fn test_parse_speed_command_rejects_non_finite() {
        assert_eq!(parse_speed_command(&f32::NAN.to_le_bytes()), None);
        assert_eq!(parse_speed_command(&f32::INFINITY.to_le_bytes()), None);
    }

    #[test]
    fn test_parse_command_dispatch() {
        let data = (-50.0f32).to_le_bytes();
        assert_eq!(
            parse_command(can_ids::SPEED_CMD, &data),
            Some(CanCommand::SetSpeed(-50.0))
        );
        assert_eq!(
            parse_command(can_ids::EMERGENCY_STOP, &[]),
            Some(CanCommand::EmergencyStop)
        );
        assert_eq!(parse_command(0x7FF, &data), None);
        assert_eq!(parse_command(can_ids::STATUS, &[0; 8]), None);
    }

    #[test]
    fn test_encode_decode_status() {
        let status = MotorStatus {
            speed_rad_s: 120.5,
            control_output: -0.25,
        };
        let encoded = encode_status(&status);
        assert_eq!(&encoded[0..4], &120.5f32.to_le_bytes());
        assert_eq!(decode_status(&encoded), Some(status));
        assert_eq!(decode_status(&encoded[..7]), None);
    }
}
