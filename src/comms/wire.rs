//! Packed wire codecs for the radio link
//!
//! Both packet layouts are fixed-size, little-endian, and match the
//! firmware structs byte for byte. Positions and velocities travel as
//! int16 millimeters (±32.767 m at 1 mm precision); battery and position
//! quality use ×200 and ×255 byte encodings.

use super::{DroneCommand, TelemetryFrame};
use crate::types::{DroneId, Position, SensorState, Velocity};

/// Ground → drone command packet size (bytes)
pub const COMMAND_PACKET_SIZE: usize = 20;

/// Drone → ground telemetry packet size (bytes)
pub const TELEMETRY_PACKET_SIZE: usize = 18;

/// Clamp meters to the int16-millimeter envelope
pub fn meters_to_mm(meters: f32) -> i16 {
    (meters.clamp(-32.767, 32.767) * 1000.0) as i16
}

/// Millimeters back to meters
pub fn mm_to_meters(mm: i16) -> f32 {
    f32::from(mm) / 1000.0
}

fn put_i16(buffer: &mut [u8], offset: usize, value: i16) {
    buffer[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn get_i16(buffer: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([buffer[offset], buffer[offset + 1]])
}

impl DroneCommand {
    /// Pack into the 20-byte wire layout; absent targets encode as zero
    pub fn encode(&self) -> [u8; COMMAND_PACKET_SIZE] {
        let mut packet = [0u8; COMMAND_PACKET_SIZE];
        packet[0..2].copy_from_slice(&self.pattern_id.to_le_bytes());
        let pos = self.target_position.unwrap_or_default();
        put_i16(&mut packet, 2, meters_to_mm(pos.x));
        put_i16(&mut packet, 4, meters_to_mm(pos.y));
        put_i16(&mut packet, 6, meters_to_mm(pos.z));
        let vel = self.target_velocity.unwrap_or_default();
        put_i16(&mut packet, 8, meters_to_mm(vel.vx));
        put_i16(&mut packet, 10, meters_to_mm(vel.vy));
        put_i16(&mut packet, 12, meters_to_mm(vel.vz));
        packet[14] = self.flags;
        // Bytes 15..20 stay reserved zeros
        packet
    }

    /// Unpack from raw bytes; anything but an exact-size packet is rejected
    pub fn decode(raw: &[u8]) -> Option<Self> {
        if raw.len() != COMMAND_PACKET_SIZE {
            return None;
        }
        Some(Self {
            pattern_id: u16::from_le_bytes([raw[0], raw[1]]),
            target_position: Some(Position::new(
                mm_to_meters(get_i16(raw, 2)),
                mm_to_meters(get_i16(raw, 4)),
                mm_to_meters(get_i16(raw, 6)),
            )),
            target_velocity: Some(Velocity::new(
                mm_to_meters(get_i16(raw, 8)),
                mm_to_meters(get_i16(raw, 10)),
                mm_to_meters(get_i16(raw, 12)),
            )),
            flags: raw[14],
        })
    }
}

impl TelemetryFrame {
    /// Pack into the 18-byte wire layout (the drone id travels in the
    /// transport envelope, not the packet)
    pub fn encode(&self) -> [u8; TELEMETRY_PACKET_SIZE] {
        let mut packet = [0u8; TELEMETRY_PACKET_SIZE];
        let sensors = &self.sensors;
        put_i16(&mut packet, 0, meters_to_mm(sensors.position.x));
        put_i16(&mut packet, 2, meters_to_mm(sensors.position.y));
        put_i16(&mut packet, 4, meters_to_mm(sensors.position.z));
        put_i16(&mut packet, 6, meters_to_mm(sensors.velocity.vx));
        put_i16(&mut packet, 8, meters_to_mm(sensors.velocity.vy));
        put_i16(&mut packet, 10, meters_to_mm(sensors.velocity.vz));
        packet[12] = (sensors.battery.percentage.clamp(0.0, 1.0) * 200.0) as u8;
        packet[13..15].copy_from_slice(&self.current_pattern_id.to_le_bytes());
        packet[15] = self.status_flags;
        packet[16] = (sensors.position_quality.clamp(0.0, 1.0) * 255.0) as u8;
        packet
    }

    /// Unpack raw telemetry for the given sender; anything but an
    /// exact-size packet is rejected. Fields the packet does not carry
    /// (orientation, wind, pack voltage) come up as defaults.
    pub fn decode(drone_id: DroneId, raw: &[u8]) -> Option<Self> {
        if raw.len() != TELEMETRY_PACKET_SIZE {
            return None;
        }
        let mut sensors = SensorState {
            position: Position::new(
                mm_to_meters(get_i16(raw, 0)),
                mm_to_meters(get_i16(raw, 2)),
                mm_to_meters(get_i16(raw, 4)),
            ),
            velocity: Velocity::new(
                mm_to_meters(get_i16(raw, 6)),
                mm_to_meters(get_i16(raw, 8)),
                mm_to_meters(get_i16(raw, 10)),
            ),
            ..SensorState::default()
        };
        sensors.battery.percentage = f32::from(raw[12]) / 200.0;
        sensors.position_quality = f32::from(raw[16]) / 255.0;
        Some(Self {
            drone_id,
            sensors,
            current_pattern_id: u16::from_le_bytes([raw[13], raw[14]]),
            status_flags: raw[15],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comms::{command_flags, telemetry_flags};

    #[test]
    fn test_mm_conversion_clamps() {
        assert_eq!(meters_to_mm(1.5), 1500);
        assert_eq!(meters_to_mm(-2.25), -2250);
        assert_eq!(meters_to_mm(100.0), 32767);
        assert_eq!(meters_to_mm(-100.0), -32767);
        assert!((mm_to_meters(1500) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_command_layout() {
        let command = DroneCommand {
            pattern_id: 0x0102,
            target_position: Some(Position::new(1.0, -2.0, 0.5)),
            target_velocity: Some(Velocity::new(0.25, 0.0, -0.125)),
            flags: command_flags::EMERGENCY | command_flags::FORCE_PATTERN,
        };
        let packet = command.encode();
        assert_eq!(packet.len(), COMMAND_PACKET_SIZE);
        assert_eq!(&packet[0..2], &[0x02, 0x01]);
        assert_eq!(get_i16(&packet, 2), 1000);
        assert_eq!(get_i16(&packet, 4), -2000);
        assert_eq!(get_i16(&packet, 6), 500);
        assert_eq!(get_i16(&packet, 8), 250);
        assert_eq!(get_i16(&packet, 12), -125);
        assert_eq!(packet[14], 0b101);
        assert_eq!(&packet[15..20], &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_command_round_trip() {
        let command = DroneCommand {
            pattern_id: 77,
            target_position: Some(Position::new(3.0, 4.0, 1.0)),
            target_velocity: Some(Velocity::new(-1.0, 0.5, 0.0)),
            flags: command_flags::STYLE_UPDATE,
        };
        let decoded = DroneCommand::decode(&command.encode()).unwrap();
        assert_eq!(decoded.pattern_id, 77);
        assert_eq!(decoded.flags, command_flags::STYLE_UPDATE);
        let pos = decoded.target_position.unwrap();
        assert!((pos.x - 3.0).abs() < 0.001);
        assert!((pos.z - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_command_decode_rejects_bad_length() {
        assert!(DroneCommand::decode(&[0u8; 19]).is_none());
        assert!(DroneCommand::decode(&[0u8; 21]).is_none());
        assert!(DroneCommand::decode(&[]).is_none());
    }

    #[test]
    fn test_telemetry_layout() {
        let sensors = SensorState::stationary(Position::new(1.0, 2.0, 3.0)).with_battery(0.5);
        let frame = TelemetryFrame {
            drone_id: DroneId::new(4),
            sensors,
            current_pattern_id: 0x0201,
            status_flags: telemetry_flags::AIRBORNE,
        };
        let packet = frame.encode();
        assert_eq!(packet.len(), TELEMETRY_PACKET_SIZE);
        assert_eq!(get_i16(&packet, 0), 1000);
        assert_eq!(get_i16(&packet, 2), 2000);
        assert_eq!(get_i16(&packet, 4), 3000);
        assert_eq!(packet[12], 100);
        assert_eq!(&packet[13..15], &[0x01, 0x02]);
        assert_eq!(packet[15], telemetry_flags::AIRBORNE);
        assert_eq!(packet[16], 255);
        assert_eq!(packet[17], 0);
    }

    #[test]
    fn test_telemetry_round_trip() {
        let sensors = SensorState::stationary(Position::new(-1.5, 0.0, 2.0))
            .with_battery(0.75)
            .with_position_quality(0.5);
        let frame = TelemetryFrame {
            drone_id: DroneId::new(9),
            sensors,
            current_pattern_id: 300,
            status_flags: telemetry_flags::AIRBORNE | telemetry_flags::LOW_BATTERY,
        };
        let decoded = TelemetryFrame::decode(DroneId::new(9), &frame.encode()).unwrap();
        assert_eq!(decoded.drone_id, DroneId::new(9));
        assert_eq!(decoded.current_pattern_id, 300);
        assert_eq!(decoded.status_flags, frame.status_flags);
        assert!((decoded.sensors.position.x + 1.5).abs() < 0.001);
        assert!((decoded.sensors.battery.percentage - 0.75).abs() < 0.01);
        assert!((decoded.sensors.position_quality - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_telemetry_decode_rejects_bad_length() {
        assert!(TelemetryFrame::decode(DroneId::new(1), &[0u8; 17]).is_none());
        assert!(TelemetryFrame::decode(DroneId::new(1), &[0u8; 20]).is_none());
    }
}
