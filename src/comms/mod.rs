//! Outbound comms seam
//!
//! The core consumes a narrow trait: fire-and-forget command sends and a
//! polled telemetry queue. Implementations include the in-process
//! simulator used as the test substrate; bridging to a hardware radio
//! stack lives outside the core.

pub mod sim;
pub mod wire;

pub use sim::SimulatedComms;
pub use wire::{mm_to_meters, meters_to_mm, COMMAND_PACKET_SIZE, TELEMETRY_PACKET_SIZE};

use crate::types::{DroneId, Position, Result, SensorState, Velocity};
use serde::{Deserialize, Serialize};

/// Command flag bits
pub mod command_flags {
    /// Safety-driven command; firmware preempts immediately
    pub const EMERGENCY: u8 = 1 << 0;
    /// Parameter-only update, pattern unchanged
    pub const STYLE_UPDATE: u8 = 1 << 1;
    /// Skip firmware-side transition checks
    pub const FORCE_PATTERN: u8 = 1 << 2;
}

/// Telemetry status flag bits
pub mod telemetry_flags {
    /// Drone is in the air
    pub const AIRBORNE: u8 = 1 << 0;
    /// A pattern is executing
    pub const PATTERN_ACTIVE: u8 = 1 << 1;
    /// Firmware is in an emergency state
    pub const EMERGENCY: u8 = 1 << 2;
    /// Firmware flags low battery
    pub const LOW_BATTERY: u8 = 1 << 3;
    /// Drone lost ground contact at some point
    pub const COMM_LOST: u8 = 1 << 4;
}

/// Ground → drone command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneCommand {
    /// Numeric pattern id (catalog load-order index)
    pub pattern_id: u16,
    /// Optional position target
    pub target_position: Option<Position>,
    /// Optional velocity target
    pub target_velocity: Option<Velocity>,
    /// `command_flags` bitfield
    pub flags: u8,
}

impl DroneCommand {
    /// Plain pattern switch with no targets
    pub fn pattern(pattern_id: u16) -> Self {
        Self {
            pattern_id,
            target_position: None,
            target_velocity: None,
            flags: 0,
        }
    }

    /// Whether the pattern id indexes into a catalog of the given size
    pub fn validate(&self, catalog_size: u16) -> bool {
        catalog_size > 0 && self.pattern_id < catalog_size
    }
}

/// Drone → ground telemetry, already associated with its sender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Reporting drone
    pub drone_id: DroneId,
    /// Decoded sensor state
    pub sensors: SensorState,
    /// Numeric id of the pattern the firmware is executing
    pub current_pattern_id: u16,
    /// `telemetry_flags` bitfield
    pub status_flags: u8,
}

impl TelemetryFrame {
    /// Frame with the given sensors and quiet flags
    pub fn new(drone_id: DroneId, sensors: SensorState) -> Self {
        Self {
            drone_id,
            sensors,
            current_pattern_id: 0,
            status_flags: telemetry_flags::AIRBORNE | telemetry_flags::PATTERN_ACTIVE,
        }
    }
}

/// The outbound comms interface the coordinator drives
pub trait SwarmComms {
    /// Establish the link to the given drones
    fn connect(&mut self, drones: &[DroneId]) -> Result<()>;

    /// Tear the link down
    fn disconnect(&mut self) -> Result<()>;

    /// Whether the link is up
    fn is_connected(&self) -> bool;

    /// Fire-and-forget command send; the caller swallows failures
    fn send_command(&mut self, drone: DroneId, command: &DroneCommand) -> Result<()>;

    /// Next pending telemetry frame, if any
    fn recv_telemetry(&mut self) -> Option<TelemetryFrame>;
}
