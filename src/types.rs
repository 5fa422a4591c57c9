//! Core type definitions for the swarm coordination core

use core::fmt;
use serde::{Deserialize, Serialize};

/// Maximum supported swarm size
pub const MAX_SWARM_SIZE: usize = 100;

/// Capacity of the world-model drone map (must be power of 2 for FnvIndexMap)
pub const MAX_DRONE_RECORDS: usize = 128;

/// Maximum spatial neighbors tracked per drone
pub const MAX_NEIGHBORS: usize = 32;

/// Maximum visible base stations per drone
pub const MAX_BASE_STATIONS: usize = 8;

/// Result type for coordination operations
pub type Result<T> = core::result::Result<T, CoordinationError>;

/// Unique identifier for each drone in the swarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DroneId(pub u64);

impl DroneId {
    /// Create a new DroneId from a u64
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DroneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drone-{}", self.0)
    }
}

/// 3D position vector
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (meters)
    pub x: f32,
    /// Y coordinate (meters)
    pub y: f32,
    /// Z coordinate (altitude in meters)
    pub z: f32,
}

impl Position {
    /// Create a position from coordinates
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Calculate Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        libm::sqrtf(dx * dx + dy * dy + dz * dz)
    }

    /// Distance from the origin
    pub fn norm(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }
}

/// Velocity vector
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// X velocity (m/s)
    pub vx: f32,
    /// Y velocity (m/s)
    pub vy: f32,
    /// Z velocity (m/s)
    pub vz: f32,
}

impl Velocity {
    /// Create a velocity from components
    pub const fn new(vx: f32, vy: f32, vz: f32) -> Self {
        Self { vx, vy, vz }
    }
}

/// Roll/pitch/yaw triple, used for orientation (radians) and body rates (rad/s)
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    /// Roll component
    pub roll: f32,
    /// Pitch component
    pub pitch: f32,
    /// Yaw component
    pub yaw: f32,
}

/// Battery condition as reported by the power subsystem
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryState {
    /// Pack voltage (V)
    pub voltage: f32,
    /// Charge fraction, 0.0-1.0
    pub percentage: f32,
    /// Discharge rate (W)
    pub discharge_rate: f32,
    /// Estimated remaining flight time (s)
    pub estimated_remaining_s: f32,
}

impl Default for BatteryState {
    fn default() -> Self {
        Self {
            voltage: 4.2,
            percentage: 1.0,
            discharge_rate: 0.0,
            estimated_remaining_s: 420.0,
        }
    }
}

/// δ — the drone's physical state from onboard sensors
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    /// Position in the flight volume (meters)
    pub position: Position,
    /// Velocity (m/s)
    pub velocity: Velocity,
    /// Orientation (radians)
    pub orientation: Attitude,
    /// Angular velocity (rad/s)
    pub angular_velocity: Attitude,
    /// Battery condition
    pub battery: BatteryState,
    /// Confidence in the position estimate, 0.0-1.0
    pub position_quality: f32,
    /// Estimated wind at the drone (m/s)
    pub wind_estimate: Velocity,
}

impl SensorState {
    /// Stationary drone at a position with full battery and perfect positioning
    pub fn stationary(position: Position) -> Self {
        Self {
            position,
            position_quality: 1.0,
            ..Self::default()
        }
    }

    /// Same state with a different battery charge fraction
    pub fn with_battery(mut self, percentage: f32) -> Self {
        self.battery.percentage = percentage;
        self
    }

    /// Same state with a different position-quality estimate
    pub fn with_position_quality(mut self, quality: f32) -> Self {
        self.position_quality = quality;
        self
    }
}

/// Errors surfaced at the coordination core's external boundary.
///
/// Operational events (unknown drones in telemetry, missing catalog ids,
/// malformed forced-exit conditions, send failures) are absorbed per the
/// error-handling policy and never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinationError {
    /// Drone ID not present in the world model
    UnknownDrone,
    /// Pattern ID not present in the catalog
    UnknownPattern,
    /// World model cannot hold any more drones
    SwarmSizeExceeded,
    /// Operation requires an established comms link
    NotConnected,
    /// Outbound comms failure
    CommFailure,
    /// Configuration failed validation
    ConfigError,
    /// Catalog failed load-time validation
    CatalogInvalid,
}

impl fmt::Display for CoordinationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinationError::UnknownDrone => write!(f, "Unknown drone ID"),
            CoordinationError::UnknownPattern => write!(f, "Unknown pattern ID"),
            CoordinationError::SwarmSizeExceeded => write!(f, "Swarm size exceeded"),
            CoordinationError::NotConnected => write!(f, "Comms link not connected"),
            CoordinationError::CommFailure => write!(f, "Communication failure"),
            CoordinationError::ConfigError => write!(f, "Configuration error"),
            CoordinationError::CatalogInvalid => write!(f, "Catalog failed validation"),
        }
    }
}

impl std::error::Error for CoordinationError {}
