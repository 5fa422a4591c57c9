//! Configuration for the coordination core

use crate::types::{CoordinationError, Result};

/// World-model configuration
#[derive(Debug, Clone, Copy)]
pub struct WorldConfig {
    /// Radio communication range (m); drones within it are neighbors
    pub comm_range_m: f32,
    /// Telemetry age beyond which a drone is stale (ms)
    pub stale_threshold_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            comm_range_m: 5.0,
            stale_threshold_ms: 500,
        }
    }
}

impl WorldConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.comm_range_m <= 0.0 {
            return Err(CoordinationError::ConfigError);
        }
        if self.stale_threshold_ms == 0 {
            return Err(CoordinationError::ConfigError);
        }
        Ok(())
    }
}

/// Role-assignment configuration
#[derive(Debug, Clone, Copy)]
pub struct RoleConfig {
    /// Battery fraction below which a drone is sent to charge
    pub battery_charge_threshold: f32,
    /// Battery fraction at which charging completes
    pub battery_return_threshold: f32,
    /// Ticks a drone must hold a role before the engine may change it
    pub role_hysteresis_ticks: u32,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            battery_charge_threshold: 0.15,
            battery_return_threshold: 0.90,
            role_hysteresis_ticks: 10,
        }
    }
}

impl RoleConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.battery_charge_threshold)
            || !(0.0..=1.0).contains(&self.battery_return_threshold)
        {
            return Err(CoordinationError::ConfigError);
        }
        if self.battery_charge_threshold >= self.battery_return_threshold {
            return Err(CoordinationError::ConfigError);
        }
        Ok(())
    }
}

/// Coordinator loop configuration
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorConfig {
    /// Tick interval (ms); 10 ms is the 100 Hz default
    pub tick_interval_ms: u64,
    /// Run role reassignment every this many ticks
    pub role_reassignment_interval: u64,
    /// World-model configuration
    pub world: WorldConfig,
    /// Role-assignment configuration
    pub role: RoleConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            role_reassignment_interval: 100,
            world: WorldConfig::default(),
            role: RoleConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Validate configuration, including nested sections
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 || self.role_reassignment_interval == 0 {
            return Err(CoordinationError::ConfigError);
        }
        self.world.validate()?;
        self.role.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(CoordinatorConfig::default().validate().is_ok());
        assert!(WorldConfig::default().validate().is_ok());
        assert!(RoleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let mut config = CoordinatorConfig::default();
        config.tick_interval_ms = 0;
        assert_eq!(config.validate(), Err(CoordinationError::ConfigError));
    }

    #[test]
    fn test_negative_comm_range_rejected() {
        let mut config = WorldConfig::default();
        config.comm_range_m = -1.0;
        assert_eq!(config.validate(), Err(CoordinationError::ConfigError));
    }

    #[test]
    fn test_inverted_battery_thresholds_rejected() {
        let mut config = RoleConfig::default();
        config.battery_charge_threshold = 0.95;
        assert_eq!(config.validate(), Err(CoordinationError::ConfigError));
    }
}
