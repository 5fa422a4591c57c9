//! Structural dimension enums and the core pattern key
//!
//! The swarm operates in a finite semantic space: every structural
//! coordinate is drawn from one of the closed sets below. The six-tuple
//! (σ, κ, χ, λ, τ, ρ) forms the catalog key; nothing at runtime ever
//! invents a value outside these sets.

use core::fmt;
use serde::{Deserialize, Serialize};

/// σ — behavioral mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BehavioralMode {
    /// Hold position in the air
    Hover,
    /// Point-to-point translation
    Translate,
    /// Circle a center point
    Orbit,
    /// Active collision avoidance
    Avoid,
    /// Gain altitude
    Climb,
    /// Lose altitude
    Descend,
    /// Controlled descent to ground
    Land,
    /// Leave the ground
    Takeoff,
    /// Approach and mate with a dock
    Dock,
    /// Separate from a dock
    Undock,
    /// On the ground, motors off
    Grounded,
    /// Mated to a dock
    Docked,
    /// Hold a formation slot
    FormationHold,
    /// Move between formation slots
    FormationTransition,
    /// Hold position as a comm relay
    RelayHold,
}

impl BehavioralMode {
    /// All modes, in wire order
    pub const ALL: [BehavioralMode; 15] = [
        BehavioralMode::Hover,
        BehavioralMode::Translate,
        BehavioralMode::Orbit,
        BehavioralMode::Avoid,
        BehavioralMode::Climb,
        BehavioralMode::Descend,
        BehavioralMode::Land,
        BehavioralMode::Takeoff,
        BehavioralMode::Dock,
        BehavioralMode::Undock,
        BehavioralMode::Grounded,
        BehavioralMode::Docked,
        BehavioralMode::FormationHold,
        BehavioralMode::FormationTransition,
        BehavioralMode::RelayHold,
    ];

    /// Canonical lowercase name
    pub const fn as_str(&self) -> &'static str {
        match self {
            BehavioralMode::Hover => "hover",
            BehavioralMode::Translate => "translate",
            BehavioralMode::Orbit => "orbit",
            BehavioralMode::Avoid => "avoid",
            BehavioralMode::Climb => "climb",
            BehavioralMode::Descend => "descend",
            BehavioralMode::Land => "land",
            BehavioralMode::Takeoff => "takeoff",
            BehavioralMode::Dock => "dock",
            BehavioralMode::Undock => "undock",
            BehavioralMode::Grounded => "grounded",
            BehavioralMode::Docked => "docked",
            BehavioralMode::FormationHold => "formation-hold",
            BehavioralMode::FormationTransition => "formation-transition",
            BehavioralMode::RelayHold => "relay-hold",
        }
    }

    /// True when the drone is on the ground or docked in this mode
    pub const fn is_on_ground(&self) -> bool {
        matches!(self, BehavioralMode::Grounded | BehavioralMode::Docked)
    }
}

impl fmt::Display for BehavioralMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// κ — autonomy level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutonomyLevel {
    /// Full onboard autonomy
    Autonomous,
    /// Operator supplies goals, drone executes
    OperatorGuided,
    /// Safety-driven override
    Emergency,
    /// Direct manual control
    Manual,
}

impl AutonomyLevel {
    /// All levels
    pub const ALL: [AutonomyLevel; 4] = [
        AutonomyLevel::Autonomous,
        AutonomyLevel::OperatorGuided,
        AutonomyLevel::Emergency,
        AutonomyLevel::Manual,
    ];

    /// Canonical lowercase name
    pub const fn as_str(&self) -> &'static str {
        match self {
            AutonomyLevel::Autonomous => "autonomous",
            AutonomyLevel::OperatorGuided => "operator-guided",
            AutonomyLevel::Emergency => "emergency",
            AutonomyLevel::Manual => "manual",
        }
    }
}

impl fmt::Display for AutonomyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// χ — formation role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormationRole {
    /// Formation reference point, followed by others
    Leader,
    /// Tracks a leader
    Follower,
    /// Extends comm coverage
    Relay,
    /// Executes the show/mission content
    Performer,
    /// Heading to a charger
    ChargerInbound,
    /// On a charger, charging
    Charging,
    /// Returning from a charger
    ChargerOutbound,
    /// Explores ahead of the swarm
    Scout,
    /// Fixed spatial reference
    Anchor,
    /// Held back, available for promotion
    Reserve,
}

impl FormationRole {
    /// All roles
    pub const ALL: [FormationRole; 10] = [
        FormationRole::Leader,
        FormationRole::Follower,
        FormationRole::Relay,
        FormationRole::Performer,
        FormationRole::ChargerInbound,
        FormationRole::Charging,
        FormationRole::ChargerOutbound,
        FormationRole::Scout,
        FormationRole::Anchor,
        FormationRole::Reserve,
    ];

    /// Canonical lowercase name
    pub const fn as_str(&self) -> &'static str {
        match self {
            FormationRole::Leader => "leader",
            FormationRole::Follower => "follower",
            FormationRole::Relay => "relay",
            FormationRole::Performer => "performer",
            FormationRole::ChargerInbound => "charger-inbound",
            FormationRole::Charging => "charging",
            FormationRole::ChargerOutbound => "charger-outbound",
            FormationRole::Scout => "scout",
            FormationRole::Anchor => "anchor",
            FormationRole::Reserve => "reserve",
        }
    }

    /// True while the drone is anywhere in the charging lifecycle
    pub const fn in_charging_cycle(&self) -> bool {
        matches!(
            self,
            FormationRole::ChargerInbound | FormationRole::Charging | FormationRole::ChargerOutbound
        )
    }
}

impl fmt::Display for FormationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// λ — resource ownership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceOwnership {
    /// Owns its airspace volume outright
    ExclusiveVolume,
    /// Shares a flight corridor
    SharedCorridor,
    /// Yields to all other traffic
    Yielding,
    /// Provides energy (charger side)
    EnergySource,
    /// Carries spare energy
    EnergyStore,
    /// Draws energy (charging)
    EnergyConsumer,
    /// Carries comm traffic for others
    CommBridge,
}

impl ResourceOwnership {
    /// All ownership classes
    pub const ALL: [ResourceOwnership; 7] = [
        ResourceOwnership::ExclusiveVolume,
        ResourceOwnership::SharedCorridor,
        ResourceOwnership::Yielding,
        ResourceOwnership::EnergySource,
        ResourceOwnership::EnergyStore,
        ResourceOwnership::EnergyConsumer,
        ResourceOwnership::CommBridge,
    ];

    /// Canonical lowercase name
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceOwnership::ExclusiveVolume => "exclusive-volume",
            ResourceOwnership::SharedCorridor => "shared-corridor",
            ResourceOwnership::Yielding => "yielding",
            ResourceOwnership::EnergySource => "energy-source",
            ResourceOwnership::EnergyStore => "energy-store",
            ResourceOwnership::EnergyConsumer => "energy-consumer",
            ResourceOwnership::CommBridge => "comm-bridge",
        }
    }
}

impl fmt::Display for ResourceOwnership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// τ — physical traits (airframe configuration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhysicalTraits {
    /// Stock airframe
    Bare,
    /// Solar panel deck
    SolarEquipped,
    /// Spare battery payload
    BatteryCarrier,
    /// Camera deck
    CameraEquipped,
    /// Extended sensor suite
    SensorExtended,
    /// Two expansion decks mounted
    DualDeck,
}

impl PhysicalTraits {
    /// All trait configurations
    pub const ALL: [PhysicalTraits; 6] = [
        PhysicalTraits::Bare,
        PhysicalTraits::SolarEquipped,
        PhysicalTraits::BatteryCarrier,
        PhysicalTraits::CameraEquipped,
        PhysicalTraits::SensorExtended,
        PhysicalTraits::DualDeck,
    ];

    /// Canonical lowercase name
    pub const fn as_str(&self) -> &'static str {
        match self {
            PhysicalTraits::Bare => "bare",
            PhysicalTraits::SolarEquipped => "solar-equipped",
            PhysicalTraits::BatteryCarrier => "battery-carrier",
            PhysicalTraits::CameraEquipped => "camera-equipped",
            PhysicalTraits::SensorExtended => "sensor-extended",
            PhysicalTraits::DualDeck => "dual-deck",
        }
    }
}

impl fmt::Display for PhysicalTraits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ρ — hardware target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareTarget {
    /// Crazyflie 2.1 (STM32F405)
    #[serde(rename = "crazyflie-2.1")]
    Crazyflie21,
    /// Crazyflie Bolt
    #[serde(rename = "crazyflie-bl")]
    CrazyflieBl,
    /// ESP-Drone
    #[serde(rename = "esp-drone")]
    EspDrone,
    /// Gazebo simulation
    #[serde(rename = "sim-gazebo")]
    SimGazebo,
    /// Lightweight kinematic simulator
    #[serde(rename = "sim-simple")]
    SimSimple,
}

impl HardwareTarget {
    /// All hardware targets
    pub const ALL: [HardwareTarget; 5] = [
        HardwareTarget::Crazyflie21,
        HardwareTarget::CrazyflieBl,
        HardwareTarget::EspDrone,
        HardwareTarget::SimGazebo,
        HardwareTarget::SimSimple,
    ];

    /// Canonical lowercase name
    pub const fn as_str(&self) -> &'static str {
        match self {
            HardwareTarget::Crazyflie21 => "crazyflie-2.1",
            HardwareTarget::CrazyflieBl => "crazyflie-bl",
            HardwareTarget::EspDrone => "esp-drone",
            HardwareTarget::SimGazebo => "sim-gazebo",
            HardwareTarget::SimSimple => "sim-simple",
        }
    }

    /// Simulators accept any airframe configuration
    pub const fn is_simulator(&self) -> bool {
        matches!(self, HardwareTarget::SimGazebo | HardwareTarget::SimSimple)
    }
}

impl fmt::Display for HardwareTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a pattern maps sensor state to motor commands (firmware-side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorType {
    /// Hold a fixed position
    PositionHold,
    /// Track a velocity setpoint
    VelocityTrack,
    /// Fly a waypoint sequence
    WaypointSequence,
    /// Hold an offset relative to another drone
    RelativeOffset,
    /// Circle a center point
    OrbitCenter,
    /// Follow a spline trajectory
    TrajectorySpline,
    /// Cut motors / crash-stop
    EmergencyStop,
    /// No output
    Idle,
}

impl GeneratorType {
    /// All generator types
    pub const ALL: [GeneratorType; 8] = [
        GeneratorType::PositionHold,
        GeneratorType::VelocityTrack,
        GeneratorType::WaypointSequence,
        GeneratorType::RelativeOffset,
        GeneratorType::OrbitCenter,
        GeneratorType::TrajectorySpline,
        GeneratorType::EmergencyStop,
        GeneratorType::Idle,
    ];

    /// Canonical lowercase name
    pub const fn as_str(&self) -> &'static str {
        match self {
            GeneratorType::PositionHold => "position-hold",
            GeneratorType::VelocityTrack => "velocity-track",
            GeneratorType::WaypointSequence => "waypoint-sequence",
            GeneratorType::RelativeOffset => "relative-offset",
            GeneratorType::OrbitCenter => "orbit-center",
            GeneratorType::TrajectorySpline => "trajectory-spline",
            GeneratorType::EmergencyStop => "emergency-stop",
            GeneratorType::Idle => "idle",
        }
    }
}

impl fmt::Display for GeneratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six structural coordinates that key the behavioral catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorePattern {
    /// σ — behavioral mode
    pub sigma: BehavioralMode,
    /// κ — autonomy level
    pub kappa: AutonomyLevel,
    /// χ — formation role
    pub chi: FormationRole,
    /// λ — resource ownership (derived from χ)
    pub lambda: ResourceOwnership,
    /// τ — physical traits
    pub tau: PhysicalTraits,
    /// ρ — hardware target
    pub rho: HardwareTarget,
}

impl CorePattern {
    /// Canonical catalog key: `{σ}-{κ}-{χ}-{τ}.{ρ}` (λ omitted, derived from χ)
    pub fn canonical_key(&self) -> String {
        format!(
            "{}-{}-{}-{}.{}",
            self.sigma, self.kappa, self.chi, self.tau, self.rho
        )
    }
}

impl fmt::Display for CorePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_key())
    }
}

/// Partial core key for catalog filtering; unset fields match anything
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PartialCorePattern {
    /// Constrain σ
    pub sigma: Option<BehavioralMode>,
    /// Constrain κ
    pub kappa: Option<AutonomyLevel>,
    /// Constrain χ
    pub chi: Option<FormationRole>,
    /// Constrain λ
    pub lambda: Option<ResourceOwnership>,
    /// Constrain τ
    pub tau: Option<PhysicalTraits>,
    /// Constrain ρ
    pub rho: Option<HardwareTarget>,
}

impl PartialCorePattern {
    /// Match only hardware and airframe (the per-drone physical key)
    pub const fn for_hardware(rho: HardwareTarget, tau: PhysicalTraits) -> Self {
        Self {
            sigma: None,
            kappa: None,
            chi: None,
            lambda: None,
            tau: Some(tau),
            rho: Some(rho),
        }
    }

    /// Same filter with σ constrained as well
    pub fn with_sigma(mut self, sigma: BehavioralMode) -> Self {
        self.sigma = Some(sigma);
        self
    }

    /// Every specified field must equal the pattern's; unset fields are free
    pub fn matches(&self, core: &CorePattern) -> bool {
        self.sigma.map_or(true, |s| s == core.sigma)
            && self.kappa.map_or(true, |k| k == core.kappa)
            && self.chi.map_or(true, |c| c == core.chi)
            && self.lambda.map_or(true, |l| l == core.lambda)
            && self.tau.map_or(true, |t| t == core.tau)
            && self.rho.map_or(true, |r| r == core.rho)
    }
}
