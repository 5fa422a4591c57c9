//! # Swarm Coordination Core
//!
//! Ground-station coordination core for drone swarms operating under a
//! selection-not-generation discipline: every behavior is drawn from a
//! finite, pre-verified catalog and parameterized at runtime by telemetry.
//!
//! ## Features
//! - 9-dimensional drone coordinate with a structural delta classifier
//! - Indexed behavioral catalog with transition and compatibility queries
//! - Authoritative world model with derived neighbor/role graphs
//! - Blast-radius propagation with bounded cascade closure
//! - Per-drone constraint solving with forced exits and safe fallbacks
//! - Priority-ordered role assignment with safety-exempt hysteresis
//! - Tick-driven coordinator loop over a narrow comms seam
//!
//! ## Safety Guarantees
//! - The core never raises on operational events; failures degrade to
//!   fallback patterns or retained state
//! - Catalog invariants (dependency rules, reference closure, paths to
//!   ground) are enforced once at load
//! - Battery safety overrides objectives, hysteresis, and mission rules
//!
//! ## Example
//! ```ignore
//! use swarm_coordination_core::{
//!     CatalogIndex, Coordinator, CoordinatorConfig, SimulatedComms,
//! };
//!
//! let catalog = CatalogIndex::validated(patterns, rules).expect("catalog");
//! let mut coordinator = Coordinator::new(SimulatedComms::new(), catalog, CoordinatorConfig::default());
//! coordinator.register_drone(id, rho, tau, "hover-autonomous-performer-bare.crazyflie-2.1", telemetry)?;
//! coordinator.start(&[id])?;
//! let assignments = coordinator.tick();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod blast;
pub mod catalog;
pub mod comms;
pub mod config;
pub mod constraint;
pub mod coordinator;
pub mod dependency;
pub mod dimensions;
pub mod roles;
pub mod types;
pub mod world;

pub use catalog::{BehavioralPattern, CatalogIndex, CompatibilityRule};
pub use comms::{DroneCommand, SimulatedComms, SwarmComms, TelemetryFrame};
pub use config::{CoordinatorConfig, RoleConfig, WorldConfig};
pub use constraint::{Assignment, ConstraintEngine, SwarmObjective};
pub use coordinator::Coordinator;
pub use dimensions::{
    AutonomyLevel, BehavioralMode, CorePattern, FormationRole, GeneratorType, HardwareTarget,
    PartialCorePattern, PhysicalTraits, ResourceOwnership,
};
pub use roles::{CoverageSpec, FormationSpec, RoleEngine};
pub use types::{
    BatteryState, CoordinationError, DroneId, Position, Result, SensorState, Velocity,
    MAX_NEIGHBORS, MAX_SWARM_SIZE,
};
pub use world::{DeltaResult, NeighborGraph, StructuralDimension, SwarmMetrics, WorldModel};
