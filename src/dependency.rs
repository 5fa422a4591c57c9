//! Dimension dependency rules and the mode transition matrix
//!
//! The six structural dimensions are not independent: which airframe
//! configurations a hardware target carries, which modes a configuration
//! can fly, which roles it can hold, and which ownership class a role
//! implies are all constrained. These tables are enforced once at catalog
//! load; the runtime assumes every drone's core pattern already satisfies
//! them.

use crate::dimensions::{
    AutonomyLevel, BehavioralMode, CorePattern, FormationRole, HardwareTarget, PhysicalTraits,
    ResourceOwnership,
};
use core::fmt;

// ============================================================================
// FIBER BUNDLE TABLES
// ============================================================================

const ALL_TRAITS: &[PhysicalTraits] = &PhysicalTraits::ALL;
const BARE_ONLY: &[PhysicalTraits] = &[PhysicalTraits::Bare];

/// Airframe configurations a hardware target can carry.
///
/// Physical hardware flies the stock airframe only; simulators accept any
/// configuration.
pub fn valid_traits(rho: HardwareTarget) -> &'static [PhysicalTraits] {
    if rho.is_simulator() {
        ALL_TRAITS
    } else {
        BARE_ONLY
    }
}

/// Modes an airframe configuration cannot fly.
///
/// Heavy decks (solar, spare battery, dual) shift the center of mass too
/// far for sustained orbit.
pub fn excluded_modes_by_traits(tau: PhysicalTraits) -> &'static [BehavioralMode] {
    match tau {
        PhysicalTraits::SolarEquipped | PhysicalTraits::BatteryCarrier | PhysicalTraits::DualDeck => {
            &[BehavioralMode::Orbit]
        }
        _ => &[],
    }
}

/// Modes a hardware target cannot fly.
///
/// Docking needs the charging-pad landing gear, absent on ESP-Drone and
/// the simple simulator.
pub fn excluded_modes_by_hardware(rho: HardwareTarget) -> &'static [BehavioralMode] {
    match rho {
        HardwareTarget::EspDrone | HardwareTarget::SimSimple => &[
            BehavioralMode::Dock,
            BehavioralMode::Undock,
            BehavioralMode::Docked,
        ],
        _ => &[],
    }
}

/// Roles an airframe configuration cannot hold.
pub fn excluded_roles_by_traits(tau: PhysicalTraits) -> &'static [FormationRole] {
    match tau {
        PhysicalTraits::SolarEquipped | PhysicalTraits::BatteryCarrier | PhysicalTraits::DualDeck => {
            &[FormationRole::Scout]
        }
        _ => &[],
    }
}

/// Ownership classes a formation role may claim; the first entry is the
/// role's default.
pub fn allowed_ownership(chi: FormationRole) -> &'static [ResourceOwnership] {
    match chi {
        FormationRole::Leader => &[ResourceOwnership::ExclusiveVolume],
        FormationRole::Follower => &[ResourceOwnership::SharedCorridor],
        FormationRole::Relay => &[
            ResourceOwnership::ExclusiveVolume,
            ResourceOwnership::CommBridge,
        ],
        FormationRole::Performer => &[
            ResourceOwnership::SharedCorridor,
            ResourceOwnership::ExclusiveVolume,
        ],
        FormationRole::ChargerInbound => &[
            ResourceOwnership::SharedCorridor,
            ResourceOwnership::Yielding,
        ],
        FormationRole::Charging => &[ResourceOwnership::EnergyConsumer],
        FormationRole::ChargerOutbound => &[ResourceOwnership::SharedCorridor],
        FormationRole::Scout => &[ResourceOwnership::ExclusiveVolume],
        FormationRole::Anchor => &[ResourceOwnership::ExclusiveVolume],
        FormationRole::Reserve => &[
            ResourceOwnership::SharedCorridor,
            ResourceOwnership::Yielding,
        ],
    }
}

/// Default ownership for a role (the first allowed class)
pub fn default_ownership(chi: FormationRole) -> ResourceOwnership {
    allowed_ownership(chi)[0]
}

// ============================================================================
// COMPOSITE VALIDATOR
// ============================================================================

/// First dependency rule a core pattern violates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyViolation {
    /// τ is not in VALID_TRAITS\[ρ\]
    TraitNotSupported {
        /// Hardware target
        rho: HardwareTarget,
        /// Offending airframe configuration
        tau: PhysicalTraits,
    },
    /// σ is excluded for this airframe configuration
    ModeExcludedByTraits {
        /// Airframe configuration
        tau: PhysicalTraits,
        /// Offending mode
        sigma: BehavioralMode,
    },
    /// σ is excluded for this hardware target
    ModeExcludedByHardware {
        /// Hardware target
        rho: HardwareTarget,
        /// Offending mode
        sigma: BehavioralMode,
    },
    /// χ is excluded for this airframe configuration
    RoleExcludedByTraits {
        /// Airframe configuration
        tau: PhysicalTraits,
        /// Offending role
        chi: FormationRole,
    },
    /// λ is not an allowed ownership class for χ
    OwnershipInvalidForRole {
        /// Formation role
        chi: FormationRole,
        /// Offending ownership class
        lambda: ResourceOwnership,
    },
}

impl fmt::Display for DependencyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyViolation::TraitNotSupported { rho, tau } => {
                write!(f, "traits {tau} not supported on {rho}")
            }
            DependencyViolation::ModeExcludedByTraits { tau, sigma } => {
                write!(f, "mode {sigma} excluded for traits {tau}")
            }
            DependencyViolation::ModeExcludedByHardware { rho, sigma } => {
                write!(f, "mode {sigma} excluded on {rho}")
            }
            DependencyViolation::RoleExcludedByTraits { tau, chi } => {
                write!(f, "role {chi} excluded for traits {tau}")
            }
            DependencyViolation::OwnershipInvalidForRole { chi, lambda } => {
                write!(f, "ownership {lambda} invalid for role {chi}")
            }
        }
    }
}

/// Check a core pattern against every dependency table, returning the first
/// violated rule.
///
/// Check order: τ valid for ρ, then σ valid for (ρ, τ), then χ valid for τ,
/// then λ valid for χ.
pub fn validate_core(core: &CorePattern) -> Result<(), DependencyViolation> {
    if !valid_traits(core.rho).contains(&core.tau) {
        return Err(DependencyViolation::TraitNotSupported {
            rho: core.rho,
            tau: core.tau,
        });
    }
    if excluded_modes_by_traits(core.tau).contains(&core.sigma) {
        return Err(DependencyViolation::ModeExcludedByTraits {
            tau: core.tau,
            sigma: core.sigma,
        });
    }
    if excluded_modes_by_hardware(core.rho).contains(&core.sigma) {
        return Err(DependencyViolation::ModeExcludedByHardware {
            rho: core.rho,
            sigma: core.sigma,
        });
    }
    if excluded_roles_by_traits(core.tau).contains(&core.chi) {
        return Err(DependencyViolation::RoleExcludedByTraits {
            tau: core.tau,
            chi: core.chi,
        });
    }
    if !allowed_ownership(core.chi).contains(&core.lambda) {
        return Err(DependencyViolation::OwnershipInvalidForRole {
            chi: core.chi,
            lambda: core.lambda,
        });
    }
    Ok(())
}

// ============================================================================
// MODE TRANSITION MATRIX
// ============================================================================

/// One rule of the σ→σ transition matrix; `None` endpoints are wildcards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionRule {
    /// Source mode, `None` for `*`
    pub from: Option<BehavioralMode>,
    /// Target mode, `None` for `*`
    pub to: Option<BehavioralMode>,
    /// Whether the transition is permitted
    pub valid: bool,
    /// Intermediate mode to route through when invalid
    pub via: Option<BehavioralMode>,
    /// Expected transition duration (s)
    pub transition_time_s: f32,
    /// Why the rule exists
    pub reason: Option<&'static str>,
}

impl TransitionRule {
    const fn allow(from: BehavioralMode, to: BehavioralMode, time_s: f32) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            valid: true,
            via: None,
            transition_time_s: time_s,
            reason: None,
        }
    }

    const fn deny_via(from: BehavioralMode, to: BehavioralMode, via: BehavioralMode) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            valid: false,
            via: Some(via),
            transition_time_s: 0.0,
            reason: None,
        }
    }
}

use BehavioralMode as M;

/// The built-in mode transition matrix.
///
/// Invariants baked in: grounded reaches the air only through takeoff,
/// docked leaves only through undock, avoid is reachable from anywhere,
/// and every airborne mode has a path to grounded (directly or through
/// hover → land).
pub static SIGMA_TRANSITIONS: &[TransitionRule] = &[
    // Ground handling
    TransitionRule::allow(M::Grounded, M::Takeoff, 2.0),
    TransitionRule::deny_via(M::Grounded, M::Hover, M::Takeoff),
    TransitionRule::deny_via(M::Grounded, M::Translate, M::Takeoff),
    TransitionRule::deny_via(M::Grounded, M::Orbit, M::Takeoff),
    // Collision avoidance is reachable from any mode
    TransitionRule {
        from: None,
        to: Some(M::Avoid),
        valid: true,
        via: None,
        transition_time_s: 0.2,
        reason: Some("avoidance preempts any mode"),
    },
    // Takeoff
    TransitionRule::allow(M::Takeoff, M::Hover, 1.5),
    TransitionRule::allow(M::Takeoff, M::Climb, 1.0),
    TransitionRule::allow(M::Takeoff, M::Land, 1.0),
    // Hover is the airborne hub
    TransitionRule::allow(M::Hover, M::Translate, 0.5),
    TransitionRule::allow(M::Hover, M::Orbit, 1.0),
    TransitionRule::allow(M::Hover, M::Climb, 0.5),
    TransitionRule::allow(M::Hover, M::Descend, 0.5),
    TransitionRule::allow(M::Hover, M::Land, 0.5),
    TransitionRule::allow(M::Hover, M::Dock, 2.0),
    TransitionRule::allow(M::Hover, M::FormationHold, 1.0),
    TransitionRule::allow(M::Hover, M::FormationTransition, 1.0),
    TransitionRule::allow(M::Hover, M::RelayHold, 1.0),
    // Translation
    TransitionRule::allow(M::Translate, M::Hover, 0.5),
    TransitionRule::allow(M::Translate, M::Land, 1.0),
    TransitionRule::allow(M::Translate, M::FormationTransition, 0.5),
    // Orbit
    TransitionRule::allow(M::Orbit, M::Hover, 1.0),
    TransitionRule::allow(M::Orbit, M::Land, 1.5),
    // Avoidance recovery
    TransitionRule::allow(M::Avoid, M::Hover, 0.5),
    TransitionRule::allow(M::Avoid, M::Land, 0.5),
    // Vertical motion
    TransitionRule::allow(M::Climb, M::Hover, 0.5),
    TransitionRule::allow(M::Climb, M::Translate, 0.5),
    TransitionRule::allow(M::Descend, M::Hover, 0.5),
    TransitionRule::allow(M::Descend, M::Land, 0.5),
    // Landing and docking
    TransitionRule::allow(M::Land, M::Grounded, 3.0),
    TransitionRule::allow(M::Dock, M::Docked, 2.0),
    TransitionRule::allow(M::Dock, M::Hover, 1.0),
    TransitionRule::allow(M::Docked, M::Undock, 1.0),
    TransitionRule::deny_via(M::Docked, M::Hover, M::Undock),
    TransitionRule::allow(M::Undock, M::Hover, 1.5),
    // Formation flight
    TransitionRule::allow(M::FormationHold, M::Hover, 0.5),
    TransitionRule::allow(M::FormationHold, M::FormationTransition, 0.5),
    TransitionRule::allow(M::FormationHold, M::Land, 1.0),
    TransitionRule::allow(M::FormationTransition, M::FormationHold, 0.5),
    TransitionRule::allow(M::FormationTransition, M::Hover, 0.5),
    // Relay duty
    TransitionRule::allow(M::RelayHold, M::Hover, 0.5),
    TransitionRule::allow(M::RelayHold, M::Land, 1.0),
];

/// Declarative σ→σ transition matrix with wildcard lookup
#[derive(Debug, Clone)]
pub struct TransitionMatrix {
    rules: Vec<TransitionRule>,
}

impl Default for TransitionMatrix {
    fn default() -> Self {
        Self {
            rules: SIGMA_TRANSITIONS.to_vec(),
        }
    }
}

impl TransitionMatrix {
    /// Matrix from a custom rule list
    pub fn with_rules(rules: Vec<TransitionRule>) -> Self {
        Self { rules }
    }

    /// Find the governing rule: exact (from, to), then (*, to), then (from, *)
    pub fn lookup(&self, from: BehavioralMode, to: BehavioralMode) -> Option<&TransitionRule> {
        self.rules
            .iter()
            .find(|r| r.from == Some(from) && r.to == Some(to))
            .or_else(|| {
                self.rules
                    .iter()
                    .find(|r| r.from.is_none() && r.to == Some(to))
            })
            .or_else(|| {
                self.rules
                    .iter()
                    .find(|r| r.from == Some(from) && r.to.is_none())
            })
    }

    /// True iff a matching rule exists with `valid = true`; self-transitions
    /// are always valid
    pub fn is_valid(&self, from: BehavioralMode, to: BehavioralMode) -> bool {
        if from == to {
            return true;
        }
        self.lookup(from, to).map_or(false, |r| r.valid)
    }
}
