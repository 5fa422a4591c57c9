//! Load-time catalog validation
//!
//! The runtime never re-checks these invariants; whatever loads the
//! catalog must run this validator once and refuse a catalog with
//! violations.

use super::{CatalogIndex, ParamValue};
use crate::dependency::{validate_core, DependencyViolation};
use crate::dimensions::{AutonomyLevel, BehavioralMode};
use core::fmt;
use log::warn;
use std::collections::{HashSet, VecDeque};

/// A single validation failure
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogViolation {
    /// Two entries share an id
    DuplicateId {
        /// The repeated id
        id: String,
    },
    /// An entry's id is not the canonical key of its core
    IdMismatch {
        /// The declared id
        id: String,
        /// The canonical key it should be
        expected: String,
    },
    /// The core pattern violates a dependency rule
    Dependency {
        /// The offending entry
        id: String,
        /// The first violated rule
        violation: DependencyViolation,
    },
    /// A referenced pattern id does not exist
    MissingReference {
        /// The referencing entry
        id: String,
        /// Which field held the reference
        field: &'static str,
        /// The dangling id
        target: String,
    },
    /// A valid_to edge implies a mode transition the matrix forbids
    TransitionNotPermitted {
        /// The source entry
        id: String,
        /// The target entry
        target: String,
    },
    /// An emergency-κ pattern has a nonzero entry floor
    EmergencyFloorNonzero {
        /// The offending entry
        id: String,
    },
    /// The entry has no edges at all, in or out
    Isolated {
        /// The offending entry
        id: String,
    },
    /// No path from this entry to any grounded pattern
    NoPathToGround {
        /// The offending entry
        id: String,
    },
    /// A generator default lies outside its declared bound
    GeneratorDefaultOutOfBounds {
        /// The offending entry
        id: String,
        /// The offending parameter
        param: String,
    },
}

impl fmt::Display for CatalogViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogViolation::DuplicateId { id } => write!(f, "{id}: duplicate id"),
            CatalogViolation::IdMismatch { id, expected } => {
                write!(f, "{id}: id is not the canonical key {expected}")
            }
            CatalogViolation::Dependency { id, violation } => write!(f, "{id}: {violation}"),
            CatalogViolation::MissingReference { id, field, target } => {
                write!(f, "{id}: {field} references missing pattern {target}")
            }
            CatalogViolation::TransitionNotPermitted { id, target } => {
                write!(f, "{id}: valid_to {target} implies a forbidden mode transition")
            }
            CatalogViolation::EmergencyFloorNonzero { id } => {
                write!(f, "{id}: emergency pattern must have zero entry floors")
            }
            CatalogViolation::Isolated { id } => write!(f, "{id}: pattern is isolated"),
            CatalogViolation::NoPathToGround { id } => {
                write!(f, "{id}: no path to a grounded pattern")
            }
            CatalogViolation::GeneratorDefaultOutOfBounds { id, param } => {
                write!(f, "{id}: generator default {param} outside declared bounds")
            }
        }
    }
}

/// Validate every catalog invariant; an empty result means the catalog is
/// safe to hand to the coordinator.
pub fn validate_catalog(catalog: &CatalogIndex) -> Vec<CatalogViolation> {
    let mut violations = Vec::new();

    check_ids(catalog, &mut violations);
    check_references(catalog, &mut violations);
    check_isolation(catalog, &mut violations);
    check_ground_reachability(catalog, &mut violations);
    check_generators(catalog, &mut violations);

    violations
}

fn check_ids(catalog: &CatalogIndex, out: &mut Vec<CatalogViolation>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for pattern in catalog.patterns() {
        if !seen.insert(&pattern.id) {
            out.push(CatalogViolation::DuplicateId {
                id: pattern.id.clone(),
            });
        }
        let expected = pattern.core.canonical_key();
        if pattern.id != expected {
            out.push(CatalogViolation::IdMismatch {
                id: pattern.id.clone(),
                expected,
            });
        }
        if let Err(violation) = validate_core(&pattern.core) {
            out.push(CatalogViolation::Dependency {
                id: pattern.id.clone(),
                violation,
            });
        }
        if pattern.core.kappa == AutonomyLevel::Emergency
            && (pattern.preconditions.battery_floor != 0.0
                || pattern.preconditions.position_quality_floor != 0.0)
        {
            out.push(CatalogViolation::EmergencyFloorNonzero {
                id: pattern.id.clone(),
            });
        }
        if pattern.verification.status == super::VerificationStatus::Failed {
            warn!("catalog entry {} carries failed verification", pattern.id);
        }
    }
}

fn check_references(catalog: &CatalogIndex, out: &mut Vec<CatalogViolation>) {
    for pattern in catalog.patterns() {
        for target in &pattern.preconditions.valid_from {
            if catalog.lookup(target).is_none() {
                out.push(CatalogViolation::MissingReference {
                    id: pattern.id.clone(),
                    field: "valid_from",
                    target: target.clone(),
                });
            }
        }
        for target in &pattern.postconditions.valid_to {
            match catalog.lookup(target) {
                None => out.push(CatalogViolation::MissingReference {
                    id: pattern.id.clone(),
                    field: "valid_to",
                    target: target.clone(),
                }),
                Some(to) => {
                    if !catalog
                        .transition_matrix()
                        .is_valid(pattern.core.sigma, to.core.sigma)
                    {
                        out.push(CatalogViolation::TransitionNotPermitted {
                            id: pattern.id.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }
        for exit in &pattern.postconditions.forced_exits {
            if catalog.lookup(&exit.target_pattern).is_none() {
                out.push(CatalogViolation::MissingReference {
                    id: pattern.id.clone(),
                    field: "forced_exits",
                    target: exit.target_pattern.clone(),
                });
            }
        }
    }
}

fn check_isolation(catalog: &CatalogIndex, out: &mut Vec<CatalogViolation>) {
    // A pattern participates in the graph if any edge touches it:
    // its own entry/exit lists, or a reference from another pattern.
    let mut referenced: HashSet<&str> = HashSet::new();
    for pattern in catalog.patterns() {
        for id in &pattern.preconditions.valid_from {
            referenced.insert(id);
        }
        for id in &pattern.postconditions.valid_to {
            referenced.insert(id);
        }
        for exit in &pattern.postconditions.forced_exits {
            referenced.insert(&exit.target_pattern);
        }
    }

    for pattern in catalog.patterns() {
        let has_own_edges = !pattern.preconditions.valid_from.is_empty()
            || !pattern.postconditions.valid_to.is_empty()
            || !pattern.postconditions.forced_exits.is_empty();
        if !has_own_edges && !referenced.contains(pattern.id.as_str()) {
            out.push(CatalogViolation::Isolated {
                id: pattern.id.clone(),
            });
        }
    }
}

fn check_ground_reachability(catalog: &CatalogIndex, out: &mut Vec<CatalogViolation>) {
    // Reverse BFS from every grounded pattern over valid_to ∪ forced_exits.
    let mut reaches_ground: HashSet<usize> = HashSet::new();
    let mut queue: VecDeque<usize> = VecDeque::new();

    let ids: Vec<&str> = catalog.patterns().map(|p| p.id.as_str()).collect();
    for (i, pattern) in catalog.patterns().enumerate() {
        if pattern.core.sigma == BehavioralMode::Grounded {
            reaches_ground.insert(i);
            queue.push_back(i);
        }
    }

    while let Some(target_idx) = queue.pop_front() {
        let target_id = ids[target_idx];
        for (i, pattern) in catalog.patterns().enumerate() {
            if reaches_ground.contains(&i) {
                continue;
            }
            let exits_to_target = pattern
                .postconditions
                .valid_to
                .iter()
                .any(|t| t == target_id)
                || pattern
                    .postconditions
                    .forced_exits
                    .iter()
                    .any(|e| e.target_pattern == target_id);
            if exits_to_target {
                reaches_ground.insert(i);
                queue.push_back(i);
            }
        }
    }

    for (i, pattern) in catalog.patterns().enumerate() {
        if pattern.core.sigma != BehavioralMode::Grounded && !reaches_ground.contains(&i) {
            out.push(CatalogViolation::NoPathToGround {
                id: pattern.id.clone(),
            });
        }
    }
}

fn check_generators(catalog: &CatalogIndex, out: &mut Vec<CatalogViolation>) {
    for pattern in catalog.patterns() {
        for (name, bounds) in &pattern.generator.bounds {
            let Some(value) = pattern.generator.defaults.get(name) else {
                continue;
            };
            let in_bounds = match value {
                ParamValue::Scalar(v) => *v >= bounds.min && *v <= bounds.max,
                ParamValue::Vector(vs) => {
                    vs.iter().all(|v| *v >= bounds.min && *v <= bounds.max)
                }
            };
            if !in_bounds {
                out.push(CatalogViolation::GeneratorDefaultOutOfBounds {
                    id: pattern.id.clone(),
                    param: name.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BehavioralPattern, CatalogIndex, GeneratorSpec, ParamBounds};
    use crate::dependency::default_ownership;
    use crate::dimensions::{
        CorePattern, FormationRole, GeneratorType, HardwareTarget, PhysicalTraits,
    };

    fn core(sigma: BehavioralMode, chi: FormationRole) -> CorePattern {
        CorePattern {
            sigma,
            kappa: AutonomyLevel::Autonomous,
            chi,
            lambda: default_ownership(chi),
            tau: PhysicalTraits::Bare,
            rho: HardwareTarget::Crazyflie21,
        }
    }

    fn linked_pair() -> Vec<BehavioralPattern> {
        let hover = BehavioralPattern::new(core(BehavioralMode::Hover, FormationRole::Performer))
            .with_valid_to(&["land-autonomous-performer-bare.crazyflie-2.1"]);
        let land = BehavioralPattern::new(core(BehavioralMode::Land, FormationRole::Performer))
            .with_valid_from(&["hover-autonomous-performer-bare.crazyflie-2.1"])
            .with_valid_to(&["grounded-autonomous-reserve-bare.crazyflie-2.1"]);
        let grounded =
            BehavioralPattern::new(core(BehavioralMode::Grounded, FormationRole::Reserve))
                .with_valid_from(&["land-autonomous-performer-bare.crazyflie-2.1"]);
        vec![hover, land, grounded]
    }

    #[test]
    fn test_clean_catalog_passes() {
        let cat = CatalogIndex::new(linked_pair(), vec![]);
        assert!(validate_catalog(&cat).is_empty());
    }

    #[test]
    fn test_id_mismatch_detected() {
        let mut patterns = linked_pair();
        patterns[0].id = "wrong-id".to_string();
        let cat = CatalogIndex::new(patterns, vec![]);
        let violations = validate_catalog(&cat);
        assert!(violations
            .iter()
            .any(|v| matches!(v, CatalogViolation::IdMismatch { .. })));
    }

    #[test]
    fn test_missing_reference_detected() {
        let mut patterns = linked_pair();
        patterns[0] = patterns[0].clone().with_forced_exit("battery < 0.1", "not-there");
        let cat = CatalogIndex::new(patterns, vec![]);
        let violations = validate_catalog(&cat);
        assert!(violations.iter().any(|v| matches!(
            v,
            CatalogViolation::MissingReference { field: "forced_exits", .. }
        )));
    }

    #[test]
    fn test_emergency_floor_enforced() {
        let mut c = core(BehavioralMode::Land, FormationRole::Performer);
        c.kappa = AutonomyLevel::Emergency;
        let mut patterns = linked_pair();
        let bad = BehavioralPattern::new(c)
            .with_battery_floor(0.1)
            .with_valid_to(&["grounded-autonomous-reserve-bare.crazyflie-2.1"]);
        patterns.push(bad);
        let cat = CatalogIndex::new(patterns, vec![]);
        let violations = validate_catalog(&cat);
        assert!(violations
            .iter()
            .any(|v| matches!(v, CatalogViolation::EmergencyFloorNonzero { .. })));
    }

    #[test]
    fn test_isolated_pattern_detected() {
        let mut patterns = linked_pair();
        patterns.push(BehavioralPattern::new(core(
            BehavioralMode::RelayHold,
            FormationRole::Relay,
        )));
        let cat = CatalogIndex::new(patterns, vec![]);
        let violations = validate_catalog(&cat);
        assert!(violations
            .iter()
            .any(|v| matches!(v, CatalogViolation::Isolated { .. })));
    }

    #[test]
    fn test_no_path_to_ground_detected() {
        // hover → translate cycle with no landing edge
        let hover = BehavioralPattern::new(core(BehavioralMode::Hover, FormationRole::Performer))
            .with_valid_to(&["translate-autonomous-performer-bare.crazyflie-2.1"])
            .with_valid_from(&["translate-autonomous-performer-bare.crazyflie-2.1"]);
        let translate =
            BehavioralPattern::new(core(BehavioralMode::Translate, FormationRole::Performer))
                .with_valid_from(&["hover-autonomous-performer-bare.crazyflie-2.1"])
                .with_valid_to(&["hover-autonomous-performer-bare.crazyflie-2.1"]);
        let cat = CatalogIndex::new(vec![hover, translate], vec![]);
        let violations = validate_catalog(&cat);
        assert_eq!(
            violations
                .iter()
                .filter(|v| matches!(v, CatalogViolation::NoPathToGround { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_transition_matrix_checked_on_valid_to() {
        // grounded → hover edge is declared but the matrix requires takeoff
        let grounded =
            BehavioralPattern::new(core(BehavioralMode::Grounded, FormationRole::Reserve))
                .with_valid_to(&["hover-autonomous-performer-bare.crazyflie-2.1"]);
        let hover = BehavioralPattern::new(core(BehavioralMode::Hover, FormationRole::Performer))
            .with_valid_from(&["grounded-autonomous-reserve-bare.crazyflie-2.1"])
            .with_valid_to(&["grounded-autonomous-reserve-bare.crazyflie-2.1"]);
        let cat = CatalogIndex::new(vec![grounded, hover], vec![]);
        let violations = validate_catalog(&cat);
        assert!(violations
            .iter()
            .any(|v| matches!(v, CatalogViolation::TransitionNotPermitted { .. })));
    }

    #[test]
    fn test_generator_default_out_of_bounds() {
        let mut generator = GeneratorSpec::of(GeneratorType::OrbitCenter);
        generator
            .defaults
            .insert("radius".to_string(), ParamValue::Scalar(9.0));
        generator
            .bounds
            .insert("radius".to_string(), ParamBounds { min: 0.5, max: 5.0 });
        let mut patterns = linked_pair();
        patterns[0] = patterns[0].clone().with_generator(generator);
        let cat = CatalogIndex::new(patterns, vec![]);
        let violations = validate_catalog(&cat);
        assert!(violations
            .iter()
            .any(|v| matches!(v, CatalogViolation::GeneratorDefaultOutOfBounds { .. })));
    }

    #[test]
    fn test_duplicate_id_detected() {
        let mut patterns = linked_pair();
        patterns.push(patterns[0].clone());
        let cat = CatalogIndex::new(patterns, vec![]);
        let violations = validate_catalog(&cat);
        assert!(violations
            .iter()
            .any(|v| matches!(v, CatalogViolation::DuplicateId { .. })));
    }

    #[test]
    fn test_validated_constructor_rejects() {
        let mut patterns = linked_pair();
        patterns[0].id = "wrong".into();
        assert!(CatalogIndex::validated(patterns, vec![]).is_err());
        assert!(CatalogIndex::validated(linked_pair(), vec![]).is_ok());
    }
}
