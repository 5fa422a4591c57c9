//! The behavioral pattern catalog
//!
//! Every drone behavior is drawn from a finite, pre-verified catalog of
//! patterns keyed by the six structural dimensions. The index is built
//! once at load, validated, and read-only afterwards: O(1) id lookup,
//! partial-key filtering, transition validity, and pairwise compatibility
//! with wildcard rules.

pub mod compat;
pub mod glob;
pub mod validate;

pub use compat::{CompatibilityRule, CompatibilitySet};
pub use glob::{glob_match, glob_specificity};
pub use validate::{validate_catalog, CatalogViolation};

use crate::dependency::TransitionMatrix;
use crate::dimensions::{CorePattern, GeneratorType, PartialCorePattern};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Verification status of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationStatus {
    /// Offline proofs passed
    Verified,
    /// Not yet run through verification
    Unverified,
    /// Verification failed; entry must not fly
    Failed,
}

/// Entry requirements for a pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preconditions {
    /// Minimum battery fraction to enter, 0.0-1.0
    pub battery_floor: f32,
    /// Minimum position quality to enter, 0.0-1.0
    pub position_quality_floor: f32,
    /// Minimum count of neighbors plus visible base stations
    pub min_references: u32,
    /// Pattern ids this pattern may be entered from
    pub valid_from: Vec<String>,
    /// Free-form hardware feature requirements
    #[serde(default)]
    pub hardware_requirements: Option<Vec<String>>,
}

impl Default for Preconditions {
    fn default() -> Self {
        Self {
            battery_floor: 0.0,
            position_quality_floor: 0.0,
            min_references: 0,
            valid_from: Vec::new(),
            hardware_requirements: None,
        }
    }
}

/// A condition → target rule that overrides normal selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcedExit {
    /// Condition over sensor state, e.g. `battery < 0.10`
    pub condition: String,
    /// Pattern to exit to when the condition holds
    pub target_pattern: String,
}

/// Exit structure of a pattern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Postconditions {
    /// Pattern ids this pattern may exit to
    pub valid_to: Vec<String>,
    /// Safety exits, checked every tick
    #[serde(default)]
    pub forced_exits: Vec<ForcedExit>,
}

/// A named generator parameter: scalar or small vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Single scalar parameter
    Scalar(f32),
    /// Small vector parameter (waypoints, offsets)
    Vector(Vec<f32>),
}

/// Closed interval bound for a generator parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamBounds {
    /// Minimum value
    pub min: f32,
    /// Maximum value
    pub max: f32,
}

/// Firmware-side generator selection and parameterization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSpec {
    /// Which motor-command generator runs the pattern
    #[serde(rename = "type")]
    pub generator_type: GeneratorType,
    /// Default parameters
    #[serde(default)]
    pub defaults: BTreeMap<String, ParamValue>,
    /// Per-parameter bounds
    #[serde(default)]
    pub bounds: BTreeMap<String, ParamBounds>,
}

impl GeneratorSpec {
    /// Idle generator with no parameters
    pub fn idle() -> Self {
        Self {
            generator_type: GeneratorType::Idle,
            defaults: BTreeMap::new(),
            bounds: BTreeMap::new(),
        }
    }

    /// Generator of the given type with no parameters
    pub fn of(generator_type: GeneratorType) -> Self {
        Self {
            generator_type,
            defaults: BTreeMap::new(),
            bounds: BTreeMap::new(),
        }
    }
}

/// Offline verification results carried by a catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationInfo {
    /// Overall status
    pub status: VerificationStatus,
    /// Guaranteed clearance envelope (m)
    pub collision_clearance_m: f32,
    /// Velocity bound (m/s)
    pub max_velocity_ms: f32,
    /// Acceleration bound (m/s²)
    pub max_acceleration_ms2: f32,
    /// Energy draw (J/s)
    pub energy_rate_js: f32,
    /// Longest verified run time (s)
    pub max_duration_s: f32,
    /// Transitions covered by offline proofs
    #[serde(default)]
    pub verified_transitions: Vec<String>,
}

impl Default for VerificationInfo {
    fn default() -> Self {
        Self {
            status: VerificationStatus::Verified,
            collision_clearance_m: 0.5,
            max_velocity_ms: 1.0,
            max_acceleration_ms2: 2.0,
            energy_rate_js: 8.0,
            max_duration_s: 120.0,
            verified_transitions: Vec::new(),
        }
    }
}

/// One pre-verified behavioral pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralPattern {
    /// Canonical key of `core` (the catalog id)
    pub id: String,
    /// The six structural coordinates
    pub core: CorePattern,
    /// Human-readable summary
    pub description: String,
    /// Entry requirements
    pub preconditions: Preconditions,
    /// Exit structure
    pub postconditions: Postconditions,
    /// Generator selection
    pub generator: GeneratorSpec,
    /// Offline verification results
    pub verification: VerificationInfo,
}

impl BehavioralPattern {
    /// Minimal pattern for a core key: canonical id, open preconditions,
    /// no exits, idle generator, verified
    pub fn new(core: CorePattern) -> Self {
        Self {
            id: core.canonical_key(),
            core,
            description: String::new(),
            preconditions: Preconditions::default(),
            postconditions: Postconditions::default(),
            generator: GeneratorSpec::idle(),
            verification: VerificationInfo::default(),
        }
    }

    /// Set the battery floor
    pub fn with_battery_floor(mut self, floor: f32) -> Self {
        self.preconditions.battery_floor = floor;
        self
    }

    /// Set the position-quality floor
    pub fn with_position_quality_floor(mut self, floor: f32) -> Self {
        self.preconditions.position_quality_floor = floor;
        self
    }

    /// Set the minimum reference count
    pub fn with_min_references(mut self, count: u32) -> Self {
        self.preconditions.min_references = count;
        self
    }

    /// Append entry edges
    pub fn with_valid_from(mut self, ids: &[&str]) -> Self {
        self.preconditions
            .valid_from
            .extend(ids.iter().map(|s| s.to_string()));
        self
    }

    /// Append exit edges
    pub fn with_valid_to(mut self, ids: &[&str]) -> Self {
        self.postconditions
            .valid_to
            .extend(ids.iter().map(|s| s.to_string()));
        self
    }

    /// Append a forced exit
    pub fn with_forced_exit(mut self, condition: &str, target: &str) -> Self {
        self.postconditions.forced_exits.push(ForcedExit {
            condition: condition.to_string(),
            target_pattern: target.to_string(),
        });
        self
    }

    /// Replace the generator
    pub fn with_generator(mut self, generator: GeneratorSpec) -> Self {
        self.generator = generator;
        self
    }
}

/// Read-only indexed store of patterns and compatibility rules
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    /// Patterns in load order; position doubles as the numeric pattern id
    patterns: Vec<BehavioralPattern>,
    by_id: HashMap<String, usize>,
    compat: CompatibilitySet,
    transitions: TransitionMatrix,
}

impl CatalogIndex {
    /// Build the index over pre-validated inputs.
    ///
    /// The core assumes the loader already ran [`validate_catalog`]; use
    /// [`CatalogIndex::validated`] to combine the two.
    pub fn new(patterns: Vec<BehavioralPattern>, rules: Vec<CompatibilityRule>) -> Self {
        let by_id = patterns
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        Self {
            patterns,
            by_id,
            compat: CompatibilitySet::new(rules),
            transitions: TransitionMatrix::default(),
        }
    }

    /// Build and validate in one step
    pub fn validated(
        patterns: Vec<BehavioralPattern>,
        rules: Vec<CompatibilityRule>,
    ) -> core::result::Result<Self, Vec<CatalogViolation>> {
        let index = Self::new(patterns, rules);
        let violations = validate_catalog(&index);
        if violations.is_empty() {
            Ok(index)
        } else {
            Err(violations)
        }
    }

    /// Number of patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when the catalog holds no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// O(1) lookup by id
    pub fn lookup(&self, id: &str) -> Option<&BehavioralPattern> {
        self.by_id.get(id).map(|&i| &self.patterns[i])
    }

    /// Load-order position of an id; doubles as the wire pattern id
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Pattern at a load-order position
    pub fn by_index(&self, index: usize) -> Option<&BehavioralPattern> {
        self.patterns.get(index)
    }

    /// All patterns in load order
    pub fn patterns(&self) -> impl Iterator<Item = &BehavioralPattern> {
        self.patterns.iter()
    }

    /// All patterns whose core matches every specified field of the
    /// partial key, in load order
    pub fn filter_by_core(&self, partial: &PartialCorePattern) -> Vec<&BehavioralPattern> {
        self.patterns
            .iter()
            .filter(|p| partial.matches(&p.core))
            .collect()
    }

    /// Whether `from_id` may transition to `to_id`.
    ///
    /// Requires all three of: the exit edge, the entry edge, and the mode
    /// transition. Missing patterns are never valid; a self-transition of
    /// a present pattern always is.
    pub fn is_transition_valid(&self, from_id: &str, to_id: &str) -> bool {
        let (Some(from), Some(to)) = (self.lookup(from_id), self.lookup(to_id)) else {
            return false;
        };
        if from_id == to_id {
            return true;
        }
        from.postconditions.valid_to.iter().any(|t| t == to_id)
            && to.preconditions.valid_from.iter().any(|f| f == from_id)
            && self.transitions.is_valid(from.core.sigma, to.core.sigma)
    }

    /// Whether two patterns may coexist at the given separation
    pub fn is_compatible(&self, id_a: &str, id_b: &str, separation_m: f32) -> bool {
        self.compat.decide(id_a, id_b, separation_m)
    }

    /// The compatibility rule set
    pub fn compatibility(&self) -> &CompatibilitySet {
        &self.compat
    }

    /// The mode transition matrix
    pub fn transition_matrix(&self) -> &TransitionMatrix {
        &self.transitions
    }
}
