//! Pairwise pattern compatibility rules
//!
//! Rules are bidirectional and addressed by glob. When several rules match
//! a pair, the most specific one governs; with no matching rule the pair
//! is compatible (open world).

use super::glob::{glob_match, glob_specificity};
use serde::{Deserialize, Serialize};

/// One pairwise compatibility rule between pattern-id globs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityRule {
    /// Glob for one side of the pair
    pub pattern_a: String,
    /// Glob for the other side
    pub pattern_b: String,
    /// Whether the pair may fly together at all
    pub compatible: bool,
    /// Minimum separation when compatible (m)
    pub min_separation_m: f32,
    /// Why the rule exists
    #[serde(default)]
    pub reason: Option<String>,
}

impl CompatibilityRule {
    /// Shorthand for a compatible-with-separation rule
    pub fn separation(pattern_a: &str, pattern_b: &str, min_separation_m: f32) -> Self {
        Self {
            pattern_a: pattern_a.to_string(),
            pattern_b: pattern_b.to_string(),
            compatible: true,
            min_separation_m,
            reason: None,
        }
    }

    /// Shorthand for a forbidden pairing
    pub fn forbid(pattern_a: &str, pattern_b: &str, reason: &str) -> Self {
        Self {
            pattern_a: pattern_a.to_string(),
            pattern_b: pattern_b.to_string(),
            compatible: false,
            min_separation_m: 0.0,
            reason: Some(reason.to_string()),
        }
    }

    /// Specificity total for a matched rule: 2 per exact side, 1 per
    /// wildcarded side, 0 per bare `*`
    pub fn specificity(&self) -> u8 {
        glob_specificity(&self.pattern_a) + glob_specificity(&self.pattern_b)
    }

    /// True when the rule addresses the (a, b) pair in either orientation
    pub fn matches(&self, id_a: &str, id_b: &str) -> bool {
        (glob_match(&self.pattern_a, id_a) && glob_match(&self.pattern_b, id_b))
            || (glob_match(&self.pattern_a, id_b) && glob_match(&self.pattern_b, id_a))
    }
}

/// The full compatibility rule list, resolved by specificity
#[derive(Debug, Clone, Default)]
pub struct CompatibilitySet {
    rules: Vec<CompatibilityRule>,
}

impl CompatibilitySet {
    /// Build from a rule list; list order breaks specificity ties
    pub fn new(rules: Vec<CompatibilityRule>) -> Self {
        Self { rules }
    }

    /// All rules in list order
    pub fn rules(&self) -> &[CompatibilityRule] {
        &self.rules
    }

    /// The governing rule for a pair, if any: the matching rule with the
    /// highest specificity total, earliest in the list among equals
    pub fn winning_rule(&self, id_a: &str, id_b: &str) -> Option<&CompatibilityRule> {
        let mut winner: Option<&CompatibilityRule> = None;
        for rule in &self.rules {
            if !rule.matches(id_a, id_b) {
                continue;
            }
            match winner {
                Some(best) if best.specificity() >= rule.specificity() => {}
                _ => winner = Some(rule),
            }
        }
        winner
    }

    /// Decide whether two patterns may coexist at the given separation.
    ///
    /// No matching rule means compatible. An incompatible winner is final;
    /// a compatible winner additionally requires its minimum separation.
    pub fn decide(&self, id_a: &str, id_b: &str, separation_m: f32) -> bool {
        match self.winning_rule(id_a, id_b) {
            None => true,
            Some(rule) if !rule.compatible => false,
            Some(rule) => separation_m >= rule.min_separation_m,
        }
    }
}
