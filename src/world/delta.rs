//! Structural delta classification
//!
//! A pattern update either changes one of the six structural dimensions
//! (a structural delta, which triggers blast-radius propagation) or only
//! touches ε/δ/Σ (which never does).

use crate::dimensions::CorePattern;
use core::fmt;
use heapless::Vec;

/// One of the six structural dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralDimension {
    /// σ — behavioral mode
    Sigma,
    /// κ — autonomy level
    Kappa,
    /// χ — formation role
    Chi,
    /// λ — resource ownership
    Lambda,
    /// τ — physical traits
    Tau,
    /// ρ — hardware target
    Rho,
}

impl StructuralDimension {
    /// Canonical lowercase name
    pub const fn as_str(&self) -> &'static str {
        match self {
            StructuralDimension::Sigma => "sigma",
            StructuralDimension::Kappa => "kappa",
            StructuralDimension::Chi => "chi",
            StructuralDimension::Lambda => "lambda",
            StructuralDimension::Tau => "tau",
            StructuralDimension::Rho => "rho",
        }
    }
}

impl fmt::Display for StructuralDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing two core patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaResult {
    /// Dimensions whose value changed
    pub changed: Vec<StructuralDimension, 6>,
}

impl DeltaResult {
    /// Compare two core patterns dimension by dimension
    pub fn classify(old: &CorePattern, new: &CorePattern) -> Self {
        let mut changed = Vec::new();
        if old.sigma != new.sigma {
            changed.push(StructuralDimension::Sigma).ok();
        }
        if old.kappa != new.kappa {
            changed.push(StructuralDimension::Kappa).ok();
        }
        if old.chi != new.chi {
            changed.push(StructuralDimension::Chi).ok();
        }
        if old.lambda != new.lambda {
            changed.push(StructuralDimension::Lambda).ok();
        }
        if old.tau != new.tau {
            changed.push(StructuralDimension::Tau).ok();
        }
        if old.rho != new.rho {
            changed.push(StructuralDimension::Rho).ok();
        }
        Self { changed }
    }

    /// Any structural dimension changed
    pub fn is_structural(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Whether a specific dimension changed
    pub fn contains(&self, dim: StructuralDimension) -> bool {
        self.changed.contains(&dim)
    }
}
