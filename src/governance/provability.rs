//! Bounded provability heuristic.
//!
//! A candidate is `Provable` when a derivation table entry says its rule type
//! follows from types already present, `Unprovable` when it directly negates
//! an existing rule, and `Heuristic` otherwise. This is a lookup, not a
//! theorem prover.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::governance::classify::{classify, RuleType};
use crate::governance::contradiction::ContradictionDetector;
use crate::rule::Rule;

/// Provability verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provability {
    /// Follows from rule types already present.
    Provable,
    /// Neither derivable nor contradicted.
    Heuristic,
    /// Directly negates an existing rule.
    Unprovable,
}

impl Provability {
    /// Lowercase tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provable => "provable",
            Self::Heuristic => "heuristic",
            Self::Unprovable => "unprovable",
        }
    }
}

impl fmt::Display for Provability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule types derive which. A type is derivable when every
/// prerequisite type is present in the existing rule set.
const DERIVATIONS: &[(RuleType, &[RuleType])] = &[(
    RuleType::Distributive,
    &[RuleType::Commutative, RuleType::Associative],
)];

/// Classifies candidates against an existing rule set.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProvabilityEngine {
    detector: ContradictionDetector,
}

impl ProvabilityEngine {
    /// Creates an engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            detector: ContradictionDetector::new(),
        }
    }

    /// Analyzes `candidate` relative to `existing`.
    #[must_use]
    pub fn analyze<'a, I>(&self, candidate: &Rule, existing: I) -> Provability
    where
        I: IntoIterator<Item = &'a Rule> + Clone,
    {
        if is_derivable(candidate, existing.clone()) {
            return Provability::Provable;
        }
        let negated = existing
            .into_iter()
            .any(|rule| self.detector.detect(candidate, rule).is_direct_negation());
        if negated {
            Provability::Unprovable
        } else {
            Provability::Heuristic
        }
    }
}

fn is_derivable<'a>(candidate: &Rule, existing: impl IntoIterator<Item = &'a Rule>) -> bool {
    let candidate_type = classify(&candidate.id);
    let Some((_, prerequisites)) = DERIVATIONS.iter().find(|(ty, _)| *ty == candidate_type) else {
        return false;
    };
    let present: BTreeSet<RuleType> = existing.into_iter().map(|r| classify(&r.id)).collect();
    prerequisites.iter().all(|ty| present.contains(ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::rule::{condition, Applicability, IdentityTransform};
    use std::sync::Arc;

    fn rule(id: &str) -> Rule {
        Rule::new(
            id,
            condition(|_, _, _| Ok(Applicability::Applicable)),
            Arc::new(IdentityTransform),
            Context::algebra(),
            5,
        )
    }

    #[test]
    fn test_distributive_provable_from_commutative_and_associative() {
        let engine = ProvabilityEngine::new();
        let existing = vec![rule("commutative_x"), rule("associative_y")];
        assert_eq!(
            engine.analyze(&rule("distributive_z"), &existing),
            Provability::Provable
        );
    }

    #[test]
    fn test_missing_prerequisite_is_heuristic() {
        let engine = ProvabilityEngine::new();
        let existing = vec![rule("commutative_x")];
        assert_eq!(
            engine.analyze(&rule("distributive_z"), &existing),
            Provability::Heuristic
        );
        assert_eq!(engine.analyze(&rule("anything"), std::iter::empty()), Provability::Heuristic);
    }

    #[test]
    fn test_direct_negation_is_unprovable() {
        let engine = ProvabilityEngine::new();
        let existing = vec![rule("expand_terms")];
        assert_eq!(
            engine.analyze(&rule("factor_terms"), &existing),
            Provability::Unprovable
        );
    }
}
