//! Pairwise heuristic conflict detection.
//!
//! Checks run in a fixed priority order and the first hit wins:
//!
//! 1. inverse-operation ids in overlapping domains (`DirectNegation`)
//! 2. near-identical domains at equal priority (`ContextOverlap`)
//! 3. a `specific` id paired with a `general` id (`SpecialGeneral`)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rule::Rule;

/// Operation pairs whose rules undo each other.
pub const INVERSE_PAIRS: [(&str, &str); 5] = [
    ("expand", "factor"),
    ("simplify", "complicate"),
    ("differentiate", "integrate"),
    ("add", "subtract"),
    ("multiply", "divide"),
];

/// Minimum domain similarity for inverse rules to conflict.
pub const NEGATION_SIMILARITY: f64 = 0.5;

/// Minimum domain similarity for equal-priority rules to overlap.
pub const OVERLAP_SIMILARITY: f64 = 0.7;

/// Kind of conflict between two rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Inverse operations in overlapping domains.
    DirectNegation,
    /// Equal priority in near-identical domains.
    ContextOverlap,
    /// A specific rule paired with a general one.
    SpecialGeneral,
    /// No conflict.
    None,
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DirectNegation => "direct_negation",
            Self::ContextOverlap => "context_overlap",
            Self::SpecialGeneral => "special_general",
            Self::None => "none",
        };
        f.write_str(s)
    }
}

/// Outcome of comparing two rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResult {
    /// True when any conflict was found.
    pub exists: bool,
    /// Kind of conflict, `None` when absent.
    pub conflict_type: ConflictType,
    /// Human-readable explanation, empty when no conflict.
    pub description: String,
    /// Domain similarity, set for `ContextOverlap`.
    pub overlap_score: f64,
}

impl ConflictResult {
    /// No conflict.
    #[must_use]
    pub fn none() -> Self {
        Self {
            exists: false,
            conflict_type: ConflictType::None,
            description: String::new(),
            overlap_score: 0.0,
        }
    }

    fn found(conflict_type: ConflictType, description: String) -> Self {
        Self {
            exists: true,
            conflict_type,
            description,
            overlap_score: 0.0,
        }
    }

    /// Returns true for a `DirectNegation` conflict.
    #[must_use]
    pub fn is_direct_negation(&self) -> bool {
        self.conflict_type == ConflictType::DirectNegation
    }
}

/// Stateless keyword and context based detector.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContradictionDetector;

impl ContradictionDetector {
    /// Creates a detector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Compares `a` (usually the candidate) with `b`.
    #[must_use]
    pub fn detect(&self, a: &Rule, b: &Rule) -> ConflictResult {
        let similarity = a.domain.similarity(&b.domain);

        if are_inverse_operations(&a.id, &b.id) && similarity > NEGATION_SIMILARITY {
            return ConflictResult::found(
                ConflictType::DirectNegation,
                format!("rules {} and {} are inverse operations", a.id, b.id),
            );
        }

        if similarity > OVERLAP_SIMILARITY && a.priority == b.priority && a.id != b.id {
            return ConflictResult {
                overlap_score: similarity,
                ..ConflictResult::found(
                    ConflictType::ContextOverlap,
                    format!(
                        "rules {} and {} share priority {} in overlapping contexts",
                        a.id, b.id, a.priority
                    ),
                )
            };
        }

        if is_special_case(&a.id, &b.id) {
            return ConflictResult::found(
                ConflictType::SpecialGeneral,
                format!("{} and {} form a specific/general pair", a.id, b.id),
            );
        }

        ConflictResult::none()
    }
}

fn are_inverse_operations(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    INVERSE_PAIRS.iter().any(|(x, y)| {
        (a.contains(x) && b.contains(y)) || (a.contains(y) && b.contains(x))
    })
}

fn is_special_case(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    (a.contains("specific") && b.contains("general")) || (a.contains("general") && b.contains("specific"))
}
