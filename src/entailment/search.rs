//! Beam search over the refinement lattice.
//!
//! The search starts at the bottom clause and generalizes by dropping one
//! body literal per step, so body length strictly decreases and the search
//! bottoms out at the empty-body clause. Clauses are ranked by compression:
//!
//! ```text
//! score = positives_covered - negatives_covered - body_length - 1
//! ```
//!
//! Coverage is a coarse proxy: a clause covers an example when its head
//! predicate equals the predicate of the example's head literal.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entailment::bottom::example_to_literal;
use crate::entailment::clause::Clause;
use crate::example::Example;

/// Bounds for bottom clause construction and hypothesis search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum body length of any clause.
    pub max_clause_length: usize,
    /// Maximum number of clause evaluations per search.
    pub max_search_nodes: usize,
    /// Clauses kept per beam level.
    pub beam_width: usize,
    /// Give up once more than this many nodes are explored without a
    /// positive score.
    pub early_exit_after: usize,
    /// Background saturation rounds during bottom clause construction.
    pub saturation_rounds: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_clause_length: 4,
            max_search_nodes: 1000,
            beam_width: 10,
            early_exit_after: 100,
            saturation_rounds: 3,
        }
    }
}

/// Result of one search run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Best clause, present only when its score is strictly positive.
    pub hypothesis: Option<Clause>,
    /// Best score seen, `None` if nothing was evaluated.
    pub best_score: Option<i64>,
    /// Number of clause evaluations performed.
    pub nodes_explored: usize,
    /// True if the no-signal early exit fired.
    pub exited_early: bool,
}

/// Compression-guided beam search.
#[derive(Debug, Clone, Default)]
pub struct HypothesisSearch {
    config: SearchConfig,
}

impl HypothesisSearch {
    /// Creates a search with the given bounds.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Scores a single clause.
    #[must_use]
    pub fn score(clause: &Clause, positive: &[Example], negative: &[Example]) -> i64 {
        let p = count_covered(clause, positive);
        let n = count_covered(clause, negative);
        p - n - clause.length() as i64 - 1
    }

    /// All clauses obtained by removing exactly one body literal.
    #[must_use]
    pub fn refine(clause: &Clause) -> Vec<Clause> {
        (0..clause.body.len())
            .map(|skip| {
                let body = clause
                    .body
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != skip)
                    .map(|(_, lit)| lit.clone())
                    .collect();
                Clause::new(clause.head.clone(), body)
            })
            .collect()
    }

    /// Runs the search from `bottom`.
    ///
    /// Background clauses are accepted for interface symmetry; coverage does
    /// not consult them.
    #[must_use]
    pub fn run(
        &self,
        bottom: &Clause,
        positive: &[Example],
        negative: &[Example],
        _background: &[Clause],
    ) -> SearchOutcome {
        let cfg = &self.config;
        let pos_heads = head_predicates(positive);
        let neg_heads = head_predicates(negative);

        let mut beam = vec![bottom.clone()];
        let mut best: Option<(i64, Clause)> = None;
        let mut explored = 0usize;
        let mut exited_early = false;

        while !beam.is_empty() && explored < cfg.max_search_nodes {
            let mut scored: Vec<(i64, Clause)> = Vec::with_capacity(beam.len());
            for clause in beam {
                if explored >= cfg.max_search_nodes {
                    break;
                }
                let score = score_with(&clause, &pos_heads, &neg_heads);
                explored += 1;
                if best.as_ref().map_or(true, |(b, _)| score > *b) {
                    best = Some((score, clause.clone()));
                }
                scored.push((score, clause));
            }

            // Stable: equal scores keep evaluation order.
            scored.sort_by(|a, b| b.0.cmp(&a.0));

            let mut seen = HashSet::new();
            let mut next = Vec::new();
            for (_, clause) in scored.iter().take(cfg.beam_width) {
                for refinement in Self::refine(clause) {
                    if refinement.length() <= cfg.max_clause_length && seen.insert(refinement.clone()) {
                        next.push(refinement);
                    }
                }
            }
            beam = next;

            let best_score = best.as_ref().map(|(s, _)| *s);
            if explored > cfg.early_exit_after && best_score.map_or(true, |s| s <= 0) {
                exited_early = true;
                break;
            }
        }

        let best_score = best.as_ref().map(|(s, _)| *s);
        tracing::debug!(
            nodes_explored = explored,
            best_score = ?best_score,
            exited_early,
            "hypothesis search finished"
        );

        SearchOutcome {
            hypothesis: best.and_then(|(score, clause)| (score > 0).then_some(clause)),
            best_score,
            nodes_explored: explored,
            exited_early,
        }
    }
}

fn head_predicates(examples: &[Example]) -> Vec<Option<String>> {
    examples
        .iter()
        .map(|ex| example_to_literal(ex, true).map(|lit| lit.predicate))
        .collect()
}

fn covered(clause: &Clause, heads: &[Option<String>]) -> i64 {
    heads
        .iter()
        .filter(|head| head.as_deref() == Some(clause.head.predicate.as_str()))
        .count() as i64
}

fn score_with(clause: &Clause, pos: &[Option<String>], neg: &[Option<String>]) -> i64 {
    covered(clause, pos) - covered(clause, neg) - clause.length() as i64 - 1
}

fn count_covered(clause: &Clause, examples: &[Example]) -> i64 {
    covered(clause, &head_predicates(examples))
}
