//! Inverse entailment.
//!
//! Progol-style learning: pick a seed positive example, build its bottom
//! clause, then search the refinement lattice above it for the clause with
//! the best compression. A winning clause is turned into a [`Rule`] whose
//! condition matches the clause head predicate against an expression's
//! top-level operator.
//!
//! Learned rules gate whether they fire; their transform is the identity.

pub mod bottom;
pub mod clause;
pub mod search;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::context::{Context, ContextBundle, Reference};
use crate::error::RuleError;
use crate::example::Example;
use crate::expr::Expr;
use crate::rule::{Applicability, IdentityTransform, Rule, RulePredicate, RuleSource};

pub use bottom::{example_to_literal, expression_to_literals, BottomClauseBuilder};
pub use clause::{is_variable, ArgMode, Clause, Literal, ModeDeclaration};
pub use search::{HypothesisSearch, SearchConfig, SearchOutcome};

/// Priority given to rules built from learned clauses.
pub const LEARNED_RULE_PRIORITY: i32 = 9;

/// Initial confidence of rules built from learned clauses.
pub const LEARNED_RULE_CONFIDENCE: f64 = 0.9;

/// Learning counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntailmentStats {
    /// Search nodes scored across all runs.
    pub clauses_evaluated: u64,
    /// Bottom clauses built.
    pub bottom_clauses_constructed: u64,
    /// Mode declarations currently registered.
    pub mode_declarations: usize,
}

/// Condition that fires when the expression's operator equals a predicate.
#[derive(Debug, Clone)]
pub struct HeadPredicateCondition {
    predicate: String,
}

impl HeadPredicateCondition {
    /// Creates the condition for `predicate`.
    #[must_use]
    pub fn new(predicate: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
        }
    }
}

impl RulePredicate for HeadPredicateCondition {
    fn evaluate(
        &self,
        expr: &Expr,
        _bundle: &ContextBundle,
        _refs: &[Reference],
    ) -> Result<Applicability, RuleError> {
        if expr.op() == self.predicate {
            Ok(Applicability::Applicable)
        } else {
            Ok(Applicability::NotApplicable)
        }
    }
}

/// Orchestrates bottom clause construction and hypothesis search.
#[derive(Debug, Clone, Default)]
pub struct InverseEntailmentEngine {
    builder: BottomClauseBuilder,
    search: HypothesisSearch,
    mode_declarations: BTreeMap<String, ModeDeclaration>,
    clauses_evaluated: u64,
    bottom_clauses_constructed: u64,
    rules_emitted: u64,
}

impl InverseEntailmentEngine {
    /// Creates an engine with the given bounds.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self {
            builder: BottomClauseBuilder::new(&config),
            search: HypothesisSearch::new(config),
            ..Self::default()
        }
    }

    /// Active search bounds.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        self.search.config()
    }

    /// Records a mode declaration, replacing any previous one for the
    /// same predicate.
    pub fn add_mode_declaration(&mut self, declaration: ModeDeclaration) {
        self.mode_declarations
            .insert(declaration.predicate.clone(), declaration);
    }

    /// Recorded mode declarations, keyed by predicate.
    #[must_use]
    pub fn mode_declarations(&self) -> &BTreeMap<String, ModeDeclaration> {
        &self.mode_declarations
    }

    /// Learns one clause from the examples.
    ///
    /// The first positive example is the seed. Returns `None` when there are
    /// no positives, when the seed has no head literal, or when no clause
    /// scores above zero.
    pub fn learn_clause(
        &mut self,
        positive: &[Example],
        negative: &[Example],
        background: &[Clause],
    ) -> Option<Clause> {
        let seed = positive.first()?;
        tracing::debug!(
            positives = positive.len(),
            negatives = negative.len(),
            seed = %seed.describe(),
            "inverse entailment started"
        );

        let bottom = self.builder.build(seed, background);
        self.bottom_clauses_constructed += 1;
        let bottom = bottom?;

        let outcome = self.search.run(&bottom, positive, negative, background);
        self.clauses_evaluated += outcome.nodes_explored as u64;

        match &outcome.hypothesis {
            Some(clause) => tracing::info!(
                hypothesis = %clause,
                score = ?outcome.best_score,
                nodes = outcome.nodes_explored,
                "hypothesis found"
            ),
            None => tracing::debug!(
                best_score = ?outcome.best_score,
                nodes = outcome.nodes_explored,
                "no hypothesis with positive score"
            ),
        }
        outcome.hypothesis
    }

    /// Builds a rule from a learned clause.
    ///
    /// The rule fires on expressions whose top-level operator equals the
    /// clause head predicate and rewrites them to themselves.
    pub fn clause_to_rule(&mut self, clause: &Clause, context: &Context) -> Rule {
        let stamp = (Utc::now().timestamp_millis().unsigned_abs() + self.rules_emitted) % 10_000;
        self.rules_emitted += 1;
        let id = format!("ile_{}_{stamp}", clause.head.predicate);

        Rule::new(
            id,
            Arc::new(HeadPredicateCondition::new(clause.head.predicate.clone())),
            Arc::new(IdentityTransform),
            context.clone(),
            LEARNED_RULE_PRIORITY,
        )
        .with_confidence(LEARNED_RULE_CONFIDENCE)
        .with_source(RuleSource::InverseEntailment)
    }

    /// Learning counters.
    #[must_use]
    pub fn statistics(&self) -> EntailmentStats {
        EntailmentStats {
            clauses_evaluated: self.clauses_evaluated,
            bottom_clauses_constructed: self.bottom_clauses_constructed,
            mode_declarations: self.mode_declarations.len(),
        }
    }
}
