//! Pluggable producers of candidate rules.
//!
//! Every proposer turns a labelled example set into zero or more candidate
//! rules. Candidates are not trusted: they go through the governor before
//! anything executes them.

use crate::context::Context;
use crate::entailment::InverseEntailmentEngine;
use crate::example::Example;
use crate::rule::Rule;

/// A strategy that proposes rules from examples.
pub trait RuleProposer: Send {
    /// Stable name used in learning reports.
    fn name(&self) -> &str;

    /// Proposes candidate rules. `context` is the domain to assign to them.
    fn propose(&mut self, positive: &[Example], negative: &[Example], context: &Context) -> Vec<Rule>;
}

impl RuleProposer for InverseEntailmentEngine {
    fn name(&self) -> &str {
        "inverse_entailment"
    }

    fn propose(&mut self, positive: &[Example], negative: &[Example], context: &Context) -> Vec<Rule> {
        self.learn_clause(positive, negative, &[])
            .map(|clause| self.clause_to_rule(&clause, context))
            .into_iter()
            .collect()
    }
}
