//! Bottom clause construction.
//!
//! The bottom clause of a seed example is the most specific clause that
//! entails it: the example's output becomes the head, its input expression
//! is flattened into body literals, and constants are lifted to variables.

use std::collections::HashMap;

use crate::entailment::clause::{is_variable, Clause, Literal};
use crate::entailment::search::SearchConfig;
use crate::example::Example;
use crate::expr::Expr;

/// Converts an example to a literal.
///
/// Ground-fact examples map directly. Otherwise the top-level operator of
/// the chosen expression is the predicate and its immediate arguments' names
/// are the terms. With `as_head` the output is preferred, falling back to
/// the input. Returns `None` when the example has no usable expression.
#[must_use]
pub fn example_to_literal(example: &Example, as_head: bool) -> Option<Literal> {
    if let Some(predicate) = &example.predicate {
        return Some(Literal {
            predicate: predicate.clone(),
            terms: example.terms.clone(),
            negated: example.negated,
        });
    }

    let expr = match (&example.output, &example.input) {
        (Some(output), _) if as_head => output,
        (_, Some(input)) => input,
        _ => return None,
    };

    Some(Literal::new(
        expr.op(),
        expr.args().iter().map(|arg| arg.op().to_string()).collect(),
    ))
}

/// Flattens an expression tree into one literal per internal node.
///
/// Each argument position gets a fresh identity token (`term_<n>`) standing
/// in for the sub-expression, so structurally equal sub-trees at different
/// positions stay distinct.
#[must_use]
pub fn expression_to_literals(expr: &Expr) -> Vec<Literal> {
    let mut next_token = 0usize;
    let mut out = Vec::new();
    flatten(expr, &mut next_token, &mut out);
    out
}

fn flatten(expr: &Expr, next_token: &mut usize, out: &mut Vec<Literal>) {
    if expr.is_leaf() {
        return;
    }
    let terms = expr
        .args()
        .iter()
        .map(|_| {
            *next_token += 1;
            format!("term_{next_token}")
        })
        .collect();
    push_unique(out, Literal::new(expr.op(), terms));
    for arg in expr.args() {
        flatten(arg, next_token, out);
    }
}

fn push_unique(body: &mut Vec<Literal>, lit: Literal) -> bool {
    if body.contains(&lit) {
        return false;
    }
    body.push(lit);
    true
}

/// Builds bottom clauses under the configured length bound.
#[derive(Debug, Clone)]
pub struct BottomClauseBuilder {
    max_clause_length: usize,
    saturation_rounds: usize,
}

impl BottomClauseBuilder {
    /// Creates a builder from the search configuration.
    #[must_use]
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            max_clause_length: config.max_clause_length,
            saturation_rounds: config.saturation_rounds,
        }
    }

    /// Builds the bottom clause for `seed`, or `None` if it has no head.
    #[must_use]
    pub fn build(&self, seed: &Example, background: &[Clause]) -> Option<Clause> {
        let Some(head) = example_to_literal(seed, true) else {
            tracing::debug!(seed = %seed.describe(), "example has no head literal");
            return None;
        };

        let mut body = Vec::new();
        for fact in &seed.facts {
            if let Some(lit) = example_to_literal(fact, false) {
                push_unique(&mut body, lit);
            }
        }
        if let Some(input) = &seed.input {
            for lit in expression_to_literals(input) {
                push_unique(&mut body, lit);
            }
        }

        self.saturate(&mut body, background);

        let (head, mut body) = variabilize(&head, &body);
        if body.len() > self.max_clause_length {
            body = most_connected(&head, body, self.max_clause_length);
        }

        let bottom = Clause::new(head, body);
        tracing::debug!(bottom = %bottom, length = bottom.length(), "constructed bottom clause");
        Some(bottom)
    }

    fn saturate(&self, body: &mut Vec<Literal>, background: &[Clause]) {
        let mut frontier = body.len();
        let mut rounds = 0;
        while frontier > 0 && rounds < self.saturation_rounds {
            let mut derived = Vec::new();
            for clause in background {
                derived.extend(self.derive_from(clause, body));
            }
            frontier = derived
                .into_iter()
                .filter(|lit| push_unique(body, lit.clone()))
                .count();
            rounds += 1;
        }
    }

    /// Forward-chaining step for one background clause.
    ///
    /// Background knowledge does not contribute derived facts yet, so the
    /// bottom clause body is exactly the seed's own literals.
    fn derive_from(&self, _clause: &Clause, _facts: &[Literal]) -> Vec<Literal> {
        Vec::new()
    }
}

impl Default for BottomClauseBuilder {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}

/// Replaces every constant with a variable, consistently across head and body.
fn variabilize(head: &Literal, body: &[Literal]) -> (Literal, Vec<Literal>) {
    let mut mapping: HashMap<String, String> = HashMap::new();
    let mut lift = |term: &String| -> String {
        if is_variable(term) {
            return term.clone();
        }
        let next = mapping.len();
        mapping
            .entry(term.clone())
            .or_insert_with(|| format!("X{next}"))
            .clone()
    };

    let mut lift_literal = |lit: &Literal| Literal {
        predicate: lit.predicate.clone(),
        terms: lit.terms.iter().map(&mut lift).collect(),
        negated: lit.negated,
    };

    let head = lift_literal(head);
    let body = body.iter().map(&mut lift_literal).collect();
    (head, body)
}

/// Keeps the `limit` body literals sharing the most variables with the head.
fn most_connected(head: &Literal, body: Vec<Literal>, limit: usize) -> Vec<Literal> {
    let head_vars = head.variables();
    let mut scored: Vec<(usize, Literal)> = body
        .into_iter()
        .map(|lit| {
            let shared = lit.variables().intersection(&head_vars).count();
            (shared, lit)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, lit)| lit).collect()
}
