//! Seed algebra rules with working transforms.
//!
//! These are trusted: the governor takes them as-is via
//! [`RuleGovernor::with_core_rules`](crate::governance::RuleGovernor::with_core_rules).

use std::sync::Arc;

use crate::context::{Context, ContextBundle, Reference};
use crate::error::RuleError;
use crate::expr::Expr;
use crate::rule::{condition, transform, Applicability, Rule, RulePredicate, RuleSource, RuleTransform};

fn binary<'a>(expr: &'a Expr, op: &str) -> Option<(&'a Expr, &'a Expr)> {
    match expr.args() {
        [a, b] if expr.op() == op => Some((a, b)),
        _ => None,
    }
}

fn fires(hit: bool) -> Result<Applicability, RuleError> {
    Ok(if hit {
        Applicability::Applicable
    } else {
        Applicability::NotApplicable
    })
}

fn shape(op: &str) -> RuleError {
    RuleError::UnsupportedShape {
        reason: format!("expected binary '{op}'"),
    }
}

/// `op(a, b)` with `b == unit` rewrites to `a`; with `reversed`, `op(unit, b)`
/// rewrites to `b`.
fn identity(op: &'static str, unit: f64, reversed: bool) -> (Arc<dyn RulePredicate>, Arc<dyn RuleTransform>) {
    let cond = condition(move |expr: &Expr, _: &ContextBundle, _: &[Reference]| {
        fires(binary(expr, op).is_some_and(|(a, b)| {
            if reversed {
                a.is_number(unit)
            } else {
                b.is_number(unit)
            }
        }))
    });
    let trans = transform(move |expr: &Expr| {
        let (a, b) = binary(expr, op).ok_or_else(|| shape(op))?;
        Ok(if reversed { b.clone() } else { a.clone() })
    });
    (cond, trans)
}

/// Swaps the operands of `op` when they are out of lexical order.
fn commutative(op: &'static str) -> (Arc<dyn RulePredicate>, Arc<dyn RuleTransform>) {
    let cond = condition(move |expr: &Expr, _: &ContextBundle, _: &[Reference]| {
        fires(binary(expr, op).is_some_and(|(a, b)| a.op() > b.op()))
    });
    let trans = transform(move |expr: &Expr| {
        let (a, b) = binary(expr, op).ok_or_else(|| shape(op))?;
        Ok(Expr::new(op, vec![b.clone(), a.clone()]))
    });
    (cond, trans)
}

fn zero_mul() -> (Arc<dyn RulePredicate>, Arc<dyn RuleTransform>) {
    let cond = condition(|expr: &Expr, _: &ContextBundle, _: &[Reference]| {
        fires(binary(expr, "*").is_some_and(|(a, b)| a.is_number(0.0) || b.is_number(0.0)))
    });
    let trans = transform(|_: &Expr| Ok(Expr::num(0.0)));
    (cond, trans)
}

/// The seven core rules in (math, algebra), highest priority first.
#[must_use]
pub fn core_rules() -> Vec<Rule> {
    let table = [
        ("identity_add", 10, identity("+", 0.0, false)),
        ("identity_add_rev", 10, identity("+", 0.0, true)),
        ("identity_mul", 9, identity("*", 1.0, false)),
        ("identity_mul_rev", 9, identity("*", 1.0, true)),
        ("zero_mul", 8, zero_mul()),
        ("commutative_add", 7, commutative("+")),
        ("commutative_mul", 7, commutative("*")),
    ];

    table
        .into_iter()
        .map(|(id, priority, (cond, trans))| {
            Rule::new(id, cond, trans, Context::algebra(), priority)
                .with_confidence(1.0)
                .with_source(RuleSource::Core)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(id: &str) -> Rule {
        core_rules().into_iter().find(|r| r.id == id).unwrap()
    }

    fn run(id: &str, expr: &Expr) -> Option<Expr> {
        let mut rule = find(id);
        let bundle = ContextBundle::isolated(expr.clone(), Context::algebra());
        (rule.is_applicable(expr, &bundle, &[]) == Applicability::Applicable).then(|| rule.apply(expr))
    }

    #[test]
    fn test_table_shape() {
        let rules = core_rules();
        let priorities: Vec<i32> = rules.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![10, 10, 9, 9, 8, 7, 7]);
        assert!(rules.iter().all(|r| r.source == RuleSource::Core));
        assert!(rules.iter().all(|r| (r.confidence() - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_identities() {
        let x = Expr::var("x");
        assert_eq!(run("identity_add", &Expr::add(x.clone(), Expr::num(0.0))), Some(x.clone()));
        assert_eq!(run("identity_add_rev", &Expr::add(Expr::num(0.0), x.clone())), Some(x.clone()));
        assert_eq!(run("identity_mul", &Expr::mul(x.clone(), Expr::num(1.0))), Some(x.clone()));
        assert_eq!(run("identity_mul_rev", &Expr::mul(Expr::num(1.0), x.clone())), Some(x.clone()));
        assert_eq!(run("identity_add", &Expr::add(Expr::num(0.0), x.clone())), None);
        assert_eq!(run("identity_mul", &Expr::add(x, Expr::num(1.0))), None);
    }

    #[test]
    fn test_zero_mul() {
        let zero = Expr::num(0.0);
        assert_eq!(run("zero_mul", &Expr::mul(Expr::var("y"), zero.clone())), Some(zero.clone()));
        assert_eq!(run("zero_mul", &Expr::mul(zero.clone(), Expr::var("y"))), Some(zero));
        assert_eq!(run("zero_mul", &Expr::mul(Expr::var("y"), Expr::num(2.0))), None);
    }

    #[test]
    fn test_commutative_sorts_operands() {
        let sorted = Expr::add(Expr::var("a"), Expr::var("b"));
        assert_eq!(run("commutative_add", &Expr::add(Expr::var("b"), Expr::var("a"))), Some(sorted.clone()));
        assert_eq!(run("commutative_add", &sorted), None);
        assert_eq!(
            run("commutative_mul", &Expr::mul(Expr::var("z"), Expr::var("c"))),
            Some(Expr::mul(Expr::var("c"), Expr::var("z")))
        );
    }

    #[test]
    fn test_transform_on_wrong_shape_is_a_no_op() {
        let mut rule = find("identity_add");
        let leaf = Expr::var("q");
        assert_eq!(rule.apply(&leaf), leaf);
        assert_eq!(rule.success_count(), 0);
        assert_eq!(rule.application_count(), 1);
    }
}
