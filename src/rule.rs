//! Conditional rewrite rules with three-valued applicability.
//!
//! A rule pairs a condition (does it fire on this expression?) with a
//! transform (what does it rewrite to?). Both are opaque callables supplied
//! by whoever proposed the rule. [`Rule::is_applicable`] and [`Rule::apply`]
//! are the only places these callables are invoked, and neither lets a
//! failure escape: an erroring or panicking condition reads as
//! [`Applicability::Undefined`], an erroring or panicking transform leaves
//! the expression unchanged.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::{Context, ContextBundle, Reference};
use crate::error::{RuleError, ValidationError};
use crate::expr::Expr;

/// Tri-state outcome of a rule condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Applicability {
    /// The rule fires.
    Applicable,
    /// The rule does not fire.
    NotApplicable,
    /// The condition could not be evaluated.
    Undefined,
}

impl Applicability {
    /// Legacy integer encoding: 1, 0, -1.
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Applicable => 1,
            Self::NotApplicable => 0,
            Self::Undefined => -1,
        }
    }
}

/// Condition half of a rule.
pub trait RulePredicate: Send + Sync {
    /// Decides whether the rule fires on `expr`.
    fn evaluate(
        &self,
        expr: &Expr,
        bundle: &ContextBundle,
        refs: &[Reference],
    ) -> Result<Applicability, RuleError>;
}

impl<F> RulePredicate for F
where
    F: Fn(&Expr, &ContextBundle, &[Reference]) -> Result<Applicability, RuleError> + Send + Sync,
{
    fn evaluate(
        &self,
        expr: &Expr,
        bundle: &ContextBundle,
        refs: &[Reference],
    ) -> Result<Applicability, RuleError> {
        self(expr, bundle, refs)
    }
}

/// Transform half of a rule.
pub trait RuleTransform: Send + Sync {
    /// Rewrites `expr`.
    fn apply(&self, expr: &Expr) -> Result<Expr, RuleError>;
}

impl<F> RuleTransform for F
where
    F: Fn(&Expr) -> Result<Expr, RuleError> + Send + Sync,
{
    fn apply(&self, expr: &Expr) -> Result<Expr, RuleError> {
        self(expr)
    }
}

/// Transform that returns its input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTransform;

impl RuleTransform for IdentityTransform {
    fn apply(&self, expr: &Expr) -> Result<Expr, RuleError> {
        Ok(expr.clone())
    }
}

/// Wraps a closure as a shareable condition.
pub fn condition<F>(f: F) -> Arc<dyn RulePredicate>
where
    F: Fn(&Expr, &ContextBundle, &[Reference]) -> Result<Applicability, RuleError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Wraps a closure as a shareable transform.
pub fn transform<F>(f: F) -> Arc<dyn RuleTransform>
where
    F: Fn(&Expr) -> Result<Expr, RuleError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Where a rule came from.
///
/// The tag feeds the confidence scorer's source adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleSource {
    Core,
    Manual,
    Derived,
    Learned,
    Empirical,
    PatternRecognition,
    SymbolicRegression,
    SynthesizedPattern,
    SynthesizedInductive,
    SynthesizedAnalogy,
    SimpleExtraction,
    InverseEntailment,
    Hardcoded,
    /// Any tag not in the table above.
    Other(String),
}

impl RuleSource {
    /// Canonical snake_case tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Core => "core",
            Self::Manual => "manual",
            Self::Derived => "derived",
            Self::Learned => "learned",
            Self::Empirical => "empirical",
            Self::PatternRecognition => "pattern_recognition",
            Self::SymbolicRegression => "symbolic_regression",
            Self::SynthesizedPattern => "synthesized_pattern",
            Self::SynthesizedInductive => "synthesized_inductive",
            Self::SynthesizedAnalogy => "synthesized_analogy",
            Self::SimpleExtraction => "simple_extraction",
            Self::InverseEntailment => "inverse_entailment",
            Self::Hardcoded => "hardcoded",
            Self::Other(tag) => tag,
        }
    }
}

impl Default for RuleSource {
    fn default() -> Self {
        Self::Hardcoded
    }
}

impl From<&str> for RuleSource {
    fn from(tag: &str) -> Self {
        match tag {
            "core" => Self::Core,
            "manual" => Self::Manual,
            "derived" => Self::Derived,
            "learned" => Self::Learned,
            "empirical" => Self::Empirical,
            "pattern_recognition" => Self::PatternRecognition,
            "symbolic_regression" => Self::SymbolicRegression,
            "synthesized_pattern" => Self::SynthesizedPattern,
            "synthesized_inductive" => Self::SynthesizedInductive,
            "synthesized_analogy" => Self::SynthesizedAnalogy,
            "simple_extraction" => Self::SimpleExtraction,
            "inverse_entailment" => Self::InverseEntailment,
            "hardcoded" => Self::Hardcoded,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for RuleSource {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<RuleSource> for String {
    fn from(source: RuleSource) -> Self {
        source.as_str().to_string()
    }
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conditional rewrite rule.
///
/// `confidence` is kept in `[0.0, 1.0]` by every setter. Cloning a rule
/// shares its callables.
#[derive(Clone)]
pub struct Rule {
    /// Rule identifier. Also drives keyword-based classification.
    pub id: String,
    condition: Arc<dyn RulePredicate>,
    transform: Arc<dyn RuleTransform>,
    /// Context the rule applies in.
    pub domain: Context,
    /// Higher fires first.
    pub priority: i32,
    confidence: f64,
    /// Provenance tag.
    pub source: RuleSource,
    application_count: u64,
    success_count: u64,
}

impl Rule {
    /// Creates a rule with confidence 1.0 and source `hardcoded`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        condition: Arc<dyn RulePredicate>,
        transform: Arc<dyn RuleTransform>,
        domain: Context,
        priority: i32,
    ) -> Self {
        Self {
            id: id.into(),
            condition,
            transform,
            domain,
            priority,
            confidence: 1.0,
            source: RuleSource::Hardcoded,
            application_count: 0,
            success_count: 0,
        }
    }

    /// Checks the fields a governed rule must carry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyRuleId);
        }
        Ok(())
    }

    /// Sets the confidence, clamped to `[0.0, 1.0]`.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.set_confidence(confidence);
        self
    }

    /// Sets the source tag.
    #[must_use]
    pub fn with_source(mut self, source: RuleSource) -> Self {
        self.source = source;
        self
    }

    /// Current confidence.
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Sets the confidence, clamped to `[0.0, 1.0]`. NaN becomes 0.0.
    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
    }

    /// Number of times [`Rule::apply`] was called.
    #[must_use]
    pub const fn application_count(&self) -> u64 {
        self.application_count
    }

    /// Number of [`Rule::apply`] calls whose transform succeeded.
    #[must_use]
    pub const fn success_count(&self) -> u64 {
        self.success_count
    }

    /// Evaluates the condition. Failures and panics read as `Undefined`.
    #[must_use]
    pub fn is_applicable(
        &self,
        expr: &Expr,
        bundle: &ContextBundle,
        refs: &[Reference],
    ) -> Applicability {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.condition.evaluate(expr, bundle, refs)));
        match outcome {
            Ok(Ok(applicability)) => applicability,
            Ok(Err(err)) => {
                tracing::debug!(rule_id = %self.id, error = %err, "condition failed");
                Applicability::Undefined
            }
            Err(_) => {
                tracing::warn!(rule_id = %self.id, "condition panicked");
                Applicability::Undefined
            }
        }
    }

    /// Applies the transform. On failure the input is returned unchanged.
    pub fn apply(&mut self, expr: &Expr) -> Expr {
        self.application_count += 1;
        let outcome = catch_unwind(AssertUnwindSafe(|| self.transform.apply(expr)));
        match outcome {
            Ok(Ok(rewritten)) => {
                self.success_count += 1;
                rewritten
            }
            Ok(Err(err)) => {
                tracing::debug!(rule_id = %self.id, error = %err, "transform failed");
                expr.clone()
            }
            Err(_) => {
                tracing::warn!(rule_id = %self.id, "transform panicked");
                expr.clone()
            }
        }
    }

    /// Fresh copy with the same callables and zeroed counters.
    #[must_use]
    pub fn fresh_copy(&self) -> Self {
        Self {
            application_count: 0,
            success_count: 0,
            ..self.clone()
        }
    }

    /// Serializable view of this rule.
    #[must_use]
    pub fn summary(&self) -> RuleSummary {
        RuleSummary {
            id: self.id.clone(),
            domain: self.domain.clone(),
            priority: self.priority,
            confidence: self.confidence,
            source: self.source.clone(),
            application_count: self.application_count,
            success_count: self.success_count,
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("domain", &self.domain)
            .field("priority", &self.priority)
            .field("confidence", &self.confidence)
            .field("source", &self.source)
            .field("application_count", &self.application_count)
            .field("success_count", &self.success_count)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rule({}, pri={}, conf={:.2})",
            self.id, self.priority, self.confidence
        )
    }
}

/// Serializable snapshot of a rule without its callables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSummary {
    /// Rule id.
    pub id: String,
    /// Rule context.
    pub domain: Context,
    /// Priority.
    pub priority: i32,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Provenance tag.
    pub source: RuleSource,
    /// Calls to [`Rule::apply`].
    pub application_count: u64,
    /// Successful applications.
    pub success_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always(answer: Applicability) -> Arc<dyn RulePredicate> {
        condition(move |_, _, _| Ok(answer))
    }

    fn bundle() -> ContextBundle {
        ContextBundle::isolated(Expr::var("x"), Context::algebra())
    }

    #[test]
    fn test_confidence_clamped() {
        let rule = Rule::new(
            "r",
            always(Applicability::Applicable),
            Arc::new(IdentityTransform),
            Context::algebra(),
            5,
        );
        assert_eq!(rule.clone().with_confidence(1.7).confidence(), 1.0);
        assert_eq!(rule.clone().with_confidence(-0.2).confidence(), 0.0);
        assert_eq!(rule.with_confidence(f64::NAN).confidence(), 0.0);
    }

    #[test]
    fn test_validate_rejects_blank_id() {
        let named = Rule::new("r", always(Applicability::Applicable), Arc::new(IdentityTransform), Context::algebra(), 1);
        assert!(named.validate().is_ok());

        let blank = Rule::new("  ", always(Applicability::Applicable), Arc::new(IdentityTransform), Context::algebra(), 1);
        assert!(matches!(blank.validate(), Err(ValidationError::EmptyRuleId)));
    }

    #[test]
    fn test_is_applicable_passes_through() {
        let rule = Rule::new(
            "r",
            always(Applicability::NotApplicable),
            Arc::new(IdentityTransform),
            Context::algebra(),
            5,
        );
        assert_eq!(
            rule.is_applicable(&Expr::var("x"), &bundle(), &[]),
            Applicability::NotApplicable
        );
    }

    #[test]
    fn test_failing_condition_is_undefined() {
        let rule = Rule::new(
            "broken",
            condition(|_, _, _| Err(RuleError::failed("boom"))),
            Arc::new(IdentityTransform),
            Context::algebra(),
            5,
        );
        assert_eq!(
            rule.is_applicable(&Expr::var("x"), &bundle(), &[]),
            Applicability::Undefined
        );
    }

    #[test]
    fn test_panicking_condition_is_undefined() {
        let rule = Rule::new(
            "panics",
            condition(|expr, _, _| {
                if expr.is_leaf() {
                    panic!("leaf not supported");
                }
                Ok(Applicability::Applicable)
            }),
            Arc::new(IdentityTransform),
            Context::algebra(),
            5,
        );
        assert_eq!(
            rule.is_applicable(&Expr::var("x"), &bundle(), &[]),
            Applicability::Undefined
        );
    }

    #[test]
    fn test_apply_counts_and_recovers() {
        let mut good = Rule::new(
            "first_arg",
            always(Applicability::Applicable),
            transform(|expr| {
                expr.args()
                    .first()
                    .cloned()
                    .ok_or_else(|| RuleError::failed("no args"))
            }),
            Context::algebra(),
            5,
        );

        let sum = Expr::add(Expr::var("x"), Expr::num(0.0));
        assert_eq!(good.apply(&sum), Expr::var("x"));
        assert_eq!(good.apply(&Expr::var("y")), Expr::var("y"));
        assert_eq!(good.application_count(), 2);
        assert_eq!(good.success_count(), 1);
        assert_eq!(good.fresh_copy().application_count(), 0);
    }

    #[test]
    fn test_source_roundtrip_tags() {
        assert_eq!(RuleSource::from("inverse_entailment"), RuleSource::InverseEntailment);
        assert_eq!(RuleSource::from("mystery"), RuleSource::Other("mystery".to_string()));
        assert_eq!(RuleSource::PatternRecognition.to_string(), "pattern_recognition");
        let json = serde_json::to_string(&RuleSource::Core).unwrap();
        assert_eq!(json, "\"core\"");
    }

    #[test]
    fn test_summary_serializes() {
        let rule = Rule::new(
            "r",
            always(Applicability::Applicable),
            Arc::new(IdentityTransform),
            Context::algebra(),
            3,
        )
        .with_source(RuleSource::Manual)
        .with_confidence(0.4);
        let json = serde_json::to_value(rule.summary()).unwrap();
        assert_eq!(json["id"], "r");
        assert_eq!(json["source"], "manual");
        assert_eq!(json["priority"], 3);
    }

    #[test]
    fn test_legacy_encoding() {
        assert_eq!(Applicability::Applicable.as_i8(), 1);
        assert_eq!(Applicability::NotApplicable.as_i8(), 0);
        assert_eq!(Applicability::Undefined.as_i8(), -1);
    }
}
