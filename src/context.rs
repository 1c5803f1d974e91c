//! Domain contexts and rule-evaluation bundles.
//!
//! A context is a `(domain, subdomain)` tag plus free-form features. Its
//! similarity measure governs rule applicability and conflict detection.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expr::Expr;

/// Computational context descriptor.
///
/// Equality considers only `domain` and `subdomain`; features are
/// descriptive metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Top-level domain, e.g. `"math"`.
    pub domain: String,

    /// Optional subdomain, e.g. `"algebra"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,

    /// Arbitrary descriptive features.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, serde_json::Value>,
}

impl Context {
    /// Creates a context with a subdomain.
    #[must_use]
    pub fn new(domain: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            subdomain: Some(subdomain.into()),
            features: BTreeMap::new(),
        }
    }

    /// Creates a context with no subdomain.
    #[must_use]
    pub fn domain_only(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            subdomain: None,
            features: BTreeMap::new(),
        }
    }

    /// The default algebra context.
    #[must_use]
    pub fn algebra() -> Self {
        Self::new("math", "algebra")
    }

    /// Adds a feature.
    #[must_use]
    pub fn with_feature(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.features.insert(key.into(), value);
        self
    }

    /// Similarity in `{0.0, 0.5, 0.7, 1.0}`.
    ///
    /// - different domains: 0.0
    /// - same domain, same subdomain (including both absent): 1.0
    /// - same domain, both subdomains present but different: 0.5
    /// - same domain, only one side has a subdomain: 0.7
    #[must_use]
    pub fn similarity(&self, other: &Context) -> f64 {
        if self.domain != other.domain {
            return 0.0;
        }
        match (&self.subdomain, &other.subdomain) {
            (a, b) if a == b => 1.0,
            (Some(_), Some(_)) => 0.5,
            _ => 0.7,
        }
    }

    /// Narrows this context to a restricted sub-context tagged with `tag`.
    ///
    /// The domain is kept, the subdomain becomes `restricted_<tag>`, and the
    /// `restricted` feature is set.
    #[must_use]
    pub fn restricted(&self, tag: &str) -> Self {
        let mut features = self.features.clone();
        features.insert("restricted".to_string(), serde_json::Value::Bool(true));
        Self {
            domain: self.domain.clone(),
            subdomain: Some(format!("restricted_{tag}")),
            features,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::algebra()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain && self.subdomain == other.subdomain
    }
}

impl Eq for Context {}

impl std::hash::Hash for Context {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.domain.hash(state);
        self.subdomain.hash(state);
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subdomain {
            Some(sub) => write!(f, "{}/{sub}", self.domain),
            None => write!(f, "{}", self.domain),
        }
    }
}

/// Read-only reference to a parallel node's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    /// The parallel output expression.
    pub output: Expr,
    /// Context the parallel node inferred.
    pub context: Context,
    /// Operation the parallel node performed.
    pub operation_type: String,
    /// Bias the parallel node operated under.
    pub bias_signature: String,
}

/// Everything a rule condition may consult besides the expression itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBundle {
    /// Outputs of sibling columns in the same layer.
    pub parallel_outputs: Vec<Expr>,
    /// Contexts of those siblings.
    pub parallel_contexts: Vec<Context>,
    /// Operations the siblings applied.
    pub parallel_operations: Vec<String>,
    /// Input before any rewriting.
    pub original_input: Expr,
    /// Intermediate results, oldest first.
    pub transformation_history: Vec<Expr>,
    /// Context of the evaluating node.
    pub current_context: Context,
    /// Layer of the evaluating node.
    pub layer_position: usize,
    /// Column of the evaluating node.
    pub column_position: usize,
}

impl ContextBundle {
    /// A bundle with no parallel activity, for evaluating a rule in isolation.
    #[must_use]
    pub fn isolated(input: Expr, context: Context) -> Self {
        Self {
            parallel_outputs: Vec::new(),
            parallel_contexts: Vec::new(),
            parallel_operations: Vec::new(),
            original_input: input,
            transformation_history: Vec::new(),
            current_context: context,
            layer_position: 0,
            column_position: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_table() {
        let algebra = Context::new("math", "algebra");
        let calculus = Context::new("math", "calculus");
        let math = Context::domain_only("math");
        let physics = Context::new("physics", "algebra");

        assert_eq!(algebra.similarity(&algebra.clone()), 1.0);
        assert_eq!(algebra.similarity(&calculus), 0.5);
        assert_eq!(algebra.similarity(&math), 0.7);
        assert_eq!(math.similarity(&algebra), 0.7);
        assert_eq!(math.similarity(&Context::domain_only("math")), 1.0);
        assert_eq!(algebra.similarity(&physics), 0.0);
    }

    #[test]
    fn test_equality_ignores_features() {
        let a = Context::algebra().with_feature("k", serde_json::json!(1));
        let b = Context::algebra();
        assert_eq!(a, b);
    }

    #[test]
    fn test_restricted() {
        let ctx = Context::algebra().with_feature("k", serde_json::json!("v"));
        let narrowed = ctx.restricted("rule_x");
        assert_eq!(narrowed.domain, "math");
        assert_eq!(narrowed.subdomain.as_deref(), Some("restricted_rule_x"));
        assert_eq!(narrowed.features.get("restricted"), Some(&serde_json::json!(true)));
        assert_eq!(narrowed.features.get("k"), Some(&serde_json::json!("v")));
        assert_eq!(narrowed.similarity(&ctx), 0.5);
    }

    #[test]
    fn test_display() {
        assert_eq!(Context::algebra().to_string(), "math/algebra");
        assert_eq!(Context::domain_only("logic").to_string(), "logic");
    }
}
