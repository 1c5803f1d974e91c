//! Training example records.
//!
//! An example is either an input/output expression pair or a ground-fact
//! shorthand (`predicate` + `terms`). Both shapes share one record so that
//! examples can be loaded from JSON without a tag.

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::expr::Expr;

/// Whether an example should or should not be covered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// The rewrite should hold.
    #[default]
    Positive,
    /// The rewrite must not be learned.
    Negative,
}

/// One training example.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Expression before the rewrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Expr>,

    /// Expected expression after the rewrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Expr>,

    /// Context for rules learned from this example.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,

    /// Absent means positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,

    /// Ground-fact shorthand: predicate name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,

    /// Ground-fact shorthand: terms.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<String>,

    /// Ground-fact shorthand: negation flag.
    #[serde(default)]
    pub negated: bool,

    /// Additional ground facts contributed to the bottom clause body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Example>,

    /// Free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Deliver rules learned from this example to this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node_id: Option<String>,

    /// Deliver rules learned from this example to this layer (1-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_layer: Option<usize>,
}

impl Example {
    /// Creates an input/output example.
    #[must_use]
    pub fn pair(input: Expr, output: Expr) -> Self {
        Self {
            input: Some(input),
            output: Some(output),
            ..Self::default()
        }
    }

    /// Creates a ground-fact example.
    #[must_use]
    pub fn fact(predicate: impl Into<String>, terms: Vec<String>) -> Self {
        Self {
            predicate: Some(predicate.into()),
            terms,
            ..Self::default()
        }
    }

    /// Sets the context.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    /// Marks the example as negative.
    #[must_use]
    pub fn negative(self) -> Self {
        self.with_label(Label::Negative)
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a ground fact.
    #[must_use]
    pub fn with_fact(mut self, fact: Example) -> Self {
        self.facts.push(fact);
        self
    }

    /// Routes learned rules to one node.
    #[must_use]
    pub fn targeting_node(mut self, node_id: impl Into<String>) -> Self {
        self.target_node_id = Some(node_id.into());
        self
    }

    /// Routes learned rules to one layer (1-based).
    #[must_use]
    pub fn targeting_layer(mut self, layer: usize) -> Self {
        self.target_layer = Some(layer);
        self
    }

    /// Effective label.
    #[must_use]
    pub fn label(&self) -> Label {
        self.label.unwrap_or_default()
    }

    /// Returns true unless labelled negative.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.label() == Label::Positive
    }

    /// Short human-readable description.
    #[must_use]
    pub fn describe(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }
        match (&self.input, &self.output, &self.predicate) {
            (Some(input), Some(output), _) => format!("{input} -> {output}"),
            (Some(input), None, _) => input.to_string(),
            (None, _, Some(predicate)) => format!("{predicate}({})", self.terms.join(", ")),
            _ => "<empty example>".to_string(),
        }
    }
}

/// Splits examples into `(positive, negative)` by label.
#[must_use]
pub fn partition(examples: &[Example]) -> (Vec<Example>, Vec<Example>) {
    examples.iter().cloned().partition(Example::is_positive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_label_is_positive() {
        let ex = Example::pair(Expr::var("x"), Expr::var("x"));
        assert!(ex.is_positive());
        assert!(!ex.clone().negative().is_positive());
    }

    #[test]
    fn test_partition() {
        let examples = vec![
            Example::pair(Expr::var("a"), Expr::var("a")),
            Example::pair(Expr::var("b"), Expr::var("b")).negative(),
            Example::pair(Expr::var("c"), Expr::var("c")).with_label(Label::Positive),
        ];
        let (pos, neg) = partition(&examples);
        assert_eq!(pos.len(), 2);
        assert_eq!(neg.len(), 1);
    }

    #[test]
    fn test_describe() {
        let pair = Example::pair(Expr::add(Expr::var("x"), Expr::num(0.0)), Expr::var("x"));
        assert_eq!(pair.describe(), "(x + 0) -> x");
        let fact = Example::fact("add", vec!["a".into(), "b".into()]);
        assert_eq!(fact.describe(), "add(a, b)");
        assert_eq!(fact.with_description("sum").describe(), "sum");
    }

    #[test]
    fn test_deserialize_fact_shorthand() {
        let json = r#"{"predicate": "add", "terms": ["a", "b"], "label": "negative"}"#;
        let ex: Example = serde_json::from_str(json).unwrap();
        assert_eq!(ex.predicate.as_deref(), Some("add"));
        assert_eq!(ex.terms.len(), 2);
        assert!(!ex.negated);
        assert_eq!(ex.label(), Label::Negative);
    }
}
