//! Symbolic expression values.
//!
//! Expressions are opaque to the learner apart from three things: an
//! operator name, an ordered argument list, and structural equality. Leaves
//! are expressions with no arguments (variables and numeric constants).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A symbolic expression tree node.
///
/// # Examples
///
/// ```
/// use kyrolearn::Expr;
///
/// let e = Expr::add(Expr::var("x"), Expr::num(0.0));
/// assert_eq!(e.op(), "+");
/// assert_eq!(e.args().len(), 2);
/// assert_eq!(e.to_string(), "(x + 0)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Expr {
    op: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    args: Vec<Expr>,
}

impl Expr {
    /// Creates an expression from an operator and its arguments.
    #[must_use]
    pub fn new(op: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            op: op.into(),
            args,
        }
    }

    /// Creates a variable leaf.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Creates a numeric constant leaf.
    ///
    /// Integral values render without a fractional part, so `num(0.0)` has
    /// operator `"0"`.
    #[must_use]
    pub fn num(value: f64) -> Self {
        let op = if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else {
            format!("{value}")
        };
        Self::new(op, Vec::new())
    }

    /// `a + b`
    #[must_use]
    pub fn add(a: Expr, b: Expr) -> Self {
        Self::new("+", vec![a, b])
    }

    /// `a - b`
    #[must_use]
    pub fn sub(a: Expr, b: Expr) -> Self {
        Self::new("-", vec![a, b])
    }

    /// `a * b`
    #[must_use]
    pub fn mul(a: Expr, b: Expr) -> Self {
        Self::new("*", vec![a, b])
    }

    /// `a / b`
    #[must_use]
    pub fn div(a: Expr, b: Expr) -> Self {
        Self::new("/", vec![a, b])
    }

    /// Operator or leaf name.
    #[must_use]
    pub fn op(&self) -> &str {
        &self.op
    }

    /// Ordered arguments (empty for leaves).
    #[must_use]
    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    /// Returns true if this node has no arguments.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.args.is_empty()
    }

    /// Returns true if this is a numeric leaf equal to `value`.
    #[must_use]
    pub fn is_number(&self, value: f64) -> bool {
        self.is_leaf() && self.op.parse::<f64>().is_ok_and(|v| v == value)
    }

    /// Alphabetic leaf names appearing in the tree.
    #[must_use]
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        if self.is_leaf() {
            if !self.op.is_empty() && self.op.chars().all(char::is_alphabetic) {
                out.insert(self.op.clone());
            }
            return;
        }
        for arg in &self.args {
            arg.collect_symbols(out);
        }
    }

    /// Operators of internal nodes appearing in the tree.
    #[must_use]
    pub fn operators(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_operators(&mut out);
        out
    }

    fn collect_operators(&self, out: &mut BTreeSet<String>) {
        if self.is_leaf() {
            return;
        }
        out.insert(self.op.clone());
        for arg in &self.args {
            arg.collect_operators(out);
        }
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.args.iter().map(Expr::size).sum::<usize>()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.args.as_slice() {
            [] => write!(f, "{}", self.op),
            [only] => write!(f, "{}({only})", self.op),
            [a, b] => write!(f, "({a} {} {b})", self.op),
            many => {
                write!(f, "{}(", self.op)?;
                for (i, arg) in many.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_renders_integral_values() {
        assert_eq!(Expr::num(0.0).op(), "0");
        assert_eq!(Expr::num(5.0).op(), "5");
        assert_eq!(Expr::num(2.5).op(), "2.5");
    }

    #[test]
    fn test_display() {
        let e = Expr::mul(Expr::var("a"), Expr::add(Expr::var("b"), Expr::var("c")));
        assert_eq!(e.to_string(), "(a * (b + c))");
        assert_eq!(Expr::new("neg", vec![Expr::var("x")]).to_string(), "neg(x)");
    }

    #[test]
    fn test_structural_equality() {
        let a = Expr::add(Expr::var("x"), Expr::num(0.0));
        let b = Expr::add(Expr::var("x"), Expr::num(0.0));
        let c = Expr::add(Expr::var("y"), Expr::num(0.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_symbols_and_operators() {
        let e = Expr::mul(Expr::var("a"), Expr::add(Expr::var("b"), Expr::num(1.0)));
        let symbols: Vec<_> = e.symbols().into_iter().collect();
        assert_eq!(symbols, vec!["a".to_string(), "b".to_string()]);
        assert!(e.operators().contains("*"));
        assert!(e.operators().contains("+"));
        assert_eq!(e.size(), 5);
    }

    #[test]
    fn test_is_number() {
        assert!(Expr::num(0.0).is_number(0.0));
        assert!(!Expr::var("x").is_number(0.0));
        assert!(!Expr::add(Expr::num(0.0), Expr::num(0.0)).is_number(0.0));
    }

    #[test]
    fn test_serialization() {
        let e = Expr::add(Expr::var("x"), Expr::num(1.0));
        let json = serde_json::to_string(&e).unwrap();
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(e, back);
    }
}
