//! First-order literals, clauses and mode declarations.
//!
//! Terms are plain strings. A term is a variable iff its first character is
//! uppercase; everything else (including the empty string) is a constant.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Returns true if `term` names a variable.
#[must_use]
pub fn is_variable(term: &str) -> bool {
    term.chars().next().is_some_and(char::is_uppercase)
}

/// A possibly negated atom `p(t1, ..., tn)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// Predicate name.
    pub predicate: String,
    /// Capitalized or `_`-prefixed terms are variables.
    pub terms: Vec<String>,
    /// True for a negated atom.
    #[serde(default)]
    pub negated: bool,
}

impl Literal {
    /// Creates a positive literal.
    #[must_use]
    pub fn new(predicate: impl Into<String>, terms: Vec<String>) -> Self {
        Self {
            predicate: predicate.into(),
            terms,
            negated: false,
        }
    }

    /// Creates a negated literal.
    #[must_use]
    pub fn negated(predicate: impl Into<String>, terms: Vec<String>) -> Self {
        Self {
            negated: true,
            ..Self::new(predicate, terms)
        }
    }

    /// Applies a substitution to every term. Unbound terms are kept.
    #[must_use]
    pub fn ground(&self, substitution: &HashMap<String, String>) -> Self {
        Self {
            predicate: self.predicate.clone(),
            terms: self
                .terms
                .iter()
                .map(|t| substitution.get(t).cloned().unwrap_or_else(|| t.clone()))
                .collect(),
            negated: self.negated,
        }
    }

    /// Returns true if no term is a variable.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(|t| !is_variable(t))
    }

    /// Variables occurring in this literal.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<String> {
        self.terms.iter().filter(|t| is_variable(t)).cloned().collect()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let neg = if self.negated { "¬" } else { "" };
        write!(f, "{neg}{}({})", self.predicate, self.terms.join(", "))
    }
}

/// A definite clause `head :- body1, ..., bodyN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clause {
    /// Conclusion of the clause.
    pub head: Literal,
    /// Conjunction of body literals. Empty means a fact.
    #[serde(default)]
    pub body: Vec<Literal>,
}

impl Clause {
    /// Creates a clause.
    #[must_use]
    pub fn new(head: Literal, body: Vec<Literal>) -> Self {
        Self { head, body }
    }

    /// Creates a clause with an empty body.
    #[must_use]
    pub fn fact(head: Literal) -> Self {
        Self::new(head, Vec::new())
    }

    /// Body size.
    #[must_use]
    pub fn length(&self) -> usize {
        self.body.len()
    }

    /// Variables occurring in the head or body.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<String> {
        let mut vars = self.head.variables();
        for lit in &self.body {
            vars.extend(lit.variables());
        }
        vars
    }

    /// Theta-subsumption check: does some substitution map this clause's head
    /// onto `other`'s head and each body literal onto some literal of `other`?
    ///
    /// Body literals are matched greedily in order; the first literal of
    /// `other` that unifies is taken.
    #[must_use]
    pub fn subsumes(&self, other: &Clause) -> bool {
        let mut substitution = HashMap::new();
        if !unify(&self.head, &other.head, &mut substitution) {
            return false;
        }

        for lit in &self.body {
            let matched = other.body.iter().find_map(|candidate| {
                let mut trial = substitution.clone();
                unify(lit, candidate, &mut trial).then_some(trial)
            });
            match matched {
                Some(extended) => substitution = extended,
                None => return false,
            }
        }
        true
    }
}

fn unify(a: &Literal, b: &Literal, substitution: &mut HashMap<String, String>) -> bool {
    if a.predicate != b.predicate || a.negated != b.negated || a.terms.len() != b.terms.len() {
        return false;
    }

    for (t1, t2) in a.terms.iter().zip(&b.terms) {
        let s1 = substitution.get(t1).cloned().unwrap_or_else(|| t1.clone());
        let s2 = substitution.get(t2).cloned().unwrap_or_else(|| t2.clone());

        if is_variable(&s1) {
            substitution.insert(s1, s2);
        } else if is_variable(&s2) {
            substitution.insert(s2, s1);
        } else if s1 != s2 {
            return false;
        }
    }
    true
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.is_empty() {
            return write!(f, "{}", self.head);
        }
        write!(f, "{} :- ", self.head)?;
        for (i, lit) in self.body.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{lit}")?;
        }
        Ok(())
    }
}

/// Role of a predicate argument in a mode declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgMode {
    /// `+`
    Input,
    /// `-`
    Output,
    /// `#`
    Constant,
}

impl ArgMode {
    /// Single-character mode symbol.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Input => '+',
            Self::Output => '-',
            Self::Constant => '#',
        }
    }
}

impl TryFrom<&str> for ArgMode {
    type Error = ValidationError;

    fn try_from(symbol: &str) -> Result<Self, Self::Error> {
        match symbol.trim() {
            "+" | "input" => Ok(Self::Input),
            "-" | "output" => Ok(Self::Output),
            "#" | "constant" => Ok(Self::Constant),
            other => Err(ValidationError::InvalidField {
                field: "arg_mode".to_string(),
                reason: format!("unknown mode '{other}'"),
            }),
        }
    }
}

/// Argument roles for one predicate.
///
/// Recorded by the engine; the search does not consult them yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDeclaration {
    /// Predicate name.
    pub predicate: String,
    /// One mode per argument position.
    pub arg_modes: Vec<ArgMode>,
}

impl ModeDeclaration {
    /// Creates a declaration.
    #[must_use]
    pub fn new(predicate: impl Into<String>, arg_modes: Vec<ArgMode>) -> Self {
        Self {
            predicate: predicate.into(),
            arg_modes,
        }
    }

    /// Parses modes from their symbols, e.g. `["+", "+", "-"]`.
    pub fn parse(predicate: impl Into<String>, symbols: &[&str]) -> Result<Self, ValidationError> {
        let arg_modes = symbols
            .iter()
            .map(|s| ArgMode::try_from(*s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(predicate, arg_modes))
    }
}

impl fmt::Display for ModeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modes: Vec<String> = self.arg_modes.iter().map(|m| m.symbol().to_string()).collect();
        write!(f, "{}({})", self.predicate, modes.join(", "))
    }
}
