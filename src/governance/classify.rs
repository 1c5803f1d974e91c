//! Keyword-based rule typing.
//!
//! A rule's type is read off its id: the first keyword from a fixed, ordered
//! list that occurs in the lowercased id wins. The order matters, an id like
//! `distributive_identity` is distributive.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse algebraic category of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Commutative,
    Associative,
    Distributive,
    Identity,
    Inverse,
    Zero,
    /// No keyword matched.
    General,
}

impl RuleType {
    /// Keyword order used by [`classify`].
    pub const KEYWORD_ORDER: [Self; 6] = [
        Self::Commutative,
        Self::Associative,
        Self::Distributive,
        Self::Identity,
        Self::Inverse,
        Self::Zero,
    ];

    /// Lowercase tag, also the keyword matched against ids.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Commutative => "commutative",
            Self::Associative => "associative",
            Self::Distributive => "distributive",
            Self::Identity => "identity",
            Self::Inverse => "inverse",
            Self::Zero => "zero",
            Self::General => "general",
        }
    }

    /// Name under which meta-patterns of this type are recorded.
    #[must_use]
    pub const fn pattern_name(self) -> &'static str {
        match self {
            Self::Commutative => "commutative_pattern",
            Self::Associative => "associative_pattern",
            Self::Distributive => "distributive_pattern",
            Self::Identity => "identity_pattern",
            Self::Inverse => "inverse_pattern",
            Self::Zero => "zero_pattern",
            Self::General => "general_transform",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a rule id.
#[must_use]
pub fn classify(rule_id: &str) -> RuleType {
    let id = rule_id.to_lowercase();
    RuleType::KEYWORD_ORDER
        .into_iter()
        .find(|ty| id.contains(ty.as_str()))
        .unwrap_or(RuleType::General)
}
