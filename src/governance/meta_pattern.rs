//! Recurring (rule type, domain) combinations among accepted rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::governance::classify::{classify, RuleType};
use crate::rule::Rule;

/// One observed combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaPatternRecord {
    /// Rule type from the id keywords.
    pub rule_type: RuleType,
    /// Top-level domain.
    pub domain: String,
    /// Accepted rules that matched.
    pub count: u64,
    /// When the pair was first seen.
    pub discovered_at: DateTime<Utc>,
}

/// What recording a rule did to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaPatternObservation {
    /// True if this (type, domain) pair was seen for the first time.
    pub new_pattern: bool,
    /// Pattern name, e.g. `identity_pattern`.
    pub pattern_type: String,
    /// Matches so far, this rule included.
    pub pattern_count: u64,
}

/// Append-only list of meta-patterns. Records are never removed.
#[derive(Debug, Default, Clone)]
pub struct MetaPatternLog {
    records: Vec<MetaPatternRecord>,
}

impl MetaPatternLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies `rule` and bumps (or creates) its counter.
    pub fn observe(&mut self, rule: &Rule) -> MetaPatternObservation {
        let rule_type = classify(&rule.id);
        let domain = &rule.domain.domain;

        if let Some(record) = self
            .records
            .iter_mut()
            .find(|r| r.rule_type == rule_type && &r.domain == domain)
        {
            record.count += 1;
            return MetaPatternObservation {
                new_pattern: false,
                pattern_type: rule_type.pattern_name().to_string(),
                pattern_count: record.count,
            };
        }

        self.records.push(MetaPatternRecord {
            rule_type,
            domain: domain.clone(),
            count: 1,
            discovered_at: Utc::now(),
        });
        tracing::debug!(pattern = rule_type.pattern_name(), domain = %domain, "new meta-pattern");
        MetaPatternObservation {
            new_pattern: true,
            pattern_type: rule_type.pattern_name().to_string(),
            pattern_count: 1,
        }
    }

    /// Records in discovery order.
    #[must_use]
    pub fn records(&self) -> &[MetaPatternRecord] {
        &self.records
    }

    /// Number of distinct patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True before any rule was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
