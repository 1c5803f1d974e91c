//! The rule acceptance state machine.
//!
//! ```text
//! RECEIVED
//!   -> CONTRADICTION_CHECK -> REJECTED | REPLACED | CONTEXTUALIZED | MERGEABLE | NO_CONFLICT
//!   -> PROVABILITY         -> REJECTED | CONTINUE
//!   -> CONFIDENCE_SCORING
//!   -> META_PATTERN_EXTRACTION
//!   -> ACCEPTED
//! ```
//!
//! The governor exclusively owns the global rule set. Every call returns a
//! structured [`GovernanceOutcome`]; nothing on the decision path fails.
//!
//! A direct-negation replacement is only planned during the contradiction
//! check. The existing rule is removed and the candidate appended in the
//! commit step, so a candidate rejected later never disturbs the set.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core_rules::core_rules;
use crate::governance::confidence::{ConfidenceBreakdown, ConfidenceScorer};
use crate::governance::contradiction::{ConflictType, ContradictionDetector};
use crate::governance::meta_pattern::{MetaPatternLog, MetaPatternObservation};
use crate::governance::provability::{Provability, ProvabilityEngine};
use crate::rule::{Rule, RuleSource, RuleSummary};

/// Characters of the candidate id used to tag a restricted sub-context.
const RESTRICTION_TAG_LEN: usize = 10;

/// Governor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Replace the provability baseline confidence with the composite score.
    pub enhanced_scoring: bool,
    /// Escalate once the rule set holds more rules than this.
    pub escalation_rule_count: usize,
    /// Escalate once more candidates than this were rejected.
    pub escalation_failure_count: u64,
    /// Escalate once the complexity estimate exceeds this.
    pub escalation_complexity: f64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            enhanced_scoring: true,
            escalation_rule_count: 50,
            escalation_failure_count: 10,
            escalation_complexity: 100.0,
        }
    }
}

/// How the contradiction check left the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContradictionResolution {
    /// No existing rule conflicts with the candidate.
    NoConflict,
    /// The candidate took the place of a rule it directly negates.
    Replaced { replaced_id: String },
    /// The candidate's domain was narrowed to avoid an equal-priority overlap.
    Contextualized { overlapping_id: String, subdomain: String },
    /// The candidate forms a specific/general pair with an existing rule.
    /// Nothing was changed; the pair is a merge hint.
    Mergeable { mergeable_id: String },
}

/// Why a candidate was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Directly negates an existing rule with at least equal confidence.
    ContradictsRule { rule_id: String },
    /// Negates an existing rule that provability could not rule out.
    Unprovable,
    /// A rule with the same id is already governed.
    DuplicateId,
    /// The candidate failed [`Rule::validate`].
    Invalid { message: String },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContradictsRule { rule_id } => write!(f, "contradicts {rule_id}"),
            Self::Unprovable => f.write_str("unprovable"),
            Self::DuplicateId => f.write_str("duplicate id"),
            Self::Invalid { message } => write!(f, "invalid: {message}"),
        }
    }
}

/// Record of an accepted candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acceptance {
    /// Id of the accepted rule.
    pub rule_id: String,
    /// Provability verdict.
    pub provability: Provability,
    /// Confidence the rule was stored with.
    pub confidence: f64,
    /// Source tag assigned on acceptance.
    pub source: RuleSource,
    /// Source tag the candidate was submitted with.
    pub origin: RuleSource,
    /// How the contradiction check left the candidate.
    pub resolution: ContradictionResolution,
    /// Meta-pattern the rule was recorded under.
    pub meta_pattern: MetaPatternObservation,
    /// Present when enhanced scoring is on.
    pub breakdown: Option<ConfidenceBreakdown>,
}

/// Result of [`RuleGovernor::process_candidate_rule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GovernanceOutcome {
    /// The candidate joined the global rule set.
    Accepted(Acceptance),
    /// The candidate was turned away; the rule set is unchanged.
    Rejected {
        /// Id of the candidate.
        rule_id: String,
        /// Why.
        reason: RejectionReason,
    },
}

impl GovernanceOutcome {
    /// True for an accepted candidate.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// Id of the candidate.
    #[must_use]
    pub fn rule_id(&self) -> &str {
        match self {
            Self::Accepted(a) => &a.rule_id,
            Self::Rejected { rule_id, .. } => rule_id,
        }
    }

    /// The acceptance record, if accepted.
    #[must_use]
    pub fn acceptance(&self) -> Option<&Acceptance> {
        match self {
            Self::Accepted(a) => Some(a),
            Self::Rejected { .. } => None,
        }
    }
}

/// Governor health counters.
///
/// Delivery counters live in
/// [`DistributionStats`](crate::distribution::DistributionStats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernorStats {
    /// Size of the global rule set.
    pub global_rules: usize,
    /// Candidates submitted.
    pub rules_processed: u64,
    /// Candidates accepted.
    pub rules_accepted: u64,
    /// Candidates rejected for any reason.
    pub rules_rejected: u64,
    /// Accepted over processed, in percent.
    pub acceptance_rate: f64,
    /// Rejections by the contradiction or provability checks.
    pub heuristic_failures: u64,
    /// Distinct meta-patterns observed.
    pub meta_patterns: usize,
    /// See [`GovernorState::estimate_complexity`].
    pub system_complexity: f64,
    /// Set once [`RuleGovernor::check_escalation`] has fired.
    pub escalation_advised: bool,
}

/// Why the heuristic pipeline should be backed by a stronger checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationAdvice {
    /// One entry per exceeded threshold.
    pub reasons: Vec<String>,
}

/// Everything the governor mutates. Owned by exactly one governor.
#[derive(Debug, Default)]
pub struct GovernorState {
    rules: Vec<Rule>,
    meta_patterns: MetaPatternLog,
    scorer: ConfidenceScorer,
    rules_processed: u64,
    rules_accepted: u64,
    rules_rejected: u64,
    heuristic_failures: u64,
    escalation_advised: bool,
}

impl GovernorState {
    /// The global rule set in insertion order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Observed meta-patterns.
    #[must_use]
    pub fn meta_patterns(&self) -> &MetaPatternLog {
        &self.meta_patterns
    }

    /// Scorer and its history.
    #[must_use]
    pub fn scorer(&self) -> &ConfidenceScorer {
        &self.scorer
    }

    fn contains(&self, id: &str) -> bool {
        self.rules.iter().any(|r| r.id == id)
    }

    /// `0.5 * rules + 10 * distinct_domains + 2 * avg_priority`.
    #[must_use]
    pub fn estimate_complexity(&self) -> f64 {
        if self.rules.is_empty() {
            return 0.0;
        }
        let n = self.rules.len() as f64;
        let domains: BTreeSet<&str> = self.rules.iter().map(|r| r.domain.domain.as_str()).collect();
        let avg_priority = self.rules.iter().map(|r| f64::from(r.priority)).sum::<f64>() / n;
        0.5 * n + 10.0 * domains.len() as f64 + 2.0 * avg_priority
    }
}

struct Screening {
    replace: Option<String>,
    resolution: ContradictionResolution,
}

/// Vets candidate rules and owns the global rule set.
#[derive(Debug, Default)]
pub struct RuleGovernor {
    config: GovernorConfig,
    detector: ContradictionDetector,
    provability: ProvabilityEngine,
    state: GovernorState,
}

impl RuleGovernor {
    /// Creates a governor with an empty rule set.
    #[must_use]
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates a governor seeded with [`core_rules`].
    #[must_use]
    pub fn with_core_rules(config: GovernorConfig) -> Self {
        let mut governor = Self::new(config);
        for rule in core_rules() {
            governor.seed_rule(rule);
        }
        governor
    }

    /// Adds a trusted rule without vetting it. Returns false if the id is
    /// already present.
    pub fn seed_rule(&mut self, rule: Rule) -> bool {
        if self.state.contains(&rule.id) {
            return false;
        }
        self.state.rules.push(rule);
        true
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Read-only view of the governed state.
    #[must_use]
    pub fn state(&self) -> &GovernorState {
        &self.state
    }

    /// The global rule set in insertion order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.state.rules
    }

    /// Looks up a governed rule.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.state.rules.iter().find(|r| r.id == id)
    }

    /// Serializable view of the rule set.
    #[must_use]
    pub fn rule_summaries(&self) -> Vec<RuleSummary> {
        self.state.rules.iter().map(Rule::summary).collect()
    }

    /// Feeds an application outcome into the performance history.
    pub fn record_application(&mut self, rule_id: &str, success: bool) {
        self.state.scorer.update_performance(rule_id, success);
    }

    /// Runs a candidate through the acceptance pipeline.
    pub fn process_candidate_rule(&mut self, mut candidate: Rule) -> GovernanceOutcome {
        self.state.rules_processed += 1;
        tracing::debug!(
            rule_id = %candidate.id,
            processed = self.state.rules_processed,
            "governing candidate rule"
        );

        if let Err(err) = candidate.validate() {
            self.state.rules_rejected += 1;
            return self.reject(
                candidate.id,
                RejectionReason::Invalid {
                    message: err.to_string(),
                },
            );
        }

        if self.state.contains(&candidate.id) {
            self.state.rules_rejected += 1;
            return self.reject(candidate.id, RejectionReason::DuplicateId);
        }

        let screening = match self.screen(&mut candidate) {
            Ok(screening) => screening,
            Err(reason) => {
                self.state.rules_rejected += 1;
                self.state.heuristic_failures += 1;
                return self.reject(candidate.id, reason);
            }
        };

        let replace = screening.replace.as_deref();
        let remaining = self
            .state
            .rules
            .iter()
            .filter(move |r| Some(r.id.as_str()) != replace);

        let provability = self.provability.analyze(&candidate, remaining.clone());
        if provability == Provability::Unprovable {
            self.state.rules_rejected += 1;
            self.state.heuristic_failures += 1;
            return self.reject(candidate.id, RejectionReason::Unprovable);
        }

        let origin = candidate.source.clone();
        let (baseline_confidence, baseline_source) = match provability {
            Provability::Provable => (1.0, RuleSource::Derived),
            _ => (0.5, RuleSource::Empirical),
        };

        let breakdown = self.config.enhanced_scoring.then(|| {
            self.state
                .scorer
                .score_rule(&candidate, remaining, Some(provability))
        });
        candidate.set_confidence(breakdown.as_ref().map_or(baseline_confidence, |b| b.final_score));
        candidate.source = baseline_source;

        let meta_pattern = self.state.meta_patterns.observe(&candidate);

        if let Some(replaced_id) = &screening.replace {
            self.state.rules.retain(|r| &r.id != replaced_id);
            tracing::info!(rule_id = %candidate.id, replaced_id = %replaced_id, "replaced negated rule");
        }

        let acceptance = Acceptance {
            rule_id: candidate.id.clone(),
            provability,
            confidence: candidate.confidence(),
            source: candidate.source.clone(),
            origin,
            resolution: screening.resolution,
            meta_pattern,
            breakdown,
        };
        self.state.rules.push(candidate);
        self.state.rules_accepted += 1;

        tracing::info!(
            rule_id = %acceptance.rule_id,
            provability = %acceptance.provability,
            confidence = acceptance.confidence,
            "accepted rule"
        );
        GovernanceOutcome::Accepted(acceptance)
    }

    /// Contradiction phase. The first conflict of any kind ends the scan.
    /// Narrows the candidate's domain on overlap.
    fn screen(&self, candidate: &mut Rule) -> Result<Screening, RejectionReason> {
        for existing in &self.state.rules {
            let conflict = self.detector.detect(candidate, existing);
            match conflict.conflict_type {
                ConflictType::None => {}
                ConflictType::DirectNegation => {
                    tracing::debug!(
                        rule_id = %candidate.id,
                        existing_id = %existing.id,
                        candidate_confidence = candidate.confidence(),
                        existing_confidence = existing.confidence(),
                        "direct negation"
                    );
                    if candidate.confidence() > existing.confidence() {
                        return Ok(Screening {
                            replace: Some(existing.id.clone()),
                            resolution: ContradictionResolution::Replaced {
                                replaced_id: existing.id.clone(),
                            },
                        });
                    }
                    return Err(RejectionReason::ContradictsRule {
                        rule_id: existing.id.clone(),
                    });
                }
                ConflictType::ContextOverlap => {
                    let tag: String = candidate.id.chars().take(RESTRICTION_TAG_LEN).collect();
                    candidate.domain = candidate.domain.restricted(&tag);
                    let subdomain = candidate.domain.subdomain.clone().unwrap_or_default();
                    tracing::debug!(
                        rule_id = %candidate.id,
                        existing_id = %existing.id,
                        subdomain = %subdomain,
                        "contextualized candidate"
                    );
                    return Ok(Screening {
                        replace: None,
                        resolution: ContradictionResolution::Contextualized {
                            overlapping_id: existing.id.clone(),
                            subdomain,
                        },
                    });
                }
                ConflictType::SpecialGeneral => {
                    tracing::debug!(rule_id = %candidate.id, existing_id = %existing.id, "mergeable pair");
                    return Ok(Screening {
                        replace: None,
                        resolution: ContradictionResolution::Mergeable {
                            mergeable_id: existing.id.clone(),
                        },
                    });
                }
            }
        }

        Ok(Screening {
            replace: None,
            resolution: ContradictionResolution::NoConflict,
        })
    }

    fn reject(&self, rule_id: String, reason: RejectionReason) -> GovernanceOutcome {
        tracing::info!(rule_id = %rule_id, reason = %reason, "rejected rule");
        GovernanceOutcome::Rejected { rule_id, reason }
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> GovernorStats {
        let s = &self.state;
        GovernorStats {
            global_rules: s.rules.len(),
            rules_processed: s.rules_processed,
            rules_accepted: s.rules_accepted,
            rules_rejected: s.rules_rejected,
            acceptance_rate: if s.rules_processed > 0 {
                s.rules_accepted as f64 / s.rules_processed as f64 * 100.0
            } else {
                0.0
            },
            heuristic_failures: s.heuristic_failures,
            meta_patterns: s.meta_patterns.len(),
            system_complexity: s.estimate_complexity(),
            escalation_advised: s.escalation_advised,
        }
    }

    /// Checks whether the rule set has outgrown the heuristic checks.
    ///
    /// Fires at most once per governor; later calls return `None`.
    pub fn check_escalation(&mut self) -> Option<EscalationAdvice> {
        if self.state.escalation_advised {
            return None;
        }

        let mut reasons = Vec::new();
        let rules = self.state.rules.len();
        if rules > self.config.escalation_rule_count {
            reasons.push(format!(
                "rule count ({rules}) > {}",
                self.config.escalation_rule_count
            ));
        }
        let failures = self.state.heuristic_failures;
        if failures > self.config.escalation_failure_count {
            reasons.push(format!(
                "heuristic failures ({failures}) > {}",
                self.config.escalation_failure_count
            ));
        }
        let complexity = self.state.estimate_complexity();
        if complexity > self.config.escalation_complexity {
            reasons.push(format!(
                "complexity ({complexity:.1}) > {}",
                self.config.escalation_complexity
            ));
        }

        if reasons.is_empty() {
            return None;
        }
        self.state.escalation_advised = true;
        tracing::warn!(reasons = ?reasons, "heuristic governance escalation advised");
        Some(EscalationAdvice { reasons })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::rule::{condition, Applicability, IdentityTransform};
    use std::sync::Arc;

    fn rule(id: &str, priority: i32) -> Rule {
        Rule::new(
            id,
            condition(|_, _, _| Ok(Applicability::Applicable)),
            Arc::new(IdentityTransform),
            Context::algebra(),
            priority,
        )
    }

    fn ids(governor: &RuleGovernor) -> Vec<&str> {
        governor.rules().iter().map(|r| r.id.as_str()).collect()
    }

    fn baseline() -> RuleGovernor {
        RuleGovernor::new(GovernorConfig {
            enhanced_scoring: false,
            ..GovernorConfig::default()
        })
    }

    #[test]
    fn test_accepts_into_empty_set() {
        let mut governor = baseline();
        let outcome = governor.process_candidate_rule(rule("my_rule", 3).with_source(RuleSource::Manual));
        let acceptance = outcome.acceptance().unwrap();
        assert_eq!(acceptance.provability, Provability::Heuristic);
        assert!((acceptance.confidence - 0.5).abs() < 1e-9);
        assert_eq!(acceptance.source, RuleSource::Empirical);
        assert_eq!(acceptance.origin, RuleSource::Manual);
        assert_eq!(acceptance.resolution, ContradictionResolution::NoConflict);
        assert!(acceptance.meta_pattern.new_pattern);
        assert!(acceptance.breakdown.is_none());
        assert_eq!(ids(&governor), vec!["my_rule"]);
    }

    #[test]
    fn test_provable_candidate_gets_derived_baseline() {
        let mut governor = baseline();
        governor.seed_rule(rule("commutative_x", 1));
        governor.seed_rule(rule("associative_y", 2));
        let outcome = governor.process_candidate_rule(rule("distributive_z", 3));
        let acceptance = outcome.acceptance().unwrap();
        assert_eq!(acceptance.provability, Provability::Provable);
        assert!((acceptance.confidence - 1.0).abs() < 1e-9);
        assert_eq!(acceptance.source, RuleSource::Derived);
    }

    #[test]
    fn test_weaker_negation_is_rejected_without_side_effects() {
        let mut governor = baseline();
        governor.seed_rule(rule("expand_terms", 1).with_confidence(0.9));
        governor.seed_rule(rule("other", 2));

        let outcome = governor.process_candidate_rule(rule("factor_terms", 3).with_confidence(0.9));
        assert_eq!(
            outcome,
            GovernanceOutcome::Rejected {
                rule_id: "factor_terms".into(),
                reason: RejectionReason::ContradictsRule {
                    rule_id: "expand_terms".into()
                },
            }
        );
        assert_eq!(ids(&governor), vec!["expand_terms", "other"]);
        let stats = governor.stats();
        assert_eq!(stats.rules_rejected, 1);
        assert_eq!(stats.heuristic_failures, 1);
    }

    #[test]
    fn test_stronger_negation_replaces_atomically() {
        let mut governor = baseline();
        governor.seed_rule(rule("expand_terms", 1).with_confidence(0.4));
        governor.seed_rule(rule("other", 2));

        let outcome = governor.process_candidate_rule(rule("factor_terms", 3).with_confidence(0.9));
        let acceptance = outcome.acceptance().unwrap();
        assert_eq!(
            acceptance.resolution,
            ContradictionResolution::Replaced {
                replaced_id: "expand_terms".into()
            }
        );
        assert_eq!(ids(&governor), vec!["other", "factor_terms"]);
    }

    #[test]
    fn test_replacement_planned_but_later_rejected_leaves_set_intact() {
        let mut governor = baseline();
        governor.seed_rule(rule("expand_terms", 1).with_confidence(0.4));
        governor.seed_rule(rule("expand_more_terms", 2).with_confidence(1.0));

        // First negation is replaceable, so the scan stops there. Provability
        // still sees the second negated rule and rejects.
        let outcome = governor.process_candidate_rule(rule("factor_terms", 3).with_confidence(0.9));
        assert!(matches!(
            outcome,
            GovernanceOutcome::Rejected {
                reason: RejectionReason::Unprovable,
                ..
            }
        ));
        assert_eq!(ids(&governor), vec!["expand_terms", "expand_more_terms"]);
    }

    #[test]
    fn test_context_overlap_narrows_domain_and_continues() {
        let mut governor = baseline();
        governor.seed_rule(rule("rewrite_one", 7));
        let outcome = governor.process_candidate_rule(rule("rewrite_two_long_name", 7));
        let acceptance = outcome.acceptance().unwrap();
        assert_eq!(
            acceptance.resolution,
            ContradictionResolution::Contextualized {
                overlapping_id: "rewrite_one".into(),
                subdomain: "restricted_rewrite_tw".into(),
            }
        );
        let stored = governor.rule("rewrite_two_long_name").unwrap();
        assert_eq!(stored.domain.subdomain.as_deref(), Some("restricted_rewrite_tw"));
        assert_eq!(stored.domain.domain, "math");
    }

    #[test]
    fn test_special_general_is_a_hint() {
        let mut governor = baseline();
        governor.seed_rule(rule("general_power", 1));
        governor.seed_rule(rule("general_root", 2));
        let outcome = governor.process_candidate_rule(rule("specific_square", 3));
        let acceptance = outcome.acceptance().unwrap();
        assert_eq!(
            acceptance.resolution,
            ContradictionResolution::Mergeable {
                mergeable_id: "general_power".into()
            }
        );
        assert_eq!(ids(&governor), vec!["general_power", "general_root", "specific_square"]);
    }

    #[test]
    fn test_mergeable_pair_ends_the_scan_before_a_later_negation() {
        let mut governor = baseline();
        governor.seed_rule(rule("general_power", 1));
        governor.seed_rule(rule("expand_terms", 2).with_confidence(0.4));

        // The scan stops at the mergeable pair, so no replacement is planned
        // and provability still sees the negated rule.
        let outcome = governor.process_candidate_rule(rule("specific_factor_terms", 5).with_confidence(0.9));
        assert_eq!(
            outcome,
            GovernanceOutcome::Rejected {
                rule_id: "specific_factor_terms".into(),
                reason: RejectionReason::Unprovable,
            }
        );
        assert_eq!(ids(&governor), vec!["general_power", "expand_terms"]);
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut governor = baseline();
        assert!(governor.process_candidate_rule(rule("dup", 1)).is_accepted());
        let outcome = governor.process_candidate_rule(rule("dup", 2));
        assert!(matches!(
            outcome,
            GovernanceOutcome::Rejected {
                reason: RejectionReason::DuplicateId,
                ..
            }
        ));
        assert_eq!(governor.rules().len(), 1);
        assert_eq!(governor.stats().heuristic_failures, 0);
    }

    #[test]
    fn test_blank_id_is_rejected_as_invalid() {
        let mut governor = baseline();
        let outcome = governor.process_candidate_rule(rule("", 1));
        assert_eq!(
            outcome,
            GovernanceOutcome::Rejected {
                rule_id: String::new(),
                reason: RejectionReason::Invalid {
                    message: "Rule id cannot be empty".into()
                },
            }
        );
        assert!(governor.rules().is_empty());
        assert_eq!(governor.stats().rules_rejected, 1);
        assert_eq!(governor.stats().heuristic_failures, 0);
    }

    #[test]
    fn test_enhanced_scoring_sets_composite_confidence() {
        let mut governor = RuleGovernor::new(GovernorConfig::default());
        let outcome = governor.process_candidate_rule(rule("ile_+_1", 9).with_source(RuleSource::InverseEntailment));
        let acceptance = outcome.acceptance().unwrap();
        let breakdown = acceptance.breakdown.as_ref().unwrap();
        assert!((breakdown.source_adjustment - 1.15).abs() < 1e-9);
        assert!((acceptance.confidence - breakdown.final_score).abs() < 1e-9);
        assert_eq!(acceptance.source, RuleSource::Empirical);
        assert_eq!(governor.state().scorer().history().len(), 1);
    }

    #[test]
    fn test_core_rules_seed_and_stats() {
        let governor = RuleGovernor::with_core_rules(GovernorConfig::default());
        let stats = governor.stats();
        assert_eq!(stats.global_rules, 7);
        assert_eq!(stats.rules_processed, 0);
        assert!((stats.acceptance_rate - 0.0).abs() < 1e-9);
        // 0.5 * 7 + 10 * 1 + 2 * (60 / 7)
        let expected = 3.5 + 10.0 + 2.0 * (60.0 / 7.0);
        assert!((stats.system_complexity - expected).abs() < 1e-9);
    }

    #[test]
    fn test_escalation_fires_once() {
        let mut governor = RuleGovernor::new(GovernorConfig {
            escalation_rule_count: 2,
            ..GovernorConfig::default()
        });
        assert!(governor.check_escalation().is_none());
        for (i, id) in ["a_rule", "b_rule", "c_rule"].iter().enumerate() {
            governor.seed_rule(rule(id, i as i32));
        }
        let advice = governor.check_escalation().unwrap();
        assert_eq!(advice.reasons.len(), 1);
        assert!(advice.reasons[0].starts_with("rule count (3)"));
        assert!(governor.stats().escalation_advised);
        assert!(governor.check_escalation().is_none());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = GovernanceOutcome::Rejected {
            rule_id: "r".into(),
            reason: RejectionReason::Unprovable,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"]["reason"], "unprovable");
    }
}
