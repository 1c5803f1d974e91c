//! Learn, govern and distribute in one call.
//!
//! [`LearningEngine`] runs every registered [`RuleProposer`] over an example
//! set, passes each candidate through the [`RuleGovernor`], and ships the
//! accepted rules to the fleet.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::distribution::{
    BroadcastReport, DistributionProtocol, DistributionStats, NodeFleet, PackageOperation, TargetedReport,
};
use crate::entailment::{EntailmentStats, InverseEntailmentEngine, SearchConfig};
use crate::error::{DistributionError, LearnResult, ValidationError};
use crate::example::{partition, Example};
use crate::governance::{EscalationAdvice, GovernanceOutcome, GovernorConfig, GovernorStats, RuleGovernor};
use crate::proposer::RuleProposer;
use crate::rule::Rule;

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Hypothesis search bounds.
    pub search: SearchConfig,
    /// Governor thresholds and scoring mode.
    pub governor: GovernorConfig,
    /// Context for learned rules when no example carries one.
    pub default_context: Context,
}

impl LearningConfig {
    /// Parses a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|err| ValidationError::InvalidConfig {
            reason: err.to_string(),
        })
    }
}

/// Per-proposer tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposerReport {
    /// Candidates the proposer returned.
    pub proposed: usize,
    /// Candidates the governor accepted.
    pub accepted: usize,
}

/// Where one accepted rule was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Delivery {
    /// Sent to every node with the global signature.
    Broadcast {
        /// The delivered rule.
        rule_id: String,
        /// Per-node results.
        report: BroadcastReport,
    },
    /// Sent to the nodes named by the examples.
    Targeted {
        /// The delivered rule.
        rule_id: String,
        /// Per-target results.
        report: TargetedReport,
    },
}

impl Delivery {
    /// Nodes that took the rule.
    #[must_use]
    pub fn nodes_reached(&self) -> usize {
        match self {
            Self::Broadcast { report, .. } => report.nodes_updated,
            Self::Targeted { report, .. } => report.successful,
        }
    }

    /// The delivered rule.
    #[must_use]
    pub fn rule_id(&self) -> &str {
        match self {
            Self::Broadcast { rule_id, .. } | Self::Targeted { rule_id, .. } => rule_id,
        }
    }
}

/// Summary of one [`LearningEngine::learn_from_examples`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningReport {
    /// Candidates the governor accepted.
    pub rules_learned: usize,
    /// Node deliveries that succeeded, summed over the accepted rules.
    pub rules_distributed: usize,
    /// Mean confidence of the accepted rules, 0 when none.
    pub confidence_avg: f64,
    /// Tallies keyed by proposer name.
    pub per_proposer: BTreeMap<String, ProposerReport>,
    /// Entailment counters after the call.
    pub entailment: EntailmentStats,
    /// One outcome per candidate, in proposal order.
    pub outcomes: Vec<GovernanceOutcome>,
    /// One delivery per accepted rule.
    pub deliveries: Vec<Delivery>,
    /// Set when this call tripped an escalation threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation: Option<EscalationAdvice>,
}

/// Combined counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Governor counters.
    pub governor: GovernorStats,
    /// Delivery counters.
    pub distribution: DistributionStats,
    /// Entailment counters.
    pub entailment: EntailmentStats,
}

/// Learning facade over a fleet.
pub struct LearningEngine {
    config: LearningConfig,
    entailment: InverseEntailmentEngine,
    proposers: Vec<Box<dyn RuleProposer>>,
    governor: RuleGovernor,
    protocol: DistributionProtocol,
    fleet: Arc<dyn NodeFleet>,
}

impl LearningEngine {
    /// Creates an engine whose governor starts from the core rules.
    #[must_use]
    pub fn new(config: LearningConfig, fleet: Arc<dyn NodeFleet>) -> Self {
        let governor = RuleGovernor::with_core_rules(config.governor.clone());
        Self::with_governor(config, governor, fleet)
    }

    /// Creates an engine around an existing governor.
    #[must_use]
    pub fn with_governor(config: LearningConfig, governor: RuleGovernor, fleet: Arc<dyn NodeFleet>) -> Self {
        Self {
            entailment: InverseEntailmentEngine::new(config.search.clone()),
            proposers: Vec::new(),
            governor,
            protocol: DistributionProtocol::new(),
            fleet,
            config,
        }
    }

    /// Adds a proposer. It runs after inverse entailment, in registration
    /// order.
    pub fn register_proposer(&mut self, proposer: Box<dyn RuleProposer>) {
        tracing::debug!(proposer = proposer.name(), "registered rule proposer");
        self.proposers.push(proposer);
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// The governor and its rule set.
    #[must_use]
    pub fn governor(&self) -> &RuleGovernor {
        &self.governor
    }

    /// The built-in inverse-entailment proposer.
    #[must_use]
    pub fn entailment(&self) -> &InverseEntailmentEngine {
        &self.entailment
    }

    /// Mutable access, e.g. to register mode declarations.
    pub fn entailment_mut(&mut self) -> &mut InverseEntailmentEngine {
        &mut self.entailment
    }

    /// The fleet accepted rules are sent to.
    #[must_use]
    pub fn fleet(&self) -> &Arc<dyn NodeFleet> {
        &self.fleet
    }

    /// Learns from `examples`, governs every candidate and distributes the
    /// accepted rules.
    ///
    /// Fails when an example names a layer the fleet does not have, or an
    /// empty one. Nothing is learned in that case.
    pub fn learn_from_examples(&mut self, examples: &[Example]) -> LearnResult<LearningReport> {
        let targets = self.resolve_targets(examples)?;
        let (positive, negative) = partition(examples);
        let context = examples
            .iter()
            .find_map(|e| e.context.clone())
            .unwrap_or_else(|| self.config.default_context.clone());

        tracing::info!(
            examples = examples.len(),
            positives = positive.len(),
            negatives = negative.len(),
            domain = %context,
            "learning from examples"
        );

        let mut proposals: Vec<(String, Vec<Rule>)> = Vec::with_capacity(self.proposers.len() + 1);
        proposals.push((
            self.entailment.name().to_string(),
            self.entailment.propose(&positive, &negative, &context),
        ));
        for proposer in &mut self.proposers {
            proposals.push((
                proposer.name().to_string(),
                proposer.propose(&positive, &negative, &context),
            ));
        }

        let mut per_proposer: BTreeMap<String, ProposerReport> = BTreeMap::new();
        let mut outcomes = Vec::new();
        let mut deliveries = Vec::new();
        let mut confidences = Vec::new();

        for (name, candidates) in proposals {
            let tally = per_proposer.entry(name).or_default();
            for candidate in candidates {
                tally.proposed += 1;
                let outcome = self.governor.process_candidate_rule(candidate);
                if let Some(acceptance) = outcome.acceptance() {
                    tally.accepted += 1;
                    confidences.push(acceptance.confidence);
                    if let Some(rule) = self.governor.rule(&acceptance.rule_id).cloned() {
                        deliveries.push(self.distribute(&rule, &targets)?);
                    }
                }
                outcomes.push(outcome);
            }
        }

        let escalation = self.governor.check_escalation();
        if let Some(advice) = &escalation {
            tracing::warn!(reasons = ?advice.reasons, "heuristic governance is reaching its limits");
        }

        let report = LearningReport {
            rules_learned: confidences.len(),
            rules_distributed: deliveries.iter().map(Delivery::nodes_reached).sum(),
            confidence_avg: if confidences.is_empty() {
                0.0
            } else {
                confidences.iter().sum::<f64>() / confidences.len() as f64
            },
            per_proposer,
            entailment: self.entailment.statistics(),
            outcomes,
            deliveries,
            escalation,
        };
        tracing::info!(
            learned = report.rules_learned,
            distributed = report.rules_distributed,
            confidence_avg = report.confidence_avg,
            "learning finished"
        );
        Ok(report)
    }

    /// Explicit node targets named by the examples, deduplicated in order.
    /// Layers are 1-based on examples.
    fn resolve_targets(&self, examples: &[Example]) -> LearnResult<Vec<String>> {
        let mut targets: Vec<String> = Vec::new();
        let mut push = |id: String| {
            if !targets.contains(&id) {
                targets.push(id);
            }
        };

        for example in examples {
            if let Some(node_id) = &example.target_node_id {
                push(node_id.clone());
            }
            if let Some(layer) = example.target_layer {
                if layer == 0 {
                    return Err(ValidationError::InvalidField {
                        field: "target_layer".to_string(),
                        reason: "layers are numbered from 1".to_string(),
                    }
                    .into());
                }
                let ids = self.fleet.layer_node_ids(layer - 1).ok_or(DistributionError::LayerNotFound {
                    index: layer - 1,
                    layers: self.fleet.layer_count(),
                })?;
                if ids.is_empty() {
                    return Err(DistributionError::NoTargets.into());
                }
                ids.into_iter().for_each(&mut push);
            }
        }
        Ok(targets)
    }

    fn distribute(&mut self, rule: &Rule, targets: &[String]) -> LearnResult<Delivery> {
        let rule_id = rule.id.clone();
        if targets.is_empty() {
            let report = self
                .protocol
                .broadcast_global_rule(self.fleet.as_ref(), rule, PackageOperation::Add);
            return Ok(Delivery::Broadcast { rule_id, report });
        }
        let report =
            self.protocol
                .send_to_specific_nodes(self.fleet.as_ref(), rule, targets, PackageOperation::Add)?;
        Ok(Delivery::Targeted { rule_id, report })
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            governor: self.governor.stats(),
            distribution: self.protocol.stats(),
            entailment: self.entailment.statistics(),
        }
    }
}

impl std::fmt::Debug for LearningEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningEngine")
            .field("config", &self.config)
            .field("proposers", &self.proposers.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("rules", &self.governor.rules().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::{ExecutionNode, LayeredFleet, LocalNode, NodeStatus};
    use crate::expr::Expr;
    use crate::error::LearnError;
    use crate::governance::ContradictionResolution;
    use crate::rule::{condition, Applicability, IdentityTransform, RuleSource};

    fn distributive_examples() -> Vec<Example> {
        let dist = |a: &str, b: &str, c: &str| {
            Example::pair(
                Expr::mul(Expr::var(a), Expr::add(Expr::var(b), Expr::var(c))),
                Expr::add(
                    Expr::mul(Expr::var(a), Expr::var(b)),
                    Expr::mul(Expr::var(a), Expr::var(c)),
                ),
            )
        };
        vec![dist("a", "b", "c"), dist("x", "y", "z"), dist("p", "q", "r")]
    }

    fn engine(layers: usize, per_layer: usize) -> LearningEngine {
        LearningEngine::new(LearningConfig::default(), Arc::new(LayeredFleet::new(layers, per_layer)))
    }

    struct FixedProposer {
        ids: Vec<&'static str>,
    }

    impl RuleProposer for FixedProposer {
        fn name(&self) -> &str {
            "fixed"
        }

        fn propose(&mut self, _: &[Example], _: &[Example], context: &Context) -> Vec<Rule> {
            self.ids
                .iter()
                .enumerate()
                .map(|(i, id)| {
                    Rule::new(
                        *id,
                        condition(|_, _, _| Ok(Applicability::Applicable)),
                        Arc::new(IdentityTransform),
                        context.clone(),
                        20 + i as i32,
                    )
                    .with_source(RuleSource::Learned)
                })
                .collect()
        }
    }

    #[test]
    fn test_learn_govern_broadcast() {
        let mut engine = engine(2, 2);
        let report = engine.learn_from_examples(&distributive_examples()).unwrap();

        assert_eq!(report.rules_learned, 1);
        assert_eq!(report.rules_distributed, 4);
        assert_eq!(report.per_proposer["inverse_entailment"], ProposerReport { proposed: 1, accepted: 1 });
        assert_eq!(report.entailment.bottom_clauses_constructed, 1);
        assert!((0.0..=1.0).contains(&report.confidence_avg));

        // Same priority as the multiplicative identities, so the learned rule
        // is narrowed into a restricted subdomain.
        let acceptance = report.outcomes[0].acceptance().unwrap();
        assert!(matches!(acceptance.resolution, ContradictionResolution::Contextualized { .. }));

        match &report.deliveries[0] {
            Delivery::Broadcast { report, .. } => {
                assert_eq!(report.nodes_updated, 4);
                assert_eq!(report.total_nodes, 4);
            }
            other => panic!("expected broadcast, got {other:?}"),
        }
        assert_eq!(engine.stats().distribution.global_broadcasts, 1);
        assert_eq!(engine.stats().distribution.packages_sent, 4);
        assert_eq!(engine.stats().governor.global_rules, 8);
    }

    #[test]
    fn test_targets_from_examples() {
        let mut engine = engine(2, 3);
        let mut examples = distributive_examples();
        examples[0] = examples[0].clone().targeting_node("L1_C2");
        examples[1] = examples[1].clone().targeting_layer(2);
        examples[2] = examples[2].clone().targeting_node("L2_C0");

        let report = engine.learn_from_examples(&examples).unwrap();
        match &report.deliveries[0] {
            Delivery::Targeted { report, .. } => {
                let ids: Vec<&str> = report.details.iter().map(|d| d.node_id.as_str()).collect();
                assert_eq!(ids, vec!["L1_C2", "L2_C0", "L2_C1", "L2_C2"]);
                assert_eq!(report.successful, 4);
                assert!(report.details.iter().all(|d| d.receipt.status == NodeStatus::Added));
            }
            other => panic!("expected targeted send, got {other:?}"),
        }
        assert_eq!(report.rules_distributed, 4);

        let skipped = engine.fleet().get_node("L1_C0").unwrap();
        assert_eq!(skipped.rule_ids().len(), 7);
    }

    #[test]
    fn test_unknown_layer_learns_nothing() {
        let mut engine = engine(1, 1);
        let examples = vec![distributive_examples()[0].clone().targeting_layer(5)];
        let err = engine.learn_from_examples(&examples).unwrap_err();
        assert!(err.is_distribution());
        assert_eq!(engine.stats().governor.rules_processed, 0);

        let zero = vec![distributive_examples()[0].clone().targeting_layer(0)];
        assert!(engine.learn_from_examples(&zero).unwrap_err().is_validation());
    }

    #[test]
    fn test_empty_layer_learns_nothing() {
        let solo: Arc<dyn ExecutionNode> = Arc::new(LocalNode::new("solo", 1, 0));
        let fleet = LayeredFleet::from_layers(vec![vec![solo], Vec::new()]);
        let mut engine = LearningEngine::new(LearningConfig::default(), Arc::new(fleet));
        let examples = vec![distributive_examples()[0].clone().targeting_layer(2)];
        let err = engine.learn_from_examples(&examples).unwrap_err();
        assert!(matches!(err, LearnError::Distribution(DistributionError::NoTargets)));
        assert_eq!(engine.stats().governor.rules_processed, 0);
    }

    #[test]
    fn test_registered_proposers_run_after_entailment() {
        let mut engine = engine(1, 2);
        engine.register_proposer(Box::new(FixedProposer {
            ids: vec!["expand_terms", "factor_terms"],
        }));
        let report = engine.learn_from_examples(&distributive_examples()).unwrap();

        let fixed = report.per_proposer["fixed"];
        assert_eq!(fixed.proposed, 2);
        assert_eq!(fixed.accepted, 2);
        assert_eq!(report.rules_learned, 3);
        // factor_terms arrives at full confidence, above the scored
        // expand_terms, and replaces it.
        assert!(engine.governor().rule("expand_terms").is_none());
        assert!(engine.governor().rule("factor_terms").is_some());
        assert_eq!(report.deliveries.len(), 3);
    }

    #[test]
    fn test_no_examples() {
        let mut engine = engine(1, 1);
        let report = engine.learn_from_examples(&[]).unwrap();
        assert_eq!(report.rules_learned, 0);
        assert_eq!(report.confidence_avg, 0.0);
        assert!(report.deliveries.is_empty());
    }

    #[test]
    fn test_config_from_json() {
        let config = LearningConfig::from_json(
            r#"{"search": {"max_search_nodes": 50}, "governor": {"enhanced_scoring": false}}"#,
        )
        .unwrap();
        assert_eq!(config.search.max_search_nodes, 50);
        assert_eq!(config.search.beam_width, 10);
        assert!(!config.governor.enhanced_scoring);
        assert_eq!(config.default_context, Context::algebra());

        let err = LearningConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidConfig { .. }));
    }
}
