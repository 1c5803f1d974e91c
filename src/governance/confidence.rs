//! Multi-factor confidence scoring.
//!
//! A candidate's trust score is a weighted sum of five components, scaled by
//! a per-source adjustment and clamped to `[0.0, 1.0]`:
//!
//! | component   | weight |
//! |-------------|--------|
//! | provability | 0.30   |
//! | consistency | 0.25   |
//! | support     | 0.20   |
//! | performance | 0.15   |
//! | complexity  | 0.10   |

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::governance::contradiction::{ConflictType, ContradictionDetector};
use crate::governance::provability::Provability;
use crate::rule::{Rule, RuleSource};

/// Component weights. Always sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight of the provability component.
    pub provability: f64,
    /// Weight of the consistency component.
    pub consistency: f64,
    /// Weight of the support component.
    pub support: f64,
    /// Weight of the performance component.
    pub performance: f64,
    /// Weight of the complexity component.
    pub complexity: f64,
}

impl ScoringWeights {
    /// The fixed weight table.
    pub const STANDARD: Self = Self {
        provability: 0.30,
        consistency: 0.25,
        support: 0.20,
        performance: 0.15,
        complexity: 0.10,
    };
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Raw component scores, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    /// From the provability verdict.
    pub provability: f64,
    /// Penalized by conflicts with existing rules.
    pub consistency: f64,
    /// Mean confidence of similar existing rules.
    pub support: f64,
    /// Observed success rate, 0.5 without history.
    pub performance: f64,
    /// Simpler rules score higher.
    pub complexity: f64,
}

impl ComponentScores {
    fn weighted(&self, w: &ScoringWeights) -> f64 {
        self.provability * w.provability
            + self.consistency * w.consistency
            + self.support * w.support
            + self.performance * w.performance
            + self.complexity * w.complexity
    }
}

/// Result of scoring one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    /// Adjusted and clamped score.
    pub final_score: f64,
    /// The provability component on its own.
    pub base_score: f64,
    /// Provability component relative to the neutral 0.5.
    pub provability_boost: f64,
    /// Weighted consistency contribution.
    pub consistency_boost: f64,
    /// Source multiplier that was applied.
    pub source_adjustment: f64,
    /// Raw component scores.
    pub components: ComponentScores,
    /// Weights that were applied.
    pub weights: ScoringWeights,
}

/// One entry of the scoring history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRecord {
    /// Scored rule.
    pub rule_id: String,
    /// Final score.
    pub score: f64,
    /// Raw component scores.
    pub components: ComponentScores,
}

/// Success counts observed for one rule id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Successful applications.
    pub success: u64,
    /// All recorded applications.
    pub total: u64,
}

impl PerformanceRecord {
    /// Success fraction, `None` before the first observation.
    #[must_use]
    pub fn success_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.success as f64 / self.total as f64)
    }
}

/// Multiplier applied to the weighted score for each source tag.
#[must_use]
pub fn source_adjustment(source: &RuleSource) -> f64 {
    match source {
        RuleSource::Derived => 1.1,
        RuleSource::Learned => 0.95,
        RuleSource::Empirical => 0.9,
        RuleSource::PatternRecognition => 1.0,
        RuleSource::SymbolicRegression => 0.95,
        RuleSource::SynthesizedPattern => 1.0,
        RuleSource::SynthesizedInductive => 0.9,
        RuleSource::SynthesizedAnalogy => 0.85,
        RuleSource::SimpleExtraction => 0.8,
        RuleSource::InverseEntailment => 1.15,
        RuleSource::Manual => 1.2,
        RuleSource::Core => 1.3,
        RuleSource::Hardcoded | RuleSource::Other(_) => 1.0,
    }
}

const MAX_COUNTED_SIMILAR: f64 = 5.0;
const SIMILAR_DOMAIN: f64 = 0.5;
const SIMILAR_TOKENS: f64 = 0.3;
const FULL_SAMPLE: f64 = 10.0;

/// Scores rules and tracks their runtime performance.
#[derive(Debug, Default, Clone)]
pub struct ConfidenceScorer {
    weights: ScoringWeights,
    detector: ContradictionDetector,
    history: Vec<ScoringRecord>,
    performance: HashMap<String, PerformanceRecord>,
}

impl ConfidenceScorer {
    /// Creates a scorer with the standard weights.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active weights.
    #[must_use]
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Scores `rule` against `existing` and records the result in history.
    ///
    /// `provability` of `None` is treated as unknown.
    pub fn score_rule<'a, I>(
        &mut self,
        rule: &Rule,
        existing: I,
        provability: Option<Provability>,
    ) -> ConfidenceBreakdown
    where
        I: IntoIterator<Item = &'a Rule> + Clone,
    {
        let components = ComponentScores {
            provability: provability_score(provability),
            consistency: self.consistency_score(rule, existing.clone()),
            support: support_score(rule, existing),
            performance: self.performance_score(&rule.id),
            complexity: complexity_score(rule),
        };

        let adjustment = source_adjustment(&rule.source);
        let final_score = (components.weighted(&self.weights) * adjustment).clamp(0.0, 1.0);

        self.history.push(ScoringRecord {
            rule_id: rule.id.clone(),
            score: final_score,
            components,
        });

        ConfidenceBreakdown {
            final_score,
            base_score: components.provability,
            provability_boost: components.provability - 0.5,
            consistency_boost: components.consistency * self.weights.consistency,
            source_adjustment: adjustment,
            components,
            weights: self.weights,
        }
    }

    /// Records one application outcome for `rule_id`.
    pub fn update_performance(&mut self, rule_id: &str, success: bool) {
        let record = self.performance.entry(rule_id.to_string()).or_default();
        record.total += 1;
        if success {
            record.success += 1;
        }
    }

    /// Recorded performance for `rule_id`, if any.
    #[must_use]
    pub fn performance_of(&self, rule_id: &str) -> Option<PerformanceRecord> {
        self.performance.get(rule_id).copied()
    }

    /// Every score produced so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ScoringRecord] {
        &self.history
    }

    fn consistency_score<'a>(&self, rule: &Rule, existing: impl IntoIterator<Item = &'a Rule>) -> f64 {
        let mut total = 0usize;
        let mut conflicts = 0usize;
        let mut supports = 0usize;
        for other in existing {
            total += 1;
            match self.detector.detect(rule, other).conflict_type {
                ConflictType::DirectNegation => conflicts += 1,
                ConflictType::SpecialGeneral => supports += 1,
                ConflictType::ContextOverlap | ConflictType::None => {}
            }
        }

        if total == 0 {
            return 0.5;
        }
        let total = total as f64;
        if conflicts > 0 {
            0.3 * (1.0 - conflicts as f64 / total)
        } else {
            0.5 + 0.5 * (supports as f64 / total)
        }
    }

    fn performance_score(&self, rule_id: &str) -> f64 {
        let Some(record) = self.performance.get(rule_id) else {
            return 0.5;
        };
        let Some(rate) = record.success_rate() else {
            return 0.5;
        };
        let sample = (record.total as f64 / FULL_SAMPLE).min(1.0);
        rate * sample + 0.5 * (1.0 - sample)
    }
}

fn provability_score(provability: Option<Provability>) -> f64 {
    match provability {
        Some(Provability::Provable) => 1.0,
        Some(Provability::Heuristic) => 0.7,
        Some(Provability::Unprovable) => 0.2,
        None => 0.5,
    }
}

fn support_score<'a>(rule: &Rule, existing: impl IntoIterator<Item = &'a Rule>) -> f64 {
    let similar: Vec<&Rule> = existing.into_iter().filter(|other| are_similar(rule, other)).collect();
    if similar.is_empty() {
        return 0.3;
    }

    let n = similar.len() as f64;
    let presence = (n / MAX_COUNTED_SIMILAR).min(1.0);
    let avg_confidence = similar.iter().map(|r| r.confidence()).sum::<f64>() / n;
    let same_domain = similar
        .iter()
        .filter(|r| r.domain.domain == rule.domain.domain)
        .count() as f64
        / n;

    (presence * 0.4 + avg_confidence * 0.4 + same_domain * 0.2).min(1.0)
}

fn id_tokens(id: &str) -> BTreeSet<String> {
    id.to_lowercase()
        .split('_')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard overlap of `_`-separated id tokens.
fn token_overlap(a: &str, b: &str) -> f64 {
    let (a, b) = (id_tokens(a), id_tokens(b));
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

fn are_similar(a: &Rule, b: &Rule) -> bool {
    a.domain.similarity(&b.domain) >= SIMILAR_DOMAIN && token_overlap(&a.id, &b.id) > SIMILAR_TOKENS
}

fn complexity_score(rule: &Rule) -> f64 {
    // Negative priorities count as zero.
    let priority = (f64::from(rule.priority) / 10.0).max(0.0);
    let features = (rule.domain.features.len() as f64 / 5.0).min(1.0);
    let id_length = (rule.id.chars().count() as f64 / 50.0).min(1.0);
    let avg = (priority + features + id_length) / 3.0;
    (-2.0 * avg).exp()
}
