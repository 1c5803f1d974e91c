//! Candidate rule governance.
//!
//! Candidates pass through contradiction detection, provability
//! classification, confidence scoring and meta-pattern bookkeeping before
//! the [`RuleGovernor`] commits them to the global rule set. The
//! [`GovernorMailbox`] serializes access when several threads learn at once.

pub mod classify;
pub mod confidence;
pub mod contradiction;
pub mod governor;
pub mod mailbox;
pub mod meta_pattern;
pub mod provability;

pub use classify::{classify, RuleType};
pub use confidence::{
    source_adjustment, ComponentScores, ConfidenceBreakdown, ConfidenceScorer, PerformanceRecord,
    ScoringRecord, ScoringWeights,
};
pub use contradiction::{ConflictResult, ConflictType, ContradictionDetector};
pub use governor::{
    Acceptance, ContradictionResolution, EscalationAdvice, GovernanceOutcome, GovernorConfig,
    GovernorState, GovernorStats, RejectionReason, RuleGovernor,
};
pub use mailbox::{GovernorMailbox, MailboxConfig, PendingOutcome};
pub use meta_pattern::{MetaPatternLog, MetaPatternObservation, MetaPatternRecord};
pub use provability::{Provability, ProvabilityEngine};
