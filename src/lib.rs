//! # KyroLearn - Rule Synthesis and Governance
//!
//! KyroLearn learns conditional rewrite rules from a handful of labelled
//! examples, vets every candidate before it is trusted, and ships the
//! accepted rules to a fleet of execution nodes.
//!
//! ## Core Concepts
//!
//! - **Inverse entailment**: bottom clause construction plus a compression-guided
//!   beam search over its refinement lattice
//! - **Governor**: the acceptance state machine (contradiction check, provability,
//!   confidence scoring, meta-pattern bookkeeping) that owns the global rule set
//! - **Rule package**: a signed rule update addressed to some or all nodes
//! - **Fleet**: layered execution nodes that apply packages to local rule stores
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kyrolearn::{Example, Expr, LayeredFleet, LearningConfig, LearningEngine};
//!
//! let fleet = Arc::new(LayeredFleet::new(3, 5));
//! let mut engine = LearningEngine::new(LearningConfig::default(), fleet);
//!
//! let examples = vec![
//!     Example::pair(Expr::mul(Expr::var("a"), Expr::num(1.0)), Expr::var("a")),
//!     Example::pair(Expr::mul(Expr::var("b"), Expr::num(1.0)), Expr::var("b")),
//! ];
//! let report = engine.learn_from_examples(&examples)?;
//! println!("learned {} rules", report.rules_learned);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod context;
pub mod error;
pub mod example;
pub mod expr;
pub mod rule;

// Learning
pub mod core_rules;
pub mod entailment;
pub mod proposer;

// Governance, distribution and the facade
pub mod distribution;
pub mod engine;
pub mod governance;

// Re-export primary types at crate root for convenience
pub use context::{Context, ContextBundle, Reference};
pub use core_rules::core_rules;
pub use error::{
    DistributionError, ExecutionError, LearnError, LearnResult, RuleError, ValidationError,
};
pub use example::{Example, Label};
pub use expr::Expr;
pub use rule::{Applicability, Rule, RulePredicate, RuleSource, RuleSummary, RuleTransform};

pub use entailment::{
    BottomClauseBuilder, Clause, EntailmentStats, HypothesisSearch, InverseEntailmentEngine,
    Literal, ModeDeclaration, SearchConfig, SearchOutcome,
};
pub use proposer::RuleProposer;

pub use distribution::{
    BroadcastReport, DistributionProtocol, ExecutionNode, LayeredFleet, LocalNode, NodeFleet,
    NodeReceipt, NodeStatus, PackageOperation, RulePackage, SignatureManager, TargetedReport,
};
pub use engine::{Delivery, EngineStats, LearningConfig, LearningEngine, LearningReport};
pub use governance::{
    classify, ConflictResult, ConflictType, ConfidenceScorer, ContradictionDetector,
    GovernanceOutcome, GovernorConfig, GovernorMailbox, MailboxConfig, Provability,
    ProvabilityEngine, RuleGovernor, RuleType,
};
