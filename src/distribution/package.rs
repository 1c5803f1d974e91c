//! Rule packages, the unit of distribution.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::Context;
use crate::distribution::signature::SignatureManager;
use crate::rule::Rule;

/// Unique identifier for a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(Uuid);

impl PackageId {
    /// Creates a new random package ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PackageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the receiving node should do with the packaged rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageOperation {
    #[default]
    /// Store the rule, replacing one with the same id.
    Add,
    /// Replace the target rule.
    Modify,
    /// Remove the target rule.
    Delete,
}

impl fmt::Display for PackageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Modify => "modify",
            Self::Delete => "delete",
        })
    }
}

/// Default `source` tag of packages built by the distribution protocol.
pub const GOVERNOR_SOURCE: &str = "governor";

/// A signed rule update addressed to some or all execution nodes.
#[derive(Debug, Clone)]
pub struct RulePackage {
    /// Unique package id.
    pub id: PackageId,
    /// Prefixed with `sig_` or `GLOBAL_SIG_`.
    pub signature: String,
    /// `None` means broadcast.
    pub target_node_ids: Option<Vec<String>>,
    /// Context of the packaged rule.
    pub target_context: Context,
    /// Rule to add, or replacement for modify.
    pub rule: Rule,
    /// What the receiver should do.
    pub operation: PackageOperation,
    /// Priority of the packaged rule.
    pub priority: i32,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Rule to modify or delete. Defaults to the packaged rule's id.
    pub target_rule_id: Option<String>,
    /// Sender tag, [`GOVERNOR_SOURCE`] for packages built here.
    pub source: String,
    /// Free-form annotations.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl RulePackage {
    /// Creates a broadcast package for `rule`, inheriting its domain and
    /// priority. `signature` must carry a recognized prefix.
    #[must_use]
    pub fn new(signature: impl Into<String>, rule: Rule, operation: PackageOperation) -> Self {
        let signature = signature.into();
        debug_assert!(
            SignatureManager::is_valid(&signature),
            "package signature {signature:?} has no recognized prefix"
        );
        Self {
            id: PackageId::new(),
            signature,
            target_node_ids: None,
            target_context: rule.domain.clone(),
            priority: rule.priority,
            rule,
            operation,
            timestamp: Utc::now(),
            target_rule_id: None,
            source: GOVERNOR_SOURCE.to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Addresses the package to specific nodes.
    #[must_use]
    pub fn targeted(mut self, node_ids: Vec<String>) -> Self {
        self.target_node_ids = Some(node_ids);
        self
    }

    /// Names the rule a modify/delete applies to.
    #[must_use]
    pub fn with_target_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.target_rule_id = Some(rule_id.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// True when no target list is set.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.target_node_ids.is_none()
    }

    /// True when the target list names at least one node.
    #[must_use]
    pub fn is_targeted(&self) -> bool {
        self.target_node_ids.as_ref().is_some_and(|ids| !ids.is_empty())
    }

    /// The rule id a modify/delete should act on.
    #[must_use]
    pub fn effective_target_rule(&self) -> &str {
        self.target_rule_id.as_deref().unwrap_or(&self.rule.id)
    }

    /// Prefix check of the signature.
    #[must_use]
    pub fn has_valid_signature(&self) -> bool {
        SignatureManager::is_valid(&self.signature)
    }
}
