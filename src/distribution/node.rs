//! Execution nodes: the receiving end of rule packages.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core_rules::core_rules;
use crate::distribution::package::{PackageId, PackageOperation, RulePackage};
use crate::rule::Rule;

/// Per-node delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// The rule was new to the node.
    Added,
    /// An existing rule was replaced or deleted.
    Modified,
    /// The package was refused, usually for its signature.
    Rejected,
    /// The node or the target rule does not exist.
    NotFound,
    /// The operation is not one the node handles.
    UnknownOperation,
}

impl NodeStatus {
    /// Added or modified.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Added | Self::Modified)
    }
}

/// A node's answer to one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReceipt {
    /// Outcome.
    pub status: NodeStatus,
    /// Rule the package acted on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    /// Machine-readable refusal tag, e.g. `invalid_signature`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl NodeReceipt {
    /// A receipt for a package that was applied to `rule_id`.
    #[must_use]
    pub fn new(status: NodeStatus, rule_id: impl Into<String>) -> Self {
        Self {
            status,
            rule_id: Some(rule_id.into()),
            reason: None,
        }
    }

    /// A status with a reason and no rule id.
    #[must_use]
    pub fn refused(status: NodeStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            rule_id: None,
            reason: Some(reason.into()),
        }
    }

    /// Receipt for a node id that does not exist.
    #[must_use]
    pub fn node_not_found() -> Self {
        Self::refused(NodeStatus::NotFound, "node_not_found")
    }
}

/// A rule-executing node.
///
/// Implementations must check the package signature before touching their
/// rule store.
pub trait ExecutionNode: Send + Sync {
    fn node_id(&self) -> &str;

    /// Applies a rule package to the local rule store.
    fn receive_rule_package(&self, package: &RulePackage) -> NodeReceipt;

    /// Ids of the rules currently held, in application order.
    fn rule_ids(&self) -> Vec<String>;
}

/// One entry of a node's update log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// Package that caused the update.
    pub package_id: PackageId,
    /// Package creation time.
    pub timestamp: DateTime<Utc>,
    /// Operation that was applied.
    pub operation: PackageOperation,
    /// Rule the update acted on.
    pub rule_id: String,
}

/// In-process execution node with a locked local rule store.
#[derive(Debug)]
pub struct LocalNode {
    node_id: String,
    layer: usize,
    column: usize,
    rules: RwLock<Vec<Rule>>,
    update_log: RwLock<Vec<UpdateRecord>>,
}

impl LocalNode {
    /// Creates a node with an empty rule store.
    #[must_use]
    pub fn new(node_id: impl Into<String>, layer: usize, column: usize) -> Self {
        Self {
            node_id: node_id.into(),
            layer,
            column,
            rules: RwLock::new(Vec::new()),
            update_log: RwLock::new(Vec::new()),
        }
    }

    /// Creates a node holding the core rules.
    #[must_use]
    pub fn with_core_rules(node_id: impl Into<String>, layer: usize, column: usize) -> Self {
        let node = Self::new(node_id, layer, column);
        *node.rules.write().unwrap_or_else(PoisonError::into_inner) = core_rules();
        node
    }

    /// 1-based layer position.
    #[must_use]
    pub const fn layer(&self) -> usize {
        self.layer
    }

    /// 0-based column position.
    #[must_use]
    pub const fn column(&self) -> usize {
        self.column
    }

    /// Rules currently stored.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Confidence of a held rule.
    #[must_use]
    pub fn rule_confidence(&self, rule_id: &str) -> Option<f64> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        rules.iter().find(|r| r.id == rule_id).map(Rule::confidence)
    }

    /// Successful updates, oldest first.
    #[must_use]
    pub fn update_log(&self) -> Vec<UpdateRecord> {
        self.update_log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn log(&self, package: &RulePackage, rule_id: &str) {
        self.update_log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(UpdateRecord {
                package_id: package.id,
                timestamp: package.timestamp,
                operation: package.operation,
                rule_id: rule_id.to_string(),
            });
    }
}

impl ExecutionNode for LocalNode {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    fn receive_rule_package(&self, package: &RulePackage) -> NodeReceipt {
        if !package.has_valid_signature() {
            tracing::warn!(node_id = %self.node_id, package_id = %package.id, "invalid package signature");
            return NodeReceipt::refused(NodeStatus::Rejected, "invalid_signature");
        }

        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        let target = package.effective_target_rule().to_string();
        let position = rules.iter().position(|r| r.id == target);

        let receipt = match (package.operation, position) {
            (PackageOperation::Add, None) => {
                rules.push(package.rule.fresh_copy());
                NodeReceipt::new(NodeStatus::Added, &package.rule.id)
            }
            (PackageOperation::Add | PackageOperation::Modify, Some(i)) => {
                let mut slot = i;
                // A rename must not leave a second rule under the new id.
                if let Some(dup) = rules.iter().position(|r| r.id == package.rule.id).filter(|&j| j != i) {
                    rules.remove(dup);
                    if dup < slot {
                        slot -= 1;
                    }
                }
                rules[slot] = package.rule.fresh_copy();
                NodeReceipt::new(NodeStatus::Modified, &package.rule.id)
            }
            (PackageOperation::Delete, Some(i)) => {
                rules.remove(i);
                NodeReceipt::new(NodeStatus::Modified, &target)
            }
            (PackageOperation::Modify | PackageOperation::Delete, None) => NodeReceipt {
                status: NodeStatus::NotFound,
                rule_id: Some(target.clone()),
                reason: Some("rule_not_found".to_string()),
            },
        };
        drop(rules);

        if receipt.status.is_success() {
            self.log(package, &target);
        }
        tracing::debug!(
            node_id = %self.node_id,
            operation = %package.operation,
            rule_id = %target,
            status = ?receipt.status,
            "received rule package"
        );
        receipt
    }

    fn rule_ids(&self) -> Vec<String> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }
}
