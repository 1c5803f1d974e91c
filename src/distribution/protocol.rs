//! Delivery of accepted rules to the fleet.

use serde::{Deserialize, Serialize};

use crate::distribution::fleet::{BroadcastReport, NodeDelivery, NodeFleet};
use crate::distribution::node::NodeReceipt;
use crate::distribution::package::{PackageOperation, RulePackage};
use crate::distribution::signature::SignatureManager;
use crate::error::DistributionError;
use crate::rule::Rule;

/// Result of a targeted send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetedReport {
    /// Targets that answered Added or Modified.
    pub successful: usize,
    /// Targets listed, found or not.
    pub total: usize,
    /// One entry per target, in request order.
    pub details: Vec<NodeDelivery>,
}

/// Distribution counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionStats {
    /// Packages handed to nodes. A broadcast counts once per fleet node.
    pub packages_sent: u64,
    /// Calls to [`DistributionProtocol::broadcast_global_rule`].
    pub global_broadcasts: u64,
    /// One-time signatures issued for targeted sends.
    pub signatures_issued: usize,
}

/// Signs rule packages and hands them to a fleet.
#[derive(Debug, Default)]
pub struct DistributionProtocol {
    signatures: SignatureManager,
    packages_sent: u64,
    global_broadcasts: u64,
}

impl DistributionProtocol {
    /// Creates a protocol with a fresh signature manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signatures issued so far.
    #[must_use]
    pub fn signatures(&self) -> &SignatureManager {
        &self.signatures
    }

    /// Sends one package signed with the global signature to every node.
    pub fn broadcast_global_rule(
        &mut self,
        fleet: &dyn NodeFleet,
        rule: &Rule,
        operation: PackageOperation,
    ) -> BroadcastReport {
        let package = RulePackage::new(self.signatures.global_signature(), rule.clone(), operation);
        let report = fleet.broadcast_to_all(&package);

        self.packages_sent += report.total_nodes as u64;
        self.global_broadcasts += 1;
        tracing::info!(
            rule_id = %rule.id,
            operation = %operation,
            nodes_updated = report.nodes_updated,
            total_nodes = report.total_nodes,
            "broadcast global rule"
        );
        report
    }

    /// Sends a freshly signed package to each listed node.
    ///
    /// Unknown ids are reported as `not_found` and do not stop the batch.
    /// An empty target list is an error.
    pub fn send_to_specific_nodes(
        &mut self,
        fleet: &dyn NodeFleet,
        rule: &Rule,
        node_ids: &[String],
        operation: PackageOperation,
    ) -> Result<TargetedReport, DistributionError> {
        if node_ids.is_empty() {
            return Err(DistributionError::NoTargets);
        }

        let mut details = Vec::with_capacity(node_ids.len());
        for node_id in node_ids {
            let receipt = match fleet.get_node(node_id) {
                Some(node) => {
                    let package = RulePackage::new(self.signatures.generate_one_time(), rule.clone(), operation)
                        .targeted(vec![node_id.clone()]);
                    self.packages_sent += 1;
                    node.receive_rule_package(&package)
                }
                None => {
                    tracing::warn!(node_id = %node_id, rule_id = %rule.id, "target node not found");
                    NodeReceipt::node_not_found()
                }
            };
            details.push(NodeDelivery {
                node_id: node_id.clone(),
                receipt,
            });
        }

        let report = TargetedReport {
            successful: details.iter().filter(|d| d.receipt.status.is_success()).count(),
            total: details.len(),
            details,
        };
        tracing::info!(
            rule_id = %rule.id,
            successful = report.successful,
            total = report.total,
            "sent rule to specific nodes"
        );
        Ok(report)
    }

    /// Sends to every node of layer `index` (0-based).
    pub fn send_to_layer(
        &mut self,
        fleet: &dyn NodeFleet,
        rule: &Rule,
        index: usize,
        operation: PackageOperation,
    ) -> Result<TargetedReport, DistributionError> {
        let node_ids = fleet.layer_node_ids(index).ok_or(DistributionError::LayerNotFound {
            index,
            layers: fleet.layer_count(),
        })?;
        self.send_to_specific_nodes(fleet, rule, &node_ids, operation)
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> DistributionStats {
        DistributionStats {
            packages_sent: self.packages_sent,
            global_broadcasts: self.global_broadcasts,
            signatures_issued: self.signatures.issued_count(),
        }
    }
}
