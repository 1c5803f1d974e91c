//! Layered fleets of execution nodes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::distribution::node::{ExecutionNode, LocalNode, NodeReceipt};
use crate::distribution::package::RulePackage;

/// One node's receipt inside a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDelivery {
    /// Node the package was addressed to.
    pub node_id: String,
    /// The node's answer.
    pub receipt: NodeReceipt,
}

/// Result of broadcasting a package to every node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    /// Nodes that answered Added or Modified.
    pub nodes_updated: usize,
    /// Nodes in the fleet.
    pub total_nodes: usize,
    /// One entry per node, layer by layer.
    pub details: Vec<NodeDelivery>,
}

/// Node registry, organised in layers.
pub trait NodeFleet: Send + Sync {
    fn get_node(&self, node_id: &str) -> Option<Arc<dyn ExecutionNode>>;

    fn layer_count(&self) -> usize;

    /// Node ids of layer `index` (0-based), or `None` if out of range.
    fn layer_node_ids(&self, index: usize) -> Option<Vec<String>>;

    /// Every node id, layer by layer.
    fn node_ids(&self) -> Vec<String> {
        (0..self.layer_count())
            .filter_map(|i| self.layer_node_ids(i))
            .flatten()
            .collect()
    }

    /// Delivers `package` to every node.
    fn broadcast_to_all(&self, package: &RulePackage) -> BroadcastReport {
        let details: Vec<NodeDelivery> = self
            .node_ids()
            .into_iter()
            .map(|node_id| {
                let receipt = self
                    .get_node(&node_id)
                    .map_or_else(NodeReceipt::node_not_found, |node| node.receive_rule_package(package));
                NodeDelivery { node_id, receipt }
            })
            .collect();

        BroadcastReport {
            nodes_updated: details.iter().filter(|d| d.receipt.status.is_success()).count(),
            total_nodes: details.len(),
            details,
        }
    }
}

/// In-process fleet, layers stored in order.
pub struct LayeredFleet {
    layers: Vec<Vec<Arc<dyn ExecutionNode>>>,
}

impl LayeredFleet {
    /// Builds `num_layers` layers of `nodes_per_layer` [`LocalNode`]s seeded
    /// with the core rules. Node ids are `L{layer}_C{column}`, layers counted
    /// from 1 and columns from 0.
    #[must_use]
    pub fn new(num_layers: usize, nodes_per_layer: usize) -> Self {
        let layers = (1..=num_layers)
            .map(|layer| {
                (0..nodes_per_layer)
                    .map(|column| {
                        Arc::new(LocalNode::with_core_rules(format!("L{layer}_C{column}"), layer, column))
                            as Arc<dyn ExecutionNode>
                    })
                    .collect()
            })
            .collect();
        Self { layers }
    }

    /// Wraps caller-built layers.
    #[must_use]
    pub fn from_layers(layers: Vec<Vec<Arc<dyn ExecutionNode>>>) -> Self {
        Self { layers }
    }

    /// Nodes across all layers.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }
}

impl std::fmt::Debug for LayeredFleet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredFleet")
            .field("layers", &self.layers.len())
            .field("nodes", &self.node_count())
            .finish()
    }
}

impl NodeFleet for LayeredFleet {
    fn get_node(&self, node_id: &str) -> Option<Arc<dyn ExecutionNode>> {
        self.layers
            .iter()
            .flatten()
            .find(|node| node.node_id() == node_id)
            .cloned()
    }

    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn layer_node_ids(&self, index: usize) -> Option<Vec<String>> {
        self.layers
            .get(index)
            .map(|layer| layer.iter().map(|n| n.node_id().to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::distribution::node::NodeStatus;
    use crate::distribution::package::PackageOperation;
    use crate::rule::{condition, Applicability, IdentityTransform, Rule};

    fn package(signature: &str) -> RulePackage {
        let rule = Rule::new(
            "learned",
            condition(|_, _, _| Ok(Applicability::Applicable)),
            Arc::new(IdentityTransform),
            Context::algebra(),
            9,
        );
        RulePackage {
            signature: signature.to_string(),
            ..RulePackage::new("sig_0", rule, PackageOperation::Add)
        }
    }

    #[test]
    fn test_node_ids_are_layer_major() {
        let fleet = LayeredFleet::new(2, 2);
        assert_eq!(fleet.layer_count(), 2);
        assert_eq!(fleet.node_ids(), vec!["L1_C0", "L1_C1", "L2_C0", "L2_C1"]);
        assert_eq!(fleet.layer_node_ids(1).unwrap(), vec!["L2_C0", "L2_C1"]);
        assert!(fleet.layer_node_ids(2).is_none());
        assert!(fleet.get_node("L2_C1").is_some());
        assert!(fleet.get_node("L3_C0").is_none());
    }

    #[test]
    fn test_broadcast_reaches_every_node() {
        let fleet = LayeredFleet::new(2, 2);
        let report = fleet.broadcast_to_all(&package("GLOBAL_SIG_abc"));
        assert_eq!(report.nodes_updated, 4);
        assert_eq!(report.total_nodes, 4);
        assert!(report.details.iter().all(|d| d.receipt.status == NodeStatus::Added));
        let node = fleet.get_node("L1_C0").unwrap();
        assert!(node.rule_ids().contains(&"learned".to_string()));
    }

    #[test]
    fn test_broadcast_with_invalid_signature_updates_nothing() {
        let fleet = LayeredFleet::new(1, 3);
        let report = fleet.broadcast_to_all(&package("nope"));
        assert_eq!(report.nodes_updated, 0);
        assert_eq!(report.total_nodes, 3);
    }

    #[test]
    fn test_empty_fleet() {
        let fleet = LayeredFleet::new(0, 4);
        let report = fleet.broadcast_to_all(&package("sig_1"));
        assert_eq!(report.total_nodes, 0);
        assert_eq!(fleet.node_count(), 0);
    }
}
