//! Signed delivery of accepted rules to execution nodes.

pub mod fleet;
pub mod node;
pub mod package;
pub mod protocol;
pub mod signature;

pub use fleet::{BroadcastReport, LayeredFleet, NodeDelivery, NodeFleet};
pub use node::{ExecutionNode, LocalNode, NodeReceipt, NodeStatus, UpdateRecord};
pub use package::{PackageId, PackageOperation, RulePackage, GOVERNOR_SOURCE};
pub use protocol::{DistributionProtocol, DistributionStats, TargetedReport};
pub use signature::SignatureManager;
