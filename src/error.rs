//! Error types for kyrolearn.
//!
//! Expected negative outcomes (no hypothesis found, rejected candidate,
//! missing node) are values, not errors. The types here cover malformed
//! input and broken infrastructure only.

use thiserror::Error;

/// Validation errors that occur during input validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Rule id cannot be empty")]
    EmptyRuleId,

    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        field: String,
        reason: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Errors raised by user-supplied rule callables.
///
/// These never escape a [`Rule`](crate::rule::Rule): the invocation
/// boundary downgrades them to `Undefined` or a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("Expression shape not supported: {reason}")]
    UnsupportedShape {
        reason: String,
    },

    #[error("Rule callable failed: {message}")]
    Failed {
        message: String,
    },
}

impl RuleError {
    /// Creates a generic callable failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Execution errors that occur while driving the governor.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Governor mailbox is full (capacity: {capacity})")]
    MailboxFull {
        capacity: usize,
    },

    #[error("Governor mailbox is disconnected")]
    Disconnected,

    #[error("Governor reply timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Failed to spawn governor worker: {message}")]
    WorkerSpawn {
        message: String,
    },
}

/// Distribution errors for rule package delivery.
#[derive(Debug, Error)]
pub enum DistributionError {
    #[error("Layer {index} not found (fleet has {layers} layers)")]
    LayerNotFound {
        index: usize,
        layers: usize,
    },

    #[error("Target node list is empty")]
    NoTargets,
}

/// Top-level error type for kyrolearn.
#[derive(Debug, Error)]
pub enum LearnError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),
}

impl LearnError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is a distribution error.
    #[must_use]
    pub const fn is_distribution(&self) -> bool {
        matches!(self, Self::Distribution(_))
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::MailboxFull { .. }))
    }
}

/// Result type alias for kyrolearn operations.
pub type LearnResult<T> = Result<T, LearnError>;
