//! Error types for topology declaration

use thiserror::Error;

use crate::domain::{
    ComputeNodeError, LogicalId, LogicalIdError, NetworkError, ResourceKind, ResourceRef,
    ValidationError,
};

/// Errors that can occur while declaring a topology
///
/// Every variant is fatal at build time. Construction is deterministic, so
/// nothing here is ever worth retrying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// A declared entity points at a sibling that is not in the graph
    #[error("Unresolved reference from {from}: {target} is not declared")]
    UnresolvedReference { from: LogicalId, target: ResourceRef },

    /// A reference resolves, but to an entity of another kind
    #[error("Reference from {from} expects {target} but it is declared as {actual}")]
    KindMismatch {
        from: LogicalId,
        target: ResourceRef,
        actual: ResourceKind,
    },

    /// Two entities share a logical id
    #[error("Duplicate logical id: {0}")]
    DuplicateId(LogicalId),

    /// Logical id failed validation
    #[error("Invalid logical id: {0}")]
    InvalidId(#[from] LogicalIdError),

    /// Graph invariant violation
    #[error("Invariant violated: {0}")]
    Invariant(#[from] ValidationError),

    /// Network partitioning failed
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Compute node specification incomplete or invalid
    #[error("Compute node error: {0}")]
    ComputeNode(#[from] ComputeNodeError),

    /// Missing or inconsistent configuration input
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reference graph contains a cycle
    #[error("Dependency cycle among: {0:?}")]
    DependencyCycle(Vec<LogicalId>),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Reading configuration from disk failed
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;

impl From<serde_json::Error> for TopologyError {
    fn from(err: serde_json::Error) -> Self {
        TopologyError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for TopologyError {
    fn from(err: std::io::Error) -> Self {
        TopologyError::Io(err.to_string())
    }
}
