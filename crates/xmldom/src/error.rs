//! Error types for tree operations
//!
//! Simple, flat error hierarchy. Misses are `Option`s, not errors.

use crate::types::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("Namespace error: prefixed name '{qualified_name}' requires a non-null namespace")]
    NamespaceConstraint { qualified_name: String },

    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Maximum tree depth exceeded: {current} > {max}")]
    MaxDepthExceeded { current: usize, max: usize },

    #[error("Nodes {0} and {1} have no common orderable root")]
    UnorderableNodes(NodeId, NodeId),

    #[error("Arena is full: {0} slots allocated")]
    ArenaFull(usize),
}

impl DomError {
    pub(crate) fn invalid_type(expected: &str, actual: impl std::fmt::Debug) -> Self {
        DomError::InvalidNodeType {
            expected: expected.to_string(),
            actual: format!("{:?}", actual),
        }
    }
}
