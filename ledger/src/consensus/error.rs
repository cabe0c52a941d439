use thiserror::Error;

use crate::types::NodeId;

/// Errors returned by the RSC ranking and tip distribution engine.
#[derive(Debug, Error, PartialEq)]
pub enum RscError {
    /// Empty node set, negative totals and the like.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// A node with the same id is already registered.
    #[error("node {0} is already registered")]
    DuplicateNode(NodeId),
    /// No node with this id is registered.
    #[error("node {0} is not registered")]
    UnknownNode(NodeId),
}
