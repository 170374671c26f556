use thiserror::Error;

/// Failures surfaced by graph evaluation.
///
/// These are distinct from a node legitimately computing an empty value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The node's compute function returned an error.
    #[error("node `{node}` failed to compute: {message}")]
    ComputeFailure { node: String, message: String },

    /// A dependency of `node` failed, so `node` was not computed.
    #[error("node `{node}` skipped because dependency `{failed}` failed")]
    Upstream { node: String, failed: String },

    /// A value was read back as a type it does not have.
    #[error("node `{node}` produced or received a value of an unexpected type")]
    TypeMismatch { node: String },

    /// A key that does not belong to this graph.
    #[error("unknown node id {0}")]
    UnknownNode(usize),

    /// A family was asked for a parameter it was not built with.
    #[error("family `{family}` has no node for {parameter}")]
    UnknownParameter { family: String, parameter: String },
}

impl GraphError {
    /// The node whose own computation failed, following upstream failures to their origin.
    pub fn origin(&self) -> Option<&str> {
        match self {
            GraphError::ComputeFailure { node, .. } => Some(node),
            GraphError::Upstream { failed, .. } => Some(failed),
            GraphError::TypeMismatch { node } => Some(node),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
