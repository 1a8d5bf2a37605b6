use thiserror::Error;

/// Result type for call-graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur while building a call graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// Tree-sitter grammar could not be loaded
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl GraphError {
    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }
}
