use thiserror::Error;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur while setting up an extractor
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Tree-sitter grammar could not be loaded
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl ExtractError {
    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }
}
