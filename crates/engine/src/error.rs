use thiserror::Error;

/// Result type for reranking operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can interrupt a rerank pipeline stage.
///
/// These never reach callers of `rerank`: the orchestrator catches them and
/// returns the contexts in whatever state the pipeline had produced.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The relationship-analysis stage failed
    #[error("Relationship analysis failed: {0}")]
    GraphError(#[from] coderank_callgraph::GraphError),
}
