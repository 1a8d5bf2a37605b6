//! # Coderank Callgraph
//!
//! Function relationship analysis for one batch of code snippets.
//!
//! The analyzer builds a directed call graph restricted to functions defined
//! somewhere in the batch (a call to an outside name is not an edge), then
//! classifies every function as main, helper, utility, or general from its
//! position in the graph and the size of its body. The classification feeds
//! a small score adjustment applied by the reranking pipeline.
//!
//! The graph is scoped to one analysis: nothing persists across batches.

mod builder;
mod error;
mod roles;
mod types;

pub use builder::GraphBuilder;
pub use error::{GraphError, Result};
pub use roles::RelationshipAnalyzer;
pub use types::{CallGraph, FunctionNode, FunctionRole, FunctionSignature};
