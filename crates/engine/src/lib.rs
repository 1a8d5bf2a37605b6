//! # Coderank Engine
//!
//! Multi-signal reranking for retrieved code contexts.
//!
//! Given a query and a sequence of retrieved snippets, the engine re-orders
//! the snippets so the one most likely to satisfy the query ranks first.
//! Every signal is explainable: each context carries its per-scorer raw
//! scores and every named boost it received.
//!
//! ## Pipeline
//!
//! ```text
//! contexts + query
//!     │
//!     ├──> Feature extraction (extract if missing) + name-match boost
//!     ├──> Per-query weight adjustment (domain, complexity, length)
//!     ├──> Structure → Signature → Semantic scorers, in order
//!     ├──> Call-graph role adjustment (main +0.1, helper −0.05)
//!     ├──> Min-max normalization
//!     ├──> Quality + domain-lexicon heuristics
//!     └──> Stable sort by final_score, descending
//! ```
//!
//! Any stage failure is caught at the pipeline boundary and the contexts
//! are returned in the state they had reached; nothing here is fatal to
//! the host process.
//!
//! ## Example
//!
//! ```rust
//! use coderank_engine::{CombinedReranker, Context};
//!
//! let reranker = CombinedReranker::new();
//! let contexts = vec![
//!     Context::new("1", 0.5, "def read_file(path):\n    return open(path).read()\n"),
//!     Context::new("2", 0.9, "def compute_sum(a, b):\n    return a + b\n"),
//! ];
//!
//! let ranked = reranker.rerank("def read_file(path):", contexts, None, None);
//! assert_eq!(ranked[0].id, "1");
//! ```

mod context;
mod error;
mod heuristics;
mod pipeline;
mod scorer;
mod semantic;
mod signature;
mod structure;
mod weights;

pub use context::{Context, PreviousScores};
pub use error::{EngineError, Result};
pub use pipeline::CombinedReranker;
pub use scorer::{Scorer, ScorerKind, ScoringRefs};
pub use semantic::{compute_semantic_similarity, SemanticScorer};
pub use signature::{compute_signature_similarity, SignatureScorer};
pub use structure::{compute_structure_similarity, StructureScorer};
pub use weights::ScorerWeights;
