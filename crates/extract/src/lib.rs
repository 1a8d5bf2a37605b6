//! # Coderank Extract
//!
//! Feature extraction for code-context reranking.
//!
//! Two extractors share this crate:
//! - [`ComponentExtractor`] turns a raw code snippet into a [`CodeFeatures`]
//!   record (signature, control-flow counts, imports, calls, docstring).
//! - [`QueryIntentExtractor`] turns a natural-language or structured-doc
//!   query into a [`QueryIntent`] record of the same general shape.
//!
//! ## Architecture
//!
//! ```text
//! Snippet text
//!     │
//!     ├──> Tree-sitter Parsing → AST walk
//!     │        │ (syntax errors)
//!     │        └──> Regex fallback (same record shape, best effort)
//!     │
//!     └──> CodeFeatures { signature, counts, imports, calls, complexity }
//!
//! Query text
//!     │
//!     └──> QueryIntent { expected name/params, domain, complexity, steps }
//! ```
//!
//! Both extractors are infallible from the caller's point of view: a snippet
//! that defeats every parser still yields the default record.

mod components;
mod error;
mod extractor;
mod intent;
pub mod text;

pub use components::CodeFeatures;
pub use error::{ExtractError, Result};
pub use extractor::{extract_components, ComponentExtractor};
pub use intent::{Complexity, Domain, QueryIntent, QueryIntentExtractor, ReturnInfo};
