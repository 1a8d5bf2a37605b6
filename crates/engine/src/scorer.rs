use crate::context::Context;
use coderank_extract::{CodeFeatures, QueryIntent};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identity of a scoring strategy; the key of the weight mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    Structure,
    Signature,
    Semantic,
}

impl ScorerKind {
    /// Human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Signature => "signature",
            Self::Semantic => "semantic",
        }
    }
}

/// Reference material a scorer compares each context against
#[derive(Debug, Clone, Copy)]
pub struct ScoringRefs<'a> {
    /// The raw query text
    pub query: &'a str,

    /// Intent extracted from (or provided with) the query
    pub intent: &'a QueryIntent,

    /// Reference features of the expected answer
    pub answer: &'a CodeFeatures,
}

/// A single scoring strategy producing a raw score in [0, 1].
///
/// Scorers are stateless and independently callable: they read
/// `ctx.components` (extracting on demand when absent) and never depend on
/// another scorer having run first.
pub trait Scorer {
    /// Which strategy this is, for weight lookup and score recording
    fn kind(&self) -> ScorerKind;

    /// Raw similarity of one context against the reference material
    fn score(&self, ctx: &mut Context, refs: &ScoringRefs<'_>) -> f32;
}

/// Count-pair similarity: `1 - |a-b| / max(a,b)`; two zeros match perfectly
#[must_use]
pub(crate) fn count_similarity(a: f32, b: f32) -> f32 {
    let max = a.max(b);
    if max > 0.0 {
        1.0 - (a - b).abs() / max
    } else {
        1.0
    }
}

/// Set-pair similarity: overlap measured against the reference set size.
/// Two empty sets match perfectly; a populated candidate against an empty
/// reference does not.
#[must_use]
pub(crate) fn set_similarity(candidate: &HashSet<&str>, reference: &HashSet<&str>) -> f32 {
    if reference.is_empty() {
        return if candidate.is_empty() { 1.0 } else { 0.0 };
    }
    candidate.intersection(reference).count() as f32 / reference.len() as f32
}
