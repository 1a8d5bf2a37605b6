use crate::scorer::ScorerKind;
use coderank_extract::{Complexity, Domain, QueryIntent};
use serde::{Deserialize, Serialize};

/// Per-scorer blend weights.
///
/// An immutable configuration value: the orchestrator derives a fresh
/// adjusted copy for every rerank call and never mutates a scorer in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorerWeights {
    pub structure: f32,
    pub signature: f32,
    pub semantic: f32,
}

impl Default for ScorerWeights {
    fn default() -> Self {
        Self {
            structure: 1.2,
            signature: 1.8,
            semantic: 1.6,
        }
    }
}

impl ScorerWeights {
    /// Weight for one scorer
    #[must_use]
    pub const fn get(self, kind: ScorerKind) -> f32 {
        match kind {
            ScorerKind::Structure => self.structure,
            ScorerKind::Signature => self.signature,
            ScorerKind::Semantic => self.semantic,
        }
    }

    /// Derive the effective weights for one query.
    ///
    /// Adjustments are additive on top of the base weights: query domain,
    /// complexity label, and word count each contribute independently.
    #[must_use]
    pub fn adjusted_for(self, query: &str, intent: &QueryIntent) -> Self {
        let mut adjusted = self;

        match intent.domain {
            Domain::FileIo => {
                adjusted.signature += 0.2;
                adjusted.semantic += 0.1;
            }
            Domain::StringProcessing | Domain::DataStructures => {
                adjusted.structure += 0.2;
            }
            Domain::ErrorHandling => {
                adjusted.structure += 0.1;
                adjusted.signature += 0.1;
            }
            Domain::Algorithms => {
                adjusted.structure += 0.3;
                adjusted.semantic += 0.1;
            }
            _ => {}
        }

        match intent.complexity {
            Complexity::High => {
                adjusted.structure += 0.2;
                adjusted.semantic += 0.1;
            }
            Complexity::Low => {
                adjusted.signature += 0.2;
            }
            Complexity::Medium => {}
        }

        let query_words = query.split_whitespace().count();
        if query_words > 50 {
            adjusted.semantic += 0.2;
        } else if query_words < 20 {
            adjusted.signature += 0.1;
        }

        adjusted
    }
}
