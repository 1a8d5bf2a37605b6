use crate::context::Context;
use crate::error::Result;
use crate::heuristics;
use crate::scorer::{Scorer, ScoringRefs};
use crate::semantic::SemanticScorer;
use crate::signature::SignatureScorer;
use crate::structure::StructureScorer;
use crate::weights::ScorerWeights;
use coderank_callgraph::RelationshipAnalyzer;
use coderank_extract::{CodeFeatures, QueryIntent, QueryIntentExtractor};
use std::cmp::Ordering;

/// Multi-signal reranker for retrieved code contexts.
///
/// Runs the structure, signature, and semantic scorers in order with
/// per-query weights, adjusts for call-graph roles, normalizes, applies
/// quality and domain heuristics, and sorts. The pipeline is synchronous
/// and holds no state across calls, so one instance can serve any number
/// of queries; independent queries may be processed on separate instances
/// in parallel.
pub struct CombinedReranker {
    intent_extractor: QueryIntentExtractor,
    scorers: Vec<Box<dyn Scorer>>,
    base_weights: ScorerWeights,
}

impl CombinedReranker {
    /// Create a reranker with the default scorer sequence and base weights
    #[must_use]
    pub fn new() -> Self {
        Self::with_weights(ScorerWeights::default())
    }

    /// Create a reranker with custom base weights
    #[must_use]
    pub fn with_weights(base_weights: ScorerWeights) -> Self {
        Self {
            intent_extractor: QueryIntentExtractor::new(),
            scorers: vec![
                Box::new(StructureScorer),
                Box::new(SignatureScorer),
                Box::new(SemanticScorer),
            ],
            base_weights,
        }
    }

    /// Base weights before per-query adjustment
    #[must_use]
    pub const fn base_weights(&self) -> ScorerWeights {
        self.base_weights
    }

    /// Rerank contexts for one query.
    ///
    /// `intent` and `answer` may be precomputed by the caller; when absent
    /// the intent is derived from the query and the reference features from
    /// the top retrieved context. A stage failure degrades gracefully: the
    /// contexts come back in whatever state the pipeline had reached.
    #[must_use]
    pub fn rerank(
        &self,
        query: &str,
        mut contexts: Vec<Context>,
        intent: Option<&QueryIntent>,
        answer: Option<&CodeFeatures>,
    ) -> Vec<Context> {
        let derived_intent;
        let intent = match intent {
            Some(intent) => intent,
            None => {
                derived_intent = self.intent_extractor.extract_intent(query);
                &derived_intent
            }
        };

        if let Err(err) = self.run_stages(query, &mut contexts, intent, answer) {
            log::warn!("Rerank pipeline degraded, returning best-effort order: {err}");
        }

        contexts
    }

    fn run_stages(
        &self,
        query: &str,
        contexts: &mut Vec<Context>,
        intent: &QueryIntent,
        answer: Option<&CodeFeatures>,
    ) -> Result<()> {
        prepare_contexts(contexts, intent);

        let derived_answer;
        let answer = match answer {
            Some(answer) => answer,
            None => {
                derived_answer = contexts
                    .first()
                    .and_then(|ctx| ctx.components.clone())
                    .unwrap_or_default();
                &derived_answer
            }
        };

        let weights = self.base_weights.adjusted_for(query, intent);
        log::debug!(
            "Effective weights: structure={:.2} signature={:.2} semantic={:.2}",
            weights.structure,
            weights.signature,
            weights.semantic
        );

        let refs = ScoringRefs {
            query,
            intent,
            answer,
        };
        for scorer in &self.scorers {
            let weight = weights.get(scorer.kind());
            for ctx in contexts.iter_mut() {
                let raw = scorer.score(ctx, &refs);
                ctx.record_score(scorer.kind(), raw);
                ctx.final_score += weight * raw;
            }
        }

        apply_role_adjustments(contexts)?;
        normalize_scores(contexts);

        heuristics::apply_quality_boosts(contexts, intent);
        heuristics::apply_query_adjustments(contexts, query, intent);

        // stable: ties keep their prior relative order
        contexts.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(Ordering::Equal)
        });

        Ok(())
    }
}

impl Default for CombinedReranker {
    fn default() -> Self {
        Self::new()
    }
}

/// Ensure every context has features and seed `final_score` with the
/// retrieval score plus the name-match boost (first matching tier wins:
/// exact 0.3, substring either direction 0.15, potential-name match 0.1)
fn prepare_contexts(contexts: &mut [Context], intent: &QueryIntent) {
    for ctx in contexts.iter_mut() {
        ctx.ensure_components();
        ctx.final_score = ctx.score;

        if intent.function_name.is_empty() {
            continue;
        }

        let ctx_name = ctx.function_name_lower();
        let query_name = intent.function_name.to_lowercase();

        let boost = if ctx_name == query_name {
            0.3
        } else if !ctx_name.is_empty()
            && (query_name.contains(&ctx_name) || ctx_name.contains(&query_name))
        {
            0.15
        } else if !ctx_name.is_empty()
            && intent.potential_names.iter().any(|name| {
                let name = name.to_lowercase();
                name.contains(&ctx_name) || ctx_name.contains(&name)
            })
        {
            0.1
        } else {
            0.0
        };

        ctx.name_match_boost = boost;
        ctx.final_score += boost;
    }
}

/// Classify the batch's functions and nudge contexts by the role of their
/// own function (+0.1 main, −0.05 helper; unknown names untouched)
fn apply_role_adjustments(contexts: &mut [Context]) -> Result<()> {
    let analyzer = {
        let texts: Vec<&str> = contexts.iter().map(|ctx| ctx.text.as_str()).collect();
        RelationshipAnalyzer::analyze(&texts)?
    };

    for ctx in contexts.iter_mut() {
        let Some(name) = ctx
            .components
            .as_ref()
            .map(|components| components.function_name.clone())
        else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        let adjustment = analyzer.score_adjustment(&name);
        if adjustment != 0.0 {
            ctx.role_adjustment = adjustment;
            ctx.final_score += adjustment;
        }
    }

    Ok(())
}

/// Min-max normalize final scores to [0, 1]; a uniform batch is left as is
fn normalize_scores(contexts: &mut [Context]) {
    let Some(first) = contexts.first() else {
        return;
    };

    let mut min = first.final_score;
    let mut max = first.final_score;
    for ctx in contexts.iter() {
        min = min.min(ctx.final_score);
        max = max.max(ctx.final_score);
    }

    if max > min {
        let range = max - min;
        for ctx in contexts.iter_mut() {
            ctx.final_score = (ctx.final_score - min) / range;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderank_extract::QueryIntentExtractor;
    use pretty_assertions::assert_eq;

    fn contexts_with_scores(scores: &[f32]) -> Vec<Context> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| {
                let mut ctx = Context::new(i.to_string(), 0.0, "");
                ctx.final_score = score;
                ctx
            })
            .collect()
    }

    #[test]
    fn normalization_spreads_scores_to_unit_range() {
        let mut contexts = contexts_with_scores(&[0.2, 0.5, 0.5]);
        normalize_scores(&mut contexts);

        assert_eq!(contexts[0].final_score, 0.0);
        assert_eq!(contexts[1].final_score, 1.0);
        assert_eq!(contexts[2].final_score, 1.0);
    }

    #[test]
    fn uniform_scores_are_left_unchanged() {
        let mut contexts = contexts_with_scores(&[0.4, 0.4, 0.4]);
        normalize_scores(&mut contexts);

        for ctx in &contexts {
            assert_eq!(ctx.final_score, 0.4);
        }
    }

    #[test]
    fn empty_batches_normalize_without_panicking() {
        let mut contexts: Vec<Context> = Vec::new();
        normalize_scores(&mut contexts);
        assert!(contexts.is_empty());
    }

    #[test]
    fn name_match_tiers_are_first_match_wins() {
        let intent = QueryIntentExtractor::new()
            .extract_intent("def read_file(path): :param path: file path");

        let mut contexts = vec![
            Context::new("exact", 0.0, "def read_file(p):\n    return p\n"),
            Context::new("partial", 0.0, "def read_file_lines(p):\n    return p\n"),
            Context::new("other", 0.0, "def compute_sum(a, b):\n    return a + b\n"),
        ];
        prepare_contexts(&mut contexts, &intent);

        assert_eq!(contexts[0].name_match_boost, 0.3);
        assert_eq!(contexts[1].name_match_boost, 0.15);
        assert_eq!(contexts[2].name_match_boost, 0.0);
    }

    #[test]
    fn nameless_contexts_get_no_name_boost() {
        let intent = QueryIntentExtractor::new().extract_intent("def read_file(path):");

        let mut contexts = vec![Context::new("plain", 0.0, "x = 1\n")];
        prepare_contexts(&mut contexts, &intent);

        assert_eq!(contexts[0].name_match_boost, 0.0);
    }

    #[test]
    fn role_adjustments_key_off_the_context_function() {
        let main_text = "def drive(data):\n    \"\"\"Top-level entry.\"\"\"\n    return shape(data)\n";
        let helper_text = "def shape(data):\n    return data\n";

        let mut contexts = vec![
            Context::new("main", 0.0, main_text),
            Context::new("helper", 0.0, helper_text),
        ];
        for ctx in contexts.iter_mut() {
            ctx.ensure_components();
        }

        apply_role_adjustments(&mut contexts).unwrap();

        assert_eq!(contexts[0].role_adjustment, 0.1);
        assert_eq!(contexts[1].role_adjustment, -0.05);
    }
}
