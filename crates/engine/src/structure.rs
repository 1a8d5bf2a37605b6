use crate::context::Context;
use crate::scorer::{count_similarity, set_similarity, Scorer, ScorerKind, ScoringRefs};
use coderank_extract::CodeFeatures;

/// Prioritizes contexts whose control-flow shape, imports, and length
/// resemble the expected answer
pub struct StructureScorer;

impl Scorer for StructureScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Structure
    }

    fn score(&self, ctx: &mut Context, refs: &ScoringRefs<'_>) -> f32 {
        ctx.ensure_components();
        let Some(features) = ctx.components.as_ref() else {
            return 0.0;
        };
        compute_structure_similarity(features, refs.answer)
    }
}

/// Structural similarity of two feature records, in [0, 1].
///
/// A weighted average over control-flow counts (0.5 each), the call set
/// (0.5), the import set (1.5, applied only when the reference imports
/// anything), and line count (0.3).
#[must_use]
pub fn compute_structure_similarity(ctx: &CodeFeatures, answer: &CodeFeatures) -> f32 {
    let mut score = 0.0;
    let mut total_weight = 0.0;

    let count_pairs = [
        (ctx.if_count, answer.if_count),
        (ctx.else_count, answer.else_count),
        (ctx.for_count, answer.for_count),
        (ctx.while_count, answer.while_count),
        (ctx.try_count, answer.try_count),
        (ctx.except_count, answer.except_count),
    ];
    for (a, b) in count_pairs {
        total_weight += 0.5;
        score += 0.5 * count_similarity(a as f32, b as f32);
    }

    total_weight += 0.5;
    score += 0.5 * set_similarity(&ctx.call_set(), &answer.call_set());

    // Imports are a strong functionality signal; an answer with no imports
    // contributes no weight rather than a zero score
    let answer_imports = answer.import_set();
    if !answer_imports.is_empty() {
        let import_weight = 1.5;
        total_weight += import_weight;
        score += import_weight * set_similarity(&ctx.import_set(), &answer_imports);
    }

    let length_weight = 0.3;
    total_weight += length_weight;
    score += length_weight * count_similarity(ctx.line_count as f32, answer.line_count as f32);

    if total_weight > 0.0 {
        score / total_weight
    } else {
        0.0
    }
}
