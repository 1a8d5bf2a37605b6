use crate::context::Context;
use crate::scorer::{Scorer, ScorerKind, ScoringRefs};
use coderank_extract::{text, CodeFeatures, QueryIntent};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static RETURN_STMT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\breturn\b").expect("valid regex"));

/// Prioritizes contexts whose function signature matches the query intent
pub struct SignatureScorer;

impl Scorer for SignatureScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Signature
    }

    fn score(&self, ctx: &mut Context, refs: &ScoringRefs<'_>) -> f32 {
        ctx.ensure_components();
        let Some(features) = ctx.components.as_ref() else {
            return 0.0;
        };
        compute_signature_similarity(features, &ctx.text, refs.intent)
    }
}

/// Signature similarity between a context and the query intent, in [0, 1].
///
/// Function names are weighed in three tiers (exact, substring,
/// token-overlap); parameters combine name overlap with positional order.
/// Intent fields that are absent contribute no weight.
#[must_use]
pub fn compute_signature_similarity(
    features: &CodeFeatures,
    ctx_text: &str,
    intent: &QueryIntent,
) -> f32 {
    let mut score = 0.0;
    let mut total_weight = 0.0;

    let function_weight = 2.0;
    let ctx_name = features.function_name.to_lowercase();

    if !intent.function_name.is_empty() {
        total_weight += function_weight;
        let query_name = intent.function_name.to_lowercase();

        if ctx_name == query_name {
            score += function_weight;
        } else if !ctx_name.is_empty() && ctx_name.contains(&query_name) {
            score += function_weight * 0.8;
        } else {
            score += function_weight * token_overlap(&query_name, &ctx_name) * 0.5;
        }
    } else if !intent.potential_names.is_empty() {
        total_weight += function_weight;
        let lowered: Vec<String> = intent
            .potential_names
            .iter()
            .map(|name| name.to_lowercase())
            .collect();

        if lowered.iter().any(|name| *name == ctx_name) && !ctx_name.is_empty() {
            score += function_weight;
        } else if !ctx_name.is_empty() && lowered.iter().any(|name| ctx_name.contains(name)) {
            score += function_weight * 0.7;
        } else {
            let best = lowered
                .iter()
                .map(|name| token_overlap(name, &ctx_name))
                .fold(0.0f32, f32::max);
            score += function_weight * best * 0.5;
        }
    }

    let param_weight = 2.0;
    if !intent.parameters.is_empty() {
        total_weight += param_weight;

        let ctx_params = &features.parameters;
        let query_params = &intent.parameters;

        if !ctx_params.is_empty() {
            let ctx_set: HashSet<&str> = ctx_params.iter().map(String::as_str).collect();
            let query_set: HashSet<&str> = query_params.iter().map(String::as_str).collect();

            if ctx_set == query_set {
                score += param_weight;
            } else {
                let overlap =
                    ctx_set.intersection(&query_set).count() as f32 / query_set.len() as f32;
                let position_matches = query_params
                    .iter()
                    .enumerate()
                    .filter(|(i, param)| ctx_params.get(*i) == Some(param))
                    .count();
                let position = position_matches as f32 / query_params.len() as f32;

                score += param_weight * (0.7 * overlap + 0.3 * position);
            }
        }
    }

    if intent.has_docstring {
        let docstring_weight = 1.0;
        total_weight += docstring_weight;
        if has_docstring_pair(ctx_text) {
            score += docstring_weight;
        }
    }

    if intent.return_value.has_return {
        let return_weight = 1.0;
        total_weight += return_weight;
        if RETURN_STMT.is_match(ctx_text) {
            score += return_weight;
        }
    }

    if intent.error_handling {
        let error_weight = 1.2;
        total_weight += error_weight;
        if features.try_count > 0 && features.except_count > 0 {
            score += error_weight;
        }
    }

    if total_weight > 0.0 {
        score / total_weight
    } else {
        0.0
    }
}

/// Share of the query name's tokens present in the context name's tokens
fn token_overlap(query_name: &str, ctx_name: &str) -> f32 {
    let query_tokens = text::alpha_tokens(query_name);
    let ctx_tokens = text::alpha_tokens(ctx_name);
    if query_tokens.is_empty() || ctx_tokens.is_empty() {
        return 0.0;
    }
    query_tokens.intersection(&ctx_tokens).count() as f32 / query_tokens.len() as f32
}

/// A docstring shows up as a matched pair of triple quotes
fn has_docstring_pair(text: &str) -> bool {
    has_marker_pair(text, "\"\"\"") || has_marker_pair(text, "'''")
}

fn has_marker_pair(text: &str, marker: &str) -> bool {
    text.find(marker)
        .map(|start| text[start + marker.len()..].contains(marker))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderank_extract::{extract_components, QueryIntentExtractor};

    fn intent(query: &str) -> QueryIntent {
        QueryIntentExtractor::new().extract_intent(query)
    }

    #[test]
    fn exact_name_outranks_substring_and_tokens() {
        let query = intent("def read_file(path):");

        let exact = "def read_file(path):\n    return path\n";
        let superstring = "def read_file_lines(path):\n    return path\n";
        let token = "def file_loader(path):\n    return path\n";

        let exact_score =
            compute_signature_similarity(&extract_components(exact), exact, &query);
        let substring_score =
            compute_signature_similarity(&extract_components(superstring), superstring, &query);
        let token_score =
            compute_signature_similarity(&extract_components(token), token, &query);

        assert!(exact_score > substring_score);
        assert!(substring_score > token_score);
        assert!(token_score > 0.0);
    }

    #[test]
    fn exact_parameter_set_matches_regardless_of_order() {
        let query = intent("def pair(a, b):");

        let ordered = "def pair(a, b):\n    return a, b\n";
        let reversed = "def pair(b, a):\n    return b, a\n";

        let ordered_score =
            compute_signature_similarity(&extract_components(ordered), ordered, &query);
        let reversed_score =
            compute_signature_similarity(&extract_components(reversed), reversed, &query);

        assert_eq!(ordered_score, reversed_score);
    }

    #[test]
    fn positional_order_breaks_partial_overlaps() {
        let query = intent("def triple(a, b, c):");

        let ordered = "def triple(a, b, x):\n    return a\n";
        let scrambled = "def triple(b, a, x):\n    return a\n";

        let ordered_score =
            compute_signature_similarity(&extract_components(ordered), ordered, &query);
        let scrambled_score =
            compute_signature_similarity(&extract_components(scrambled), scrambled, &query);

        assert!(ordered_score > scrambled_score);
    }

    #[test]
    fn error_handling_expectation_is_weighed() {
        let query = intent("def safe_load(path): handle the exception");

        let guarded =
            "def safe_load(path):\n    try:\n        return open(path)\n    except IOError:\n        return None\n";
        let bare = "def safe_load(path):\n    return open(path)\n";

        let guarded_score =
            compute_signature_similarity(&extract_components(guarded), guarded, &query);
        let bare_score = compute_signature_similarity(&extract_components(bare), bare, &query);

        assert!(guarded_score > bare_score);
    }

    #[test]
    fn absent_intent_fields_contribute_no_weight() {
        let empty = QueryIntent::default();
        let snippet = "def anything(x):\n    return x\n";

        let score =
            compute_signature_similarity(&extract_components(snippet), snippet, &empty);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn scoring_is_idempotent() {
        let query = intent("def read_file(path): :param path: the path");
        let snippet = "def read_file(path):\n    \"\"\"Read it.\"\"\"\n    return open(path)\n";
        let features = extract_components(snippet);

        let first = compute_signature_similarity(&features, snippet, &query);
        let second = compute_signature_similarity(&features, snippet, &query);
        assert_eq!(first, second);
    }
}
