use crate::context::Context;
use crate::scorer::{Scorer, ScorerKind, ScoringRefs};
use coderank_extract::{text, QueryIntent};
use once_cell::sync::Lazy;
use regex::Regex;

static VERB_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([a-z]+(?:\s+[a-z]+){1,3}(?:\s+the\s+[a-z]+)?)").expect("valid regex")
});

static PARAM_DESC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":param\s+\w+:\s+([^:\n]+)").expect("valid regex"));

static RETURN_DESC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":return:\s+([^:\n]+)").expect("valid regex"));

static STEP_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-z][a-z_]+\b").expect("valid regex"));

static CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z_][a-zA-Z0-9_]*)\s*\(").expect("valid regex"));

static DOCSTRING_DOUBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)"""(.*?)""""#).expect("valid regex"));

static DOCSTRING_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)'''(.*?)'''").expect("valid regex"));

static RST_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":param\s+(\w+):").expect("valid regex"));

/// Term families used for domain-term matching, keyed loosely by topic
const DOMAIN_TERMS: &[&[&str]] = &[
    &["file", "directory", "path", "open", "read", "write", "close"],
    &["string", "parse", "format", "concatenate", "split", "join"],
    &["calculate", "compute", "sum", "average", "median", "normalize"],
    &["http", "request", "response", "url", "api", "json", "endpoint"],
    &["query", "database", "sql", "table", "row", "column", "record"],
    &["exception", "error", "handle", "try", "except", "finally", "raise"],
];

/// Matches free-text overlap between the query and the snippet: key
/// phrases, domain terms, algorithm steps, referenced calls, and docstrings
pub struct SemanticScorer;

impl Scorer for SemanticScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Semantic
    }

    fn score(&self, ctx: &mut Context, refs: &ScoringRefs<'_>) -> f32 {
        compute_semantic_similarity(refs.query, &ctx.text, refs.intent)
    }
}

/// Semantic similarity between a query and a snippet's text, in [0, 1].
///
/// A weighted average of key-phrase matches (1.5), domain-term matches
/// (1.2), algorithm-step coverage (1.8), key-function-call coverage (1.4),
/// and docstring alignment (1.0, only when positive). Sources absent from
/// the query contribute no weight.
#[must_use]
pub fn compute_semantic_similarity(query: &str, ctx_text: &str, intent: &QueryIntent) -> f32 {
    let mut score = 0.0;
    let mut total_weight = 0.0;

    let ctx_lower = ctx_text.to_lowercase();

    let key_phrases = extract_key_phrases(query);
    if !key_phrases.is_empty() {
        let phrase_weight = 1.5;
        total_weight += phrase_weight;
        let matches = key_phrases
            .iter()
            .filter(|phrase| ctx_lower.contains(phrase.to_lowercase().as_str()))
            .count();
        score += phrase_weight * matches as f32 / key_phrases.len() as f32;
    }

    let domain_terms = extract_domain_terms(query);
    if !domain_terms.is_empty() {
        let domain_weight = 1.2;
        total_weight += domain_weight;
        let matches = domain_terms
            .iter()
            .filter(|term| ctx_lower.contains(*term))
            .count();
        score += domain_weight * matches as f32 / domain_terms.len() as f32;
    }

    if !intent.algorithm_description.is_empty() {
        let algo_weight = 1.8;
        total_weight += algo_weight;
        let step_matches = intent
            .algorithm_description
            .iter()
            .filter(|step| {
                STEP_TERM
                    .find_iter(&step.to_lowercase())
                    .any(|term| ctx_lower.contains(term.as_str()))
            })
            .count();
        score += algo_weight * step_matches as f32 / intent.algorithm_description.len() as f32;
    }

    if !intent.key_functions.is_empty() {
        let func_weight = 1.4;
        total_weight += func_weight;
        let calls: Vec<String> = CALL
            .captures_iter(ctx_text)
            .map(|c| c[1].to_lowercase())
            .collect();
        let matches = intent
            .key_functions
            .iter()
            .filter(|func| calls.contains(&func.to_lowercase()))
            .count();
        score += func_weight * matches as f32 / intent.key_functions.len() as f32;
    }

    let docstring_match = assess_docstring_match(ctx_text, query);
    if docstring_match > 0.0 {
        let doc_weight = 1.0;
        total_weight += doc_weight;
        score += doc_weight * docstring_match;
    }

    if total_weight > 0.0 {
        score / total_weight
    } else {
        0.0
    }
}

/// 2–4 word windows from the query plus structured-doc descriptions
fn extract_key_phrases(query: &str) -> Vec<String> {
    let mut phrases: Vec<String> = Vec::new();

    let query_lower = query.to_lowercase();
    for m in VERB_PHRASE.find_iter(&query_lower) {
        let phrase = m.as_str();
        if phrase.split_whitespace().count() >= 2 {
            phrases.push(phrase.to_string());
        }
    }

    for captures in PARAM_DESC.captures_iter(query) {
        phrases.push(captures[1].trim().to_string());
    }
    for captures in RETURN_DESC.captures_iter(query) {
        phrases.push(captures[1].trim().to_string());
    }

    phrases
}

/// Domain-specific terms the query uses, across every topic family it
/// touches
fn extract_domain_terms(query: &str) -> Vec<String> {
    let query_lower = query.to_lowercase();

    let mut terms = Vec::new();
    for family in DOMAIN_TERMS {
        if !family.iter().any(|term| query_lower.contains(term)) {
            continue;
        }
        for term in *family {
            if query_lower.contains(term) && !terms.contains(&(*term).to_string()) {
                terms.push((*term).to_string());
            }
        }
    }

    terms
}

/// How well the snippet's docstring matches the query:
/// 0.4 × general term overlap + 0.6 × parameter-doc coverage
fn assess_docstring_match(ctx_text: &str, query: &str) -> f32 {
    let docstring = DOCSTRING_DOUBLE
        .captures(ctx_text)
        .or_else(|| DOCSTRING_SINGLE.captures(ctx_text))
        .map(|captures| captures[1].to_string());
    let Some(docstring) = docstring else {
        return 0.0;
    };

    let query_terms = text::term_set(query);
    if query_terms.is_empty() {
        return 0.0;
    }
    let doc_terms = text::term_set(&docstring);
    let overlap = query_terms.intersection(&doc_terms).count() as f32 / query_terms.len() as f32;

    let query_params: Vec<String> = RST_PARAM
        .captures_iter(query)
        .map(|c| c[1].to_string())
        .collect();
    let param_coverage = if query_params.is_empty() {
        0.0
    } else {
        let doc_params: Vec<String> = RST_PARAM
            .captures_iter(&docstring)
            .map(|c| c[1].to_string())
            .collect();
        let covered = query_params
            .iter()
            .filter(|param| doc_params.contains(param))
            .count();
        covered as f32 / query_params.len() as f32
    };

    0.4 * overlap + 0.6 * param_coverage
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderank_extract::QueryIntentExtractor;

    fn intent(query: &str) -> QueryIntent {
        QueryIntentExtractor::new().extract_intent(query)
    }

    #[test]
    fn domain_terms_favor_matching_snippets() {
        let query = "read a file from a path";
        let query_intent = intent(query);

        let file_snippet = "def read_file(path):\n    with open(path) as f:\n        return f.read()\n";
        let math_snippet = "def compute_sum(a, b):\n    return a + b\n";

        let file_score = compute_semantic_similarity(query, file_snippet, &query_intent);
        let math_score = compute_semantic_similarity(query, math_snippet, &query_intent);

        assert!(file_score > math_score);
    }

    #[test]
    fn algorithm_steps_count_when_terms_appear() {
        let query = "1. check the cache\n2. compute the digest\n3. return the digest";
        let query_intent = intent(query);
        assert_eq!(query_intent.algorithm_description.len(), 3);

        let matching = "def digest(data):\n    cached = cache.get(data)\n    if cached:\n        return cached\n    return compute(data)\n";
        let unrelated = "def greet(name):\n    print(name)\n";

        let matching_score = compute_semantic_similarity(query, matching, &query_intent);
        let unrelated_score = compute_semantic_similarity(query, unrelated, &query_intent);

        assert!(matching_score > unrelated_score);
    }

    #[test]
    fn docstring_parameter_coverage_dominates_overlap() {
        let query = "def save(path, data): :param path: target file :param data: payload";

        let documented = "def save(path, data):\n    \"\"\"Persist data.\n\n    :param path: target file\n    :param data: payload\n    \"\"\"\n    pass\n";
        let undocumented = "def save(path, data):\n    pass\n";

        let query_intent = intent(query);
        let documented_score = compute_semantic_similarity(query, documented, &query_intent);
        let undocumented_score = compute_semantic_similarity(query, undocumented, &query_intent);

        assert!(documented_score > undocumented_score);
    }

    #[test]
    fn empty_inputs_score_zero() {
        let query_intent = QueryIntent::default();
        assert_eq!(compute_semantic_similarity("", "", &query_intent), 0.0);
    }

    #[test]
    fn scoring_is_idempotent() {
        let query = "split a string and join the parts";
        let query_intent = intent(query);
        let snippet = "def rejoin(s):\n    return \"-\".join(s.split())\n";

        let first = compute_semantic_similarity(query, snippet, &query_intent);
        let second = compute_semantic_similarity(query, snippet, &query_intent);
        assert_eq!(first, second);
    }
}
