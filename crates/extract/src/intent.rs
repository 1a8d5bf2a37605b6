use crate::text;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static FUNC_DEF_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"def\s+([a-zA-Z_][a-zA-Z0-9_]*)").expect("valid regex"));

static CODE_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([a-zA-Z_][a-zA-Z0-9_]*)`").expect("valid regex"));

static RST_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":param\s+(\w+):").expect("valid regex"));

static SIG_PARAMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"def\s+\w+\s*\(([^)]*)\)").expect("valid regex"));

static PARAM_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*").expect("valid regex"));

static LOOSE_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:parameter|argument|param)\s+(?:named|called)?\s*['"]?([a-zA-Z_][a-zA-Z0-9_]*)['"]?"#)
        .expect("valid regex")
});

static RETURN_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i):return:|:rtype:|returns|returning").expect("valid regex"));

static RTYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":rtype:\s*([a-zA-Z_][a-zA-Z0-9_]*)").expect("valid regex"));

static RETURN_DESC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":return:\s*([^\n]+)").expect("valid regex"));

static NAME_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([a-z][a-zA-Z0-9_]*(?:_[a-z][a-zA-Z0-9_]*)+)\b|\b([a-z][a-z]*[A-Z][a-zA-Z0-9]*)\b")
        .expect("valid regex")
});

static CALL_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z_][a-zA-Z0-9_]*)\s*\(").expect("valid regex"));

static STEP_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\d+\.\s+|\*\s+)([^\n]+)").expect("valid regex"));

/// Expected complexity of the requested function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Low,
    Medium,
    High,
}

/// Domain label for a query, from a fixed term table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    FileIo,
    StringProcessing,
    Math,
    Web,
    Database,
    ErrorHandling,
    DataStructures,
    Algorithms,
    #[default]
    General,
}

impl Domain {
    /// Human-readable label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileIo => "file_io",
            Self::StringProcessing => "string_processing",
            Self::Math => "math",
            Self::Web => "web",
            Self::Database => "database",
            Self::ErrorHandling => "error_handling",
            Self::DataStructures => "data_structures",
            Self::Algorithms => "algorithms",
            Self::General => "general",
        }
    }
}

/// What the query says about the return value
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReturnInfo {
    pub has_return: bool,
    pub return_type: Option<String>,
    pub description: String,
}

/// Structured summary of what a query is asking for
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryIntent {
    /// Most likely expected function name, empty if unknown
    pub function_name: String,

    /// Expected parameter names, in order
    pub parameters: Vec<String>,

    pub return_value: ReturnInfo,

    /// Whether the requested function is expected to carry a docstring
    pub has_docstring: bool,

    /// Whether the query asks for error handling
    pub error_handling: bool,

    pub complexity: Complexity,
    pub domain: Domain,

    /// Call names the query references or implies
    pub key_functions: Vec<String>,

    /// Ordered algorithm step descriptions, when the query spells them out
    pub algorithm_description: Vec<String>,

    /// Further function-name guesses beyond the primary one (at most 5)
    pub potential_names: Vec<String>,
}

const DOMAIN_TABLE: &[(Domain, &[&str])] = &[
    (Domain::FileIo, &["file", "directory", "path", "open", "read", "write", "close"]),
    (Domain::StringProcessing, &["string", "text", "parse", "format", "concatenate", "split", "join"]),
    (Domain::Math, &["calculate", "compute", "sum", "average", "median", "normalize"]),
    (Domain::Web, &["http", "request", "response", "url", "api", "json", "endpoint"]),
    (Domain::Database, &["query", "database", "sql", "table", "row", "column", "record"]),
    (Domain::ErrorHandling, &["exception", "error", "handle", "try", "except", "finally", "raise"]),
    (Domain::DataStructures, &["list", "dict", "tuple", "set", "array", "collection"]),
    (Domain::Algorithms, &["algorithm", "sort", "search", "find", "filter", "map", "reduce"]),
];

const ERROR_TERMS: &[&str] = &["error", "exception", "raise", "try", "except", "handle", "catch"];

const LOOP_TERMS: &[&str] = &["loop", "iteration", "recursion", "recursive", "nested"];
const OPTIMIZATION_TERMS: &[&str] = &["algorithm", "optimize", "efficient", "complexity"];
const CONTAINER_TERMS: &[&str] = &["dictionary", "list", "array", "tree", "graph", "hash"];

const COMMON_FUNCS: &[&str] = &[
    "open", "read", "write", "close", "append", "split", "join", "strip",
    "replace", "format", "parse", "sort", "filter", "map", "reduce",
    "sum", "min", "max", "len", "range", "enumerate", "zip", "list", "dict",
    "set", "tuple", "int", "float", "str", "bool", "print", "input",
];

const ACTION_VERBS: &[&str] = &[
    "add", "append", "build", "calculate", "check", "compute", "concatenate",
    "convert", "count", "create", "delete", "extract", "fetch", "filter",
    "find", "format", "generate", "get", "iterate", "join", "load", "merge",
    "normalize", "open", "parse", "print", "process", "read", "remove",
    "replace", "return", "reverse", "save", "search", "set", "sort", "split",
    "strip", "sum", "transform", "update", "validate", "write",
];

const STEP_VERBS: &[&str] = &[
    "check", "find", "return", "compute", "calculate", "get", "set", "create",
    "update", "delete", "convert", "transform", "parse", "iterate",
];

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "function",
    "has", "have", "in", "is", "it", "its", "of", "on", "or", "should",
    "that", "the", "this", "to", "was", "which", "will", "with", "would",
];

/// Extract structured intent records from natural-language queries
#[derive(Debug, Default)]
pub struct QueryIntentExtractor;

impl QueryIntentExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract intent from a query string. Never fails.
    #[must_use]
    pub fn extract_intent(&self, query: &str) -> QueryIntent {
        QueryIntent {
            function_name: self.extract_function_name(query),
            parameters: self.extract_parameters(query),
            return_value: extract_return_value(query),
            has_docstring: expects_docstring(query),
            error_handling: needs_error_handling(query),
            complexity: self.determine_complexity(query),
            domain: determine_domain(query),
            key_functions: extract_key_functions(query),
            algorithm_description: extract_algorithm_steps(query),
            potential_names: self.extract_potential_names(query),
        }
    }

    /// Extract the same intent shape from an answer/reference string.
    ///
    /// Identical to [`Self::extract_intent`] except that no extra name
    /// guesses are produced: the answer's own signature is authoritative.
    #[must_use]
    pub fn extract_answer_components(&self, answer: &str) -> QueryIntent {
        QueryIntent {
            potential_names: Vec::new(),
            ..self.extract_intent(answer)
        }
    }

    /// Function-name inference: explicit definition, then an inline code
    /// reference, then the top verb+noun pair
    fn extract_function_name(&self, query: &str) -> String {
        if let Some(captures) = FUNC_DEF_NAME.captures(query) {
            return captures[1].to_string();
        }

        if let Some(captures) = CODE_REF.captures(query) {
            return captures[1].to_string();
        }

        if let Some((verb, noun)) = verb_noun_pairs(query).into_iter().next() {
            return format!("{verb}_{noun}");
        }

        String::new()
    }

    /// Parameter inference: `:param name:` markers, then an explicit
    /// signature, then loose "parameter named X" phrasing
    fn extract_parameters(&self, query: &str) -> Vec<String> {
        let rst_params: Vec<String> = RST_PARAM
            .captures_iter(query)
            .map(|c| c[1].to_string())
            .collect();
        if !rst_params.is_empty() {
            return rst_params;
        }

        if let Some(captures) = SIG_PARAMS.captures(query) {
            let mut params = Vec::new();
            for param in captures[1].split(',') {
                if let Some(name) = PARAM_NAME.find(param.trim()) {
                    params.push(name.as_str().to_string());
                }
            }
            if !params.is_empty() {
                return params;
            }
        }

        LOOSE_PARAM
            .captures_iter(query)
            .map(|c| c[1].to_string())
            .collect()
    }

    /// Complexity label from a 4-factor count: many parameters,
    /// loop/recursion language, optimization language, container language
    fn determine_complexity(&self, query: &str) -> Complexity {
        let query_lower = query.to_lowercase();
        let mut factors = 0;

        if self.extract_parameters(query).len() >= 3 {
            factors += 1;
        }
        if LOOP_TERMS.iter().any(|term| query_lower.contains(term)) {
            factors += 1;
        }
        if OPTIMIZATION_TERMS.iter().any(|term| query_lower.contains(term)) {
            factors += 1;
        }
        if CONTAINER_TERMS.iter().any(|term| query_lower.contains(term)) {
            factors += 1;
        }

        match factors {
            0 => Complexity::Low,
            1 | 2 => Complexity::Medium,
            _ => Complexity::High,
        }
    }

    /// Function-name guesses beyond the primary one: identifier-shaped
    /// tokens, verb+noun pairs, and repeated content words
    fn extract_potential_names(&self, query: &str) -> Vec<String> {
        let mut candidates: Vec<String> = Vec::new();

        for captures in NAME_TOKEN.captures_iter(query) {
            let name = captures
                .get(1)
                .or_else(|| captures.get(2))
                .map(|m| m.as_str().to_string());
            if let Some(name) = name {
                push_unique(&mut candidates, name);
            }
        }

        for (verb, noun) in verb_noun_pairs(query) {
            push_unique(&mut candidates, format!("{verb}_{noun}"));
        }

        let frequent = frequent_content_words(query);
        if frequent.len() >= 2 {
            push_unique(&mut candidates, format!("{}_{}", frequent[0], frequent[1]));
        }

        candidates.truncate(5);
        candidates
    }
}

fn extract_return_value(query: &str) -> ReturnInfo {
    let mut info = ReturnInfo::default();

    if RETURN_HINT.is_match(query) {
        info.has_return = true;

        if let Some(captures) = RTYPE.captures(query) {
            info.return_type = Some(captures[1].to_string());
        }
        if let Some(captures) = RETURN_DESC.captures(query) {
            info.description = captures[1].trim().to_string();
        }
    }

    info
}

/// A docstring is expected for structured-doc queries and long descriptions
fn expects_docstring(query: &str) -> bool {
    let has_rst = [":param", ":type", ":return", ":rtype"]
        .iter()
        .any(|marker| query.contains(marker));
    has_rst || query.split_whitespace().count() > 30
}

fn needs_error_handling(query: &str) -> bool {
    let query_lower = query.to_lowercase();
    ERROR_TERMS.iter().any(|term| query_lower.contains(term))
}

/// The domain with the most term hits wins; ties resolve to table order
fn determine_domain(query: &str) -> Domain {
    let query_lower = query.to_lowercase();

    let mut best = Domain::General;
    let mut best_hits = 0usize;
    for (domain, terms) in DOMAIN_TABLE {
        let hits = terms
            .iter()
            .filter(|term| query_lower.contains(*term))
            .count();
        if hits > best_hits {
            best = *domain;
            best_hits = hits;
        }
    }

    best
}

/// Call names the query mentions: well-known builtins as whole words plus
/// anything written in call syntax
fn extract_key_functions(query: &str) -> Vec<String> {
    let query_words = text::identifier_set(query);

    let mut funcs: Vec<String> = Vec::new();
    for func in COMMON_FUNCS {
        if query_words.contains(*func) {
            push_unique(&mut funcs, (*func).to_string());
        }
    }

    for captures in CALL_REF.captures_iter(query) {
        push_unique(&mut funcs, captures[1].to_string());
    }

    funcs
}

/// Numbered or bulleted lines, else sentences that lead with an action verb
fn extract_algorithm_steps(query: &str) -> Vec<String> {
    let steps: Vec<String> = STEP_LINE
        .captures_iter(query)
        .map(|c| c[1].trim().to_string())
        .collect();
    if !steps.is_empty() {
        return steps;
    }

    text::sentences(query)
        .into_iter()
        .filter(|sentence| {
            sentence
                .split_whitespace()
                .next()
                .map(|first| STEP_VERBS.contains(&first.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .map(str::to_string)
        .collect()
}

/// Lexicon-based verb+noun pairing: an action verb immediately followed by a
/// content word yields a `verb_noun` candidate. Both halves are lemmatized
/// with light suffix stripping.
fn verb_noun_pairs(query: &str) -> Vec<(String, String)> {
    let tokens = text::words(query);
    let mut pairs = Vec::new();

    for window in tokens.windows(2) {
        let Some(verb) = lemmatize_verb(&window[0]) else {
            continue;
        };
        let next = window[1].as_str();
        if !next.chars().all(char::is_alphabetic) {
            continue;
        }
        if STOPWORDS.contains(&next) || lemmatize_verb(next).is_some() {
            continue;
        }
        pairs.push((verb.to_string(), lemmatize_noun(next)));
    }

    pairs
}

fn lemmatize_verb(word: &str) -> Option<&'static str> {
    if let Some(base) = find_verb(word) {
        return Some(base);
    }
    for suffix in ["ing", "ed", "es", "s"] {
        if let Some(stripped) = word.strip_suffix(suffix) {
            if let Some(base) = find_verb(stripped) {
                return Some(base);
            }
            // drop-e inflections: parsing → parse
            let restored = format!("{stripped}e");
            if let Some(base) = find_verb(&restored) {
                return Some(base);
            }
        }
    }
    None
}

fn find_verb(word: &str) -> Option<&'static str> {
    ACTION_VERBS.iter().find(|verb| **verb == word).copied()
}

fn lemmatize_noun(word: &str) -> String {
    if let Some(base) = word.strip_suffix("ies") {
        if word.len() > 4 {
            return format!("{base}y");
        }
    }
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Content words occurring more than once, most frequent first; ties keep
/// first-seen order
fn frequent_content_words(query: &str) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for word in text::words(query) {
        if !word.chars().all(char::is_alphabetic) || STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        if !counts.contains_key(&word) {
            order.push(word.clone());
        }
        *counts.entry(word).or_insert(0) += 1;
    }

    let mut repeated: Vec<String> = order
        .into_iter()
        .filter(|word| counts[word] > 1)
        .collect();
    repeated.sort_by_key(|word| std::cmp::Reverse(counts[word]));
    repeated.truncate(3);
    repeated
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn intent(query: &str) -> QueryIntent {
        QueryIntentExtractor::new().extract_intent(query)
    }

    #[test]
    fn rst_query_yields_full_intent() {
        let intent =
            intent("def read_file(path): :param path: file path :return: contents");

        assert_eq!(intent.function_name, "read_file");
        assert_eq!(intent.parameters, vec!["path".to_string()]);
        assert!(intent.has_docstring);
        assert!(intent.return_value.has_return);
        assert_eq!(intent.return_value.description, "contents");
        assert_eq!(intent.domain, Domain::FileIo);
    }

    #[test]
    fn code_reference_names_the_function() {
        let intent = intent("implement `merge_sorted` over two inputs");
        assert_eq!(intent.function_name, "merge_sorted");
    }

    #[test]
    fn verb_noun_pair_is_last_resort() {
        let intent = intent("parse strings quickly");
        assert_eq!(intent.function_name, "parse_string");
    }

    #[test]
    fn loose_parameter_phrasing_is_recognized() {
        let intent = intent("takes a parameter named depth and a parameter named width");
        assert_eq!(
            intent.parameters,
            vec!["depth".to_string(), "width".to_string()]
        );
    }

    #[test]
    fn domain_ties_resolve_to_table_order() {
        // one string_processing hit (parse), one math hit (sum)
        assert_eq!(intent("parse the sum").domain, Domain::StringProcessing);
    }

    #[test]
    fn unmatched_queries_are_general_domain() {
        assert_eq!(intent("do something unusual").domain, Domain::General);
    }

    #[test]
    fn complexity_counts_factors() {
        assert_eq!(intent("print a value").complexity, Complexity::Low);
        assert_eq!(
            intent("iterate in a loop over items").complexity,
            Complexity::Medium
        );
        assert_eq!(
            intent("an efficient algorithm over a list using a nested loop").complexity,
            Complexity::High
        );
    }

    #[test]
    fn error_terms_flag_error_handling() {
        assert!(intent("handle the exception gracefully").error_handling);
        assert!(!intent("add two numbers").error_handling);
    }

    #[test]
    fn key_functions_include_builtins_and_call_refs() {
        let intent = intent("use open to load and then process(data)");
        assert!(intent.key_functions.contains(&"open".to_string()));
        assert!(intent.key_functions.contains(&"process".to_string()));
    }

    #[test]
    fn numbered_steps_are_extracted_in_order() {
        let intent = intent("1. check the input\n2. compute the total\n3. return it");
        assert_eq!(
            intent.algorithm_description,
            vec![
                "check the input".to_string(),
                "compute the total".to_string(),
                "return it".to_string()
            ]
        );
    }

    #[test]
    fn action_sentences_become_steps() {
        let intent = intent("Check the bounds first. Compute the average. The rest is easy.");
        assert_eq!(intent.algorithm_description.len(), 2);
    }

    #[test]
    fn potential_names_are_bounded_and_unique() {
        let intent = intent(
            "maybe read_file or readFile or load_data or parse_text or fetch_rows or dump_all",
        );
        assert_eq!(intent.potential_names.len(), 5);
        let mut deduped = intent.potential_names.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), 5);
    }

    #[test]
    fn answer_components_skip_potential_names() {
        let extractor = QueryIntentExtractor::new();
        let components =
            extractor.extract_answer_components("def save_state(path): :param path: target");
        assert_eq!(components.function_name, "save_state");
        assert!(components.potential_names.is_empty());
    }
}
