use crate::context::Context;
use coderank_extract::{Complexity, QueryIntent};

const FILE_QUERY_TERMS: &[&str] = &["file", "directory", "open", "read", "write"];
const FILE_OPS: &[&str] = &[
    "open", "read", "write", "close", "makedirs", "exists", "isdir", "isfile",
];

const STRING_QUERY_TERMS: &[&str] = &["string", "text", "parse", "format", "split", "join"];
const STRING_OPS: &[&str] = &[
    "split", "join", "strip", "replace", "format", "lower", "upper", "find", "index",
];

const HELPER_HINTS: &[&str] = &["_helper", "helper_", "util", "internal", "impl"];
const MAIN_HINTS: &[&str] = &["main", "public", "api", "interface"];

/// Fixed quality boosts: docstring, error handling, length band, parameter
/// count, and return presence, each gated on the query expecting them
pub(crate) fn apply_quality_boosts(contexts: &mut [Context], intent: &QueryIntent) {
    for ctx in contexts.iter_mut() {
        ctx.ensure_components();
        let Some(components) = ctx.components.as_ref() else {
            continue;
        };

        let mut boost = 0.0;

        if intent.has_docstring && components.has_docstring {
            boost += 0.08;
        }

        if intent.error_handling && components.error_handling {
            boost += 0.10;
        }

        let line_count = components.line_count;
        let in_band = match intent.complexity {
            Complexity::Low => (3..=15).contains(&line_count),
            Complexity::Medium => (10..=30).contains(&line_count),
            Complexity::High => line_count >= 20,
        };
        if in_band {
            boost += 0.05;
        }

        if !intent.parameters.is_empty() {
            let expected = intent.parameters.len();
            let actual = components.parameters.len();
            if expected == actual {
                boost += 0.08;
            } else if expected.abs_diff(actual) <= 1 {
                boost += 0.04;
            }
        }

        if intent.return_value.has_return && components.return_type.is_some() {
            boost += 0.05;
        }

        ctx.quality_boost = boost;
        ctx.final_score += boost;
    }
}

/// Domain-lexicon boosts (file and string operations, capped at three
/// matches) and helper/main naming hints cross-checked against the query
pub(crate) fn apply_query_adjustments(
    contexts: &mut [Context],
    query: &str,
    intent: &QueryIntent,
) {
    let query_lower = query.to_lowercase();

    if FILE_QUERY_TERMS.iter().any(|term| query_lower.contains(term)) {
        for ctx in contexts.iter_mut() {
            let Some(components) = ctx.components.as_ref() else {
                continue;
            };
            let matches = FILE_OPS
                .iter()
                .filter(|op| components.function_calls.iter().any(|call| call == *op))
                .count();
            if matches > 0 {
                let boost = 0.05 * matches.min(3) as f32;
                ctx.file_op_boost = boost;
                ctx.final_score += boost;
            }
        }
    }

    if STRING_QUERY_TERMS.iter().any(|term| query_lower.contains(term)) {
        for ctx in contexts.iter_mut() {
            let Some(components) = ctx.components.as_ref() else {
                continue;
            };
            let matches = STRING_OPS
                .iter()
                .filter(|op| components.function_calls.iter().any(|call| call == *op))
                .count();
            if matches > 0 {
                let boost = 0.04 * matches.min(3) as f32;
                ctx.string_op_boost = boost;
                ctx.final_score += boost;
            }
        }
    }

    if !intent.function_name.is_empty() {
        let wants_helper = query_lower.contains("helper");
        for ctx in contexts.iter_mut() {
            let ctx_name = ctx.function_name_lower();
            if ctx_name.is_empty() {
                continue;
            }

            let helper_named = HELPER_HINTS.iter().any(|hint| ctx_name.contains(hint));
            let main_named = MAIN_HINTS.iter().any(|hint| ctx_name.contains(hint));

            if helper_named && wants_helper {
                ctx.helper_boost = 0.08;
                ctx.final_score += 0.08;
            } else if main_named && !wants_helper {
                ctx.main_boost = 0.08;
                ctx.final_score += 0.08;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderank_extract::QueryIntentExtractor;
    use pretty_assertions::assert_eq;

    fn intent(query: &str) -> QueryIntent {
        QueryIntentExtractor::new().extract_intent(query)
    }

    #[test]
    fn quality_boosts_stack() {
        let query = intent(
            "def read_file(path): :param path: file path :return: contents, \
             handle the exception when the file is missing",
        );

        let text = "def read_file(path):\n    \"\"\"Read a file.\n\n    :param path: file path\n    :return: contents\n    \"\"\"\n    try:\n        with open(path) as handle:\n            return handle.read()\n    except IOError:\n        return \"\"\n";
        let mut contexts = vec![Context::new("1", 0.0, text)];

        apply_quality_boosts(&mut contexts, &query);

        // docstring 0.08 + error handling 0.10 + length band 0.05 + exact
        // parameter count 0.08
        assert!((contexts[0].quality_boost - 0.31).abs() < 1e-6);
    }

    #[test]
    fn file_op_boost_caps_at_three_matches() {
        let query = intent("write then close the file");
        let text = "def churn(path):\n    f = open(path)\n    f.read()\n    f.write(b\"x\")\n    f.close()\n    exists(path)\n";
        let mut contexts = vec![Context::new("1", 0.0, text)];
        contexts[0].ensure_components();

        apply_query_adjustments(&mut contexts, "write then close the file", &query);

        assert!((contexts[0].file_op_boost - 0.15).abs() < 1e-6);
    }

    #[test]
    fn string_ops_are_rewarded_for_string_queries() {
        let query = intent("split the text and join it back");
        let text = "def rejoin(s):\n    return \"-\".join(s.split())\n";
        let mut contexts = vec![Context::new("1", 0.0, text)];
        contexts[0].ensure_components();

        apply_query_adjustments(&mut contexts, "split the text and join it back", &query);

        assert!((contexts[0].string_op_boost - 0.08).abs() < 1e-6);
    }

    #[test]
    fn main_named_functions_win_unless_helpers_are_wanted() {
        let query_text = "def process_api(data): clean it";
        let query = intent(query_text);

        let mut contexts = vec![
            Context::new("main", 0.0, "def process_api(data):\n    return data\n"),
            Context::new("helper", 0.0, "def process_helper_rows(data):\n    return data\n"),
        ];
        for ctx in contexts.iter_mut() {
            ctx.ensure_components();
        }

        apply_query_adjustments(&mut contexts, query_text, &query);

        assert_eq!(contexts[0].main_boost, 0.08);
        assert_eq!(contexts[1].helper_boost, 0.0);
    }

    #[test]
    fn helper_boost_requires_helper_in_query() {
        let query_text = "def format_helper_cells(rows): a helper for the table";
        let query = intent(query_text);
        assert!(!query.function_name.is_empty());

        let mut contexts = vec![Context::new(
            "h",
            0.0,
            "def format_helper_cells(rows):\n    return rows\n",
        )];
        contexts[0].ensure_components();

        apply_query_adjustments(&mut contexts, query_text, &query);

        assert_eq!(contexts[0].helper_boost, 0.08);
    }
}
