//! Shared text tokenization helpers used by the extractors and scorers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([a-zA-Z_][a-zA-Z0-9_]*)\b").expect("valid regex"));

static CONTENT_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-z][a-z_]{2,}\b").expect("valid regex"));

static ALPHA_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+").expect("valid regex"));

/// Lowercased words of a text, in order
#[must_use]
pub fn words(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

/// Lowercased identifier-shaped tokens of a text, as a set
#[must_use]
pub fn identifier_set(text: &str) -> HashSet<String> {
    IDENTIFIER
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Lowercase alphabetic runs of a name (`read_file` → {read, file})
#[must_use]
pub fn alpha_tokens(name: &str) -> HashSet<String> {
    ALPHA_RUN
        .find_iter(&name.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Lowercase content terms of a text (3+ characters), as a set
#[must_use]
pub fn term_set(text: &str) -> HashSet<String> {
    CONTENT_TERM
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Split text into sentences at `.`, `!` or `?` followed by whitespace
#[must_use]
pub fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();

    for (idx, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            let next = idx + ch.len_utf8();
            if next >= bytes.len() || bytes[next].is_ascii_whitespace() {
                let sentence = text[start..next].trim();
                if !sentence.is_empty() {
                    out.push(sentence);
                }
                start = next;
            }
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn words_are_lowercased() {
        assert_eq!(words("Read the File"), vec!["read", "the", "file"]);
    }

    #[test]
    fn alpha_tokens_split_snake_case() {
        let tokens = alpha_tokens("read_file_contents");
        assert!(tokens.contains("read"));
        assert!(tokens.contains("file"));
        assert!(tokens.contains("contents"));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn term_set_drops_short_words() {
        let terms = term_set("an api to read the file");
        assert!(terms.contains("read"));
        assert!(terms.contains("api"));
        assert!(!terms.contains("an"));
        assert!(!terms.contains("to"));
    }

    #[test]
    fn sentences_split_on_terminators() {
        let parts = sentences("Check the input. Return the sum! Done");
        assert_eq!(
            parts,
            vec!["Check the input.", "Return the sum!", "Done"]
        );
    }
}
