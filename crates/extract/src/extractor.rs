use crate::components::CodeFeatures;
use crate::error::{ExtractError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Node, Parser};

static FN_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"def\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*\(([^)]*)\)").expect("valid regex"));

static PARAM_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*").expect("valid regex"));

static DOC_DOUBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)"""(.*?)""""#).expect("valid regex"));

static DOC_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)'''(.*?)'''").expect("valid regex"));

static IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"import\s+([a-zA-Z0-9_.]+)").expect("valid regex"));

static FROM_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"from\s+([a-zA-Z0-9_.]+)\s+import").expect("valid regex"));

static IF_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bif\b\s").expect("valid regex"));
static ELSE_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\belse\b\s*:").expect("valid regex"));
static FOR_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfor\b\s").expect("valid regex"));
static WHILE_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bwhile\b\s").expect("valid regex"));
static TRY_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\btry\s*:").expect("valid regex"));
static EXCEPT_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bexcept\b").expect("valid regex"));

static CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z_][a-zA-Z0-9_]*)\s*\(").expect("valid regex"));

static CLASS_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"class\s+([a-zA-Z_][a-zA-Z0-9_]*)").expect("valid regex"));

/// Extract a [`CodeFeatures`] record from snippet text.
///
/// Convenience wrapper around [`ComponentExtractor`] that degrades to the
/// regex fallback even when the tree-sitter grammar cannot be loaded.
#[must_use]
pub fn extract_components(text: &str) -> CodeFeatures {
    match ComponentExtractor::new() {
        Ok(mut extractor) => extractor.extract(text),
        Err(err) => {
            log::warn!("component extractor unavailable ({err}), using regex fallback");
            fallback_extract(text)
        }
    }
}

/// AST-based feature extractor for code snippets
pub struct ComponentExtractor {
    parser: Parser,
}

impl ComponentExtractor {
    /// Create a new extractor with the Python grammar loaded
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| ExtractError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self { parser })
    }

    /// Extract features from snippet text.
    ///
    /// The primary path walks the syntax tree; a snippet with syntax errors
    /// falls through to regex extraction of the same record shape.
    pub fn extract(&mut self, text: &str) -> CodeFeatures {
        match self.parse_features(text) {
            Some(features) => features,
            None => {
                log::debug!("AST parse failed, falling back to regex extraction");
                fallback_extract(text)
            }
        }
    }

    fn parse_features(&mut self, text: &str) -> Option<CodeFeatures> {
        let tree = self.parser.parse(text, None)?;
        let root = tree.root_node();
        if root.has_error() {
            return None;
        }

        let mut features = CodeFeatures::for_text(text);

        // Only the first top-level function is treated as "the" function;
        // classes are recorded by name only.
        let mut main_function: Option<Node> = None;
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            let node = if child.kind() == "decorated_definition" {
                child.child_by_field_name("definition").unwrap_or(child)
            } else {
                child
            };

            match node.kind() {
                "function_definition" => {
                    if main_function.is_none() {
                        main_function = Some(node);
                    }
                }
                "class_definition" => {
                    if let Some(name) = node.child_by_field_name("name") {
                        features.classes_defined.push(node_text(name, text).to_string());
                    }
                }
                _ => {}
            }
        }

        if let Some(func) = main_function {
            extract_signature(func, text, &mut features);
            analyze_body(func, text, &mut features);
        }

        collect_imports(root, text, &mut features);

        features.finish();
        Some(features)
    }
}

fn node_text<'a>(node: Node, text: &'a str) -> &'a str {
    &text[node.byte_range()]
}

/// Record name, parameters, return type, and docstring of the function node
fn extract_signature(func: Node, text: &str, features: &mut CodeFeatures) {
    if let Some(name) = func.child_by_field_name("name") {
        features.function_name = node_text(name, text).to_string();
        features
            .functions_defined
            .push(features.function_name.clone());
    }

    if let Some(params) = func.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "identifier" => {
                    features.parameters.push(node_text(param, text).to_string());
                }
                "typed_parameter" => {
                    if let Some(name) = first_identifier(param) {
                        let name_text = node_text(name, text).to_string();
                        if let Some(ty) = param.child_by_field_name("type") {
                            features
                                .parameter_types
                                .insert(name_text.clone(), node_text(ty, text).to_string());
                        }
                        features.parameters.push(name_text);
                    }
                }
                "default_parameter" | "typed_default_parameter" => {
                    if let Some(name) = param.child_by_field_name("name") {
                        let name_text = node_text(name, text).to_string();
                        if let Some(ty) = param.child_by_field_name("type") {
                            features
                                .parameter_types
                                .insert(name_text.clone(), node_text(ty, text).to_string());
                        }
                        features.parameters.push(name_text);
                    }
                }
                "list_splat_pattern" | "dictionary_splat_pattern" => {
                    if let Some(name) = first_identifier(param) {
                        features.parameters.push(node_text(name, text).to_string());
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(ret) = func.child_by_field_name("return_type") {
        features.return_type = Some(node_text(ret, text).to_string());
    }

    if let Some(docstring) = extract_docstring(func, text) {
        features.has_docstring = true;
        features.docstring = docstring;
    }
}

fn first_identifier(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let result = node
        .named_children(&mut cursor)
        .find(|child| child.kind() == "identifier");
    result
}

/// A docstring is a string expression as the first statement of the body
fn extract_docstring(func: Node, text: &str) -> Option<String> {
    let body = func.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let value = first.named_child(0)?;
    if value.kind() != "string" {
        return None;
    }
    Some(string_literal_value(node_text(value, text)))
}

/// Strip string-literal prefixes and quotes, trimming the result
fn string_literal_value(raw: &str) -> String {
    let body = raw.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim().to_string();
        }
    }
    body.trim().to_string()
}

/// Count control structures and collect call targets within the function
fn analyze_body(node: Node, text: &str, features: &mut CodeFeatures) {
    match node.kind() {
        // elif chains count as branches, matching the nested-if model
        "if_statement" | "elif_clause" => features.if_count += 1,
        "else_clause" => features.else_count += 1,
        "for_statement" => features.for_count += 1,
        "while_statement" => features.while_count += 1,
        "try_statement" => features.try_count += 1,
        "except_clause" => features.except_count += 1,
        "call" => {
            if let Some(target) = call_target(node, text) {
                features.push_call(target);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        analyze_body(child, text, features);
    }
}

/// Resolve a call node to its target name: plain identifiers directly,
/// attribute calls by the attribute name
fn call_target<'a>(call: Node, text: &'a str) -> Option<&'a str> {
    let function = call.child_by_field_name("function")?;
    match function.kind() {
        "identifier" => Some(node_text(function, text)),
        "attribute" => function
            .child_by_field_name("attribute")
            .map(|attr| node_text(attr, text)),
        _ => None,
    }
}

/// Collect import module names from the whole tree
fn collect_imports(node: Node, text: &str, features: &mut CodeFeatures) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                let module = match child.kind() {
                    "dotted_name" => Some(node_text(child, text)),
                    "aliased_import" => child
                        .child_by_field_name("name")
                        .map(|name| node_text(name, text)),
                    _ => None,
                };
                if let Some(module) = module {
                    push_unique(&mut features.imports, module);
                }
            }
        }
        "import_from_statement" => {
            if let Some(module) = node.child_by_field_name("module_name") {
                push_unique(&mut features.from_imports, node_text(module, text));
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_imports(child, text, features);
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

/// Regex extraction for snippets that defeat the AST parser.
///
/// Populates the same record shape with best-effort values and never fails.
fn fallback_extract(text: &str) -> CodeFeatures {
    let mut features = CodeFeatures::for_text(text);

    if let Some(captures) = FN_DEF.captures(text) {
        features.function_name = captures[1].to_string();
        features
            .functions_defined
            .push(features.function_name.clone());

        for param in captures[2].split(',') {
            if let Some(name) = PARAM_NAME.find(param.trim()) {
                features.parameters.push(name.as_str().to_string());
            }
        }
    }

    let docstring = DOC_DOUBLE
        .captures(text)
        .or_else(|| DOC_SINGLE.captures(text));
    if let Some(captures) = docstring {
        features.has_docstring = true;
        features.docstring = captures[1].trim().to_string();
    }

    for captures in IMPORT.captures_iter(text) {
        push_unique(&mut features.imports, &captures[1]);
    }
    for captures in FROM_IMPORT.captures_iter(text) {
        push_unique(&mut features.from_imports, &captures[1]);
    }

    features.if_count = IF_KW.find_iter(text).count() as u32;
    features.else_count = ELSE_KW.find_iter(text).count() as u32;
    features.for_count = FOR_KW.find_iter(text).count() as u32;
    features.while_count = WHILE_KW.find_iter(text).count() as u32;
    features.try_count = TRY_KW.find_iter(text).count() as u32;
    features.except_count = EXCEPT_KW.find_iter(text).count() as u32;

    for captures in CALL.captures_iter(text) {
        let name = &captures[1];
        if matches!(name, "if" | "for" | "while" | "with") {
            continue;
        }
        features.push_call(name);
    }

    for captures in CLASS_DEF.captures_iter(text) {
        features.classes_defined.push(captures[1].to_string());
    }

    features.finish();
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const READ_FILE: &str = r#"import os
from pathlib import Path

def read_file(path):
    """Read a file.

    :param path: file path
    """
    try:
        with open(path) as handle:
            return handle.read()
    except IOError:
        return ""

class Loader:
    pass
"#;

    fn extract(text: &str) -> CodeFeatures {
        ComponentExtractor::new().unwrap().extract(text)
    }

    #[test]
    fn extracts_primary_function_signature() {
        let features = extract(READ_FILE);

        assert_eq!(features.function_name, "read_file");
        assert_eq!(features.parameters, vec!["path".to_string()]);
        assert!(features.has_docstring);
        assert!(features.docstring.starts_with("Read a file."));
        assert_eq!(features.functions_defined, vec!["read_file".to_string()]);
        assert_eq!(features.classes_defined, vec!["Loader".to_string()]);
    }

    #[test]
    fn counts_control_flow_and_calls() {
        let features = extract(READ_FILE);

        assert_eq!(features.try_count, 1);
        assert_eq!(features.except_count, 1);
        assert!(features.error_handling);
        assert!(features.function_calls.contains(&"open".to_string()));
        assert!(features.function_calls.contains(&"read".to_string()));
    }

    #[test]
    fn collects_imports() {
        let features = extract(READ_FILE);

        assert_eq!(features.imports, vec!["os".to_string()]);
        assert_eq!(features.from_imports, vec!["pathlib".to_string()]);
    }

    #[test]
    fn extracts_annotations() {
        let features = extract("def add(a: int, b: int = 0) -> int:\n    return a + b\n");

        assert_eq!(features.parameters, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(features.parameter_types.get("a").map(String::as_str), Some("int"));
        assert_eq!(features.parameter_types.get("b").map(String::as_str), Some("int"));
        assert_eq!(features.return_type.as_deref(), Some("int"));
    }

    #[test]
    fn first_function_wins() {
        let features = extract(
            "def first(a):\n    return a\n\ndef second(b):\n    return b\n",
        );

        assert_eq!(features.function_name, "first");
        assert_eq!(features.parameters, vec!["a".to_string()]);
    }

    #[test]
    fn elif_counts_as_branch() {
        let features = extract(
            "def pick(x):\n    if x > 1:\n        return 1\n    elif x > 0:\n        return 0\n    else:\n        return -1\n",
        );

        assert_eq!(features.if_count, 2);
        assert_eq!(features.else_count, 1);
    }

    #[test]
    fn malformed_code_uses_fallback() {
        let features = extract("def broken(path):\n    try:\n        open(path\n");

        assert_eq!(features.function_name, "broken");
        assert!(features.function_calls.contains(&"open".to_string()));
        assert_eq!(features.try_count, 1);
    }

    #[test]
    fn empty_text_yields_default_record() {
        let features = extract("");

        assert_eq!(features.function_name, "");
        assert_eq!(features.line_count, 1);
        assert_eq!(features.complexity, 0.1);
    }

    #[test]
    fn fallback_matches_record_shape() {
        let features = fallback_extract(READ_FILE);

        assert_eq!(features.function_name, "read_file");
        assert_eq!(features.parameters, vec!["path".to_string()]);
        assert!(features.has_docstring);
        assert!(features.error_handling);
        assert!(features.classes_defined.contains(&"Loader".to_string()));
    }
}
