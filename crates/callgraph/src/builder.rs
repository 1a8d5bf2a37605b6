use crate::error::{GraphError, Result};
use crate::types::{CallGraph, FunctionSignature};
use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Node, Parser};

static FN_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"def\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*\(([^)]*)\)\s*:").expect("valid regex")
});

/// One function found in a snippet, with the call targets inside its body
struct ParsedFunction {
    name: String,
    signature: FunctionSignature,
    calls: Vec<String>,
}

/// Functions recovered from a single snippet
enum SnippetFunctions {
    /// AST parse succeeded; call targets were resolved per function
    Parsed(Vec<ParsedFunction>),

    /// Syntax errors; only definition names are known, calls are matched
    /// against the raw text
    Fallback { names: Vec<String>, text: String },
}

/// Build per-batch call graphs from snippet texts
pub struct GraphBuilder {
    parser: Parser,
}

impl GraphBuilder {
    /// Create a new builder with the Python grammar loaded
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| GraphError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self { parser })
    }

    /// Build the call graph for one batch of snippets.
    ///
    /// Nodes are every function defined anywhere in the batch; edges are
    /// calls that resolve to a batch-defined name.
    pub fn build(&mut self, texts: &[&str]) -> CallGraph {
        let mut graph = CallGraph::new();
        let mut snippets = Vec::with_capacity(texts.len());

        for text in texts {
            if text.is_empty() {
                continue;
            }
            let snippet = self.collect_functions(text);
            match &snippet {
                SnippetFunctions::Parsed(functions) => {
                    for function in functions {
                        graph.add_function(&function.name, function.signature.clone());
                    }
                }
                SnippetFunctions::Fallback { names, text } => {
                    for name in names {
                        graph.add_function(name, fallback_signature(name, text));
                    }
                }
            }
            snippets.push(snippet);
        }

        for snippet in &snippets {
            match snippet {
                SnippetFunctions::Parsed(functions) => {
                    for function in functions {
                        for call in &function.calls {
                            if graph.contains(call) {
                                graph.add_call(&function.name, call);
                            }
                        }
                    }
                }
                SnippetFunctions::Fallback { names, text } => {
                    add_fallback_calls(&mut graph, names, text);
                }
            }
        }

        log::debug!(
            "Built call graph: {} functions, {} calls",
            graph.function_count(),
            graph.call_count()
        );

        graph
    }

    fn collect_functions(&mut self, text: &str) -> SnippetFunctions {
        let parsed = self.parser.parse(text, None).and_then(|tree| {
            let root = tree.root_node();
            if root.has_error() {
                return None;
            }
            let mut functions = Vec::new();
            collect_defs(root, text, &mut functions);
            Some(functions)
        });

        match parsed {
            Some(functions) => SnippetFunctions::Parsed(functions),
            None => SnippetFunctions::Fallback {
                names: FN_DEF
                    .captures_iter(text)
                    .map(|c| c[1].to_string())
                    .collect(),
                text: text.to_string(),
            },
        }
    }
}

fn node_text<'a>(node: Node, text: &'a str) -> &'a str {
    &text[node.byte_range()]
}

/// Collect every function definition in the tree, nested ones included
fn collect_defs(node: Node, text: &str, functions: &mut Vec<ParsedFunction>) {
    if node.kind() == "function_definition" {
        if let Some(name) = node.child_by_field_name("name") {
            let mut calls = Vec::new();
            collect_calls(node, text, &mut calls);
            functions.push(ParsedFunction {
                name: node_text(name, text).to_string(),
                signature: parsed_signature(node, text),
                calls,
            });
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_defs(child, text, functions);
    }
}

fn parsed_signature(func: Node, text: &str) -> FunctionSignature {
    let mut parameters = Vec::new();
    if let Some(params) = func.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "identifier" => parameters.push(node_text(param, text).to_string()),
                "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                    if let Some(name) = first_identifier(param) {
                        parameters.push(node_text(name, text).to_string());
                    }
                }
                "default_parameter" | "typed_default_parameter" => {
                    if let Some(name) = param.child_by_field_name("name") {
                        parameters.push(node_text(name, text).to_string());
                    }
                }
                _ => {}
            }
        }
    }

    FunctionSignature {
        parameters,
        has_docstring: has_docstring(func),
        has_return: has_value_return(func),
        line_count: func.end_position().row - func.start_position().row + 1,
    }
}

fn first_identifier(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let result = node
        .named_children(&mut cursor)
        .find(|child| child.kind() == "identifier");
    result
}

fn has_docstring(func: Node) -> bool {
    let Some(body) = func.child_by_field_name("body") else {
        return false;
    };
    let Some(first) = body.named_child(0) else {
        return false;
    };
    first.kind() == "expression_statement"
        && first
            .named_child(0)
            .is_some_and(|value| value.kind() == "string")
}

/// Whether the subtree contains a `return` with a value
fn has_value_return(node: Node) -> bool {
    if node.kind() == "return_statement" && node.named_child_count() > 0 {
        return true;
    }
    let mut cursor = node.walk();
    let result = node
        .children(&mut cursor)
        .any(|child| has_value_return(child));
    result
}

/// Plain-identifier call targets inside the subtree
fn collect_calls(node: Node, text: &str, calls: &mut Vec<String>) {
    if node.kind() == "call" {
        if let Some(function) = node.child_by_field_name("function") {
            if function.kind() == "identifier" {
                calls.push(node_text(function, text).to_string());
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(child, text, calls);
    }
}

/// Best-effort signature for a definition found by regex only
fn fallback_signature(name: &str, text: &str) -> FunctionSignature {
    let Some(captures) = FN_DEF
        .captures_iter(text)
        .find(|c| &c[1] == name)
    else {
        return FunctionSignature::default();
    };

    let parameters = captures[2]
        .split(',')
        .filter_map(|param| {
            let name = param.trim().split([':', '=']).next()?.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect();

    let body = &text[captures.get(0).map_or(0, |m| m.end())..];
    let trimmed = body.trim_start();

    FunctionSignature {
        parameters,
        has_docstring: trimmed.starts_with('"') || trimmed.starts_with('\''),
        has_return: body.contains("return "),
        line_count: body.split('\n').take(20).count(),
    }
}

/// Fallback edges: a batch-defined name written in call syntax anywhere in
/// the snippet counts as called by each of the snippet's own functions
fn add_fallback_calls(graph: &mut CallGraph, names: &[String], text: &str) {
    let callees: Vec<String> = graph
        .functions()
        .map(|node| node.name.clone())
        .collect();

    for caller in names {
        for callee in &callees {
            if callee == caller {
                continue;
            }
            let Ok(pattern) = Regex::new(&format!(r"\b{}\s*\(", regex::escape(callee))) else {
                continue;
            };
            if pattern.is_match(text) {
                graph.add_call(caller, callee);
            }
        }
    }
}
