use crate::builder::GraphBuilder;
use crate::error::Result;
use crate::types::{CallGraph, FunctionRole};
use std::collections::HashMap;

/// Analyze call relationships across one batch of snippets and classify
/// every defined function by role
pub struct RelationshipAnalyzer {
    graph: CallGraph,
    roles: HashMap<String, FunctionRole>,
}

impl RelationshipAnalyzer {
    /// Build the batch call graph and classify its functions
    pub fn analyze(texts: &[&str]) -> Result<Self> {
        let mut builder = GraphBuilder::new()?;
        let graph = builder.build(texts);
        let roles = classify(&graph);

        log::debug!(
            "Classified {} functions from {} snippets",
            roles.len(),
            texts.len()
        );

        Ok(Self { graph, roles })
    }

    /// Role of a function; unknown names are General
    #[must_use]
    pub fn role_of(&self, name: &str) -> FunctionRole {
        self.roles
            .get(name)
            .copied()
            .unwrap_or(FunctionRole::General)
    }

    /// Whether the named function is classified as a main function
    #[must_use]
    pub fn is_main(&self, name: &str) -> bool {
        self.role_of(name) == FunctionRole::Main
    }

    /// Whether the named function is classified as a helper
    #[must_use]
    pub fn is_helper(&self, name: &str) -> bool {
        self.role_of(name) == FunctionRole::Helper
    }

    /// Final-score adjustment for a context whose function has this name.
    ///
    /// Unrecognized or absent names receive no adjustment.
    #[must_use]
    pub fn score_adjustment(&self, name: &str) -> f32 {
        self.roles
            .get(name)
            .map_or(0.0, |role| role.score_adjustment())
    }

    /// The underlying call graph
    #[must_use]
    pub fn graph(&self) -> &CallGraph {
        &self.graph
    }
}

/// Classification rules, first match wins:
/// 1. called, calls nothing, body ≤ 10 lines → Helper
/// 2. never called, calls others, documented → Main
/// 3. never called, calls nothing, body ≤ 5 lines → Utility
/// 4. otherwise → General
fn classify(graph: &CallGraph) -> HashMap<String, FunctionRole> {
    let mut roles = HashMap::new();

    for node in graph.functions() {
        let name = node.name.as_str();
        let is_called = !graph.callers_of(name).is_empty();
        let calls_others = !graph.callees_of(name).is_empty();
        let line_count = node.signature.line_count;

        let role = if is_called && !calls_others && line_count <= 10 {
            FunctionRole::Helper
        } else if !is_called && calls_others && node.signature.has_docstring {
            FunctionRole::Main
        } else if !is_called && !calls_others && line_count <= 5 {
            FunctionRole::Utility
        } else {
            FunctionRole::General
        };

        roles.insert(node.name.clone(), role);
    }

    roles
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = r#"def run_report(data):
    """Build the report from raw rows."""
    cleaned = normalize_rows(data)
    return render_rows(cleaned)

def normalize_rows(rows):
    return [r for r in rows if r]

def render_rows(rows):
    return "\n".join(rows)
"#;

    #[test]
    fn documented_caller_is_main() {
        let analyzer = RelationshipAnalyzer::analyze(&[REPORT]).unwrap();

        // never called, two outgoing calls, has a docstring
        assert_eq!(analyzer.role_of("run_report"), FunctionRole::Main);
        assert!(analyzer.is_main("run_report"));
    }

    #[test]
    fn called_leaf_is_helper() {
        let analyzer = RelationshipAnalyzer::analyze(&[REPORT]).unwrap();

        assert_eq!(analyzer.role_of("normalize_rows"), FunctionRole::Helper);
        assert!(analyzer.is_helper("render_rows"));
    }

    #[test]
    fn standalone_short_function_is_utility() {
        let analyzer =
            RelationshipAnalyzer::analyze(&["def ident(x):\n    return x\n"]).unwrap();

        assert_eq!(analyzer.role_of("ident"), FunctionRole::Utility);
    }

    #[test]
    fn undocumented_caller_is_general() {
        let text = "def top(x):\n    return leaf(x)\n\ndef leaf(x):\n    return x\n";
        let analyzer = RelationshipAnalyzer::analyze(&[text]).unwrap();

        assert_eq!(analyzer.role_of("top"), FunctionRole::General);
    }

    #[test]
    fn unknown_names_are_general_with_no_adjustment() {
        let analyzer = RelationshipAnalyzer::analyze(&[REPORT]).unwrap();

        assert_eq!(analyzer.role_of("missing"), FunctionRole::General);
        assert_eq!(analyzer.score_adjustment("missing"), 0.0);
    }

    #[test]
    fn adjustments_follow_roles() {
        let analyzer = RelationshipAnalyzer::analyze(&[REPORT]).unwrap();

        assert_eq!(analyzer.score_adjustment("run_report"), 0.1);
        assert_eq!(analyzer.score_adjustment("normalize_rows"), -0.05);
    }
}
