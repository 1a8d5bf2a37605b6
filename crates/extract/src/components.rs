use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Structured summary of a code snippet's signature and control-flow shape
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CodeFeatures {
    /// Name of the primary (first top-level) function, empty if unknown
    pub function_name: String,

    /// Ordered parameter names of the primary function
    pub parameters: Vec<String>,

    /// Parameter name → annotated type text, where annotations exist
    #[serde(default)]
    pub parameter_types: BTreeMap<String, String>,

    /// Return-type annotation of the primary function
    pub return_type: Option<String>,

    /// Whether the primary function carries a docstring
    pub has_docstring: bool,

    /// Docstring text (empty when absent)
    pub docstring: String,

    /// Plain `import x` module names
    pub imports: Vec<String>,

    /// `from x import ...` source module names
    pub from_imports: Vec<String>,

    pub if_count: u32,
    pub else_count: u32,
    pub for_count: u32,
    pub while_count: u32,
    pub try_count: u32,
    pub except_count: u32,

    /// Call targets inside the primary function, excluding its own
    /// defined functions; deduplicated, insertion order
    pub function_calls: Vec<String>,

    /// Functions defined by the snippet (primary function only)
    pub functions_defined: Vec<String>,

    /// Top-level classes defined by the snippet
    pub classes_defined: Vec<String>,

    /// Number of lines of raw text (at least 1)
    pub line_count: usize,

    /// Derived complexity metric, one decimal place
    pub complexity: f32,

    /// Whether the snippet handles errors (try and except both present)
    pub error_handling: bool,
}

impl CodeFeatures {
    /// Create an otherwise-empty record for the given text
    #[must_use]
    pub fn for_text(text: &str) -> Self {
        Self {
            line_count: text.split('\n').count(),
            ..Default::default()
        }
    }

    /// Derive `complexity` and `error_handling` from the counted fields.
    ///
    /// The weighting is a fixed scoring constant:
    /// `if + 2*for + 2*while + try + 0.5*except + 0.5*calls + 0.5*params + 0.1*lines`,
    /// rounded to one decimal place.
    pub fn finish(&mut self) {
        let mut complexity = 0.0f32;
        complexity += self.if_count as f32 + 2.0 * self.for_count as f32
            + 2.0 * self.while_count as f32;
        complexity += self.try_count as f32 + 0.5 * self.except_count as f32;
        complexity += 0.5 * self.function_calls.len() as f32
            + 0.5 * self.parameters.len() as f32;
        complexity += 0.1 * self.line_count as f32;

        self.complexity = (complexity * 10.0).round() / 10.0;
        self.error_handling = self.try_count > 0 && self.except_count > 0;
    }

    /// Union of `imports` and `from_imports` as a set
    #[must_use]
    pub fn import_set(&self) -> HashSet<&str> {
        self.imports
            .iter()
            .chain(self.from_imports.iter())
            .map(String::as_str)
            .collect()
    }

    /// Call targets as a set
    #[must_use]
    pub fn call_set(&self) -> HashSet<&str> {
        self.function_calls.iter().map(String::as_str).collect()
    }

    /// Record a call target, skipping duplicates and own definitions
    pub(crate) fn push_call(&mut self, name: &str) {
        if self.functions_defined.iter().any(|f| f == name) {
            return;
        }
        if !self.function_calls.iter().any(|c| c == name) {
            self.function_calls.push(name.to_string());
        }
    }
}
