use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Signature facts needed for role classification
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FunctionSignature {
    /// Ordered parameter names
    pub parameters: Vec<String>,

    /// Whether the function carries a docstring
    pub has_docstring: bool,

    /// Whether the function returns a value
    pub has_return: bool,

    /// Body size in lines
    pub line_count: usize,
}

/// Role of a function within one batch's call graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionRole {
    /// Entry point: never called, calls others, documented
    Main,
    /// Called by others, calls nothing, short body
    Helper,
    /// Standalone short function
    Utility,
    /// Everything else
    General,
}

impl FunctionRole {
    /// Human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Helper => "helper",
            Self::Utility => "utility",
            Self::General => "general",
        }
    }

    /// Final-score adjustment for contexts whose function has this role
    #[must_use]
    pub const fn score_adjustment(self) -> f32 {
        match self {
            Self::Main => 0.1,
            Self::Helper => -0.05,
            Self::Utility | Self::General => 0.0,
        }
    }
}

/// Node in the call graph
#[derive(Debug, Clone)]
pub struct FunctionNode {
    /// Function name
    pub name: String,

    /// Signature facts for classification
    pub signature: FunctionSignature,
}

/// Directed graph of "function A calls function B" for one snippet batch
pub struct CallGraph {
    /// The graph itself; edges are unweighted call relations
    graph: DiGraph<FunctionNode, ()>,

    /// Function name → NodeIndex mapping for fast lookup
    name_index: HashMap<String, NodeIndex>,
}

impl CallGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            name_index: HashMap::new(),
        }
    }

    /// Add a function node; a repeated name overwrites the stored signature
    pub fn add_function(&mut self, name: &str, signature: FunctionSignature) -> NodeIndex {
        if let Some(&idx) = self.name_index.get(name) {
            if let Some(node) = self.graph.node_weight_mut(idx) {
                node.signature = signature;
            }
            return idx;
        }

        let idx = self.graph.add_node(FunctionNode {
            name: name.to_string(),
            signature,
        });
        self.name_index.insert(name.to_string(), idx);
        idx
    }

    /// Add a call edge between two known functions; duplicates are dropped
    pub fn add_call(&mut self, caller: &str, callee: &str) {
        let (Some(&from), Some(&to)) = (self.name_index.get(caller), self.name_index.get(callee))
        else {
            return;
        };
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Whether the batch defines a function of this name
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    /// Signature of a defined function
    #[must_use]
    pub fn signature_of(&self, name: &str) -> Option<&FunctionSignature> {
        self.name_index
            .get(name)
            .and_then(|&idx| self.graph.node_weight(idx))
            .map(|node| &node.signature)
    }

    /// Names of functions that call the given function
    #[must_use]
    pub fn callers_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Names of functions the given function calls
    #[must_use]
    pub fn callees_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.name_index.get(name) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, direction)
            .filter_map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                self.graph.node_weight(other).map(|node| node.name.as_str())
            })
            .collect()
    }

    /// Iterate over all function nodes
    pub fn functions(&self) -> impl Iterator<Item = &FunctionNode> {
        self.graph.node_weights()
    }

    /// Number of defined functions
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct call relations
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for CallGraph {
    fn default() -> Self {
        Self::new()
    }
}
