//! The compiled, immutable executable representation of a template.
//!
//! Node graphs are acyclic by construction; partial and extend references
//! stay name-based, so cycles can only arise dynamically at render time
//! and are bounded there by the recursion counter.

use indexmap::IndexMap;
use serde_json::Value;

/// An ordered, immutable sequence of nodes. Only ever reachable behind an
/// `Arc<CompiledTemplate>` once compilation has finished.
pub type NodeList = Vec<Node>;

/// A key path split into segments at compile time by the configured
/// [`crate::KeySplitter`]; never re-parsed at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPath {
    pub raw: String,
    pub segments: Vec<String>,
}

impl KeyPath {
    /// `this` and `.` resolve to the current top-of-stack frame without
    /// consulting the resolver chain.
    pub fn is_self(&self) -> bool {
        self.raw == "." || self.raw == "this"
    }
}

/// A compiled helper parameter: a literal is passed through at render
/// time, a key path goes through the resolver chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Literal(Value),
    Path(KeyPath),
}

/// Compiled executable unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(String),

    Variable {
        path: KeyPath,
        escape: bool,
        line: usize,
    },

    Section {
        path: KeyPath,
        body: NodeList,
        inverted: bool,
        line: usize,
    },

    /// Name-based reference, resolved through the template cache when
    /// rendered.
    Partial {
        name: String,
        line: usize,
    },

    /// Like a partial, but supplies override bodies for named insertion
    /// points of the referenced template.
    Extend {
        name: String,
        overrides: IndexMap<String, NodeList>,
        line: usize,
    },

    /// A named insertion point; renders its default body unless an
    /// enclosing extend supplied an override.
    ExtendSection {
        name: String,
        body: NodeList,
        line: usize,
    },

    Helper {
        name: String,
        params: Vec<Param>,
        hash: IndexMap<String, Param>,
        body: NodeList,
        inverse: NodeList,
        block: bool,
        line: usize,
    },
}

/// Source metadata of the tag a render-time operation originated from.
#[derive(Debug, Clone, PartialEq)]
pub struct TagInfo {
    pub name: String,
    pub line: usize,
    pub template: String,
}

impl TagInfo {
    pub fn new(name: impl Into<String>, line: usize, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line,
            template: template.into(),
        }
    }
}
