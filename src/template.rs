use crate::config::Delimiters;
use crate::node::{Node, NodeList};

/// A compiled template: identifier, owning node graph and the delimiter
/// pair active when compilation finished. Immutable after construction
/// and shared behind an `Arc`, so arbitrarily many renders may walk it
/// concurrently.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    name: String,
    nodes: NodeList,
    delimiters: Delimiters,
}

impl CompiledTemplate {
    pub(crate) fn new(name: impl Into<String>, nodes: NodeList, delimiters: Delimiters) -> Self {
        Self {
            name: name.into(),
            nodes,
            delimiters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }
}
