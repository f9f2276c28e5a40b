use crate::error::{Error, Result};
use crate::node::NodeList;
use indexmap::IndexMap;
use serde_json::Value;

static NULL: Value = Value::Null;

/// Per-render-call state: the context frame stack, the recursion depth
/// counter shared by partial/extend/lambda re-entry, and the stack of
/// extend-override scopes. Never shared across concurrent renders.
pub(crate) struct RenderContext {
    stack: Vec<Value>,
    depth: usize,
    overrides: Vec<IndexMap<String, NodeList>>,
}

impl RenderContext {
    pub fn new(root: Value) -> Self {
        Self {
            stack: vec![root],
            depth: 0,
            overrides: Vec::new(),
        }
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn push(&mut self, frame: Value) {
        self.stack.push(frame);
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.stack.pop()
    }

    pub fn peek(&self) -> &Value {
        self.stack.last().unwrap_or(&NULL)
    }

    /// Enter a partial/extend/lambda re-entry, failing once the depth
    /// would exceed the configured limit.
    pub fn enter_nested(&mut self, limit: usize, name: &str) -> Result<()> {
        if self.depth >= limit {
            return Err(Error::RecursionLimitExceeded {
                name: name.to_string(),
                limit,
            });
        }
        self.depth += 1;
        Ok(())
    }

    pub fn exit_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn push_overrides(&mut self, overrides: IndexMap<String, NodeList>) {
        self.overrides.push(overrides);
    }

    pub fn pop_overrides(&mut self) {
        self.overrides.pop();
    }

    /// Overrides supplied by the most derived template win, and that is
    /// the scope pushed first.
    pub fn find_override(&self, name: &str) -> Option<&NodeList> {
        self.overrides.iter().find_map(|scope| scope.get(name))
    }
}
