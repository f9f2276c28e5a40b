//! The helper invocation protocol.
//!
//! A helper is a named, pluggable render-time operation. It receives its
//! resolved parameters and hash arguments through an [`Options`] record,
//! together with control over its body/inverse sub-graphs and the output
//! sink; the engine never inspects helper internals.

pub mod builtin;

use crate::error::{Error, Result};
use crate::escape::HtmlEscaper;
use crate::node::{Node, TagInfo};
use crate::render::{value_to_string, Renderer};
use crate::resolver::Resolved;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt::Write;

/// Which tag forms a helper accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperPlacement {
    Inline,
    Block,
    Both,
}

/// A named render-time operation.
pub trait Helper: Send + Sync {
    fn placement(&self) -> HelperPlacement {
        HelperPlacement::Both
    }

    fn execute(&self, options: &mut Options<'_, '_>) -> Result<()>;
}

/// Everything one helper call may touch. Scoped to that call; frames the
/// helper pushed but did not pop are reclaimed by the engine when the
/// call returns.
pub struct Options<'a, 'e> {
    renderer: &'a mut Renderer<'e>,
    out: &'a mut dyn Write,
    body: &'a [Node],
    inverse: &'a [Node],
    params: Vec<Value>,
    hash: IndexMap<String, Value>,
    tag: TagInfo,
    block: bool,
    pushed: usize,
}

impl<'a, 'e> Options<'a, 'e> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        renderer: &'a mut Renderer<'e>,
        out: &'a mut dyn Write,
        body: &'a [Node],
        inverse: &'a [Node],
        params: Vec<Value>,
        hash: IndexMap<String, Value>,
        tag: TagInfo,
        block: bool,
    ) -> Self {
        Self {
            renderer,
            out,
            body,
            inverse,
            params,
            hash,
            tag,
            block,
            pushed: 0,
        }
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn param(&self, index: usize) -> Option<&Value> {
        self.params.get(index)
    }

    pub fn hash(&self) -> &IndexMap<String, Value> {
        &self.hash
    }

    pub fn hash_value(&self, name: &str) -> Option<&Value> {
        self.hash.get(name)
    }

    pub fn tag_info(&self) -> &TagInfo {
        &self.tag
    }

    /// True when invoked as `{{#name ..}}...{{/name}}`.
    pub fn is_block(&self) -> bool {
        self.block
    }

    /// Current top of the context stack.
    pub fn peek(&self) -> &Value {
        self.renderer.context.peek()
    }

    /// Push a context frame for the rest of this call.
    pub fn push(&mut self, frame: Value) {
        self.renderer.context.push(frame);
        self.pushed += 1;
    }

    /// Pop a frame this helper pushed. Popping beyond that is invalid.
    pub fn pop(&mut self) -> Result<Value> {
        if self.pushed == 0 {
            return Err(Error::invalid_helper_call(
                format!("helper '{}' popped more frames than it pushed", self.tag.name),
                self.tag.line,
            ));
        }
        self.pushed -= 1;
        Ok(self.renderer.context.pop().unwrap_or(Value::Null))
    }

    /// Render the body sub-graph into the output sink.
    pub fn render_body(&mut self) -> Result<()> {
        self.renderer.render_nodes(self.body, self.out)
    }

    /// Render the inverse sub-graph into the output sink.
    pub fn render_inverse(&mut self) -> Result<()> {
        self.renderer.render_nodes(self.inverse, self.out)
    }

    /// Append literal text to the output sink.
    pub fn write(&mut self, text: &str) -> Result<()> {
        self.out.write_str(text)?;
        Ok(())
    }

    /// Append a value, HTML-escaped when the engine's escaping default is
    /// on.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        let text = value_to_string(value);
        if self.renderer.engine().config().escape_html {
            self.out.write_str(&HtmlEscaper::escape(&text))?;
        } else {
            self.out.write_str(&text)?;
        }
        Ok(())
    }

    /// Resolve a key path built at call time through the resolver chain,
    /// against the current context stack.
    pub fn resolve(&self, key: &str) -> Option<Value> {
        let path = crate::node::KeyPath {
            raw: key.to_string(),
            segments: if key == "." || key == "this" {
                vec![key.to_string()]
            } else {
                self.renderer.engine().splitter().split(key)
            },
        };
        match self.renderer.resolve_path(&path) {
            Resolved::Found(value) => Some(value),
            Resolved::Lambda(lambda) => Some(Value::String(lambda.invoke(""))),
            Resolved::NotFound => None,
        }
    }

    /// Apply the engine's missing-value policy for a key this helper
    /// failed to resolve.
    pub fn missing_value(&self, key: &str) -> Result<Option<Value>> {
        let tag = TagInfo::new(key, self.tag.line, &self.tag.template);
        self.renderer.engine().missing_handler().handle(&tag)
    }

    pub(crate) fn pushed(&self) -> usize {
        self.pushed
    }
}
