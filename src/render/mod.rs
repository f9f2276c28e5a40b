//! The rendering engine: walks a compiled node graph depth-first,
//! left-to-right, streaming output into a caller-supplied sink.

pub(crate) mod context;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::escape::HtmlEscaper;
use crate::helpers::{HelperPlacement, Options};
use crate::lambda::Lambda;
use crate::node::{KeyPath, Node, Param, TagInfo};
use crate::resolver::Resolved;
use context::RenderContext;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt::Write;
use std::sync::Arc;

/// Falsy test shared by sections and inverted sections: absent, null,
/// false and empty collections/strings render nothing (or the inverse).
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

/// Convert a resolved value to interpolation output.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) struct Renderer<'e> {
    engine: &'e Engine,
    template_name: String,
    pub(crate) context: RenderContext,
}

impl<'e> Renderer<'e> {
    pub fn new(engine: &'e Engine, template_name: impl Into<String>, root: Value) -> Self {
        Self {
            engine,
            template_name: template_name.into(),
            context: RenderContext::new(root),
        }
    }

    pub(crate) fn engine(&self) -> &'e Engine {
        self.engine
    }

    pub fn render_nodes(&mut self, nodes: &[Node], out: &mut dyn Write) -> Result<()> {
        for node in nodes {
            self.render_node(node, out)?;
        }
        Ok(())
    }

    fn render_node(&mut self, node: &Node, out: &mut dyn Write) -> Result<()> {
        match node {
            Node::Literal(text) => {
                out.write_str(text)?;
                Ok(())
            }

            Node::Variable { path, escape, line } => {
                self.render_variable(path, *escape, *line, out)
            }

            Node::Section {
                path,
                body,
                inverted,
                line,
            } => {
                if *inverted {
                    self.render_inverted_section(path, body, out)
                } else {
                    self.render_section(path, body, *line, out)
                }
            }

            Node::Partial { name, line } => self.render_partial(name, *line, out),

            Node::Extend {
                name,
                overrides,
                line,
            } => self.render_extend(name, overrides, *line, out),

            Node::ExtendSection { name, body, .. } => {
                match self.context.find_override(name).cloned() {
                    Some(nodes) => self.render_nodes(&nodes, out),
                    None => self.render_nodes(body, out),
                }
            }

            Node::Helper {
                name,
                params,
                hash,
                body,
                inverse,
                block,
                line,
            } => self.render_helper(name, params, hash, body, inverse, *block, *line, out),
        }
    }

    pub(crate) fn resolve_path(&self, path: &KeyPath) -> Resolved {
        self.engine
            .resolvers()
            .resolve_path(self.context.stack(), path)
    }

    /// Evaluate a compiled helper parameter: literals pass through, key
    /// paths go through the chain, an unresolved path becomes `null` and
    /// a lambda contributes its product.
    pub(crate) fn eval_param(&self, param: &Param) -> Value {
        match param {
            Param::Literal(value) => value.clone(),
            Param::Path(path) => match self.resolve_path(path) {
                Resolved::Found(value) => value,
                Resolved::Lambda(lambda) => Value::String(lambda.invoke("")),
                Resolved::NotFound => Value::Null,
            },
        }
    }

    fn render_variable(
        &mut self,
        path: &KeyPath,
        escape: bool,
        line: usize,
        out: &mut dyn Write,
    ) -> Result<()> {
        match self.resolve_path(path) {
            Resolved::Found(Value::Null) => Ok(()),
            Resolved::Found(value) => self.write_value(&value, escape, out),
            Resolved::Lambda(lambda) => self.render_lambda(&lambda, "", escape, line, out),
            Resolved::NotFound => {
                let tag = TagInfo::new(&path.raw, line, &self.template_name);
                match self.engine.missing_handler().handle(&tag)? {
                    Some(value) => self.write_value(&value, escape, out),
                    None => Ok(()),
                }
            }
        }
    }

    fn write_value(&self, value: &Value, escape: bool, out: &mut dyn Write) -> Result<()> {
        let text = value_to_string(value);
        if escape {
            out.write_str(&HtmlEscaper::escape(&text))?;
        } else {
            out.write_str(&text)?;
        }
        Ok(())
    }

    fn render_section(
        &mut self,
        path: &KeyPath,
        body: &[Node],
        line: usize,
        out: &mut dyn Write,
    ) -> Result<()> {
        match self.resolve_path(path) {
            Resolved::Lambda(lambda) => {
                let mut body_text = String::new();
                self.render_nodes(body, &mut body_text)?;
                self.render_lambda(&lambda, &body_text, false, line, out)
            }
            Resolved::Found(value) if !is_falsy(&value) => {
                if let Value::Array(items) = value {
                    for item in items {
                        self.context.push(item);
                        let result = self.render_nodes(body, out);
                        self.context.pop();
                        result?;
                    }
                    Ok(())
                } else {
                    self.context.push(value);
                    let result = self.render_nodes(body, out);
                    self.context.pop();
                    result
                }
            }
            _ => Ok(()),
        }
    }

    fn render_inverted_section(
        &mut self,
        path: &KeyPath,
        body: &[Node],
        out: &mut dyn Write,
    ) -> Result<()> {
        let falsy = match self.resolve_path(path) {
            Resolved::NotFound => true,
            Resolved::Found(value) => is_falsy(&value),
            Resolved::Lambda(_) => false,
        };
        if falsy {
            // The inverse body renders in the current scope; no frame is
            // pushed.
            self.render_nodes(body, out)
        } else {
            Ok(())
        }
    }

    fn render_partial(&mut self, name: &str, _line: usize, out: &mut dyn Write) -> Result<()> {
        let template = match self.engine.get_template(name) {
            Ok(template) => template,
            Err(Error::TemplateNotFound(_)) => {
                return Err(Error::MissingPartial(name.to_string()));
            }
            Err(err) => return Err(err),
        };
        self.context
            .enter_nested(self.engine.config().recursion_limit, name)?;
        let result = self.render_nodes(template.nodes(), out);
        self.context.exit_nested();
        result
    }

    fn render_extend(
        &mut self,
        name: &str,
        overrides: &IndexMap<String, Vec<Node>>,
        _line: usize,
        out: &mut dyn Write,
    ) -> Result<()> {
        let template = match self.engine.get_template(name) {
            Ok(template) => template,
            Err(Error::TemplateNotFound(_)) => {
                return Err(Error::MissingExtend(name.to_string()));
            }
            Err(err) => return Err(err),
        };
        self.context
            .enter_nested(self.engine.config().recursion_limit, name)?;
        self.context.push_overrides(overrides.clone());
        let result = self.render_nodes(template.nodes(), out);
        self.context.pop_overrides();
        self.context.exit_nested();
        result
    }

    /// Invoke a lambda and interpolate its product. An interpolated
    /// return value is compiled as a one-off template and counts against
    /// the recursion limit, because it may itself reference partials.
    fn render_lambda(
        &mut self,
        lambda: &Arc<dyn Lambda>,
        input: &str,
        escape: bool,
        line: usize,
        out: &mut dyn Write,
    ) -> Result<()> {
        let produced = lambda.invoke(input);
        if lambda.interpolate_return_value() {
            let name = format!("{}:lambda:{line}", self.template_name);
            let template = self.engine.compile(&name, &produced)?;
            self.context
                .enter_nested(self.engine.config().recursion_limit, &name)?;
            let result = self.render_nodes(template.nodes(), out);
            self.context.exit_nested();
            result
        } else if escape {
            out.write_str(&HtmlEscaper::escape(&produced))?;
            Ok(())
        } else {
            out.write_str(&produced)?;
            Ok(())
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_helper(
        &mut self,
        name: &str,
        params: &[Param],
        hash: &IndexMap<String, Param>,
        body: &[Node],
        inverse: &[Node],
        block: bool,
        line: usize,
        out: &mut dyn Write,
    ) -> Result<()> {
        let helper = self
            .engine
            .helper(name)
            .ok_or_else(|| Error::UnknownHelper(name.to_string()))?;

        match (helper.placement(), block) {
            (HelperPlacement::Inline, true) => {
                return Err(Error::invalid_helper_call(
                    format!("helper '{name}' is not valid as a block"),
                    line,
                ));
            }
            (HelperPlacement::Block, false) => {
                return Err(Error::invalid_helper_call(
                    format!("helper '{name}' must be used as a block"),
                    line,
                ));
            }
            _ => {}
        }

        let params: Vec<Value> = params.iter().map(|p| self.eval_param(p)).collect();
        let hash: IndexMap<String, Value> = hash
            .iter()
            .map(|(k, v)| (k.clone(), self.eval_param(v)))
            .collect();
        let tag = TagInfo::new(name, line, &self.template_name);

        let mut options = Options::new(self, out, body, inverse, params, hash, tag, block);
        let result = helper.execute(&mut options);
        let leftover = options.pushed();

        // Frames the helper pushed and did not pop are reclaimed here.
        for _ in 0..leftover {
            self.context.pop();
        }
        result
    }
}
