//! Lowering of the tag tree into the executable node graph.
//!
//! The transform is purely structural: key paths are split once via the
//! injected splitter, helper parameter text is tokenized and classified
//! syntactically, and partial/extend references stay name-based. Nothing
//! here depends on host data, so compilation is deterministic given the
//! template text and delimiter configuration.

use crate::error::{Error, Result};
use crate::interpolation::KeySplitter;
use crate::node::{KeyPath, Node, NodeList, Param};
use crate::parser::Tag;
use indexmap::IndexMap;
use serde_json::Value;

pub(crate) struct Compiler<'a> {
    splitter: &'a dyn KeySplitter,
    escape_default: bool,
}

impl<'a> Compiler<'a> {
    pub fn new(splitter: &'a dyn KeySplitter, escape_default: bool) -> Self {
        Self {
            splitter,
            escape_default,
        }
    }

    pub fn compile(&self, tags: Vec<Tag>) -> Result<NodeList> {
        tags.into_iter().map(|tag| self.compile_tag(tag)).collect()
    }

    fn compile_tag(&self, tag: Tag) -> Result<Node> {
        Ok(match tag {
            Tag::Text { value } => Node::Literal(value),

            Tag::Variable { name, escape, line } => Node::Variable {
                path: self.key_path(&name),
                escape: escape && self.escape_default,
                line,
            },

            Tag::Section {
                name,
                inverted,
                body,
                line,
            } => Node::Section {
                path: self.key_path(&name),
                body: self.compile(body)?,
                inverted,
                line,
            },

            Tag::Partial { name, line } => Node::Partial { name, line },

            Tag::Extend { name, body, line } => {
                let mut overrides = IndexMap::new();
                for child in body {
                    // Anything other than an override section inside an
                    // extend block carries no meaning and is dropped.
                    if let Tag::ExtendSection { name, body, .. } = child {
                        overrides.insert(name, self.compile(body)?);
                    }
                }
                Node::Extend {
                    name,
                    overrides,
                    line,
                }
            }

            Tag::ExtendSection { name, body, line } => Node::ExtendSection {
                name,
                body: self.compile(body)?,
                line,
            },

            Tag::Helper { name, params, line } => {
                let (params, hash) = self.compile_params(&params, line)?;
                Node::Helper {
                    name,
                    params,
                    hash,
                    body: Vec::new(),
                    inverse: Vec::new(),
                    block: false,
                    line,
                }
            }

            Tag::HelperBlock {
                name,
                params,
                body,
                inverse,
                line,
            } => {
                let (params, hash) = self.compile_params(&params, line)?;
                Node::Helper {
                    name,
                    params,
                    hash,
                    body: self.compile(body)?,
                    inverse: self.compile(inverse)?,
                    block: true,
                    line,
                }
            }
        })
    }

    fn key_path(&self, raw: &str) -> KeyPath {
        let segments = if raw == "." || raw == "this" {
            vec![raw.to_string()]
        } else {
            self.splitter.split(raw)
        };
        KeyPath {
            raw: raw.to_string(),
            segments,
        }
    }

    /// Tokenize raw helper parameter text into positional parameters and
    /// `name=value` hash arguments.
    fn compile_params(
        &self,
        raw: &str,
        line: usize,
    ) -> Result<(Vec<Param>, IndexMap<String, Param>)> {
        let mut params = Vec::new();
        let mut hash = IndexMap::new();

        for token in tokenize(raw) {
            match split_hash(&token) {
                Some((name, value)) => {
                    if name.is_empty() {
                        return Err(Error::invalid_tag(
                            format!("hash argument '{token}' has no name"),
                            line,
                        ));
                    }
                    hash.insert(name.to_string(), self.classify(value));
                }
                None => {
                    if !hash.is_empty() {
                        return Err(Error::invalid_tag(
                            "positional parameters must precede hash arguments",
                            line,
                        ));
                    }
                    params.push(self.classify(&token));
                }
            }
        }
        Ok((params, hash))
    }

    /// Classify a parameter token: quoted strings, numbers, booleans and
    /// `null` are literals; everything else is a key path resolved at
    /// render time.
    fn classify(&self, token: &str) -> Param {
        if let Some(inner) = unquote(token) {
            return Param::Literal(Value::String(inner.to_string()));
        }
        match token {
            "true" => return Param::Literal(Value::Bool(true)),
            "false" => return Param::Literal(Value::Bool(false)),
            "null" => return Param::Literal(Value::Null),
            _ => {}
        }
        if let Ok(n) = token.parse::<i64>() {
            return Param::Literal(Value::Number(n.into()));
        }
        if let Ok(f) = token.parse::<f64>() {
            if f.is_finite() {
                if let Some(n) = serde_json::Number::from_f64(f) {
                    return Param::Literal(Value::Number(n));
                }
            }
        }
        Param::Path(self.key_path(token))
    }
}

/// Split parameter text on whitespace, keeping quoted spans intact.
fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;

    for c in raw.chars() {
        match c {
            '\'' if !in_double => {
                in_single = !in_single;
                current.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push(c);
            }
            c if c.is_whitespace() && !in_single && !in_double => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Split a `name=value` token at the first `=` outside quotes.
fn split_hash(token: &str) -> Option<(&str, &str)> {
    let mut in_single = false;
    let mut in_double = false;
    for (i, c) in token.char_indices() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '=' if !in_single && !in_double => {
                return Some((&token[..i], &token[i + 1..]));
            }
            _ => {}
        }
    }
    None
}

fn unquote(token: &str) -> Option<&str> {
    for quote in ['\'', '"'] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return Some(&token[1..token.len() - 1]);
        }
    }
    None
}
