//! Key splitting and missing-value policies.

use crate::error::{Error, Result};
use crate::node::TagInfo;
use serde_json::Value;

/// Strategy turning raw key-path text into ordered segments. Consulted
/// once per key at compile time.
pub trait KeySplitter: Send + Sync {
    fn split(&self, key: &str) -> Vec<String>;
}

/// Default splitter: dot-separated segments (`a.b.c`).
pub struct DotKeySplitter;

impl KeySplitter for DotKeySplitter {
    fn split(&self, key: &str) -> Vec<String> {
        key.split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Bracket-and-dot notation: `a.b["my.key"][0].c`. Quoted bracket content
/// may contain dots; unquoted bracket content is taken verbatim (array
/// indexes).
pub struct BracketDotKeySplitter;

impl KeySplitter for BracketDotKeySplitter {
    fn split(&self, key: &str) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = key.chars();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    let mut inner = String::new();
                    for c in chars.by_ref() {
                        if c == ']' {
                            break;
                        }
                        inner.push(c);
                    }
                    let inner = inner
                        .strip_prefix(['"', '\''])
                        .and_then(|s| s.strip_suffix(['"', '\'']))
                        .unwrap_or(&inner);
                    segments.push(inner.to_string());
                }
                _ => current.push(c),
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// Consulted when a key path resolves to nothing. The default renders
/// nothing; alternatives raise an error or substitute a placeholder.
pub trait MissingValueHandler: Send + Sync {
    fn handle(&self, tag: &TagInfo) -> Result<Option<Value>>;
}

/// Default policy: a missing key renders as empty output.
pub struct NoValueHandler;

impl MissingValueHandler for NoValueHandler {
    fn handle(&self, _tag: &TagInfo) -> Result<Option<Value>> {
        Ok(None)
    }
}

/// Strict policy: a missing key aborts the render.
pub struct StrictValueHandler;

impl MissingValueHandler for StrictValueHandler {
    fn handle(&self, tag: &TagInfo) -> Result<Option<Value>> {
        Err(Error::NoValue(format!(
            "{} (template '{}', line {})",
            tag.name, tag.template, tag.line
        )))
    }
}

/// Substitution policy: a missing key renders a caller-supplied value.
pub struct PlaceholderValueHandler {
    placeholder: Value,
}

impl PlaceholderValueHandler {
    pub fn new(placeholder: Value) -> Self {
        Self { placeholder }
    }
}

impl MissingValueHandler for PlaceholderValueHandler {
    fn handle(&self, _tag: &TagInfo) -> Result<Option<Value>> {
        Ok(Some(self.placeholder.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dot_splitter() {
        let splitter = DotKeySplitter;
        assert_eq!(splitter.split("a.b.c"), vec!["a", "b", "c"]);
        assert_eq!(splitter.split("name"), vec!["name"]);
    }

    #[test]
    fn test_bracket_dot_splitter() {
        let splitter = BracketDotKeySplitter;
        assert_eq!(splitter.split("a.b[0].c"), vec!["a", "b", "0", "c"]);
        assert_eq!(splitter.split(r#"a["my.key"]"#), vec!["a", "my.key"]);
        assert_eq!(splitter.split("a['x']"), vec!["a", "x"]);
    }

    #[test]
    fn test_strict_handler_names_the_key() {
        let tag = TagInfo::new("user.name", 4, "page");
        let err = StrictValueHandler.handle(&tag).unwrap_err();
        assert_eq!(err.error_code(), "E_RENDER_NO_VALUE");
        assert!(err.to_string().contains("user.name"));
    }

    #[test]
    fn test_placeholder_handler() {
        let tag = TagInfo::new("missing", 1, "t");
        let value = PlaceholderValueHandler::new(json!("N/A"))
            .handle(&tag)
            .unwrap();
        assert_eq!(value, Some(json!("N/A")));
    }
}
