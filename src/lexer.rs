use crate::config::Delimiters;
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Characters allowed in a key path or helper name.
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[A-Za-z0-9_.\-\[\]"'@]+$"#).expect("valid name pattern"));

/// Token types for Mustache template syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Text(String),

    /// `{{key}}` or `{{helper p1 p2 k=v}}`
    Variable(String),
    /// `{{{key}}}` or `{{&key}}`
    Unescaped(String),

    /// `{{#key}}` or `{{#helper p1 p2}}`
    SectionOpen(String),
    /// `{{^key}}`
    InvertedOpen(String),
    /// `{{/name}}`
    SectionClose(String),

    /// `{{>name}}`
    Partial(String),
    /// `{{<name}}`
    Extend(String),
    /// `{{$name}}`
    ExtendSection(String),

    /// `{{! ... }}`
    Comment(String),
    /// `{{=<% %>=}}`
    DelimiterChange(Delimiters),

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    /// The tag stood alone on its line and its trailing whitespace/newline
    /// was consumed; the parser strips the leading indentation.
    pub standalone: bool,
}

impl Token {
    fn new(kind: TokenKind, line: usize) -> Self {
        Self {
            kind,
            line,
            standalone: false,
        }
    }
}

/// Incremental lexer for Mustache templates.
///
/// Tokens are pulled one at a time by the parser because the active
/// delimiter pair is mutable: a `{{=..=}}` tag switches it immediately and
/// the parser restores the pair saved at block entry when a block closes.
pub struct Lexer {
    input: String,
    pos: usize,
    line: usize,
    delimiters: Delimiters,
    block_stack: Vec<Delimiters>,
    trim_standalone: bool,
}

impl Lexer {
    pub fn new(input: &str, delimiters: Delimiters, trim_standalone: bool) -> Self {
        Self {
            input: input.to_string(),
            pos: 0,
            line: 1,
            delimiters,
            block_stack: Vec::new(),
            trim_standalone,
        }
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Save the active pair at block entry. Called by the parser when a
    /// section/helper/extend block opens.
    pub fn push_block(&mut self) {
        self.block_stack.push(self.delimiters.clone());
    }

    /// Restore the pair active at block entry. Called by the parser when
    /// the block closes, so a delimiter change never leaks past its block.
    pub fn pop_block(&mut self) {
        if let Some(saved) = self.block_stack.pop() {
            self.delimiters = saved;
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        if self.pos >= self.input.len() {
            return Ok(Token::new(TokenKind::Eof, self.line));
        }

        let tag_at = self.find_tag_start();

        match tag_at {
            Some((start, in_entry_pair)) if start == self.pos => {
                let pair = if in_entry_pair {
                    self.block_stack
                        .last()
                        .cloned()
                        .unwrap_or_else(|| self.delimiters.clone())
                } else {
                    self.delimiters.clone()
                };
                self.lex_tag(&pair)
            }
            Some((start, _)) => {
                let line = self.line;
                let text = self.input[self.pos..start].to_string();
                self.advance_to(start);
                Ok(Token::new(TokenKind::Text(text), line))
            }
            None => {
                let line = self.line;
                let text = self.input[self.pos..].to_string();
                self.advance_to(self.input.len());
                Ok(Token::new(TokenKind::Text(text), line))
            }
        }
    }

    /// Find the next tag start at or after the current position.
    ///
    /// Tags are recognized in the active pair; additionally, the close tag
    /// of the enclosing block is recognized in the pair that was active at
    /// that block's entry (block-scoped delimiter changes would otherwise
    /// make the close tag unreachable).
    fn find_tag_start(&self) -> Option<(usize, bool)> {
        let current = self.input[self.pos..]
            .find(&self.delimiters.start)
            .map(|i| self.pos + i);

        let entry = self
            .block_stack
            .last()
            .filter(|entry| **entry != self.delimiters)
            .and_then(|entry| self.find_close_tag(entry));

        match (current, entry) {
            (Some(c), Some(e)) if e < c => Some((e, true)),
            (Some(c), _) => Some((c, false)),
            (None, Some(e)) => Some((e, true)),
            (None, None) => None,
        }
    }

    /// Find the next `<start>/` occurrence for the given pair.
    fn find_close_tag(&self, pair: &Delimiters) -> Option<usize> {
        let mut from = self.pos;
        while let Some(i) = self.input[from..].find(&pair.start) {
            let at = from + i;
            let after = at + pair.start.len();
            if self.input[after..].starts_with('/') {
                return Some(at);
            }
            from = after;
        }
        None
    }

    fn lex_tag(&mut self, pair: &Delimiters) -> Result<Token> {
        let line = self.line;
        let tag_start = self.pos;
        let content_start = tag_start + pair.start.len();

        // Triple mustache under the default pair: {{{key}}}
        let (content, tag_end, triple) = if pair.start == "{{"
            && self.input[content_start..].starts_with('{')
        {
            let inner_start = content_start + 1;
            let close = self.input[inner_start..]
                .find("}}}")
                .map(|i| inner_start + i)
                .ok_or_else(|| Error::invalid_tag("missing end delimiter", line))?;
            (self.input[inner_start..close].to_string(), close + 3, true)
        } else {
            let close = self.input[content_start..]
                .find(&pair.end)
                .map(|i| content_start + i)
                .ok_or_else(|| Error::invalid_tag("missing end delimiter", line))?;
            (
                self.input[content_start..close].to_string(),
                close + pair.end.len(),
                false,
            )
        };

        self.advance_to(tag_end);

        let trimmed = content.trim();
        let kind = if triple {
            TokenKind::Unescaped(self.validated_name(trimmed, line)?)
        } else if trimmed.is_empty() {
            return Err(Error::invalid_tag("empty tag", line));
        } else if trimmed.starts_with('=') && trimmed.ends_with('=') && trimmed.len() >= 2 {
            let pair = self.parse_delimiter_change(trimmed, line)?;
            self.delimiters = pair.clone();
            TokenKind::DelimiterChange(pair)
        } else {
            match trimmed.chars().next() {
                Some('!') => TokenKind::Comment(trimmed[1..].trim().to_string()),
                Some('#') => {
                    let body = trimmed[1..].trim();
                    self.validated_first_word(body, line)?;
                    TokenKind::SectionOpen(body.to_string())
                }
                Some('^') => {
                    TokenKind::InvertedOpen(self.validated_name(trimmed[1..].trim(), line)?)
                }
                Some('/') => {
                    TokenKind::SectionClose(self.validated_name(trimmed[1..].trim(), line)?)
                }
                Some('>') => TokenKind::Partial(self.validated_name(trimmed[1..].trim(), line)?),
                Some('<') => TokenKind::Extend(self.validated_name(trimmed[1..].trim(), line)?),
                Some('$') => {
                    TokenKind::ExtendSection(self.validated_name(trimmed[1..].trim(), line)?)
                }
                Some('&') => TokenKind::Unescaped(self.validated_name(trimmed[1..].trim(), line)?),
                _ => {
                    self.validated_first_word(trimmed, line)?;
                    TokenKind::Variable(trimmed.to_string())
                }
            }
        };

        let mut token = Token::new(kind, line);
        if self.trim_standalone
            && is_standalone_eligible(&token.kind)
            && self.standalone_left(tag_start)
        {
            if let Some(resume) = self.standalone_right() {
                token.standalone = true;
                self.advance_to(resume);
            }
        }
        Ok(token)
    }

    fn parse_delimiter_change(&self, content: &str, line: usize) -> Result<Delimiters> {
        let inner = content
            .strip_prefix('=')
            .and_then(|s| s.strip_suffix('='))
            .ok_or_else(|| Error::invalid_tag("malformed delimiter change", line))?;
        let parts: Vec<&str> = inner.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(Error::invalid_delimiters(format!(
                "expected two markers on line {line}, got '{}'",
                inner.trim()
            )));
        }
        let pair = Delimiters::new(parts[0], parts[1]);
        pair.validate()?;
        Ok(pair)
    }

    fn validated_name(&self, name: &str, line: usize) -> Result<String> {
        if name.is_empty() {
            return Err(Error::invalid_tag("empty tag name", line));
        }
        if name != "." && !NAME_RE.is_match(name) {
            return Err(Error::invalid_tag(
                format!("invalid character in tag name '{name}'"),
                line,
            ));
        }
        Ok(name.to_string())
    }

    fn validated_first_word(&self, content: &str, line: usize) -> Result<()> {
        let first = content.split_whitespace().next().unwrap_or("");
        self.validated_name(first, line)?;
        Ok(())
    }

    /// Only spaces or tabs between the last newline (or input start) and
    /// the tag.
    fn standalone_left(&self, tag_start: usize) -> bool {
        let bytes = self.input.as_bytes();
        let mut i = tag_start;
        while i > 0 {
            match bytes[i - 1] {
                b' ' | b'\t' => i -= 1,
                b'\n' => return true,
                _ => return false,
            }
        }
        true
    }

    /// Only spaces or tabs between the tag and the next newline or EOF.
    /// Returns the position just past the consumed trailing whitespace and
    /// newline.
    fn standalone_right(&self) -> Option<usize> {
        let bytes = self.input.as_bytes();
        let mut i = self.pos;
        while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
            i += 1;
        }
        if i == bytes.len() {
            return Some(i);
        }
        if bytes[i] == b'\r' && i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
            return Some(i + 2);
        }
        if bytes[i] == b'\n' {
            return Some(i + 1);
        }
        None
    }

    fn advance_to(&mut self, to: usize) {
        self.line += self.input[self.pos..to].matches('\n').count();
        self.pos = to;
    }
}

fn is_standalone_eligible(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::SectionOpen(_)
        | TokenKind::InvertedOpen(_)
        | TokenKind::SectionClose(_)
        | TokenKind::Partial(_)
        | TokenKind::Extend(_)
        | TokenKind::ExtendSection(_)
        | TokenKind::Comment(_)
        | TokenKind::DelimiterChange(_) => true,
        // The body/inverse divider inside helper blocks.
        TokenKind::Variable(name) => name == "else",
        _ => false,
    }
}
