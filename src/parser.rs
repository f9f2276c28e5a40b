use crate::config::Delimiters;
use crate::error::{Error, Result};
use crate::lexer::{Lexer, TokenKind};

/// One element of the validated tag tree. Block variants own their child
/// sequences; the tree is built once per compile and discarded after
/// lowering to the node graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Text {
        value: String,
    },
    Variable {
        name: String,
        escape: bool,
        line: usize,
    },
    Section {
        name: String,
        inverted: bool,
        body: Vec<Tag>,
        line: usize,
    },
    Partial {
        name: String,
        line: usize,
    },
    Extend {
        name: String,
        body: Vec<Tag>,
        line: usize,
    },
    ExtendSection {
        name: String,
        body: Vec<Tag>,
        line: usize,
    },
    Helper {
        name: String,
        params: String,
        line: usize,
    },
    HelperBlock {
        name: String,
        params: String,
        body: Vec<Tag>,
        inverse: Vec<Tag>,
        line: usize,
    },
}

enum BlockKind {
    Section { inverted: bool },
    Helper { params: String },
    Extend,
    ExtendSection,
}

struct OpenBlock {
    kind: BlockKind,
    name: String,
    line: usize,
    body: Vec<Tag>,
    inverse: Vec<Tag>,
    in_inverse: bool,
}

/// Parser for Mustache templates.
///
/// Pulls tokens from the lexer one at a time and keeps an explicit stack
/// of open blocks; the delimiter pair saved at block entry is restored
/// when the block is popped.
pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new(source: &str, delimiters: Delimiters, trim_standalone: bool) -> Self {
        Self {
            lexer: Lexer::new(source, delimiters, trim_standalone),
        }
    }

    /// The delimiter pair active after the last scanned token.
    pub fn delimiters(&self) -> &Delimiters {
        self.lexer.delimiters()
    }

    /// Parse the whole template into a tag tree.
    pub fn parse(&mut self) -> Result<Vec<Tag>> {
        let mut stack: Vec<OpenBlock> = Vec::new();
        let mut top: Vec<Tag> = Vec::new();

        loop {
            let token = self.lexer.next_token()?;
            if token.standalone {
                strip_indent(children(&mut stack, &mut top));
            }

            match token.kind {
                TokenKind::Eof => {
                    if let Some(open) = stack.last() {
                        return Err(Error::invalid_section_end(
                            format!("unclosed section '{}'", open.name),
                            open.line,
                        ));
                    }
                    break;
                }

                TokenKind::Text(value) => {
                    if !value.is_empty() {
                        children(&mut stack, &mut top).push(Tag::Text { value });
                    }
                }

                // Comments produce nothing; the delimiter switch already
                // happened inside the lexer.
                TokenKind::Comment(_) | TokenKind::DelimiterChange(_) => {}

                TokenKind::Variable(content) => {
                    if content == "else" {
                        if let Some(open) = stack.last_mut() {
                            if matches!(open.kind, BlockKind::Helper { .. }) {
                                if open.in_inverse {
                                    return Err(Error::invalid_tag(
                                        "duplicate {{else}}",
                                        token.line,
                                    ));
                                }
                                open.in_inverse = true;
                                continue;
                            }
                        }
                    }
                    let tag = match content.split_once(char::is_whitespace) {
                        Some((name, params)) => Tag::Helper {
                            name: name.to_string(),
                            params: params.trim().to_string(),
                            line: token.line,
                        },
                        None => Tag::Variable {
                            name: content,
                            escape: true,
                            line: token.line,
                        },
                    };
                    children(&mut stack, &mut top).push(tag);
                }

                TokenKind::Unescaped(name) => {
                    children(&mut stack, &mut top).push(Tag::Variable {
                        name,
                        escape: false,
                        line: token.line,
                    });
                }

                TokenKind::SectionOpen(content) => {
                    let (name, kind) = match content.split_once(char::is_whitespace) {
                        Some((name, params)) => (
                            name.to_string(),
                            BlockKind::Helper {
                                params: params.trim().to_string(),
                            },
                        ),
                        None => (content, BlockKind::Section { inverted: false }),
                    };
                    self.open(&mut stack, kind, name, token.line);
                }

                TokenKind::InvertedOpen(name) => {
                    self.open(&mut stack, BlockKind::Section { inverted: true }, name, token.line);
                }

                TokenKind::Extend(name) => {
                    self.open(&mut stack, BlockKind::Extend, name, token.line);
                }

                TokenKind::ExtendSection(name) => {
                    self.open(&mut stack, BlockKind::ExtendSection, name, token.line);
                }

                TokenKind::Partial(name) => {
                    children(&mut stack, &mut top).push(Tag::Partial {
                        name,
                        line: token.line,
                    });
                }

                TokenKind::SectionClose(name) => {
                    let open = stack.pop().ok_or_else(|| {
                        Error::invalid_section_end(
                            format!("unexpected close of '{name}'"),
                            token.line,
                        )
                    })?;
                    if open.name != name {
                        return Err(Error::invalid_section_end(
                            format!("expected close of '{}', found '{}'", open.name, name),
                            token.line,
                        ));
                    }
                    self.lexer.pop_block();
                    let tag = close_block(open);
                    children(&mut stack, &mut top).push(tag);
                }
            }
        }

        Ok(top)
    }

    fn open(&mut self, stack: &mut Vec<OpenBlock>, kind: BlockKind, name: String, line: usize) {
        self.lexer.push_block();
        stack.push(OpenBlock {
            kind,
            name,
            line,
            body: Vec::new(),
            inverse: Vec::new(),
            in_inverse: false,
        });
    }
}

fn children<'a>(stack: &'a mut [OpenBlock], top: &'a mut Vec<Tag>) -> &'a mut Vec<Tag> {
    match stack.last_mut() {
        Some(open) if open.in_inverse => &mut open.inverse,
        Some(open) => &mut open.body,
        None => top,
    }
}

fn close_block(open: OpenBlock) -> Tag {
    match open.kind {
        BlockKind::Section { inverted } => Tag::Section {
            name: open.name,
            inverted,
            body: open.body,
            line: open.line,
        },
        BlockKind::Helper { params } => Tag::HelperBlock {
            name: open.name,
            params,
            body: open.body,
            inverse: open.inverse,
            line: open.line,
        },
        BlockKind::Extend => Tag::Extend {
            name: open.name,
            body: open.body,
            line: open.line,
        },
        BlockKind::ExtendSection => Tag::ExtendSection {
            name: open.name,
            body: open.body,
            line: open.line,
        },
    }
}

/// Remove the indentation a standalone tag left behind in the preceding
/// text span.
fn strip_indent(children: &mut Vec<Tag>) {
    if let Some(Tag::Text { value }) = children.last_mut() {
        let kept = value.trim_end_matches([' ', '\t']).len();
        value.truncate(kept);
        if value.is_empty() {
            children.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<Tag> {
        Parser::new(source, Delimiters::default(), true)
            .parse()
            .unwrap()
    }

    #[test]
    fn test_parse_text_and_variable() {
        let tags = parse("Hello {{name}}!");
        assert_eq!(tags.len(), 3);
        match &tags[1] {
            Tag::Variable { name, escape, .. } => {
                assert_eq!(name, "name");
                assert!(escape);
            }
            _ => panic!("Expected variable tag"),
        }
    }

    #[test]
    fn test_parse_section() {
        let tags = parse("{{#items}}{{.}}{{/items}}");
        match &tags[0] {
            Tag::Section {
                name,
                inverted,
                body,
                ..
            } => {
                assert_eq!(name, "items");
                assert!(!inverted);
                assert_eq!(body.len(), 1);
            }
            _ => panic!("Expected section tag"),
        }
    }

    #[test]
    fn test_parse_inverted_section() {
        let tags = parse("{{^items}}empty{{/items}}");
        assert!(matches!(&tags[0], Tag::Section { inverted: true, .. }));
    }

    #[test]
    fn test_parse_helper_block_with_else() {
        let tags = parse("{{#if flag}}yes{{else}}no{{/if}}");
        match &tags[0] {
            Tag::HelperBlock {
                name,
                params,
                body,
                inverse,
                ..
            } => {
                assert_eq!(name, "if");
                assert_eq!(params, "flag");
                assert!(matches!(&body[0], Tag::Text { value } if value == "yes"));
                assert!(matches!(&inverse[0], Tag::Text { value } if value == "no"));
            }
            _ => panic!("Expected helper block"),
        }
    }

    #[test]
    fn test_bare_else_outside_helper_is_a_variable() {
        let tags = parse("{{else}}");
        assert!(matches!(&tags[0], Tag::Variable { name, .. } if name == "else"));
    }

    #[test]
    fn test_inline_helper() {
        let tags = parse("{{fmt value 'short'}}");
        match &tags[0] {
            Tag::Helper { name, params, .. } => {
                assert_eq!(name, "fmt");
                assert_eq!(params, "value 'short'");
            }
            _ => panic!("Expected inline helper"),
        }
    }

    #[test]
    fn test_mismatched_close_rejected() {
        let err = Parser::new("{{#a}}{{/b}}", Delimiters::default(), true)
            .parse()
            .unwrap_err();
        assert_eq!(err.error_code(), "E_COMPILE_INVALID_SECTION_END");
    }

    #[test]
    fn test_unclosed_section_rejected() {
        let err = Parser::new("{{#a}}body", Delimiters::default(), true)
            .parse()
            .unwrap_err();
        assert_eq!(err.error_code(), "E_COMPILE_INVALID_SECTION_END");
    }

    #[test]
    fn test_stray_close_rejected() {
        let err = Parser::new("{{/a}}", Delimiters::default(), true)
            .parse()
            .unwrap_err();
        assert_eq!(err.error_code(), "E_COMPILE_INVALID_SECTION_END");
    }

    #[test]
    fn test_comment_dropped() {
        let tags = parse("a{{! ignored }}b");
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_delimiter_change_scoped_to_section() {
        let tags = parse("{{#sec}}{{=<% %>=}}<%x%>{{/sec}}{{x}}");
        assert_eq!(tags.len(), 2);
        match &tags[0] {
            Tag::Section { body, .. } => {
                assert!(matches!(&body[0], Tag::Variable { name, .. } if name == "x"));
            }
            _ => panic!("Expected section tag"),
        }
        // The change did not leak past the close: {{x}} is still a tag.
        assert!(matches!(&tags[1], Tag::Variable { name, .. } if name == "x"));
    }

    #[test]
    fn test_extend_with_override() {
        let tags = parse("{{<base}}{{$title}}custom{{/title}}{{/base}}");
        match &tags[0] {
            Tag::Extend { name, body, .. } => {
                assert_eq!(name, "base");
                assert!(body
                    .iter()
                    .any(|t| matches!(t, Tag::ExtendSection { name, .. } if name == "title")));
            }
            _ => panic!("Expected extend tag"),
        }
    }

    #[test]
    fn test_standalone_section_lines_trimmed() {
        let tags = parse("Shown.\n{{#hidden}}\nNever.\n{{/hidden}}\n");
        match (&tags[0], &tags[1]) {
            (Tag::Text { value }, Tag::Section { body, .. }) => {
                assert_eq!(value, "Shown.\n");
                assert!(matches!(&body[0], Tag::Text { value } if value == "Never.\n"));
            }
            other => panic!("Unexpected tags: {other:?}"),
        }
    }
}
