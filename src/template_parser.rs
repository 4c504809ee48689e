/// The template_parser module compiles a template into a tree of field nodes.
///
/// The syntax is that of a `str.format()`-style format string, with these additions:
///
/// * `{}` renders nothing and can be used as a separator.
/// * `{tag?then#else}` tests whether `tag` is present and renders one of two nested templates.
///   Only presence is tested. Inside a clause `#` is escaped as `##`, and `{}`, `{.` and `.}` can
///   separate an escaped `#` from the else operator.
/// * `{tag?}` renders `tag` when it is present.
/// * A width without an alignment right-aligns, for every type of value.
/// * `!u` strips accents from the value and `!w` also strips characters that are not allowed in
///   filenames.
///
/// For example, `{track:02?{track}#00}` zero-pads the track number when present and renders
/// `00` otherwise.
use std::collections::VecDeque;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::conversion::Conversion;
use crate::error::TemplateError;
use crate::format_spec::FormatSpec;
use crate::tags::Lookup;
use crate::tokenizer::{tokenize, Token};

static DESCRIPTOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z_][a-zA-Z0-9_]*)(?:!([a-zA-Z]))?(?::([^?]+))?(\?.*)?").unwrap());

static POSITIONAL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A literal-only node, also produced by `{}`.
    Empty,
    /// A purely numeric reference. Positional arguments are not supported, so it renders nothing.
    Positional(String),
    Name(String),
    Conditional(Conditional),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    /// The tag whose presence selects the clause.
    pub test: String,
    pub then_clause: Vec<FieldNode>,
    pub else_clause: Vec<FieldNode>,
}

impl Conditional {
    pub fn new(test: &str) -> Self {
        Conditional {
            test: test.to_string(),
            then_clause: Vec::new(),
            else_clause: Vec::new(),
        }
    }
}

/// One rendering unit: a literal prefix followed by a formatted field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    pub literal: String,
    pub field: Field,
    pub spec: FormatSpec,
    pub conversion: Option<Conversion>,
}

impl FieldNode {
    pub fn literal(text: String) -> Self {
        FieldNode {
            literal: text,
            field: Field::Empty,
            spec: FormatSpec::default(),
            conversion: None,
        }
    }
}

/// A compiled template. It is immutable and can be rendered any number of times, from any number
/// of threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTemplate {
    nodes: Vec<FieldNode>,
}

impl ParsedTemplate {
    pub fn parse(template: &str) -> Result<ParsedTemplate, TemplateError> {
        let parsed = parse_tokens(tokenize(template))?;
        tracing::debug!("Parsed template raw={:?} into {} nodes", template, parsed.nodes.len());
        Ok(parsed)
    }

    pub fn nodes(&self) -> &[FieldNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn render<L: Lookup + ?Sized>(&self, tags: &L) -> String {
        crate::templates::render(self, tags)
    }
}

impl FromStr for ParsedTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParsedTemplate::parse(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Then,
    Else,
}

/// A conditional whose closing brace has not been seen yet, along with the literal, spec and
/// conversion that wrap it in the enclosing clause.
#[derive(Debug)]
struct Frame {
    literal: String,
    spec: FormatSpec,
    conversion: Option<Conversion>,
    conditional: Conditional,
    building: Clause,
}

impl Frame {
    fn push(&mut self, node: FieldNode) {
        match self.building {
            Clause::Then => self.conditional.then_clause.push(node),
            Clause::Else => self.conditional.else_clause.push(node),
        }
    }

    fn into_node(self) -> FieldNode {
        FieldNode {
            literal: self.literal,
            field: Field::Conditional(self.conditional),
            spec: self.spec,
            conversion: self.conversion,
        }
    }
}

/// The parsed contents of the text between `{` and `}`.
#[derive(Debug, PartialEq)]
enum Descriptor<'a> {
    Positional(&'a str),
    Field {
        name: &'a str,
        conversion: Option<Conversion>,
        spec: FormatSpec,
        /// The text after `?`, if this is a conditional.
        condition: Option<&'a str>,
    },
}

impl<'a> Descriptor<'a> {
    fn parse(raw: &'a str) -> Result<Descriptor<'a>, TemplateError> {
        if POSITIONAL_REGEX.is_match(raw) {
            return Ok(Descriptor::Positional(raw));
        }

        let caps = DESCRIPTOR_REGEX
            .captures(raw)
            .ok_or_else(|| TemplateError::InvalidIdentifier {
                token: raw.to_string(),
            })?;
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        if whole.start > 0 {
            return Err(TemplateError::InvalidIdentifier {
                token: raw[..whole.start].to_string(),
            });
        }
        if whole.end < raw.len() {
            return Err(TemplateError::UnexpectedToken {
                token: raw[whole.end..].to_string(),
            });
        }

        let spec = match caps.get(3) {
            Some(m) => FormatSpec::parse(m.as_str())?,
            None => FormatSpec::default(),
        };
        Ok(Descriptor::Field {
            name: caps.get(1).map_or("", |m| m.as_str()),
            conversion: caps
                .get(2)
                .and_then(|m| m.as_str().chars().next())
                .map(Conversion::from_char),
            spec,
            condition: caps.get(4).map(|m| &m.as_str()[1..]),
        })
    }
}

pub fn parse_template(template: &str) -> Result<ParsedTemplate, TemplateError> {
    ParsedTemplate::parse(template)
}

/// Builds the node tree from a token stream. Open conditionals are kept on an explicit stack;
/// clause text is split at its first `#` and fed back into the stream so that nested fields and
/// the else operator are handled by the same loop.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<ParsedTemplate, TemplateError> {
    let mut queue: VecDeque<Token> = tokens.into();
    let mut literal = String::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut nodes: Vec<FieldNode> = Vec::new();

    while let Some(token) = queue.pop_front() {
        match token {
            Token::Escaped(c) => literal.push(c),
            Token::Open { .. } => {
                let raw = match queue.pop_front() {
                    None => return Err(TemplateError::UnclosedOpenBrace),
                    Some(Token::Close { .. }) => continue,
                    Some(Token::Text(raw)) => raw,
                    Some(other) => {
                        return Err(TemplateError::InvalidIdentifier {
                            token: other.to_string(),
                        })
                    }
                };
                match Descriptor::parse(&raw)? {
                    Descriptor::Field {
                        name,
                        conversion,
                        spec,
                        condition: Some(condition),
                    } => {
                        stack.push(Frame {
                            literal: std::mem::take(&mut literal),
                            spec,
                            conversion,
                            conditional: Conditional::new(name),
                            building: Clause::Then,
                        });
                        requeue_split(&mut queue, condition);
                    }
                    Descriptor::Field {
                        name,
                        conversion,
                        spec,
                        condition: None,
                    } => {
                        expect_close(&mut queue)?;
                        let node = FieldNode {
                            literal: std::mem::take(&mut literal),
                            field: Field::Name(name.to_string()),
                            spec,
                            conversion,
                        };
                        emit(&mut stack, &mut nodes, node);
                    }
                    Descriptor::Positional(index) => {
                        expect_close(&mut queue)?;
                        let node = FieldNode {
                            literal: std::mem::take(&mut literal),
                            field: Field::Positional(index.to_string()),
                            spec: FormatSpec::default(),
                            conversion: None,
                        };
                        emit(&mut stack, &mut nodes, node);
                    }
                }
            }
            ref token if token.is_else_operator() => {
                let frame = match stack.last_mut() {
                    Some(frame) if frame.building == Clause::Then => frame,
                    _ => {
                        return Err(TemplateError::UnexpectedToken {
                            token: token.to_string(),
                        })
                    }
                };
                frame.push(FieldNode::literal(std::mem::take(&mut literal)));
                frame.building = Clause::Else;
            }
            Token::Text(text) if !stack.is_empty() && text.contains('#') => {
                requeue_split(&mut queue, &text);
            }
            Token::Text(text) => literal.push_str(&text),
            Token::Close { .. } => {
                let mut frame = stack.pop().ok_or(TemplateError::UnmatchedCloseBrace)?;
                if !literal.is_empty() {
                    frame.push(FieldNode::literal(std::mem::take(&mut literal)));
                }
                emit(&mut stack, &mut nodes, frame.into_node());
            }
        }
    }

    if !stack.is_empty() {
        return Err(TemplateError::UnclosedOpenBrace);
    }
    if !literal.is_empty() {
        nodes.push(FieldNode::literal(literal));
    }
    Ok(ParsedTemplate { nodes })
}

/// A plain field must be closed by the very next token.
fn expect_close(queue: &mut VecDeque<Token>) -> Result<(), TemplateError> {
    match queue.pop_front() {
        Some(Token::Close { .. }) => Ok(()),
        Some(other) => Err(TemplateError::UnexpectedToken {
            token: other.to_string(),
        }),
        None => Err(TemplateError::UnclosedOpenBrace),
    }
}

/// Pushes `text` back onto the front of the queue, split at its first `#` into the text before,
/// the else operator and the text after.
fn requeue_split(queue: &mut VecDeque<Token>, text: &str) {
    let (before, after) = match text.split_once('#') {
        Some((before, after)) => (before, Some(after)),
        None => (text, None),
    };
    if let Some(after) = after {
        if !after.is_empty() {
            queue.push_front(Token::Text(after.to_string()));
        }
        queue.push_front(Token::Text("#".to_string()));
    }
    if !before.is_empty() {
        queue.push_front(Token::Text(before.to_string()));
    }
}

/// Attaches a finished node to the clause being built by the innermost open conditional, or to
/// the top level.
fn emit(stack: &mut [Frame], nodes: &mut Vec<FieldNode>, node: FieldNode) {
    match stack.last_mut() {
        Some(frame) => frame.push(node),
        None => nodes.push(node),
    }
}
