/// The tokenizer splits a raw template into a flat stream of primitive tokens. It never fails:
/// anything that is not a marker is literal text.
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `{{`, `}}` or `##`, standing for a single literal `{`, `}` or `#`.
    Escaped(char),
    /// `{`, or `{.` when `explicit`.
    Open { explicit: bool },
    /// `}`, or `.}` when `explicit`.
    Close { explicit: bool },
    Text(String),
}

impl Token {
    pub fn is_else_operator(&self) -> bool {
        matches!(self, Token::Text(text) if text == "#")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Escaped(c) => write!(f, "{c}{c}"),
            Token::Open { explicit: false } => f.write_str("{"),
            Token::Open { explicit: true } => f.write_str("{."),
            Token::Close { explicit: false } => f.write_str("}"),
            Token::Close { explicit: true } => f.write_str(".}"),
            Token::Text(text) => f.write_str(text),
        }
    }
}

/// Escapes win over boundary markers, which win over bare braces: `{{.` is an escaped brace
/// followed by a literal dot.
pub fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        let token = match (c, chars.peek().copied()) {
            ('{', Some('{')) => Some(Token::Escaped('{')),
            ('}', Some('}')) => Some(Token::Escaped('}')),
            ('#', Some('#')) => Some(Token::Escaped('#')),
            ('{', Some('.')) => Some(Token::Open { explicit: true }),
            ('.', Some('}')) => Some(Token::Close { explicit: true }),
            _ => None,
        };
        let token = match token {
            Some(token) => {
                chars.next();
                token
            }
            None => match c {
                '{' => Token::Open { explicit: false },
                '}' => Token::Close { explicit: false },
                _ => {
                    text.push(c);
                    continue;
                }
            },
        };
        if !text.is_empty() {
            tokens.push(Token::Text(std::mem::take(&mut text)));
        }
        tokens.push(token);
    }
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}
