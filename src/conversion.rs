use std::borrow::Cow;

use crate::common::{filename_safe, unaccent};
use crate::tags::Value;

/// A single-letter post-processing step written as `!x` in a field, applied to the resolved value
/// before the format spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// `u`: strip accents from strings.
    Unaccent,
    /// `w`: strip accents and characters that are illegal in a path segment.
    FilenameSafe,
    /// `r`: quoted, escaped form.
    Repr,
    /// `a`: like `r` with non-ASCII characters escaped.
    Ascii,
    /// Any other letter: plain stringification.
    Stringify(char),
}

impl Conversion {
    pub fn from_char(c: char) -> Conversion {
        match c {
            'u' => Conversion::Unaccent,
            'w' => Conversion::FilenameSafe,
            'r' => Conversion::Repr,
            'a' => Conversion::Ascii,
            other => Conversion::Stringify(other),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Conversion::Unaccent => 'u',
            Conversion::FilenameSafe => 'w',
            Conversion::Repr => 'r',
            Conversion::Ascii => 'a',
            Conversion::Stringify(c) => *c,
        }
    }

    /// Accent conversions only touch strings; numbers pass through unchanged.
    pub fn apply<'a>(&self, value: Cow<'a, Value>) -> Cow<'a, Value> {
        let converted = match (self, value.as_ref()) {
            (Conversion::Unaccent, Value::Str(s)) => unaccent(s),
            (Conversion::FilenameSafe, Value::Str(s)) => filename_safe(s),
            (Conversion::Repr, v) => v.repr(false),
            (Conversion::Ascii, v) => v.repr(true),
            (Conversion::Stringify(_), v @ (Value::Int(_) | Value::Float(_))) => v.to_string(),
            _ => return value,
        };
        Cow::Owned(Value::Str(converted))
    }
}
