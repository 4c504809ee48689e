/// The format_spec module parses the mini-grammar that follows `:` in a field:
///
/// ```text
/// [[fill]align][sign]["#"]["0"][width][grouping]["." precision][type]
/// ```
///
/// Any character outside this grammar is a hard error. When a width is given without an
/// alignment, the field is right-aligned regardless of the value's type.
use std::fmt;

use crate::error::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    /// Padding goes between the sign and the digits.
    AfterSign,
    Center,
}

impl Align {
    pub fn from_char(c: char) -> Option<Align> {
        match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '=' => Some(Align::AfterSign),
            '^' => Some(Align::Center),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Align::Left => '<',
            Align::Right => '>',
            Align::AfterSign => '=',
            Align::Center => '^',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Always,
    NegativeOnly,
    Space,
}

impl Sign {
    pub fn from_char(c: char) -> Option<Sign> {
        match c {
            '+' => Some(Sign::Always),
            '-' => Some(Sign::NegativeOnly),
            ' ' => Some(Sign::Space),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Sign::Always => '+',
            Sign::NegativeOnly => '-',
            Sign::Space => ' ',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Underscore,
    Comma,
}

impl Grouping {
    pub fn from_char(c: char) -> Option<Grouping> {
        match c {
            '_' => Some(Grouping::Underscore),
            ',' => Some(Grouping::Comma),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Grouping::Underscore => '_',
            Grouping::Comma => ',',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    Binary,
    Char,
    Decimal,
    LowerExp,
    UpperExp,
    LowerFixed,
    UpperFixed,
    LowerGeneral,
    UpperGeneral,
    Number,
    Octal,
    Str,
    LowerHex,
    UpperHex,
    Percent,
}

impl FormatType {
    pub fn from_char(c: char) -> Option<FormatType> {
        match c {
            'b' => Some(FormatType::Binary),
            'c' => Some(FormatType::Char),
            'd' => Some(FormatType::Decimal),
            'e' => Some(FormatType::LowerExp),
            'E' => Some(FormatType::UpperExp),
            'f' => Some(FormatType::LowerFixed),
            'F' => Some(FormatType::UpperFixed),
            'g' => Some(FormatType::LowerGeneral),
            'G' => Some(FormatType::UpperGeneral),
            'n' => Some(FormatType::Number),
            'o' => Some(FormatType::Octal),
            's' => Some(FormatType::Str),
            'x' => Some(FormatType::LowerHex),
            'X' => Some(FormatType::UpperHex),
            '%' => Some(FormatType::Percent),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            FormatType::Binary => 'b',
            FormatType::Char => 'c',
            FormatType::Decimal => 'd',
            FormatType::LowerExp => 'e',
            FormatType::UpperExp => 'E',
            FormatType::LowerFixed => 'f',
            FormatType::UpperFixed => 'F',
            FormatType::LowerGeneral => 'g',
            FormatType::UpperGeneral => 'G',
            FormatType::Number => 'n',
            FormatType::Octal => 'o',
            FormatType::Str => 's',
            FormatType::LowerHex => 'x',
            FormatType::UpperHex => 'X',
            FormatType::Percent => '%',
        }
    }

    /// Presentation types that only make sense for integers.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            FormatType::Binary
                | FormatType::Char
                | FormatType::Decimal
                | FormatType::Octal
                | FormatType::LowerHex
                | FormatType::UpperHex
        )
    }

    /// Presentation types that render a floating point number.
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            FormatType::LowerExp
                | FormatType::UpperExp
                | FormatType::LowerFixed
                | FormatType::UpperFixed
                | FormatType::LowerGeneral
                | FormatType::UpperGeneral
                | FormatType::Percent
        )
    }

    pub fn is_upper(&self) -> bool {
        matches!(
            self,
            FormatType::UpperExp | FormatType::UpperFixed | FormatType::UpperGeneral | FormatType::UpperHex
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatSpec {
    pub fill: Option<char>,
    pub align: Option<Align>,
    pub sign: Option<Sign>,
    pub alternate: bool,
    pub zero_pad: bool,
    pub width: Option<usize>,
    pub grouping: Option<Grouping>,
    pub precision: Option<usize>,
    pub kind: Option<FormatType>,
}

impl FormatSpec {
    pub fn parse(spec: &str) -> Result<FormatSpec, TemplateError> {
        let invalid = || TemplateError::InvalidSpec {
            spec: spec.to_string(),
        };
        let chars: Vec<char> = spec.chars().collect();
        let mut idx = 0;
        let mut parsed = FormatSpec::default();

        // A fill character is only recognized when it is directly followed by an alignment.
        if let Some(align) = chars.get(1).and_then(|c| Align::from_char(*c)) {
            parsed.fill = Some(chars[0]);
            parsed.align = Some(align);
            idx = 2;
        } else if let Some(align) = chars.first().and_then(|c| Align::from_char(*c)) {
            parsed.align = Some(align);
            idx = 1;
        }

        if let Some(sign) = chars.get(idx).and_then(|c| Sign::from_char(*c)) {
            parsed.sign = Some(sign);
            idx += 1;
        }
        if chars.get(idx) == Some(&'#') {
            parsed.alternate = true;
            idx += 1;
        }
        if chars.get(idx) == Some(&'0') {
            parsed.zero_pad = true;
            idx += 1;
        }

        let (width, fwd) = take_digits(&chars[idx..]);
        if fwd > 0 {
            parsed.width = Some(width.ok_or_else(invalid)?);
            idx += fwd;
        }

        if let Some(grouping) = chars.get(idx).and_then(|c| Grouping::from_char(*c)) {
            parsed.grouping = Some(grouping);
            idx += 1;
        }

        if chars.get(idx) == Some(&'.') {
            idx += 1;
            let (precision, fwd) = take_digits(&chars[idx..]);
            if fwd == 0 {
                return Err(invalid());
            }
            parsed.precision = Some(precision.ok_or_else(invalid)?);
            idx += fwd;
        }

        if let Some(kind) = chars.get(idx).and_then(|c| FormatType::from_char(*c)) {
            parsed.kind = Some(kind);
            idx += 1;
        }

        if idx < chars.len() {
            return Err(invalid());
        }

        if parsed.width.is_some() && parsed.align.is_none() {
            parsed.align = Some(Align::Right);
        }
        Ok(parsed)
    }

    pub fn is_empty(&self) -> bool {
        *self == FormatSpec::default()
    }
}

/// The largest width or precision a spec may ask for. Padding is allocated up front, so larger
/// values are rejected when the spec is parsed.
pub const MAX_SPEC_NUMBER: usize = u16::MAX as usize;

/// Reads a run of ASCII digits. Returns the parsed number (None when it exceeds
/// `MAX_SPEC_NUMBER`) and the number of characters consumed.
fn take_digits(chars: &[char]) -> (Option<usize>, usize) {
    let fwd = chars.iter().take_while(|c| c.is_ascii_digit()).count();
    if fwd == 0 {
        return (None, 0);
    }
    let digits: String = chars[..fwd].iter().collect();
    let number = digits.parse::<usize>().ok().filter(|n| *n <= MAX_SPEC_NUMBER);
    (number, fwd)
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(align) = self.align {
            if let Some(fill) = self.fill {
                write!(f, "{fill}")?;
            }
            write!(f, "{}", align.as_char())?;
        }
        if let Some(sign) = self.sign {
            write!(f, "{}", sign.as_char())?;
        }
        if self.alternate {
            f.write_str("#")?;
        }
        if self.zero_pad {
            f.write_str("0")?;
        }
        if let Some(width) = self.width {
            write!(f, "{width}")?;
        }
        if let Some(grouping) = self.grouping {
            write!(f, "{}", grouping.as_char())?;
        }
        if let Some(precision) = self.precision {
            write!(f, ".{precision}")?;
        }
        if let Some(kind) = self.kind {
            write!(f, "{}", kind.as_char())?;
        }
        Ok(())
    }
}

impl std::str::FromStr for FormatSpec {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatSpec::parse(s)
    }
}
