use crate::format_spec::{Align, FormatSpec, FormatType, Grouping, Sign};
use crate::tags::Value;

/// Formats a resolved value according to a parsed spec.
///
/// Strings given a numeric presentation type are coerced when they parse as a number, and are
/// otherwise formatted as text with the type ignored. Formatting never fails.
pub fn format_value(value: &Value, spec: &FormatSpec) -> String {
    if spec.is_empty() {
        return value.to_string();
    }
    match value {
        Value::Str(s) => format_str(s, spec),
        Value::Int(i) => format_int(*i, spec),
        Value::Float(x) => format_float(*x, spec),
    }
}

fn format_str(s: &str, spec: &FormatSpec) -> String {
    match spec.kind {
        Some(kind) if kind.is_integer() => {
            if let Ok(i) = s.trim().parse::<i64>() {
                return format_int(i, spec);
            }
        }
        Some(kind) if kind.is_float() => {
            if let Ok(x) = s.trim().parse::<f64>() {
                return format_float(x, spec);
            }
        }
        Some(FormatType::Number) => {
            if let Ok(i) = s.trim().parse::<i64>() {
                return format_int(i, spec);
            }
            if let Ok(x) = s.trim().parse::<f64>() {
                return format_float(x, spec);
            }
        }
        _ => {}
    }
    pad_text(s, spec)
}

fn pad_text(s: &str, spec: &FormatSpec) -> String {
    let body: String = match spec.precision {
        Some(precision) => s.chars().take(precision).collect(),
        None => s.to_string(),
    };
    pad("", &body, spec, false)
}

fn format_int(i: i64, spec: &FormatSpec) -> String {
    let kind = spec.kind.unwrap_or(FormatType::Decimal);
    if kind.is_float() {
        return format_float(i as f64, spec);
    }
    match kind {
        FormatType::Str => return pad_text(&i.to_string(), spec),
        FormatType::Char => {
            if let Some(c) = u32::try_from(i).ok().and_then(char::from_u32) {
                return pad("", &c.to_string(), spec, false);
            }
        }
        _ => {}
    }

    let magnitude = i.unsigned_abs();
    let (digits, prefix, group_size) = match kind {
        FormatType::Binary => (format!("{magnitude:b}"), "0b", 4),
        FormatType::Octal => (format!("{magnitude:o}"), "0o", 4),
        FormatType::LowerHex => (format!("{magnitude:x}"), "0x", 4),
        FormatType::UpperHex => (format!("{magnitude:X}"), "0X", 4),
        _ => (magnitude.to_string(), "", 3),
    };
    let mut lead = sign_prefix(i < 0, spec.sign).to_string();
    if spec.alternate {
        lead.push_str(prefix);
    }
    let digits = match spec.grouping {
        Some(grouping) => {
            let min_width = grouped_zero_fill_width(spec, lead.chars().count());
            group_digits_padded(&digits, grouping, group_size, min_width)
        }
        None => digits,
    };
    pad(&lead, &digits, spec, true)
}

fn format_float(x: f64, spec: &FormatSpec) -> String {
    match spec.kind {
        Some(kind) if kind.is_integer() => return format_int(x.trunc() as i64, spec),
        Some(FormatType::Str) => return pad_text(&Value::Float(x).to_string(), spec),
        _ => {}
    }

    let negative = x.is_sign_negative() && !x.is_nan();
    let abs = x.abs();
    let upper = spec.kind.is_some_and(|k| k.is_upper());

    let body = if !abs.is_finite() {
        let text = if abs.is_nan() { "nan" } else { "inf" };
        let text = if upper { text.to_uppercase() } else { text.to_string() };
        if spec.kind == Some(FormatType::Percent) {
            format!("{text}%")
        } else {
            text
        }
    } else {
        match spec.kind {
            None => match spec.precision {
                None => crate::tags::float_repr(abs),
                Some(precision) => general(abs, precision, spec.alternate, false, true),
            },
            Some(FormatType::LowerFixed) | Some(FormatType::UpperFixed) => {
                fixed(abs, spec.precision.unwrap_or(6), spec.alternate)
            }
            Some(FormatType::LowerExp) | Some(FormatType::UpperExp) => {
                scientific(abs, spec.precision.unwrap_or(6), spec.alternate, upper)
            }
            Some(FormatType::Percent) => {
                format!("{}%", fixed(abs * 100.0, spec.precision.unwrap_or(6), spec.alternate))
            }
            _ => general(abs, spec.precision.unwrap_or(6), spec.alternate, upper, false),
        }
    };

    let lead = sign_prefix(negative, spec.sign);
    let body = match spec.grouping {
        Some(grouping) => {
            let int_len = body.chars().take_while(|c| c.is_ascii_digit()).count();
            let tail = &body[int_len..];
            let min_width = grouped_zero_fill_width(spec, lead.len() + tail.chars().count());
            format!("{}{tail}", group_digits_padded(&body[..int_len], grouping, 3, min_width))
        }
        None => body,
    };

    pad(lead, &body, spec, true)
}

fn fixed(abs: f64, precision: usize, alternate: bool) -> String {
    let mut s = format!("{abs:.precision$}");
    if alternate && precision == 0 {
        s.push('.');
    }
    s
}

/// Exponent notation with a signed, at least two digit exponent (`1.500000e+03`).
fn scientific(abs: f64, precision: usize, alternate: bool, upper: bool) -> String {
    let s = format!("{abs:.precision$e}");
    let (mantissa, exp) = split_exponent(&s);
    let mut mantissa = mantissa.to_string();
    if alternate && precision == 0 {
        mantissa.push('.');
    }
    join_exponent(&mantissa, exp, upper)
}

/// The "general" presentation: fixed or exponent notation depending on the magnitude, with
/// insignificant trailing zeros removed unless `alternate` is set. `repr_style` is the variant
/// used when no type letter is given: it switches to exponent notation one digit earlier and
/// always keeps a fractional digit in fixed notation.
fn general(abs: f64, precision: usize, alternate: bool, upper: bool, repr_style: bool) -> String {
    let precision = precision.max(1);
    let probe = format!("{:.*e}", precision - 1, abs);
    let (mantissa, exp) = split_exponent(&probe);
    let threshold = if repr_style { precision as i32 - 1 } else { precision as i32 };

    if (-4..threshold).contains(&exp) {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        let mut s = format!("{abs:.decimals$}");
        if !alternate {
            s = strip_trailing_zeros(&s);
        }
        if repr_style && !s.contains('.') {
            s.push_str(".0");
        }
        s
    } else {
        let mantissa = if alternate {
            mantissa.to_string()
        } else {
            strip_trailing_zeros(mantissa)
        };
        join_exponent(&mantissa, exp, upper)
    }
}

fn strip_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn split_exponent(s: &str) -> (&str, i32) {
    match s.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

fn join_exponent(mantissa: &str, exp: i32, upper: bool) -> String {
    let e = if upper { 'E' } else { 'e' };
    let exp_sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}{e}{exp_sign}{:02}", exp.abs())
}

fn sign_prefix(negative: bool, sign: Option<Sign>) -> &'static str {
    match (negative, sign) {
        (true, _) => "-",
        (false, Some(Sign::Always)) => "+",
        (false, Some(Sign::Space)) => " ",
        (false, _) => "",
    }
}

fn group_digits(digits: &str, grouping: Grouping, size: usize) -> String {
    let sep = grouping.as_char();
    let len = digits.chars().count();
    let mut out = String::with_capacity(len + len / size);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % size == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// With `=` alignment and a `0` fill, the zero padding is part of the number and gets grouped
/// too. Returns how wide the grouped digits must be, or 0 when the padding is plain fill.
fn grouped_zero_fill_width(spec: &FormatSpec, other_len: usize) -> usize {
    let fill = spec.fill.unwrap_or(if spec.zero_pad { '0' } else { ' ' });
    if spec.align == Some(Align::AfterSign) && fill == '0' {
        spec.width.unwrap_or(0).saturating_sub(other_len)
    } else {
        0
    }
}

/// Groups `digits` after extending them with leading zeros until the grouped text is at least
/// `min_width` long. The result never starts with a separator.
fn group_digits_padded(digits: &str, grouping: Grouping, size: usize, min_width: usize) -> String {
    let len = digits.chars().count();
    if len == 0 {
        return String::new();
    }
    let mut wanted = len;
    while wanted + (wanted - 1) / size < min_width {
        wanted += 1;
    }
    let extended = format!("{}{digits}", "0".repeat(wanted - len));
    group_digits(&extended, grouping, size)
}

/// Pads `lead + body` out to the spec's width. `lead` is the sign and radix prefix, kept in front
/// of the padding for `=` alignment.
fn pad(lead: &str, body: &str, spec: &FormatSpec, numeric: bool) -> String {
    let width = spec.width.unwrap_or(0);
    let len = lead.chars().count() + body.chars().count();
    if len >= width {
        return format!("{lead}{body}");
    }

    let fill = spec.fill.unwrap_or(if spec.zero_pad { '0' } else { ' ' });
    let align = spec.align.unwrap_or(match (numeric, spec.zero_pad) {
        (true, true) => Align::AfterSign,
        (true, false) => Align::Right,
        (false, _) => Align::Left,
    });
    let padding = width - len;
    let fills = |n: usize| fill.to_string().repeat(n);

    match align {
        Align::Left => format!("{lead}{body}{}", fills(padding)),
        Align::Right => format!("{}{lead}{body}", fills(padding)),
        Align::AfterSign if numeric => format!("{lead}{}{body}", fills(padding)),
        Align::AfterSign => format!("{}{lead}{body}", fills(padding)),
        Align::Center => {
            let left = padding / 2;
            format!("{}{lead}{body}{}", fills(left), fills(padding - left))
        }
    }
}
