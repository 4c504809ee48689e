/// The tags module holds the value mapping that templates render against. Keys are case
/// insensitive: they are upper-cased on the way in and on every lookup, and iteration preserves
/// insertion order.
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

static LEADING_THE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:(the)\s+)?(.*)").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Only strings have a length; numbers are never considered empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Str(s) if s.is_empty())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// A quoted, escaped rendering of the value suitable for diagnostics. Strings are quoted;
    /// numbers render as they display. With `ascii_only`, non-ASCII characters are escaped.
    pub fn repr(&self, ascii_only: bool) -> String {
        match self {
            Value::Str(s) => quote(s, ascii_only),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => f.write_str(&float_repr(*x)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

/// Shortest round-trip representation of a float: fixed notation with at least one fractional
/// digit inside `1e-4 <= |x| < 1e16`, exponent notation (`1e+16`, `1.5e-07`) outside it.
pub fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x < 0.0 { "-inf".to_string() } else { "inf".to_string() };
    }

    let sign = if x.is_sign_negative() { "-" } else { "" };
    let shortest = format!("{:e}", x.abs());
    let (mantissa, exp) = match shortest.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (shortest.as_str(), 0),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if (-4..16).contains(&exp) {
        let body = if exp >= 0 {
            let int_len = exp as usize + 1;
            if digits.len() <= int_len {
                format!("{}{}.0", digits, "0".repeat(int_len - digits.len()))
            } else {
                format!("{}.{}", &digits[..int_len], &digits[int_len..])
            }
        } else {
            format!("0.{}{}", "0".repeat((-exp - 1) as usize), digits)
        };
        format!("{sign}{body}")
    } else {
        let mantissa = if digits.len() > 1 {
            format!("{}.{}", &digits[..1], &digits[1..])
        } else {
            digits
        };
        let exp_sign = if exp < 0 { '-' } else { '+' };
        format!("{sign}{mantissa}e{exp_sign}{:02}", exp.abs())
    }
}

fn quote(s: &str, ascii_only: bool) -> String {
    let q = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(q);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => out.push_str(&format!("\\x{:02x}", c as u32)),
            c if ascii_only && !c.is_ascii() => {
                let code = c as u32;
                if code <= 0xff {
                    out.push_str(&format!("\\x{code:02x}"));
                } else if code <= 0xffff {
                    out.push_str(&format!("\\u{code:04x}"));
                } else {
                    out.push_str(&format!("\\U{code:08x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

/// A source of values for template rendering. `None` is the "missing" sentinel and must stay
/// distinct from a present-but-empty value.
pub trait Lookup {
    fn lookup(&self, key: &str) -> Option<&Value>;

    fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, Value>", into = "IndexMap<String, Value>")]
pub struct TagMap {
    entries: IndexMap<String, Value>,
}

fn normalize_key(key: &str) -> String {
    key.to_uppercase()
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(normalize_key(key), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(&normalize_key(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize_key(key))
    }

    /// Removes a key while keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(&normalize_key(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copies every entry of `other` into this map, overwriting existing keys.
    pub fn update(&mut self, other: &TagMap) {
        for (k, v) in other.iter() {
            self.entries.insert(k.to_string(), v.clone());
        }
    }

    /// Stores a tag read from a media file along with the tags derived from it.
    pub fn insert_probed(&mut self, tag: &str, content: &str) {
        self.insert(tag, content);

        match tag.to_lowercase().as_str() {
            "composer" => match content.rsplit_once(' ') {
                Some((first_names, last_name)) => {
                    let initials: String = first_names
                        .split(' ')
                        .filter_map(|name| name.chars().next())
                        .collect();
                    self.insert("composerfirstnames", first_names);
                    self.insert("composerlastname", last_name);
                    self.insert("composerinitials", initials);
                }
                None => debug!("Composer {:?} has no first names, not deriving name tags", content),
            },
            "artist" | "album_artist" => {
                let the = match LEADING_THE_REGEX.captures(content) {
                    Some(caps) => [caps.get(2), caps.get(1)]
                        .iter()
                        .flatten()
                        .map(|m| m.as_str())
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                        .join(", "),
                    None => content.to_string(),
                };
                self.insert(&format!("{tag}_the"), the);
            }
            "disc" | "track" if !content.chars().all(|c| c.is_ascii_digit()) => {
                if let Some((num, total)) = content.split_once('/') {
                    self.insert(tag, num);
                    self.insert(&format!("{tag}total"), total);
                }
            }
            _ => {}
        }
    }

    /// Falls back to the file stem when the title tag is absent or empty.
    pub fn fill_title_from_path(&mut self, path: &Path) {
        if self.get("title").is_some_and(|v| !v.is_empty()) {
            return;
        }
        if let Some(stem) = path.file_stem() {
            self.insert("title", stem.to_string_lossy().into_owned());
        }
    }
}

impl Lookup for TagMap {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl From<IndexMap<String, Value>> for TagMap {
    fn from(map: IndexMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl From<TagMap> for IndexMap<String, Value> {
    fn from(tags: TagMap) -> Self {
        tags.entries
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = TagMap::new();
        for (k, v) in iter {
            tags.insert(k.as_ref(), v);
        }
        tags
    }
}

impl fmt::Display for TagMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self
            .iter()
            .map(|(k, v)| format!("{}: {}", quote(k, false), v.repr(false)))
            .collect();
        write!(f, "{{{}}}", items.join(", "))
    }
}

/// Collects the tags shared by a group of files. A key survives if every map that carries it
/// agrees on its value.
pub fn shared_tags<'a>(maps: impl IntoIterator<Item = &'a TagMap>) -> TagMap {
    let mut shared = TagMap::new();
    let mut conflicting: HashSet<String> = HashSet::new();
    for tags in maps {
        for (k, v) in tags.iter() {
            match shared.get(k) {
                Some(existing) if existing != v => {
                    conflicting.insert(k.to_string());
                }
                Some(_) => {}
                None => {
                    shared.insert(k, v.clone());
                }
            }
        }
    }
    for k in &conflicting {
        shared.remove(k);
    }
    shared
}

/// Copies `disc` into `adisc` on every track that has one, but only when the tracks span more
/// than one disc. Templates can then test `{adisc?...}` to add a disc prefix for multi-disc sets.
pub fn mark_multi_disc(tracks: &mut [TagMap]) {
    let mut discs: Vec<&Value> = Vec::new();
    for t in tracks.iter() {
        if let Some(disc) = t.get("disc") {
            if !discs.contains(&disc) {
                discs.push(disc);
            }
        }
    }
    if discs.len() <= 1 {
        return;
    }
    for t in tracks.iter_mut() {
        if let Some(disc) = t.get("disc").cloned() {
            t.insert("adisc", disc);
        }
    }
}
