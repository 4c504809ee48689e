/// The templates module renders compiled templates against a tag mapping, and wraps template text
/// so it can live in the configuration and be compiled on demand.
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::conversion::Conversion;
use crate::error::{Result, TemplateError};
use crate::format_spec::FormatSpec;
use crate::formatter::format_value;
use crate::tags::{Lookup, Value};
use crate::template_parser::{Field, FieldNode, ParsedTemplate};

/// Renders `template` against `tags`. Missing tags render as empty strings, so rendering never
/// fails.
pub fn render<L: Lookup + ?Sized>(template: &ParsedTemplate, tags: &L) -> String {
    render_nodes(template.nodes(), tags)
}

fn render_nodes<L: Lookup + ?Sized>(nodes: &[FieldNode], tags: &L) -> String {
    let mut out = String::new();
    for node in nodes {
        out.push_str(&node.literal);
        let value = resolve(&node.field, tags);
        out.push_str(&finish(value, node.conversion, &node.spec));
    }
    out
}

/// Resolves a field to its value. `None` means the value is missing.
fn resolve<'a, L: Lookup + ?Sized>(field: &'a Field, tags: &'a L) -> Option<Cow<'a, Value>> {
    match field {
        Field::Empty | Field::Positional(_) => Some(Cow::Owned(Value::Str(String::new()))),
        Field::Name(name) => tags.lookup(name).map(Cow::Borrowed),
        Field::Conditional(cond) => match tags.lookup(&cond.test) {
            // `{tag?}` passes the tag's own value through.
            Some(value) if cond.then_clause.is_empty() => Some(Cow::Borrowed(value)),
            Some(_) => Some(Cow::Owned(Value::Str(render_nodes(&cond.then_clause, tags)))),
            None if cond.then_clause.is_empty() && cond.else_clause.is_empty() => None,
            None => Some(Cow::Owned(Value::Str(render_nodes(&cond.else_clause, tags)))),
        },
    }
}

fn finish(value: Option<Cow<'_, Value>>, conversion: Option<Conversion>, spec: &FormatSpec) -> String {
    let Some(value) = value else {
        return String::new();
    };
    // Present but empty values skip conversion and padding.
    if value.is_empty() {
        return String::new();
    }
    let value = match conversion {
        Some(conversion) => conversion.apply(value),
        None => value,
    };
    format_value(&value, spec)
}

/// A wrapper for a template that stores the template text and compiles it on first use. The text
/// is what gets serialized, compared and hashed.
pub struct PathTemplate {
    pub text: String,
    compiled: OnceCell<ParsedTemplate>,
}

impl PathTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        PathTemplate {
            text: text.into(),
            compiled: OnceCell::new(),
        }
    }

    pub fn compiled(&self) -> std::result::Result<&ParsedTemplate, TemplateError> {
        self.compiled.get_or_try_init(|| {
            debug!("Compiling path template {:?}", self.text);
            ParsedTemplate::parse(&self.text)
        })
    }

    pub fn evaluate<L: Lookup + ?Sized>(&self, tags: &L) -> Result<String> {
        Ok(render(self.compiled()?, tags))
    }
}

impl Clone for PathTemplate {
    fn clone(&self) -> Self {
        PathTemplate {
            text: self.text.clone(),
            compiled: self.compiled.clone(),
        }
    }
}

impl fmt::Debug for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathTemplate").field(&self.text).finish()
    }
}

impl PartialEq for PathTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for PathTemplate {}

impl Hash for PathTemplate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl Serialize for PathTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for PathTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(PathTemplate::new)
    }
}

/// Builds a destination path: the rendered template, plus `suffix`, under `dest`.
pub fn evaluate_path_template<L: Lookup + ?Sized>(
    template: &PathTemplate,
    tags: &L,
    dest: &Path,
    suffix: &str,
) -> Result<PathBuf> {
    let rendered = template.evaluate(tags)?;
    Ok(dest.join(format!("{rendered}{suffix}")))
}
