pub mod common;
pub mod config;
pub mod conversion;
pub mod error;
pub mod format_spec;
pub mod formatter;
pub mod tags;
pub mod template_parser;
pub mod templates;
pub mod tokenizer;

mod testing;

pub use common::{filename_safe, initialize_logging, unaccent, LogOutput};
pub use config::Config;
pub use error::{Result, StrinkError, StrinkExpectedError, TemplateError};
pub use format_spec::FormatSpec;
pub use tags::{Lookup, TagMap, Value};
pub use template_parser::{parse_template, ParsedTemplate};
pub use templates::{evaluate_path_template, render, PathTemplate};

#[cfg(test)]
mod config_test;
#[cfg(test)]
mod tags_test;
