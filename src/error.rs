use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrinkError {
    #[error("Strink error: {0}")]
    Generic(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Expected(#[from] StrinkExpectedError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Syntax errors raised while compiling a template. A template either compiles wholly or not at
/// all; none of these are retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("invalid identifier '{token}'")]
    InvalidIdentifier { token: String },
    #[error("unexpected token '{token}'")]
    UnexpectedToken { token: String },
    #[error("unmatched }}")]
    UnmatchedCloseBrace,
    #[error("expected }}")]
    UnclosedOpenBrace,
    #[error("invalid format specifier '{spec}'")]
    InvalidSpec { spec: String },
}

#[derive(Error, Debug)]
pub enum StrinkExpectedError {
    #[error("Configuration file not found ({path})")]
    ConfigNotFound { path: PathBuf },
    #[error("Failed to decode configuration file ({path}): {message}")]
    ConfigDecode { path: PathBuf, message: String },
    #[error("Missing key {key} in configuration file ({path})")]
    MissingConfigKey { key: String, path: PathBuf },
    #[error("Invalid value for {key} in configuration file ({path}): {message}")]
    InvalidConfigValue {
        key: String,
        path: PathBuf,
        message: String,
    },
    #[error("Failed to compile template {key}: {source}")]
    InvalidPathTemplate {
        key: String,
        #[source]
        source: TemplateError,
    },
    #[error("Preset not found in configuration file: {name}")]
    PresetNotFound { name: String },
    #[error("Codec not specified in configuration file: {name}")]
    CodecNotFound { name: String },
    #[error("The default format selects itself in the configuration file")]
    DefaultPresetSelectsItself,
}

pub type Result<T> = std::result::Result<T, StrinkError>;
