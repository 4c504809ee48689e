/// The config module provides the config spec and parsing logic.
///
/// Every key is validated individually so that an invalid configuration produces an error naming
/// the offending key, and unrecognized sections produce warnings rather than errors.
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{Result, StrinkError, StrinkExpectedError};
use crate::tags::TagMap;
use crate::templates::PathTemplate;

/// The key in `[format]` that names the preset used when none is requested.
const DEFAULT_PRESET_KEY: &str = "default";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Where the configuration was read from. Used in error messages.
    pub path: PathBuf,
    /// The preset named by `format.default`, if set.
    pub default_preset: Option<String>,
    /// Format presets keyed by their lowercased name, in file order.
    pub presets: IndexMap<String, PathTemplate>,
    /// Tag rewrite rules, applied in file order.
    pub metadata: IndexMap<String, PathTemplate>,
    /// Transcoding settings keyed by codec name, from `[transcode.<codec>]` tables.
    pub transcodes: IndexMap<String, Transcode>,
}

/// The settings of one `[transcode.<codec>]` table. Only `file_suffix` is interpreted here; the
/// remaining options are passed through to the encoder untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcode {
    pub codec: String,
    pub file_suffix: Option<String>,
    pub options: IndexMap<String, String>,
}

impl Transcode {
    /// The suffix for a transcoded file: `file_suffix` when set, else the source file's own
    /// extension (with its dot), else nothing.
    pub fn suffix_for(&self, source: &Path) -> String {
        match &self.file_suffix {
            Some(suffix) => suffix.clone(),
            None => source
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default(),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "strink")
        .ok_or_else(|| StrinkError::Generic("Failed to get project directories".to_string()))?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

impl Config {
    pub fn parse(config_path_override: Option<&Path>) -> Result<Config> {
        let cfgpath = match config_path_override {
            Some(path) => expand_path(path)?,
            None => default_config_path()?,
        };
        debug!("Loading configuration from {}", cfgpath.display());

        let text = fs::read_to_string(&cfgpath)
            .map_err(|_| StrinkExpectedError::ConfigNotFound { path: cfgpath.clone() })?;
        Config::from_toml_str(&text, &cfgpath)
    }

    pub fn from_toml_str(text: &str, cfgpath: &Path) -> Result<Config> {
        let mut data: toml::Table = toml::from_str(text).map_err(|e| StrinkExpectedError::ConfigDecode {
            path: cfgpath.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut config = Config {
            path: cfgpath.to_path_buf(),
            ..Default::default()
        };

        if let Some(format) = data.remove("format") {
            for (name, value) in string_table("format", format, cfgpath)? {
                if name.eq_ignore_ascii_case(DEFAULT_PRESET_KEY) {
                    config.default_preset = Some(value);
                    continue;
                }
                let template = compile(&format!("format.{name}"), value)?;
                config.presets.insert(name.to_lowercase(), template);
            }
        }

        if let Some(metadata) = data.remove("metadata") {
            for (tag, value) in string_table("metadata", metadata, cfgpath)? {
                let template = compile(&format!("metadata.{tag}"), value)?;
                config.metadata.insert(tag, template);
            }
        }

        if let Some(transcode) = data.remove("transcode") {
            let toml::Value::Table(codecs) = transcode else {
                return Err(StrinkExpectedError::InvalidConfigValue {
                    key: "transcode".to_string(),
                    path: cfgpath.to_path_buf(),
                    message: "must be a table of codec tables".to_string(),
                }
                .into());
            };
            for (codec, value) in codecs {
                let mut options: IndexMap<String, String> =
                    string_table(&format!("transcode.{codec}"), value, cfgpath)?.into_iter().collect();
                let file_suffix = options.shift_remove("file_suffix");
                config.transcodes.insert(
                    codec.clone(),
                    Transcode {
                        codec,
                        file_suffix,
                        options,
                    },
                );
            }
        }

        for key in data.keys() {
            warn!("Unrecognized section {} in configuration file ({})", key, cfgpath.display());
        }

        Ok(config)
    }

    /// Selects a format preset by name, or the preset named by `format.default` when `preset` is
    /// `None`. Names are matched case-insensitively.
    pub fn resolve_format(&self, preset: Option<&str>) -> Result<&PathTemplate> {
        let name = match preset {
            Some(name) => name,
            None => {
                let name = self
                    .default_preset
                    .as_deref()
                    .ok_or_else(|| StrinkExpectedError::MissingConfigKey {
                        key: format!("format.{DEFAULT_PRESET_KEY}"),
                        path: self.path.clone(),
                    })?;
                if name.eq_ignore_ascii_case(DEFAULT_PRESET_KEY) {
                    return Err(StrinkExpectedError::DefaultPresetSelectsItself.into());
                }
                name
            }
        };
        self.presets.get(&name.to_lowercase()).ok_or_else(|| {
            StrinkExpectedError::PresetNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Selects the transcoding settings for `codec`. Codec names are matched exactly.
    pub fn transcode(&self, codec: &str) -> Result<&Transcode> {
        self.transcodes.get(codec).ok_or_else(|| {
            StrinkExpectedError::CodecNotFound {
                name: codec.to_string(),
            }
            .into()
        })
    }

    /// Renders every metadata rule against `tags` and stores the results back into it, so later
    /// rules see the values written by earlier ones. Returns only the written values.
    pub fn apply_metadata(&self, tags: &mut TagMap) -> Result<TagMap> {
        let mut written = TagMap::new();
        for (tag, template) in &self.metadata {
            let value = template.evaluate(&*tags)?;
            debug!("Metadata: {}={:?}", tag, value);
            tags.insert(tag, value.clone());
            written.insert(tag, value);
        }
        Ok(written)
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .map_err(|e| StrinkError::Generic(format!("Failed to expand path {raw}: {e}")))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Reads a section that must be a table of string values.
fn string_table(section: &str, value: toml::Value, cfgpath: &Path) -> Result<Vec<(String, String)>> {
    let table = match value {
        toml::Value::Table(table) => table,
        other => {
            return Err(StrinkExpectedError::InvalidConfigValue {
                key: section.to_string(),
                path: cfgpath.to_path_buf(),
                message: format!("must be a table: got {}", other.type_str()),
            }
            .into())
        }
    };
    table
        .into_iter()
        .map(|(key, value)| match value {
            toml::Value::String(s) => Ok((key, s)),
            other => Err(StrinkError::from(StrinkExpectedError::InvalidConfigValue {
                key: format!("{section}.{key}"),
                path: cfgpath.to_path_buf(),
                message: format!("must be a string: got {}", other.type_str()),
            })),
        })
        .collect()
}

fn compile(key: &str, text: String) -> Result<PathTemplate> {
    let template = PathTemplate::new(text);
    template.compiled().map_err(|source| StrinkExpectedError::InvalidPathTemplate {
        key: key.to_string(),
        source,
    })?;
    Ok(template)
}
