use std::path::Path;

use tempfile::TempDir;

use crate::config::*;
use crate::error::{StrinkError, StrinkExpectedError, TemplateError};
use crate::tags::Value;
use crate::templates::evaluate_path_template;
use crate::testing;

const FULL_CONFIG: &str = r#"
[format]
default = "Library"
library = "{album_artist_the!w}/{album!w}/{track:02}. {title!w}"
flat = "{artist!w} - {title!w}"

[metadata]
album_artist = "{album_artist?{album_artist}#{artist}}"
album_artist_upper = "{album_artist!u}"

[transcode.opus]
file_suffix = ".opus"
codec = "libopus"
b = "128k"

[transcode.copy]
c = "copy"
"#;

fn parse(text: &str) -> crate::error::Result<Config> {
    Config::from_toml_str(text, Path::new("/tmp/strink.toml"))
}

#[test]
fn test_config_full() {
    testing::init();
    let config = parse(FULL_CONFIG).unwrap();
    assert_eq!(config.default_preset.as_deref(), Some("Library"));
    assert_eq!(config.presets.keys().collect::<Vec<_>>(), vec!["library", "flat"]);
    assert_eq!(
        config.metadata.keys().collect::<Vec<_>>(),
        vec!["album_artist", "album_artist_upper"]
    );
}

#[test]
fn test_config_empty() {
    let config = parse("").unwrap();
    assert!(config.presets.is_empty());
    assert!(config.metadata.is_empty());
    assert_eq!(config.default_preset, None);
}

#[test]
fn test_config_parse_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, FULL_CONFIG).unwrap();

    let config = Config::parse(Some(&config_path)).unwrap();
    assert_eq!(config.path, config_path);
    assert_eq!(config.presets, parse(FULL_CONFIG).unwrap().presets);
}

#[test]
fn test_config_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("missing.toml");
    let result = Config::parse(Some(&config_path));
    assert!(matches!(
        result,
        Err(StrinkError::Expected(StrinkExpectedError::ConfigNotFound { path })) if path == config_path
    ));
}

#[test]
fn test_config_decode_error() {
    let result = parse("[format\n");
    assert!(matches!(result, Err(StrinkError::Expected(StrinkExpectedError::ConfigDecode { .. }))));
}

#[test]
fn test_config_invalid_section_type() {
    let result = parse("format = 3");
    assert!(matches!(
        result,
        Err(StrinkError::Expected(StrinkExpectedError::InvalidConfigValue { key, .. })) if key == "format"
    ));
}

#[test]
fn test_config_invalid_value_type() {
    let result = parse("[metadata]\ntitle = 3");
    assert!(matches!(
        result,
        Err(StrinkError::Expected(StrinkExpectedError::InvalidConfigValue { key, message, .. }))
            if key == "metadata.title" && message == "must be a string: got integer"
    ));
}

#[test]
fn test_config_invalid_template() {
    let result = parse("[format]\nbroken = \"{artist\"");
    match result {
        Err(StrinkError::Expected(StrinkExpectedError::InvalidPathTemplate { key, source })) => {
            assert_eq!(key, "format.broken");
            assert_eq!(source, TemplateError::UnclosedOpenBrace);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let result = parse("[metadata]\ntitle = \"{1bad}\"");
    assert!(matches!(
        result,
        Err(StrinkError::Expected(StrinkExpectedError::InvalidPathTemplate { key, .. })) if key == "metadata.title"
    ));
}

#[test]
fn test_config_ignores_unknown_sections() {
    let config = parse("[something]\nkey = 1\n\n[format]\nflat = \"{title}\"").unwrap();
    assert_eq!(config.presets.len(), 1);
}

#[test]
fn test_resolve_format_default() {
    let config = parse(FULL_CONFIG).unwrap();
    let template = config.resolve_format(None).unwrap();
    assert_eq!(template.text, "{album_artist_the!w}/{album!w}/{track:02}. {title!w}");
}

#[test]
fn test_resolve_format_named_is_case_insensitive() {
    let config = parse(FULL_CONFIG).unwrap();
    assert_eq!(config.resolve_format(Some("FLAT")).unwrap().text, "{artist!w} - {title!w}");
}

#[test]
fn test_resolve_format_errors() {
    let config = parse(FULL_CONFIG).unwrap();
    assert!(matches!(
        config.resolve_format(Some("nope")),
        Err(StrinkError::Expected(StrinkExpectedError::PresetNotFound { name })) if name == "nope"
    ));

    let config = parse("[format]\nflat = \"{title}\"").unwrap();
    assert!(matches!(
        config.resolve_format(None),
        Err(StrinkError::Expected(StrinkExpectedError::MissingConfigKey { key, .. })) if key == "format.default"
    ));

    let config = parse("[format]\ndefault = \"Default\"").unwrap();
    assert!(matches!(
        config.resolve_format(None),
        Err(StrinkError::Expected(StrinkExpectedError::DefaultPresetSelectsItself))
    ));
}

#[test]
fn test_apply_metadata_in_order() {
    let config = parse(FULL_CONFIG).unwrap();
    let mut tags = testing::tags([("artist", "Björk"), ("title", "Jóga")]);
    let written = config.apply_metadata(&mut tags).unwrap();

    assert_eq!(written.to_string(), "{'ALBUM_ARTIST': 'Björk', 'ALBUM_ARTIST_UPPER': 'Bjork'}");
    assert_eq!(tags.get("album_artist"), Some(&Value::from("Björk")));
    assert_eq!(tags.get("title"), Some(&Value::from("Jóga")));
}

#[test]
fn test_apply_metadata_then_format() {
    let config = parse(FULL_CONFIG).unwrap();
    let mut tags = crate::tags::TagMap::new();
    tags.insert_probed("artist", "The Sugarcubes");
    tags.insert_probed("album_artist", "The Sugarcubes");
    tags.insert("album", "Life's Too Good");
    tags.insert_probed("track", "1/11");
    tags.insert("title", "Traitor");
    config.apply_metadata(&mut tags).unwrap();

    let template = config.resolve_format(None).unwrap();
    assert_eq!(
        template.evaluate(&tags).unwrap(),
        "Sugarcubes, The/Life's Too Good/01. Traitor"
    );
}

#[test]
fn test_transcode_sections() {
    let config = parse(FULL_CONFIG).unwrap();
    assert_eq!(config.transcodes.keys().collect::<Vec<_>>(), vec!["opus", "copy"]);

    let opus = config.transcode("opus").unwrap();
    assert_eq!(opus.codec, "opus");
    assert_eq!(opus.file_suffix.as_deref(), Some(".opus"));
    assert_eq!(
        opus.options.iter().collect::<Vec<_>>(),
        vec![(&"codec".to_string(), &"libopus".to_string()), (&"b".to_string(), &"128k".to_string())]
    );

    let copy = config.transcode("copy").unwrap();
    assert_eq!(copy.file_suffix, None);
    assert_eq!(copy.suffix_for(Path::new("/src/01.flac")), ".flac");
    assert_eq!(copy.suffix_for(Path::new("/src/README")), "");
}

#[test]
fn test_transcode_not_found() {
    let config = parse(FULL_CONFIG).unwrap();
    assert!(matches!(
        config.transcode("vorbis"),
        Err(StrinkError::Expected(StrinkExpectedError::CodecNotFound { name })) if name == "vorbis"
    ));
    assert!(matches!(
        config.transcode("OPUS"),
        Err(StrinkError::Expected(StrinkExpectedError::CodecNotFound { .. }))
    ));
}

#[test]
fn test_transcode_invalid_values() {
    let result = parse("transcode = \"opus\"");
    assert!(matches!(
        result,
        Err(StrinkError::Expected(StrinkExpectedError::InvalidConfigValue { key, .. })) if key == "transcode"
    ));

    let result = parse("[transcode.opus]\nfile_suffix = 1");
    assert!(matches!(
        result,
        Err(StrinkError::Expected(StrinkExpectedError::InvalidConfigValue { key, .. }))
            if key == "transcode.opus.file_suffix"
    ));
}

#[test]
fn test_transcode_suffix_replaces_source_suffix() {
    let config = parse(FULL_CONFIG).unwrap();
    let template = config.resolve_format(Some("flat")).unwrap();
    let tags = testing::tags([("artist", "Sigur Rós"), ("title", "Hoppípolla")]);
    let suffix = config.transcode("opus").unwrap().suffix_for(Path::new("/src/05.flac"));
    let path = evaluate_path_template(template, &tags, Path::new("/out"), &suffix).unwrap();
    assert_eq!(path, Path::new("/out/Sigur Ros - Hoppipolla.opus"));
}
