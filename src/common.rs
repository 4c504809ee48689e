/// The common module holds the text helpers shared by conversions and the logging setup.
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::{Mutex, OnceLock};

use directories::ProjectDirs;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, EnvFilter};
use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Result, StrinkError};

static ILLEGAL_FS_CHARS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

thread_local! {
    static UNACCENT_CACHE: RefCell<HashMap<char, Option<char>>> = RefCell::new(HashMap::new());
}

/// Translate accented characters to their non-accented equivalents.
///
/// Printable ASCII passes through, combining marks are dropped, and everything else is replaced
/// by the first character of its compatibility (NFKD) decomposition. Anything after that first
/// character is discarded, so e.g. `ﬁ` becomes `f` and `½` becomes `1`. Generated filenames rely
/// on this exact truncation.
pub fn unaccent(text: &str) -> String {
    text.chars().filter_map(unaccent_char).collect()
}

fn unaccent_char(c: char) -> Option<char> {
    UNACCENT_CACHE.with(|cache| {
        *cache
            .borrow_mut()
            .entry(c)
            .or_insert_with(|| compute_unaccent_char(c))
    })
}

fn compute_unaccent_char(c: char) -> Option<char> {
    if is_printable_ascii(c) {
        Some(c)
    } else if canonical_combining_class(c) != 0 {
        None
    } else {
        std::iter::once(c).nfkd().next()
    }
}

fn is_printable_ascii(c: char) -> bool {
    c.is_ascii_graphic() || matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

/// Unaccent `text` and strip the characters that cannot appear in a single path segment on common
/// filesystems: `< > : " / \ | ? *`.
pub fn filename_safe(text: &str) -> String {
    ILLEGAL_FS_CHARS_REGEX
        .replace_all(&unaccent(text), "")
        .into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogOutput {
    Stderr,
    File,
}

static LOGGING_INITIALIZED: Lazy<Mutex<HashSet<LogOutput>>> = Lazy::new(|| Mutex::new(HashSet::new()));
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub fn initialize_logging(output: LogOutput) -> Result<()> {
    install_once(&LOGGING_INITIALIZED, output, || install_subscriber(output))
}

/// Runs `install` unless `output` is already recorded in `registry`, and records `output` only
/// once `install` succeeds. The lock is held throughout so concurrent callers install once.
fn install_once(
    registry: &Mutex<HashSet<LogOutput>>,
    output: LogOutput,
    install: impl FnOnce() -> Result<()>,
) -> Result<()> {
    let mut initialized = registry
        .lock()
        .map_err(|e| StrinkError::Generic(format!("Logging state poisoned: {e}")))?;
    if initialized.contains(&output) {
        return Ok(());
    }
    install()?;
    initialized.insert(output);
    Ok(())
}

fn install_subscriber(output: LogOutput) -> Result<()> {
    let log_despite_testing = std::env::var("LOG_TEST").is_ok();
    let is_testing = std::env::var("CARGO_TEST").is_ok();
    if is_testing && !log_despite_testing {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match output {
        LogOutput::Stderr => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(!log_despite_testing)
                .with_thread_ids(log_despite_testing)
                .with_line_number(log_despite_testing)
                .with_file(log_despite_testing)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| StrinkError::Generic(format!("Failed to install logger: {e}")))?;
        }
        LogOutput::File => {
            let proj_dirs = ProjectDirs::from("", "", "strink")
                .ok_or_else(|| StrinkError::Generic("Failed to get project directories".to_string()))?;
            let log_dir = if cfg!(target_os = "macos") {
                proj_dirs.cache_dir()
            } else {
                proj_dirs.state_dir().unwrap_or(proj_dirs.cache_dir())
            };
            fs::create_dir_all(log_dir)?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix("strink")
                .filename_suffix("log")
                .build(log_dir)
                .map_err(|e| StrinkError::Generic(format!("Failed to open log file: {e}")))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = LOG_GUARD.set(guard);

            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(non_blocking)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| StrinkError::Generic(format!("Failed to install logger: {e}")))?;
        }
    }

    Ok(())
}
