#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static INIT: Once = Once::new();

/// Installs a test-writer subscriber once per test binary so that `debug!` output shows up for
/// failing tests.
#[cfg(test)]
pub fn init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Builds a tag map from literal pairs.
#[cfg(test)]
pub fn tags<V: Into<crate::tags::Value>>(pairs: impl IntoIterator<Item = (&'static str, V)>) -> crate::tags::TagMap {
    pairs.into_iter().collect()
}
