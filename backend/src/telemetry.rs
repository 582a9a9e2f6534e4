//! Tracing subscriber set-up shared by the binaries.
//!
//! `RUST_LOG` wins when set. Otherwise production logs at `info` and every
//! other environment at `debug`. Production emits JSON lines; development
//! gets the human-readable formatter.

use tracing_subscriber::{EnvFilter, fmt};

/// Boxed error returned by `try_init`.
pub type TelemetryError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn default_directive(production: bool) -> &'static str {
    if production { "info" } else { "debug" }
}

/// Build the filter from `RUST_LOG`, falling back to the environment default.
pub fn env_filter(production: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(production)))
}

/// Install the global subscriber.
///
/// # Errors
/// Fails when a global subscriber is already installed.
pub fn init(production: bool) -> Result<(), TelemetryError> {
    let builder = fmt().with_env_filter(env_filter(production)).with_target(true);
    if production {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for filter defaults.

    use super::*;
    use env_lock::lock_env;
    use rstest::rstest;

    #[rstest]
    #[case(true, "info")]
    #[case(false, "debug")]
    fn unset_rust_log_uses_the_environment_default(
        #[case] production: bool,
        #[case] expected: &str,
    ) {
        let _guard = lock_env([("RUST_LOG", None::<String>)]);
        assert_eq!(env_filter(production).to_string(), expected);
    }

    #[rstest]
    fn rust_log_overrides_the_default() {
        let _guard = lock_env([("RUST_LOG", Some("whenworks=trace".to_owned()))]);
        assert_eq!(env_filter(true).to_string(), "whenworks=trace");
    }
}
