#![forbid(unsafe_code)]

//! Structured logging hooks.
//!
//! With the `tracing` feature the usual macros are re-exported so crates that
//! only depend on `roster-core` can log without naming `tracing` directly.
//! With `tracing-json` enabled, [`init_logging`] installs a JSON subscriber
//! filtered by the `ROSTER_LOG` environment variable (default `info`).
//!
//! Without either feature this module is empty apart from [`LOG_ENV`].

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "ROSTER_LOG";

#[cfg(feature = "tracing")]
pub use tracing::{debug, error, info, trace, warn};

/// Install the process-wide JSON subscriber.
///
/// Returns `false` if a global subscriber was already set.
#[cfg(feature = "tracing-json")]
pub fn init_logging() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .try_init()
        .is_ok()
}

#[cfg(all(test, feature = "tracing-json"))]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_subscriber() {
        let _ = init_logging();
        assert!(!init_logging());
    }
}
