#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Logging setup for the generators.
//!
//! Diagnostics go to stderr so that nothing can interleave with generated output.
//! `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber at `level` (`error`, `warn`, `info`, `debug`, `trace`).
///
/// Installing twice is harmless: the second call is ignored, which keeps test
/// binaries that call this from several tests working.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Emit a discovery trace line for `module`.
pub fn trace(module: &str, msg: &str) {
    tracing::info!(module, "{}", msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init("debug");
        init("warn");
        trace("logging", "still usable after repeated init");
    }
}
