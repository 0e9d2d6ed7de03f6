//! Log setup
//!
//! Logs go to stderr so that `--dry-run` and `--output json` keep stdout
//! clean. `RUST_LOG` takes precedence over the verbosity flags.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber
pub fn init(verbose: u8, debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose, debug)));

    // A subscriber may already be set when running under a test harness
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn default_level(verbose: u8, debug: bool) -> &'static str {
    let verbose = if debug { verbose.max(2) } else { verbose };
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(0, false), "warn");
        assert_eq!(default_level(1, false), "info");
        assert_eq!(default_level(2, false), "debug");
        assert_eq!(default_level(5, false), "trace");
        assert_eq!(default_level(0, true), "debug");
        assert_eq!(default_level(3, true), "trace");
    }
}
