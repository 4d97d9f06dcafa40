//! Log output setup
//!
//! Logs go to stderr so `banana build` can stream YAML on stdout. The filter is chosen
//! from `--log-level`, then `-v` (debug), then `RUST_LOG`, falling back to `info`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LEVEL: &str = "info";

/// Normalize a user supplied level name
fn normalize_level(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        "off" | "quiet" => "off",
        _ => DEFAULT_LEVEL,
    }
}

/// Build the filter for the given flags
fn filter(verbose: bool, level: Option<&str>) -> EnvFilter {
    if let Some(level) = level {
        return EnvFilter::new(normalize_level(level));
    }
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Install the global subscriber
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init(verbose: bool, level: Option<&str>) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter(verbose, level))
        .with(layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("DEBUG"), "debug");
        assert_eq!(normalize_level("warning"), "warn");
        assert_eq!(normalize_level("quiet"), "off");
        assert_eq!(normalize_level("bogus"), "info");
    }

    #[test]
    fn test_explicit_level_wins_over_verbose() {
        assert_eq!(filter(true, Some("error")).to_string(), "error");
        assert_eq!(filter(true, None).to_string(), "debug");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init(false, Some("off"));
        init(true, None);
    }
}
