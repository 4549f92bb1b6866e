//! Logging setup for the Cachet CLI.
//!
//! Library and CLI emit `tracing` events; this installs the subscriber.
//!
//! The filter is chosen in this order:
//! 1. `--verbose`: debug for cachet crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. info for cachet crates

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "cachet=debug,cachet_cli=debug";
const QUIET_FILTER: &str = "cachet=error,cachet_cli=error";
const DEFAULT_FILTER: &str = "cachet=info,cachet_cli=info";

/// Initialize the global tracing subscriber. Call once, early in `main`.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

/// Initialize with an explicit filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .with_writer(std::io::stderr)
        .compact();

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Whether stderr output should be colored.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise terminal detection decides.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_filters_parse() {
        for directives in [VERBOSE_FILTER, QUIET_FILTER, DEFAULT_FILTER] {
            assert!(EnvFilter::try_new(directives).is_ok(), "{directives}");
        }
    }

    #[test]
    fn test_verbose_wins() {
        assert_eq!(filter_for(true, false).to_string(), EnvFilter::new(VERBOSE_FILTER).to_string());
        assert_eq!(filter_for(false, true).to_string(), EnvFilter::new(QUIET_FILTER).to_string());
    }

    #[test]
    #[serial]
    fn test_no_color_overrides_force_color() {
        unsafe {
            std::env::set_var("NO_COLOR", "1");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(!should_use_colors());
        unsafe {
            std::env::remove_var("NO_COLOR");
        }
        assert!(should_use_colors());
        unsafe {
            std::env::remove_var("FORCE_COLOR");
        }
    }

    #[test]
    fn test_double_init_does_not_panic() {
        init_logger(false, true, true);
        init_logger(true, false, true);
    }
}
