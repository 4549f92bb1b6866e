//! Terminal output: status lines, a spinner and formatting helpers.
//!
//! Everything here writes to stderr so stdout stays clean for command output
//! such as `cachet url`.

mod format;
mod messages;
mod spinner;

pub use format::{format_duration, format_size, print_asset_summary};
pub use messages::{debug, error, info, success, warning};
pub use spinner::Spinner;

/// Apply `--no-color` and `NO_COLOR` to status output.
pub fn init_colors(no_color: bool) {
    if no_color || !crate::logger::should_use_colors() {
        owo_colors::set_override(false);
    }
}

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Whether interactive widgets (spinners) should be drawn.
pub fn is_interactive() -> bool {
    !is_ci() && console::user_attended_stderr()
}
