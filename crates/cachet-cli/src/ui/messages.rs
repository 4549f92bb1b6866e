//! Status message functions for terminal output.
//!
//! Markers are colored only when stderr supports it and colors were not
//! turned off with [`init_colors`](super::init_colors).

use owo_colors::{OwoColorize, Stream::Stderr, Style};

fn paint(text: &str, style: Style) -> String {
    text.if_supports_color(Stderr, |t| t.style(style)).to_string()
}

/// Print a success message to stderr.
pub fn success(message: &str) {
    eprintln!("{} {}", paint("✓", Style::new().green().bold()), message);
}

/// Print an info message to stderr.
pub fn info(message: &str) {
    eprintln!("{} {}", paint("ℹ", Style::new().blue().bold()), message);
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        paint("⚠", Style::new().yellow().bold()),
        paint(message, Style::new().yellow())
    );
}

/// Print an error message to stderr.
pub fn error(message: &str) {
    eprintln!(
        "{} {}",
        paint("✗", Style::new().red().bold()),
        paint(message, Style::new().red())
    );
}

/// Print a dimmed message to stderr, only when `RUST_LOG` is set.
pub fn debug(message: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        let dim = Style::new().dimmed();
        eprintln!("{} {}", paint("◆", dim), paint(message, dim));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        success("Build complete");
        info("Watching assets");
        warning("No processors configured");
        error("Processor 'sass' failed");
        debug("resolved app.css");
    }

    #[test]
    fn test_paint_without_colors_is_plain() {
        owo_colors::set_override(false);
        assert_eq!(paint("✓", Style::new().green()), "✓");
        owo_colors::unset_override();
    }
}
