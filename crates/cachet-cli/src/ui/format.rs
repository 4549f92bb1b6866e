//! Formatting utilities for sizes, durations and build summaries.

use console::Term;
use owo_colors::OwoColorize;
use std::time::Duration;

/// Format a byte count with the most appropriate unit.
///
/// ```
/// use cachet_cli::ui::format_size;
///
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format a duration as `50ms`, `1.50s` or `1m 30s`.
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print the fingerprinted assets of a build to stderr.
///
/// `entries` are `(logical, fingerprinted, size)`.
pub fn print_asset_summary(entries: &[(String, String, u64)], duration: Duration) {
    let width = (Term::stderr().size().1 as usize).clamp(20, 80);

    eprintln!("\n{}", "Assets".bold().underline());
    eprintln!("{}", "─".repeat(width));

    for (logical, fingerprinted, size) in entries {
        eprintln!(
            "  {} {} {} {}",
            "▸".blue(),
            logical.bright_white().bold(),
            format!("→ {}", fingerprinted).dimmed(),
            format!("({})", format_size(*size)).dimmed()
        );
    }

    eprintln!("{}", "─".repeat(width));

    let total: u64 = entries.iter().map(|(_, _, size)| size).sum();
    eprintln!(
        "  {} {} assets, {} in {}",
        "Total:".bold(),
        entries.len(),
        format_size(total).green(),
        format_duration(duration).green()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1_572_864), "1.50 MB");
        assert_eq!(format_size(2_147_483_648), "2.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
    }

    #[test]
    fn test_print_asset_summary() {
        print_asset_summary(
            &[(
                "app.css".to_string(),
                "app.3f2a9c1d.css".to_string(),
                1_024,
            )],
            Duration::from_millis(12),
        );
        print_asset_summary(&[], Duration::ZERO);
    }
}
