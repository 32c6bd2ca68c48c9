// file: src/utils/logging.rs
// description: Tracing subscriber initialization and colored notification formatting

use crate::pipeline::selection::{Notification, NotificationLevel};
use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(colored_output);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}

/// Renders a user-facing notification with the marker for its level.
pub fn format_notification(notification: &Notification) -> String {
    match notification.level {
        NotificationLevel::Success => format_success(&notification.message),
        NotificationLevel::Info => format_info(&notification.message),
        NotificationLevel::Warning => format_warning(&notification.message),
        NotificationLevel::Error => format_error(&notification.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_notification_keeps_message() {
        colored::control::set_override(false);
        let notification = Notification::error("wrong format");
        assert_eq!(format_notification(&notification), "✗ wrong format");
    }
}
