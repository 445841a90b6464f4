//! User-facing notifications (toasts in a browser, styled lines in a terminal).

use std::fmt;

use console::style;

use crate::ui::icons::{CHECK, CROSS, INFO, WARN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Success => write!(f, "success"),
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);

    fn success(&self, message: &str) {
        self.notify(Notification::new(Level::Success, message));
    }

    fn error(&self, message: &str) {
        self.notify(Notification::new(Level::Error, message));
    }

    fn warning(&self, message: &str) {
        self.notify(Notification::new(Level::Warning, message));
    }

    fn info(&self, message: &str) {
        self.notify(Notification::new(Level::Info, message));
    }
}

/// Prints notifications to the terminal; errors and warnings go to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    quiet: bool,
}

impl ConsoleNotifier {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn render(notification: &Notification) -> String {
        match notification.level {
            Level::Success => format!("{}{}", CHECK, style(&notification.message).green()),
            Level::Error => format!("{}{}", CROSS, style(&notification.message).red()),
            Level::Warning => format!("{}{}", WARN, style(&notification.message).yellow()),
            Level::Info => format!("{}{}", INFO, notification.message),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        tracing::debug!(level = %notification.level, message = %notification.message, "notification");
        match notification.level {
            Level::Error | Level::Warning => eprintln!("{}", Self::render(&notification)),
            Level::Success | Level::Info if !self.quiet => {
                println!("{}", Self::render(&notification))
            }
            _ => {}
        }
    }
}
