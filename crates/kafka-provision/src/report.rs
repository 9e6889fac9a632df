//! User-facing progress messages
//!
//! The library only decides *what* to say and how severe it is; presentation
//! (prefixes, colors) belongs to the [`Reporter`] implementation.

use std::fmt;

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Bracketed tag shown in front of the message
    pub fn tag(self) -> &'static str {
        match self {
            Self::Info => "[INFO]",
            Self::Warning => "[WARNING]",
            Self::Error => "[ERROR]",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Sink for user-facing messages
pub trait Reporter {
    fn report(&self, severity: Severity, message: &str);

    /// Show a numbered list (1-indexed) under a heading
    fn menu(&self, title: &str, items: &[String]);

    fn info(&self, message: &str) {
        self.report(Severity::Info, message);
    }

    fn warn(&self, message: &str) {
        self.report(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.report(Severity::Error, message);
    }
}
