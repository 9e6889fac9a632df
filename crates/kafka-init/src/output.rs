//! Terminal output for installer progress

use std::cell::RefCell;
use std::io::{self, Stdout, Write};

use console::style;
use kafka_provision::{Reporter, Severity};

/// Prints progress, colored by severity, to standard output
#[derive(Debug)]
pub struct ConsoleReporter<W: Write = Stdout> {
    out: RefCell<W>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_line(&self, line: &str) {
        // nowhere left to report a failed write
        let _ = writeln!(self.out.borrow_mut(), "{line}");
    }
}

/// Format one message the way it is printed, without color
pub fn plain_line(severity: Severity, message: &str) -> String {
    format!("{} {message}", severity.tag())
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report(&self, severity: Severity, message: &str) {
        let line = plain_line(severity, message);
        let styled = match severity {
            Severity::Info => style(line).green(),
            Severity::Warning => style(line).yellow(),
            Severity::Error => style(line).red(),
        };
        self.write_line(&styled.to_string());
    }

    fn menu(&self, title: &str, items: &[String]) {
        self.write_line("");
        self.write_line(&style(title).cyan().bold().to_string());
        for item in items {
            self.write_line(&format!("  {item}"));
        }
        self.write_line("");
    }
}
