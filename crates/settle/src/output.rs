//! Colored terminal output utilities.

use std::fmt::Display;

use console::{Style, Term};

/// Terminal output formatter. Writes to stderr so stdout stays clean.
pub(crate) struct Output {
    term: Term,
    label: Style,
    ok: Style,
    failed: Style,
    accent: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            label: Style::new().dim(),
            ok: Style::new().green(),
            failed: Style::new().red().bold(),
            accent: Style::new().cyan().bold(),
        }
    }

    /// Print `label: value` with a dimmed label.
    pub(crate) fn status(&self, label: &str, value: impl Display) {
        let line = format!("{} {value}", self.label.apply_to(format!("{label}:")));
        let _ = self.term.write_line(&line);
    }

    /// Print an indented list item.
    pub(crate) fn item(&self, value: impl Display) {
        let _ = self.term.write_line(&format!("  {value}"));
    }

    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.ok.apply_to(msg).to_string());
    }

    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.failed.apply_to(msg).to_string());
    }

    /// Print `label: value` with the value highlighted.
    pub(crate) fn highlight(&self, label: &str, value: impl Display) {
        let line = format!(
            "{} {}",
            self.label.apply_to(format!("{label}:")),
            self.accent.apply_to(value)
        );
        let _ = self.term.write_line(&line);
    }
}
