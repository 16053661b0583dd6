//! Event-stream frames.
//!
//! Each frame renders to a self-delimited block of `field:value` lines
//! terminated by a blank line.

use std::fmt;
use std::time::Duration;

/// Reload notification sent once per settle point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ReloadFrame {
    pub(crate) id: u64,
    pub(crate) retry: Duration,
    pub(crate) descriptors: Vec<String>,
}

impl fmt::Display for ReloadFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "id:{:X}", self.id)?;
        writeln!(f, "retry:{}", self.retry.as_millis())?;
        write_data(f, "data:", &self.descriptors.join(" "))?;
        writeln!(f)
    }
}

/// Sent instead of a reload frame when the template set failed to reparse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ErrorFrame {
    pub(crate) message: String,
}

impl fmt::Display for ErrorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "event:reload-error")?;
        write_data(f, "data:", &self.message)?;
        writeln!(f)
    }
}

/// Fragment push in the datastar wire format.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct FragmentFrame {
    selector: Option<String>,
    merge_type: Option<String>,
    fragment: Option<String>,
}

impl FragmentFrame {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub(crate) fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    #[must_use]
    pub(crate) fn merge_type(mut self, merge_type: impl Into<String>) -> Self {
        self.merge_type = Some(merge_type.into());
        self
    }

    #[must_use]
    pub(crate) fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }
}

impl fmt::Display for FragmentFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "event: datastar-fragment")?;
        if let Some(selector) = &self.selector {
            writeln!(f, "data: selector {selector}")?;
        }
        if let Some(merge_type) = &self.merge_type {
            writeln!(f, "data: mergeType {merge_type}")?;
        }
        if let Some(fragment) = &self.fragment {
            write_data(f, "data: fragment ", fragment)?;
        }
        writeln!(f)
    }
}

/// Write `text` as one `prefix`-led line per line of text.
///
/// A bare newline inside a value would end the frame early.
fn write_data(f: &mut fmt::Formatter<'_>, prefix: &str, text: &str) -> fmt::Result {
    if text.is_empty() {
        return writeln!(f, "{prefix}");
    }
    for line in text.lines() {
        writeln!(f, "{prefix}{line}")?;
    }
    Ok(())
}
