//! Line-oriented text output.
//!
//! Each result becomes `display_name|full_path`. A `|` inside a filename is
//! kept as is: callers split on the first `|` since paths end the line. No
//! results writes nothing.

use std::io::{self, Write};

use crate::matcher::MatchResult;
use crate::search::SearchOutcome;

/// Field separator between display name and path.
pub const FIELD_SEPARATOR: char = '|';

/// Text formatter over a search outcome.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    outcome: &'a SearchOutcome,
}

impl<'a> TextOutput<'a> {
    /// Create a formatter for `outcome`.
    #[must_use]
    pub fn new(outcome: &'a SearchOutcome) -> Self {
        Self { outcome }
    }

    /// Format one result as a line, without the trailing newline.
    #[must_use]
    pub fn format_line(result: &MatchResult) -> String {
        format!(
            "{}{}{}",
            result.display_name,
            FIELD_SEPARATOR,
            result.path.display()
        )
    }

    /// Write all result lines to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for result in self.outcome.results() {
            writeln!(writer, "{}", Self::format_line(result))?;
        }
        writer.flush()
    }
}
