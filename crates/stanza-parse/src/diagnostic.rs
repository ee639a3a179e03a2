//! Terminal rendering of errors with their source context.

use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::{Error, ErrorKind};

impl Error {
    /// Render this error with ariadne.
    ///
    /// Returns a string containing the formatted error message with source context.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let range = self.range_in(source);
        let mut report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(self.message())
            .with_label(
                Label::new((filename, range))
                    .with_message(self.kind().as_str())
                    .with_color(Color::Red),
            );
        if let Some(help) = help(self.kind()) {
            report = report.with_help(help);
        }
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    /// The byte range to underline: the character at the error location.
    fn range_in(&self, source: &str) -> Range<usize> {
        let start = self
            .location()
            .and_then(|location| location.offset_in(source))
            .unwrap_or(source.len());
        let width = source[start..].chars().next().map_or(0, char::len_utf8);
        start..start + width
    }
}

fn help(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::Lexical => Some("quote values that contain structural characters"),
        ErrorKind::OccurrenceLimitExceeded => Some("raise the node's maximum or remove the repetition"),
        ErrorKind::MissingOccurrence => Some("add the required entry"),
        _ => None,
    }
}
