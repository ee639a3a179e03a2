//! Errors, warnings and the per-pass diagnostics sink.

use std::fmt;

use tracing::warn;

use crate::Location;

/// Result type for operations that can only fail fatally.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// No rule matched, or blocks and attribute lists were malformed.
    Lexical,
    /// Unknown child, unbalanced contexts, content or comments where none
    /// are allowed.
    Structural,
    /// A node was entered more often than its maximum allows.
    OccurrenceLimitExceeded,
    /// A required node did not occur.
    MissingOccurrence,
    /// Text could not be converted to the bound value type.
    Conversion,
    /// A foreign parser (XML) rejected the input.
    Syntax,
    /// Reading or writing the underlying stream failed.
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Structural => "structural error",
            ErrorKind::OccurrenceLimitExceeded => "occurrence limit exceeded",
            ErrorKind::MissingOccurrence => "missing occurrence",
            ErrorKind::Conversion => "conversion error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Io => "i/o error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal error. Aborts the current pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    location: Option<Location>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn lexical(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lexical, message)
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, message)
    }

    /// Attach a location, unless one is already known.
    pub fn at(mut self, location: Location) -> Self {
        self.location.get_or_insert(location);
        self
    }

    /// Attach a location if there is one and none is known yet.
    pub fn at_opt(self, location: Option<Location>) -> Self {
        match location {
            Some(location) => self.at(location),
            None => self,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{}:{}: {}", location.line, location.column, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(ErrorKind::Io, error.to_string())
    }
}

/// A recoverable problem. Reported, but processing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    message: String,
    location: Option<Location>,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Attach a location, unless one is already known.
    pub fn at(mut self, location: Location) -> Self {
        self.location.get_or_insert(location);
        self
    }

    pub fn at_opt(self, location: Option<Location>) -> Self {
        match location {
            Some(location) => self.at(location),
            None => self,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{}:{}: {}", location.line, location.column, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Failure of an operation on a schema node or writer.
///
/// A [`Fault::Recoverable`] is reported after the operation has completed;
/// the caller records the warning and carries on. A [`Fault::Fatal`] aborts
/// the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Recoverable(Warning),
    Fatal(Error),
}

impl Fault {
    pub fn warning(message: impl Into<String>) -> Self {
        Fault::Recoverable(Warning::new(message))
    }

    pub fn fatal(kind: ErrorKind, message: impl Into<String>) -> Self {
        Fault::Fatal(Error::new(kind, message))
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Fault::fatal(ErrorKind::Structural, message)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Fault::Fatal(_))
    }
}

impl From<Error> for Fault {
    fn from(error: Error) -> Self {
        Fault::Fatal(error)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Recoverable(warning) => warning.fmt(f),
            Fault::Fatal(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for Fault {}

/// Warnings collected during one pass.
///
/// Each consumer owns its own sink; nothing is shared between passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it.
    pub fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn clear(&mut self) {
        self.warnings.clear();
    }

    /// Turn a fault into a warning or an error, attaching `location`.
    pub fn absorb(&mut self, fault: Fault, location: Option<Location>) -> Result<()> {
        match fault {
            Fault::Recoverable(warning) => {
                self.warn(warning.at_opt(location));
                Ok(())
            }
            Fault::Fatal(error) => Err(error.at_opt(location)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_with_their_location() {
        let error = Error::lexical("Undefined pattern").at(Location::new(3, 7));
        assert_eq!(error.to_string(), "3:7: Undefined pattern");
        assert_eq!(Error::structural("oops").to_string(), "oops");
    }

    #[test]
    fn first_location_wins() {
        let error = Error::structural("x")
            .at(Location::new(1, 2))
            .at(Location::new(9, 9));
        assert_eq!(error.location(), Some(Location::new(1, 2)));
    }

    #[test]
    fn absorb_splits_warnings_from_errors() {
        let mut diagnostics = Diagnostics::new();
        let here = Some(Location::new(4, 0));
        assert!(diagnostics.absorb(Fault::warning("odd"), here).is_ok());
        let error = diagnostics
            .absorb(Fault::fatal(ErrorKind::Conversion, "bad"), here)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conversion);
        assert_eq!(error.to_string(), "4:0: bad");
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.warnings()[0].to_string(), "4:0: odd");
    }
}
