//! Source positions.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A position in the source text.
///
/// Lines start at 1, columns are 0-based character offsets into the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Location {
    /// Line number, starting at 1.
    pub line: u32,
    /// Character offset within the line, starting at 0.
    pub column: u32,
}

impl Location {
    /// Create a location from a line and a column.
    #[inline]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Compute the location of a byte offset in `source`.
    ///
    /// Offsets past the end of `source` are clamped to the end.
    pub fn of_offset(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let mut line = 1;
        let mut start = 0;
        for text in Lines::new(source) {
            if start + text.len() > offset || !text.ends_with(['\r', '\n']) {
                break;
            }
            start += text.len();
            line += 1;
        }
        let column = source[start..offset].chars().count() as u32;
        Self { line, column }
    }

    /// Byte offset of this location in `source`, if it lies inside it.
    pub fn offset_in(&self, source: &str) -> Option<usize> {
        let mut lines = Lines::new(source);
        let mut start = 0;
        for _ in 1..self.line {
            start += lines.next()?.len();
        }
        let line = lines.next().unwrap_or("").trim_end_matches(['\r', '\n']);
        match line.char_indices().nth(self.column as usize) {
            Some((i, _)) => Some(start + i),
            None if line.chars().count() == self.column as usize => Some(start + line.len()),
            None => None,
        }
    }
}

/// Lines of a source text, each with its terminator.
///
/// `\r\n`, a lone `\r` and `\n` all end a line.
#[derive(Debug, Clone)]
pub(crate) struct Lines<'src> {
    rest: &'src str,
}

impl<'src> Lines<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Self { rest: source }
    }
}

impl<'src> Iterator for Lines<'src> {
    type Item = &'src str;

    fn next(&mut self) -> Option<&'src str> {
        if self.rest.is_empty() {
            return None;
        }
        let end = match self.rest.find(['\r', '\n']) {
            Some(i) if self.rest[i..].starts_with("\r\n") => i + 2,
            Some(i) => i + 1,
            None => self.rest.len(),
        };
        let (line, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(line)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The reader's moving cursor, shared read-only with whoever consumes its
/// events.
///
/// Cloning a `Locator` yields another handle on the same cursor. Consumers
/// call [`Locator::location`] at the moment they raise an error to get a
/// snapshot.
#[derive(Debug, Clone, Default)]
pub struct Locator(Rc<Cell<Location>>);

impl Locator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current position.
    #[inline]
    pub fn location(&self) -> Location {
        self.0.get()
    }

    /// Move the cursor.
    #[inline]
    pub fn set(&self, location: Location) {
        self.0.set(location);
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.0.get().line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.0.get().column
    }
}
