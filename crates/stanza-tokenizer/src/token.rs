//! Token types produced by the rule table.

use crate::Location;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Comment running to the end of the line: `# ...` (`; ...` in INI).
    Comment,
    /// Line break, together with any blanks in front of it.
    Newline,
    /// `'...'`
    SingleQuoted,
    /// `"..."`
    DoubleQuoted,

    // Structural tokens
    /// `(`
    BlockOpen,
    /// `)`
    BlockClose,
    /// Verbatim text inside a `( ... )` block.
    BlockText,
    /// The assignment character, `=` by default.
    Assign,
    /// `{`
    BraceOpen,
    /// `}`
    BraceClose,
    /// `[` opening an attribute list.
    AttributesOpen,
    /// `]` closing an attribute list.
    AttributesClose,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// INI section header: `[name]`.
    Section,

    /// Any run of non-structural characters.
    Identifier,
    /// Spaces and tabs.
    Whitespace,

    /// No rule matched the rest of the line.
    Error,
}

impl TokenKind {
    /// Whether this token is a quoted scalar.
    pub fn is_quoted(&self) -> bool {
        matches!(self, TokenKind::SingleQuoted | TokenKind::DoubleQuoted)
    }
}

/// A token with its text and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    /// Everything the rule consumed.
    pub text: &'src str,
    /// The meaningful part of `text`: the body of a comment, the inside of
    /// quotes, the name of a section. Equal to `text` for other kinds.
    pub value: &'src str,
    /// Where the token starts.
    pub location: Location,
}

impl<'src> Token<'src> {
    #[inline]
    pub fn new(kind: TokenKind, text: &'src str, value: &'src str, location: Location) -> Self {
        Self {
            kind,
            text,
            value,
            location,
        }
    }
}
