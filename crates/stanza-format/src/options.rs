//! Formatting options for DSL output.

use stanza_parse::Syntax;

/// Options for DSL output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Indentation string (default: "  " - 2 spaces)
    pub indent: String,

    /// Comments are wrapped to fit this many columns (default: 80)
    pub comment_width: usize,

    /// Assignment and comment characters (default: `=` and `#`)
    pub syntax: Syntax,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            comment_width: 80,
            syntax: Syntax::dsl(),
        }
    }
}

impl FormatOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom indentation string.
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Set the column comments are wrapped at.
    pub fn comment_width(mut self, width: usize) -> Self {
        self.comment_width = width;
        self
    }

    /// Use other assignment and comment characters.
    pub fn syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }
}
