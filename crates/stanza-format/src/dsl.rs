//! Rendering of the brace/assignment DSL.

use stanza_parse::{Attributes, Result};

use crate::scalar::{format_name, format_scalar, quote, wrap_comment};
use crate::{FormatOptions, Render, Writer};

/// Writer producing DSL text.
pub type DslWriter = Writer<DslRenderer>;

/// [`Render`] implementation for the DSL.
///
/// The outermost context is implicit and prints nothing; branches print as
/// `name {` ... `}`, leaves as `name= content`.
#[derive(Debug, Clone, Default)]
pub struct DslRenderer {
    out: String,
    options: FormatOptions,
}

impl DslRenderer {
    pub fn new(options: FormatOptions) -> Self {
        Self {
            out: String::new(),
            options,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Consume the renderer and return the output.
    pub fn finish_string(self) -> String {
        self.out
    }

    /// Children of the outermost context start at the left margin.
    fn write_indent(&mut self, depth: usize) {
        for _ in 1..depth {
            self.out.push_str(&self.options.indent);
        }
    }

    fn write_head(&mut self, name: &str, attributes: &Attributes) -> Result<()> {
        let syntax = self.options.syntax;
        self.out.push_str(&format_name(name, syntax)?);
        if attributes.is_empty() {
            return Ok(());
        }
        self.out.push('[');
        for (i, (key, value)) in attributes.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            let value = quote(value, '\'').ok_or_else(|| {
                stanza_parse::Error::structural(format!(
                    "Attribute '{key}' cannot be represented: {value:?}"
                ))
            })?;
            self.out.push_str(&format_name(key, syntax)?);
            self.out.push(syntax.assign);
            self.out.push_str(&value);
        }
        self.out.push(']');
        Ok(())
    }
}

impl Render for DslRenderer {
    fn start(&mut self) -> Result<()> {
        self.out.clear();
        Ok(())
    }

    fn enter_branch(&mut self, name: &str, attributes: &Attributes, depth: usize) -> Result<()> {
        if depth == 0 {
            return Ok(());
        }
        self.write_indent(depth);
        self.write_head(name, attributes)?;
        self.out.push_str(" {\n");
        Ok(())
    }

    fn exit_branch(&mut self, _name: &str, depth: usize) -> Result<()> {
        if depth == 0 {
            return Ok(());
        }
        self.write_indent(depth);
        self.out.push_str("}\n");
        Ok(())
    }

    fn enter_leaf(&mut self, name: &str, attributes: &Attributes, depth: usize) -> Result<()> {
        self.write_indent(depth);
        self.write_head(name, attributes)?;
        self.out.push(self.options.syntax.assign);
        self.out.push(' ');
        Ok(())
    }

    fn write_content(&mut self, content: &str) -> Result<()> {
        let scalar = format_scalar(content, self.options.syntax)?;
        self.out.push_str(&scalar);
        Ok(())
    }

    fn exit_leaf(&mut self, _name: &str, _depth: usize) -> Result<()> {
        self.out.push('\n');
        Ok(())
    }

    fn write_comment(&mut self, comment: &str, depth: usize) -> Result<()> {
        let indent = self.options.indent.chars().count() * depth.saturating_sub(1);
        let width = self.options.comment_width.saturating_sub(indent + 1).max(1);
        for line in wrap_comment(comment, width) {
            self.write_indent(depth);
            self.out.push(self.options.syntax.comment);
            self.out.push_str(&line);
            self.out.push('\n');
        }
        Ok(())
    }
}

impl Writer<DslRenderer> {
    /// A writer producing DSL text with the given options.
    pub fn dsl(options: FormatOptions) -> Self {
        Writer::new(DslRenderer::new(options))
    }

    /// Consume the writer and return the output.
    pub fn finish_string(self) -> String {
        self.into_inner().finish_string()
    }
}
