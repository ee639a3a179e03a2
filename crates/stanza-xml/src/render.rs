//! XML output for the leaf/branch writer.

use quick_xml::Writer as XmlSink;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use stanza_format::{Render, Writer};
use stanza_parse::{Attributes, Error, ErrorKind, Result};

/// Writer producing XML.
pub type XmlWriter = Writer<XmlRenderer>;

/// Options for XML output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlOptions {
    /// Spaces per nesting level (default: 2)
    pub indent: usize,
    /// Write `<?xml version="1.0" encoding="utf-8"?>` first (default: true)
    pub declaration: bool,
}

impl Default for XmlOptions {
    fn default() -> Self {
        XmlOptions {
            indent: 2,
            declaration: true,
        }
    }
}

impl XmlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }
}

/// [`Render`] implementation writing elements through `quick-xml`.
///
/// Leaves are written on one line, `<name>content</name>`; empty leaves as
/// `<name></name>`.
pub struct XmlRenderer {
    sink: XmlSink<Vec<u8>>,
    options: XmlOptions,
    /// Nothing has been written yet.
    fresh: bool,
}

impl XmlRenderer {
    pub fn new(options: XmlOptions) -> Self {
        XmlRenderer {
            sink: XmlSink::new(Vec::new()),
            options,
            fresh: true,
        }
    }

    /// A writer rendering through a new `XmlRenderer`.
    pub fn writer(options: XmlOptions) -> XmlWriter {
        Writer::new(XmlRenderer::new(options))
    }

    /// Consume the renderer and return the document.
    pub fn finish_string(self) -> Result<String> {
        String::from_utf8(self.sink.into_inner()).map_err(io)
    }

    fn emit(&mut self, event: XmlEvent<'_>) -> Result<()> {
        self.fresh = false;
        self.sink.write_event(event).map_err(io)
    }

    /// Start a new line indented for `depth`.
    fn line(&mut self, depth: usize) -> Result<()> {
        if self.fresh {
            return Ok(());
        }
        let indent = format!("\n{}", " ".repeat(self.options.indent * depth));
        self.emit(XmlEvent::Text(BytesText::from_escaped(indent)))
    }
}

fn io(error: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Io, error.to_string())
}

impl Render for XmlRenderer {
    fn start(&mut self) -> Result<()> {
        self.sink = XmlSink::new(Vec::new());
        self.fresh = true;
        if self.options.declaration {
            self.emit(XmlEvent::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        }
        Ok(())
    }

    fn enter_branch(&mut self, name: &str, attributes: &Attributes, depth: usize) -> Result<()> {
        self.line(depth)?;
        self.emit(XmlEvent::Start(start_tag(name, attributes)))
    }

    fn exit_branch(&mut self, name: &str, depth: usize) -> Result<()> {
        self.line(depth)?;
        self.emit(XmlEvent::End(BytesEnd::new(name)))
    }

    fn enter_leaf(&mut self, name: &str, attributes: &Attributes, depth: usize) -> Result<()> {
        self.line(depth)?;
        self.emit(XmlEvent::Start(start_tag(name, attributes)))
    }

    fn write_content(&mut self, content: &str) -> Result<()> {
        if content.is_empty() {
            return Ok(());
        }
        self.emit(XmlEvent::Text(BytesText::new(content)))
    }

    fn exit_leaf(&mut self, name: &str, _depth: usize) -> Result<()> {
        self.emit(XmlEvent::End(BytesEnd::new(name)))
    }

    fn write_comment(&mut self, comment: &str, depth: usize) -> Result<()> {
        if comment.contains("--") {
            return Err(Error::structural(format!(
                "Comment cannot be represented in XML: {comment:?}"
            )));
        }
        self.line(depth)?;
        self.emit(XmlEvent::Comment(BytesText::from_escaped(comment)))
    }

    fn finish(&mut self) -> Result<()> {
        self.emit(XmlEvent::Text(BytesText::from_escaped("\n")))
    }
}

fn start_tag<'a>(name: &'a str, attributes: &'a Attributes) -> BytesStart<'a> {
    BytesStart::new(name).with_attributes(
        attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    )
}
