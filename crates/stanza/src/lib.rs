#![doc = include_str!("../README.md")]

pub use stanza_format::{DslRenderer, DslWriter, FormatOptions, NodeState, Render, Writer};
pub use stanza_parse::{
    Attributes, ContentBuffer, ContentHandler, Diagnostics, Dialect, Error, ErrorKind, Event,
    EventLog, Fault, Location, Locator, Reader, Result, Syntax, Warning,
};
pub use stanza_schema::{
    Binding, Capability, Convert, Dispatcher, Group, Map, Node, Parsed, Proxy, Schema,
    SchemaReader, Slot, Validator, Verbatim, flag, group, ignore, list, list_with, node, proxy,
    text, value, value_with,
};
pub use stanza_xml::{XmlOptions, XmlReader, XmlRenderer, XmlWriter};

pub use stanza_format as format;
pub use stanza_parse as parse;
pub use stanza_schema as schema;
pub use stanza_tokenizer as tokenizer;
pub use stanza_xml as xml;

use tracing::debug;

/// Bind a DSL or INI document to the tree under `root`.
///
/// Returns the warnings of the pass; the first fatal problem is the error.
pub fn load(reader: &Reader, source: &str, root: &mut Node) -> Result<Diagnostics> {
    debug!(dialect = ?reader.dialect(), root = root.name(), "load");
    let mut dispatcher = Dispatcher::new(root);
    reader.parse(source, &mut dispatcher)?;
    Ok(dispatcher.into_diagnostics())
}

/// Bind an XML document to the tree under `root`.
pub fn load_xml(source: &str, root: &mut Node) -> Result<Diagnostics> {
    debug!(root = root.name(), "load xml");
    let mut dispatcher = Dispatcher::new(root);
    XmlReader::new().parse(source, &mut dispatcher)?;
    Ok(dispatcher.into_diagnostics())
}

/// Write the values bound under `root` as a DSL document.
pub fn dump(root: &Node, options: &FormatOptions) -> Result<String> {
    let mut writer = DslWriter::dsl(options.clone());
    SchemaReader::new(root).parse(&mut writer)?;
    Ok(writer.finish_string())
}

/// Write the values bound under `root` as an XML document.
pub fn dump_xml(root: &Node, options: &XmlOptions) -> Result<String> {
    let mut writer = XmlRenderer::writer(options.clone());
    SchemaReader::new(root).parse(&mut writer)?;
    writer.into_inner().finish_string()
}
