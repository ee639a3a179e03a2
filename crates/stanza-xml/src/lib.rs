//! XML for the stanza event protocol.
//!
//! [`XmlReader`] turns a document into protocol events, and an
//! [`XmlWriter`] turns protocol events back into a document. The document
//! element plays the part of the root context.

mod reader;
mod render;

pub use reader::XmlReader;
pub use render::{XmlOptions, XmlRenderer, XmlWriter};
