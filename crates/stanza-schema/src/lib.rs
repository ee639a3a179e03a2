//! Schema trees that bind stanza documents to host values.
//!
//! A tree is built once from [`node`]s widened with capabilities:
//!
//! - [`group`]: ordered, named children, with aliases and a fallback child
//! - [`value`], [`value_with`], [`text`], [`flag`]: content bound to a [`Slot`]
//! - [`list`], [`list_with`]: one element per occurrence
//! - [`proxy`]: one of several delegates, chosen by an attribute
//! - [`ignore`]: anything goes
//!
//! A [`Dispatcher`] feeds a document into the tree; a [`SchemaReader`] turns
//! the tree back into events for any writer.

mod capability;
mod convert;
mod dispatcher;
mod node;
mod schema;
mod schema_reader;

pub use capability::{
    Binding, Capability, Group, Proxy, flag, group, ignore, list, list_with, proxy, text, value,
    value_with,
};
pub use convert::{Convert, Map, Parsed, Slot, Verbatim};
pub use dispatcher::{Dispatcher, Validator};
pub use node::{Node, node};
pub use schema::Schema;
pub use schema_reader::SchemaReader;
