//! Streaming writers for the stanza formats.
//!
//! A [`Writer`] consumes the neutral event protocol and decides, one node at
//! a time, whether a node is a leaf (it carries content) or a branch (it
//! carries children). The actual characters come from a [`Render`]
//! implementation; [`DslRenderer`] produces the brace/assignment DSL.

mod options;
mod scalar;
mod writer;
mod dsl;

pub use dsl::{DslRenderer, DslWriter};
pub use options::FormatOptions;
pub use scalar::{can_be_bare, format_name, format_scalar, quote, wrap_comment};
pub use writer::{NodeState, Render, Writer};
