#![doc = include_str!("../README.md")]

pub use stanza_tokenizer::{Dialect, Location, Locator, Syntax, Token, TokenKind, Tokenizer};

mod error;
pub use error::{Diagnostics, Error, ErrorKind, Fault, Result, Warning};

mod diagnostic;

mod event;
pub use event::{Attributes, ContentHandler, Event, EventLog};

mod buffer;
pub use buffer::ContentBuffer;

mod reader;
pub use reader::Reader;
