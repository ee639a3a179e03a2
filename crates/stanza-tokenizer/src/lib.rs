//! A line-oriented, rule-table driven tokenizer for the stanza formats.
//!
//! The tokenizer knows nothing about contexts or assignments: it only splits
//! text into [`Token`]s according to an ordered [`RuleTable`]. The reader in
//! `stanza-parse` gives the tokens their meaning.

mod location;
pub use location::{Location, Locator};

mod rules;
pub use rules::{Dialect, Rule, RuleTable, Syntax};

mod token;
pub use token::{Token, TokenKind};

mod tokenizer;
pub use tokenizer::Tokenizer;
