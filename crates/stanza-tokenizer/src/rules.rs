//! The ordered (pattern, kind) table the tokenizer matches against.

use regex::Regex;

use crate::TokenKind;

/// Which surface syntax a rule table recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// `name = value`, `name { ... }`, attributes, blocks.
    #[default]
    Dsl,
    /// `[section]` headers and `key = value` pairs.
    Ini,
}

/// The configurable characters of a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Syntax {
    /// Separates a name from its value.
    pub assign: char,
    /// Starts a comment running to the end of the line.
    pub comment: char,
}

impl Syntax {
    /// `=` and `#`.
    pub const fn dsl() -> Self {
        Self {
            assign: '=',
            comment: '#',
        }
    }

    /// `=` and `;`.
    pub const fn ini() -> Self {
        Self {
            assign: '=',
            comment: ';',
        }
    }

    pub fn with_assign(mut self, assign: char) -> Self {
        self.assign = assign;
        self
    }

    pub fn with_comment(mut self, comment: char) -> Self {
        self.comment = comment;
        self
    }
}

impl Default for Syntax {
    fn default() -> Self {
        Self::dsl()
    }
}

/// One entry of a [`RuleTable`].
#[derive(Debug, Clone)]
pub struct Rule {
    kind: TokenKind,
    regex: Regex,
    /// Capture group holding the token's value; 0 is the whole match.
    group: usize,
}

impl Rule {
    /// Compile a rule. The pattern is anchored at the start of the input.
    pub fn new(kind: TokenKind, pattern: &str, group: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            regex: Regex::new(&format!("^(?:{pattern})"))?,
            group,
        })
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Match the rule against the start of `input`, returning the consumed
    /// text and the token value.
    pub fn matches<'a>(&self, input: &'a str) -> Option<(&'a str, &'a str)> {
        let captures = self.regex.captures(input)?;
        let text = captures.get(0)?.as_str();
        if text.is_empty() {
            return None;
        }
        let value = captures.get(self.group).map_or(text, |m| m.as_str());
        Some((text, value))
    }
}

/// Rules tried in order; the first one that matches wins.
#[derive(Debug, Clone)]
pub struct RuleTable {
    dialect: Dialect,
    syntax: Syntax,
    rules: Vec<Rule>,
    /// Tried before everything else while the tokenizer is in block mode.
    block: Rule,
}

impl RuleTable {
    /// Build the rule table for a dialect.
    pub fn new(dialect: Dialect, syntax: Syntax) -> Result<Self, regex::Error> {
        let assign = regex::escape(&syntax.assign.to_string());
        let comment = regex::escape(&syntax.comment.to_string());

        let mut rules = vec![
            Rule::new(TokenKind::Comment, &format!("{comment}([^\r\n]*)"), 1)?,
            Rule::new(TokenKind::Newline, r"[\t ]*(?:\r\n|\r|\n)", 0)?,
            Rule::new(TokenKind::SingleQuoted, r"'([^'\r\n]*)'", 1)?,
            Rule::new(TokenKind::DoubleQuoted, r#""([^"\r\n]*)""#, 1)?,
        ];
        match dialect {
            Dialect::Dsl => {
                let special = format!(r#"\s{assign}{comment}{{}}\[\],;()"#);
                rules.extend([
                    Rule::new(TokenKind::BlockOpen, r"\(", 0)?,
                    Rule::new(TokenKind::BlockClose, r"\)", 0)?,
                    Rule::new(TokenKind::Assign, &assign, 0)?,
                    Rule::new(TokenKind::BraceOpen, r"\{", 0)?,
                    Rule::new(TokenKind::BraceClose, r"\}", 0)?,
                    Rule::new(TokenKind::AttributesOpen, r"\[", 0)?,
                    Rule::new(TokenKind::AttributesClose, r"\]", 0)?,
                    Rule::new(TokenKind::Comma, ",", 0)?,
                    Rule::new(TokenKind::Semicolon, ";", 0)?,
                    Rule::new(
                        TokenKind::Identifier,
                        &format!(r#"[^{special}'"][^{special}]*"#),
                        0,
                    )?,
                ]);
            }
            Dialect::Ini => {
                let special = format!(r"\s{assign}{comment}");
                rules.extend([
                    Rule::new(TokenKind::Section, r"\[[\t ]*([^\s\]]+)[\t ]*\]", 1)?,
                    Rule::new(TokenKind::Assign, &assign, 0)?,
                    Rule::new(
                        TokenKind::Identifier,
                        &format!(r#"[^{special}\['"][^{special}]*"#),
                        0,
                    )?,
                ]);
            }
        }
        rules.push(Rule::new(TokenKind::Whitespace, r"[\t ]+", 0)?);

        Ok(Self {
            dialect,
            syntax,
            rules,
            block: Rule::new(TokenKind::BlockText, r"[^(){}\r\n]+", 0)?,
        })
    }

    pub fn dsl() -> Result<Self, regex::Error> {
        Self::new(Dialect::Dsl, Syntax::dsl())
    }

    pub fn ini() -> Result<Self, regex::Error> {
        Self::new(Dialect::Ini, Syntax::ini())
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Find the first rule matching the start of `input`.
    pub fn find<'a>(&self, input: &'a str, block: bool) -> Option<(TokenKind, &'a str, &'a str)> {
        let block_rule = block.then_some(&self.block);
        block_rule
            .into_iter()
            .chain(self.rules.iter())
            .find_map(|rule| {
                rule.matches(input)
                    .map(|(text, value)| (rule.kind, text, value))
            })
    }
}
