//! Line-oriented tokenizer driven by a [`RuleTable`].

use tracing::trace;

use crate::location::Lines;
use crate::{Location, RuleTable, Token, TokenKind};

/// Splits source text into tokens, one line at a time.
///
/// Every rule is tried against the unconsumed rest of the current line. When
/// nothing matches, a single [`TokenKind::Error`] token covering the rest of
/// the line is produced and the tokenizer stops.
#[derive(Clone)]
pub struct Tokenizer<'src> {
    rules: RuleTable,
    lines: Lines<'src>,
    /// The line being tokenized, including its terminator.
    line: &'src str,
    /// Byte offset into `line`.
    offset: usize,
    location: Location,
    /// Lexical mode for the inside of `( ... )`.
    block: bool,
    failed: bool,
}

impl<'src> Tokenizer<'src> {
    /// Create a tokenizer over `source` using `rules`.
    pub fn new(source: &'src str, rules: RuleTable) -> Self {
        Self {
            rules,
            lines: Lines::new(source),
            line: "",
            offset: 0,
            location: Location::new(0, 0),
            block: false,
            failed: false,
        }
    }

    /// Position of the next token.
    #[inline]
    pub fn location(&self) -> Location {
        self.location
    }

    /// Whether block text is being recognized.
    #[inline]
    pub fn in_block(&self) -> bool {
        self.block
    }

    /// Switch block mode on or off. Takes effect at the next token.
    #[inline]
    pub fn set_block(&mut self, block: bool) {
        self.block = block;
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Get the next token, or `None` at the end of input.
    pub fn next_token(&mut self) -> Option<Token<'src>> {
        if self.failed {
            return None;
        }
        while self.offset >= self.line.len() {
            self.line = self.lines.next()?;
            self.offset = 0;
            self.location = Location::new(self.location.line + 1, 0);
        }

        let rest = &self.line[self.offset..];
        let location = self.location;
        let Some((kind, text, value)) = self.rules.find(rest, self.block) else {
            trace!("No rule matches at {}: {:?}", location, rest);
            self.failed = true;
            self.offset = self.line.len();
            return Some(Token::new(TokenKind::Error, rest, rest, location));
        };

        self.offset += text.len();
        self.location.column += text.chars().count() as u32;
        trace!("Token {:?} at {}: {:?}", kind, location, text);
        Some(Token::new(kind, text, value, location))
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn tokenize(source: &str) -> Vec<(TokenKind, &str)> {
        init_tracing();
        Tokenizer::new(source, RuleTable::dsl().unwrap())
            .map(|t| (t.kind, t.text))
            .collect()
    }

    fn tokenize_ini(source: &str) -> Vec<(TokenKind, &str)> {
        Tokenizer::new(source, RuleTable::ini().unwrap())
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_assignment() {
        assert_eq!(
            tokenize("value1 = 5\n"),
            vec![
                (TokenKind::Identifier, "value1"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Assign, "="),
                (TokenKind::Whitespace, " "),
                (TokenKind::Identifier, "5"),
                (TokenKind::Newline, "\n"),
            ]
        );
    }

    #[test]
    fn test_structural_tokens() {
        assert_eq!(
            tokenize("a[k='v'];{}(),"),
            vec![
                (TokenKind::Identifier, "a"),
                (TokenKind::AttributesOpen, "["),
                (TokenKind::Identifier, "k"),
                (TokenKind::Assign, "="),
                (TokenKind::SingleQuoted, "'v'"),
                (TokenKind::AttributesClose, "]"),
                (TokenKind::Semicolon, ";"),
                (TokenKind::BraceOpen, "{"),
                (TokenKind::BraceClose, "}"),
                (TokenKind::BlockOpen, "("),
                (TokenKind::BlockClose, ")"),
                (TokenKind::Comma, ","),
            ]
        );
    }

    #[test]
    fn test_comment_and_crlf() {
        assert_eq!(
            tokenize("x # note\r\ny"),
            vec![
                (TokenKind::Identifier, "x"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Comment, "# note"),
                (TokenKind::Newline, "\r\n"),
                (TokenKind::Identifier, "y"),
            ]
        );
    }

    #[test]
    fn test_locations() {
        let tokens: Vec<_> = Tokenizer::new("a = 1\n  bé = 2", RuleTable::dsl().unwrap())
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| (t.text, t.location))
            .collect();
        assert_eq!(
            tokens,
            vec![
                ("a", Location::new(1, 0)),
                ("1", Location::new(1, 4)),
                ("bé", Location::new(2, 2)),
                ("2", Location::new(2, 7)),
            ]
        );
    }

    #[test]
    fn test_block_mode() {
        let mut tokenizer = Tokenizer::new("f(x = 1, 'y') z", RuleTable::dsl().unwrap());
        assert_eq!(tokenizer.next_token().map(|t| t.kind), Some(TokenKind::Identifier));
        assert_eq!(tokenizer.next_token().map(|t| t.kind), Some(TokenKind::BlockOpen));
        tokenizer.set_block(true);
        let text = tokenizer.next_token().unwrap();
        assert_eq!((text.kind, text.text), (TokenKind::BlockText, "x = 1, 'y'"));
        assert_eq!(tokenizer.next_token().map(|t| t.kind), Some(TokenKind::BlockClose));
        tokenizer.set_block(false);
        assert_eq!(tokenizer.next_token().map(|t| t.kind), Some(TokenKind::Whitespace));
    }

    #[test]
    fn test_error_stops_tokenizing() {
        let tokens = tokenize("a 'open\nb = 1\n");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Identifier, "a"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Error, "'open\n"),
            ]
        );
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(
            tokenize("a\rb \r\nc\n"),
            vec![
                (TokenKind::Identifier, "a"),
                (TokenKind::Newline, "\r"),
                (TokenKind::Identifier, "b"),
                (TokenKind::Newline, " \r\n"),
                (TokenKind::Identifier, "c"),
                (TokenKind::Newline, "\n"),
            ]
        );
        let lines: Vec<_> = Tokenizer::new("a\rb\r\nc", RuleTable::dsl().unwrap())
            .map(|t| t.location.line)
            .collect();
        assert_eq!(lines, [1, 1, 2, 2, 3]);
    }

    #[test]
    fn test_ini() {
        assert_eq!(
            tokenize_ini("[main]\nkey = a,b ; c\n"),
            vec![
                (TokenKind::Section, "[main]"),
                (TokenKind::Newline, "\n"),
                (TokenKind::Identifier, "key"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Assign, "="),
                (TokenKind::Whitespace, " "),
                (TokenKind::Identifier, "a,b"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Comment, "; c"),
                (TokenKind::Newline, "\n"),
            ]
        );
    }

    proptest! {
        #[test]
        fn tokens_cover_the_input_or_stop_at_one_error(source in "[a-z =#{}\\[\\],;()'\"\n\t]{0,64}") {
            let tokens: Vec<_> = Tokenizer::new(&source, RuleTable::dsl().unwrap()).collect();
            let errors = tokens.iter().filter(|t| t.kind == TokenKind::Error).count();
            prop_assert!(errors <= 1);
            if errors == 1 {
                prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Error));
                let joined: String = tokens.iter().map(|t| t.text).collect();
                prop_assert!(source.starts_with(&joined));
            } else {
                let joined: String = tokens.iter().map(|t| t.text).collect();
                prop_assert_eq!(joined, source);
            }
        }
    }
}
