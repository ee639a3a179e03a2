//! The push reader for the brace/assignment DSL and the INI dialect.

use std::io::Read;
use std::mem;

use stanza_tokenizer::{Dialect, Locator, RuleTable, Syntax, Token, TokenKind, Tokenizer};
use tracing::debug;

use crate::{Attributes, ContentHandler, Error, Result, Warning};


/// Reads DSL or INI text and pushes protocol events into a [`ContentHandler`].
///
/// The whole document is wrapped in an implicit root context, `"root"` unless
/// configured otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reader {
    dialect: Dialect,
    syntax: Syntax,
    root: String,
}

impl Reader {
    /// Reader for the brace/assignment DSL.
    pub fn dsl() -> Self {
        Self {
            dialect: Dialect::Dsl,
            syntax: Syntax::dsl(),
            root: "root".to_string(),
        }
    }

    /// Reader for INI files.
    pub fn ini() -> Self {
        Self {
            dialect: Dialect::Ini,
            syntax: Syntax::ini(),
            root: "root".to_string(),
        }
    }

    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// Name of the implicit context around the document.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Parse `source`, sending every event to `handler`.
    ///
    /// The first error, whether raised by the reader or returned by the
    /// handler, aborts the parse and is returned with its location.
    pub fn parse<H: ContentHandler + ?Sized>(&self, source: &str, handler: &mut H) -> Result<()> {
        let rules = RuleTable::new(self.dialect, self.syntax)
            .map_err(|e| Error::lexical(format!("invalid rule table: {e}")))?;
        let locator = Locator::new();
        handler.set_locator(locator.clone());
        let mut state = ReadState::new(handler, locator, self.dialect);
        state.run(Tokenizer::new(source, rules), &self.root)
    }

    /// Read everything from `input` and parse it.
    pub fn parse_reader<R: Read, H: ContentHandler + ?Sized>(
        &self,
        mut input: R,
        handler: &mut H,
    ) -> Result<()> {
        let mut source = String::new();
        input.read_to_string(&mut source)?;
        self.parse(&source, handler)
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::dsl()
    }
}

/// Mutable state of one parse.
struct ReadState<'h, H: ContentHandler + ?Sized> {
    handler: &'h mut H,
    locator: Locator,
    dialect: Dialect,

    /// Left of an assignment character.
    on_lhs: bool,
    in_attributes: bool,
    in_block: bool,
    /// Only blanks and comments seen so far on this line.
    line_start: bool,

    /// Identifiers seen on the LHS, not yet turned into a context.
    names: Vec<String>,
    /// Attributes for the next context.
    attributes: Attributes,
    /// Attribute key waiting for its value.
    attribute: Option<String>,
    /// Open contexts, innermost last. The root is not included.
    stack: Vec<String>,

    /// Whether the current RHS has produced content yet.
    rhs_started: bool,
    /// Blanks after RHS content; they become content if more content follows.
    space: String,
}

impl<'h, H: ContentHandler + ?Sized> ReadState<'h, H> {
    fn new(handler: &'h mut H, locator: Locator, dialect: Dialect) -> Self {
        Self {
            handler,
            locator,
            dialect,
            on_lhs: true,
            in_attributes: false,
            in_block: false,
            line_start: true,
            names: Vec::new(),
            attributes: Attributes::new(),
            attribute: None,
            stack: Vec::new(),
            rhs_started: false,
            space: String::new(),
        }
    }

    fn run(&mut self, mut tokens: Tokenizer<'_>, root: &str) -> Result<()> {
        self.handler.start_document()?;
        self.handler.enter(root, &Attributes::new())?;

        while let Some(token) = tokens.next_token() {
            self.locator.set(token.location);
            self.token(token).map_err(|e| e.at(token.location))?;
            match token.kind {
                TokenKind::Newline => self.line_start = true,
                TokenKind::Whitespace | TokenKind::Comment => {}
                _ => self.line_start = false,
            }
            tokens.set_block(self.in_block);
        }

        let end = tokens.location();
        self.locator.set(end);
        self.finish().map_err(|e| e.at(end))?;
        self.handler.leave()?;
        self.handler.end_document()
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::lexical(message).at(self.locator.location())
    }

    fn token(&mut self, token: Token<'_>) -> Result<()> {
        if self.in_block {
            return self.block_token(token);
        }
        match token.kind {
            TokenKind::Error => Err(self.error("Undefined pattern")),
            TokenKind::Comment => {
                self.end_assignment()?;
                self.handler.comment(token.value)
            }
            TokenKind::Newline => self.newline(token.text),
            TokenKind::SingleQuoted | TokenKind::DoubleQuoted => self.quoted(token),
            TokenKind::BlockOpen => self.begin_block(token.text),
            TokenKind::BlockClose => Err(self.error("Spurious ')'")),
            TokenKind::BlockText => self.rhs_content(token.text),
            TokenKind::Assign => self.assign(),
            TokenKind::BraceOpen => self.open_brace(),
            TokenKind::BraceClose => self.close_brace(),
            TokenKind::AttributesOpen => self.open_attributes(token.text),
            TokenKind::AttributesClose => self.close_attributes(token.text),
            TokenKind::Comma => self.comma(token.text),
            TokenKind::Semicolon => self.end_assignment(),
            TokenKind::Section => self.section(token),
            TokenKind::Identifier => self.identifier(token.value),
            TokenKind::Whitespace => self.whitespace(token.text),
        }
    }

    /// Inside `( ... )` everything is content, up to the closing parenthesis.
    fn block_token(&mut self, token: Token<'_>) -> Result<()> {
        match token.kind {
            TokenKind::BlockClose => {
                self.in_block = false;
                self.handler.content(token.text)
            }
            TokenKind::BlockOpen => Err(self.error("Nested blocks are not allowed")),
            TokenKind::BraceOpen => Err(self.error("Cannot open a context in a block")),
            TokenKind::BraceClose => Err(self.error("Cannot close a context in a block")),
            TokenKind::Error => Err(self.error("Undefined pattern")),
            _ => self.handler.content(token.text),
        }
    }

    fn begin_block(&mut self, text: &str) -> Result<()> {
        if self.in_attributes {
            return Err(self.error("Blocks are not allowed in attributes"));
        }
        if self.on_lhs {
            return Err(self.error("Blocks are not allowed on the LHS"));
        }
        self.rhs_content(text)?;
        self.in_block = true;
        Ok(())
    }

    fn identifier(&mut self, value: &str) -> Result<()> {
        if self.in_attributes {
            self.attribute_part(value)
        } else if self.on_lhs {
            self.names.push(value.to_string());
            Ok(())
        } else {
            self.rhs_content(value)
        }
    }

    /// A quoted scalar is an identifier whose quotes are padding.
    fn quoted(&mut self, token: Token<'_>) -> Result<()> {
        if self.in_attributes {
            return self.attribute_part(token.value);
        }
        let quote = &token.text[..1];
        if self.on_lhs {
            self.handler.ignore(quote)?;
            self.names.push(token.value.to_string());
        } else {
            self.flush_space()?;
            self.handler.ignore(quote)?;
            self.rhs_started = true;
            self.handler.content(token.value)?;
        }
        self.handler.ignore(quote)
    }

    /// A key or a value inside `[ ... ]`.
    fn attribute_part(&mut self, value: &str) -> Result<()> {
        if self.on_lhs {
            if let Some(key) = &self.attribute {
                return Err(self.error(format!("Expected assignment after attribute '{key}'")));
            }
            self.attribute = Some(value.to_string());
        } else {
            let Some(key) = self.attribute.take() else {
                return Err(self.error("Incomplete attribute"));
            };
            self.attributes.insert(key, value.to_string());
            self.on_lhs = true;
        }
        Ok(())
    }

    fn whitespace(&mut self, text: &str) -> Result<()> {
        if !self.on_lhs && !self.in_attributes && self.rhs_started {
            self.space.push_str(text);
            Ok(())
        } else {
            self.handler.ignore(text)
        }
    }

    fn flush_space(&mut self) -> Result<()> {
        if self.space.is_empty() {
            return Ok(());
        }
        let space = mem::take(&mut self.space);
        self.handler.content(&space)
    }

    fn rhs_content(&mut self, text: &str) -> Result<()> {
        self.flush_space()?;
        self.rhs_started = true;
        self.handler.content(text)
    }

    fn assign(&mut self) -> Result<()> {
        if self.in_attributes {
            if self.attribute.is_none() || !self.on_lhs {
                return Err(self.error("Incomplete attribute"));
            }
            self.on_lhs = false;
            return Ok(());
        }
        if !self.on_lhs {
            return Err(self.error("Assignment character on RHS must be quoted"));
        }
        self.enter_context()?;
        self.on_lhs = false;
        self.rhs_started = false;
        Ok(())
    }

    fn open_brace(&mut self) -> Result<()> {
        if self.in_attributes {
            return Err(self.error("Cannot open a context in attributes"));
        }
        if !self.on_lhs {
            return Err(self.error("Cannot open a context on the RHS"));
        }
        self.enter_context()
    }

    /// Turn the single buffered name and the pending attributes into an
    /// `enter` event.
    fn enter_context(&mut self) -> Result<()> {
        if self.names.len() != 1 {
            return Err(self.error(format!(
                "Expected exactly one identifier, got {}",
                self.names.len()
            )));
        }
        let name = self.names.remove(0);
        let attributes = mem::take(&mut self.attributes);
        debug!(name = %name, depth = self.stack.len() + 1, "enter");
        self.handler.enter(&name, &attributes)?;
        self.stack.push(name);
        Ok(())
    }

    fn leave_context(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(name) => {
                debug!(name = %name, depth = self.stack.len() + 1, "leave");
                self.handler.leave()
            }
            None => Err(Error::structural("Spurious '}'").at(self.locator.location())),
        }
    }

    fn close_brace(&mut self) -> Result<()> {
        if self.in_attributes {
            return Err(self.error("Cannot close a context in attributes"));
        }
        self.end_assignment()?;
        if !self.attributes.is_empty() {
            return Err(self.error("Superfluous attributes"));
        }
        self.flush_names()?;
        self.leave_context()
    }

    /// Buffered names that never got an assignment are content.
    fn flush_names(&mut self) -> Result<()> {
        if self.names.is_empty() {
            return Ok(());
        }
        let text = self.names.join(" ");
        self.names.clear();
        self.handler.content(&text)
    }

    /// Close the context opened by the last assignment, if any.
    fn end_assignment(&mut self) -> Result<()> {
        if self.in_attributes {
            if self.attribute.is_some() || !self.on_lhs {
                return Err(self.error("Incomplete attribute"));
            }
            return Ok(());
        }
        if !self.on_lhs {
            if !self.space.is_empty() {
                let space = mem::take(&mut self.space);
                self.handler.ignore(&space)?;
            }
            self.on_lhs = true;
            self.rhs_started = false;
            self.leave_context()?;
        }
        Ok(())
    }

    fn newline(&mut self, text: &str) -> Result<()> {
        if self.in_attributes {
            if self.attribute.is_some() || !self.on_lhs {
                return Err(self.error("Illegal line break before incomplete attribute"));
            }
            return self.handler.ignore(text);
        }
        self.end_assignment()?;
        if !self.attributes.is_empty() {
            return Err(self.error("Superfluous attributes"));
        }
        self.flush_names()?;
        self.handler.ignore(text)
    }

    fn open_attributes(&mut self, text: &str) -> Result<()> {
        if self.in_attributes {
            return Err(self.error("Nested attribute lists are not allowed"));
        }
        if !self.on_lhs {
            return self.rhs_content(text);
        }
        self.in_attributes = true;
        Ok(())
    }

    fn close_attributes(&mut self, text: &str) -> Result<()> {
        if !self.in_attributes {
            if !self.on_lhs {
                return self.rhs_content(text);
            }
            return Err(self.error("Spurious ']'"));
        }
        if self.attribute.is_some() || !self.on_lhs {
            return Err(self.error("Incomplete attribute"));
        }
        self.in_attributes = false;
        Ok(())
    }

    fn comma(&mut self, text: &str) -> Result<()> {
        if self.in_attributes {
            self.end_assignment()
        } else if !self.on_lhs {
            self.rhs_content(text)
        } else {
            self.flush_names()?;
            self.handler.content(text)
        }
    }

    /// INI `[name]`: closes the open section and opens the next one.
    fn section(&mut self, token: Token<'_>) -> Result<()> {
        if !self.on_lhs {
            return self.rhs_content(token.text);
        }
        if !self.line_start {
            return Err(self.error("Section header must start a line"));
        }
        if !self.stack.is_empty() {
            self.leave_context()?;
        }
        debug!(name = token.value, "section");
        self.handler.enter(token.value, &Attributes::new())?;
        self.stack.push(token.value.to_string());
        Ok(())
    }

    /// End of input acts as a final line break.
    fn finish(&mut self) -> Result<()> {
        if self.in_block {
            return Err(self.error("Unterminated block"));
        }
        if self.in_attributes {
            return Err(self.error("Unterminated attribute list"));
        }
        self.end_assignment()?;
        if !self.attributes.is_empty() {
            return Err(self.error("Superfluous attributes"));
        }
        self.flush_names()?;

        if self.dialect == Dialect::Ini && !self.stack.is_empty() {
            self.leave_context()?;
        }
        if !self.stack.is_empty() {
            let warning = Warning::new(format!(
                "{} context(s) were not closed: {}",
                self.stack.len(),
                self.stack.join(", ")
            ))
            .at(self.locator.location());
            self.handler.warning(warning);
            while !self.stack.is_empty() {
                self.leave_context()?;
            }
        }
        Ok(())
    }
}
