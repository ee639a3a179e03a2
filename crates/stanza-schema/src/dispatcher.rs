//! Drives a [`Schema`] cursor from the event protocol.

use stanza_parse::{
    Attributes, ContentBuffer, ContentHandler, Diagnostics, Fault, Location, Locator, Result,
    Warning,
};
use tracing::debug;

use crate::{Node, Schema};

/// A [`ContentHandler`] that binds a document to a schema tree.
///
/// Content is buffered between structural events and handed to the active
/// node before the next `enter` or `leave`. Recoverable faults become
/// warnings in [`Dispatcher::diagnostics`]; everything else aborts the pass
/// with the location of the event that caused it.
pub struct Dispatcher<'s> {
    schema: Schema<'s>,
    buffer: ContentBuffer,
    locator: Option<Locator>,
    diagnostics: Diagnostics,
}

/// The dispatcher doubles as the validator of a document.
pub type Validator<'s> = Dispatcher<'s>;

impl<'s> Dispatcher<'s> {
    pub fn new(root: &'s mut Node) -> Self {
        Dispatcher {
            schema: Schema::new(root),
            buffer: ContentBuffer::new(),
            locator: None,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn schema(&self) -> &Schema<'s> {
        &self.schema
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn location(&self) -> Option<Location> {
        self.locator.as_ref().map(Locator::location)
    }

    fn absorb(&mut self, outcome: std::result::Result<(), Fault>) -> Result<()> {
        match outcome {
            Ok(()) => Ok(()),
            Err(fault) => {
                let location = self.location();
                self.diagnostics.absorb(fault, location)
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let text = self.buffer.flush();
        let outcome = self.schema.content(&text);
        self.absorb(outcome)
    }
}

impl ContentHandler for Dispatcher<'_> {
    fn set_locator(&mut self, locator: Locator) {
        self.locator = Some(locator);
    }

    fn start_document(&mut self) -> Result<()> {
        self.schema.reset();
        self.buffer.clear();
        self.diagnostics.clear();
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.flush()?;
        let open = self.schema.depth();
        if open > 0 {
            let warning = Warning::new(format!("{open} context(s) were not closed properly."))
                .at_opt(self.location());
            self.diagnostics.warn(warning);
        }
        Ok(())
    }

    fn enter(&mut self, name: &str, attributes: &Attributes) -> Result<()> {
        self.flush()?;
        debug!(name, depth = self.schema.depth(), "dispatch enter");
        let outcome = self.schema.enter(name, attributes);
        self.absorb(outcome)
    }

    fn leave(&mut self) -> Result<()> {
        self.flush()?;
        let outcome = self.schema.leave();
        self.absorb(outcome)
    }

    fn content(&mut self, text: &str) -> Result<()> {
        self.buffer.push(text);
        Ok(())
    }

    fn comment(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn warning(&mut self, warning: Warning) {
        self.diagnostics.warn(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Slot, group, node, value};
    use stanza_parse::{ErrorKind, Event, Location};

    fn run(root: &mut Node, events: &[Event]) -> Result<Diagnostics> {
        let mut dispatcher = Dispatcher::new(root);
        let locator = Locator::new();
        dispatcher.set_locator(locator.clone());
        for (line, event) in (1..).zip(events) {
            locator.set(Location::new(line, 0));
            event.dispatch(&mut dispatcher)?;
        }
        Ok(dispatcher.into_diagnostics())
    }

    #[test]
    fn content_is_joined_before_assignment() {
        let text = Slot::new(String::new());
        let mut root = node("root") << group([node("t") << crate::text(&text)]);
        let events = [
            Event::StartDocument,
            Event::enter("root"),
            Event::enter("t"),
            Event::content("a"),
            Event::content(" "),
            Event::content("b"),
            Event::Leave,
            Event::Leave,
            Event::EndDocument,
        ];
        let diagnostics = run(&mut root, &events).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(text.get(), "a b");
    }

    #[test]
    fn faults_carry_the_event_location() {
        let n = Slot::new(0i32);
        let mut root = node("root") << group([node("n") << value(&n)]);
        let events = [
            Event::StartDocument,
            Event::enter("root"),
            Event::enter("n"),
            Event::content("x"),
            Event::Leave,
        ];
        let error = run(&mut root, &events).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conversion);
        assert_eq!(error.location(), Some(Location::new(5, 0)));
    }

    #[test]
    fn unclosed_contexts_warn_at_the_end() {
        let mut root = node("root") << group([node("g") << group([])]);
        let events = [
            Event::StartDocument,
            Event::enter("root"),
            Event::enter("g"),
            Event::EndDocument,
        ];
        let diagnostics = run(&mut root, &events).unwrap();
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(
            diagnostics.warnings()[0].message(),
            "2 context(s) were not closed properly."
        );
    }

    #[test]
    fn unknown_children_are_fatal() {
        let mut root = node("root") << group([]);
        let events = [Event::StartDocument, Event::enter("root"), Event::enter("nope")];
        let error = run(&mut root, &events).unwrap_err();
        assert_eq!(error.to_string(), "3:0: Child 'nope' not supported by 'root'");
    }

    #[test]
    fn start_document_resets_the_tree() {
        let mut root = node("root") << group([node("once")]);
        let events = [
            Event::StartDocument,
            Event::enter("root"),
            Event::enter("once"),
            Event::Leave,
            Event::Leave,
            Event::EndDocument,
        ];
        run(&mut root, &events).unwrap();
        run(&mut root, &events).unwrap();
    }
}
