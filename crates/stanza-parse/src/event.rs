//! The neutral event protocol shared by every reader and consumer.

use std::collections::BTreeMap;

use tracing::warn;

use crate::{Diagnostics, Locator, Result, Warning};

/// Attributes of a context, iterated in key order.
pub type Attributes = BTreeMap<String, String>;

/// Receiver of a document's event stream.
///
/// A reader calls [`set_locator`](Self::set_locator) once, then
/// `start_document`, a balanced sequence of `enter`/`leave` with
/// `content`, `comment` and `ignore` in between, and finally `end_document`.
/// Any `Err` returned by the handler aborts the pass.
pub trait ContentHandler {
    /// Receive the reader's position cursor. Called before `start_document`.
    fn set_locator(&mut self, locator: Locator) {
        let _ = locator;
    }

    fn start_document(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        Ok(())
    }

    /// A named context opens.
    fn enter(&mut self, name: &str, attributes: &Attributes) -> Result<()>;

    /// The innermost open context closes.
    fn leave(&mut self) -> Result<()>;

    /// Character data of the innermost open context.
    fn content(&mut self, text: &str) -> Result<()>;

    fn comment(&mut self, text: &str) -> Result<()> {
        let _ = text;
        Ok(())
    }

    /// Text with no meaning to the document, such as padding or quotes.
    fn ignore(&mut self, text: &str) -> Result<()> {
        let _ = text;
        Ok(())
    }

    /// A recoverable problem found by the producer of the stream.
    fn warning(&mut self, warning: Warning) {
        warn!("{}", warning);
    }
}

impl<H: ContentHandler + ?Sized> ContentHandler for &mut H {
    fn set_locator(&mut self, locator: Locator) {
        (**self).set_locator(locator)
    }

    fn start_document(&mut self) -> Result<()> {
        (**self).start_document()
    }

    fn end_document(&mut self) -> Result<()> {
        (**self).end_document()
    }

    fn enter(&mut self, name: &str, attributes: &Attributes) -> Result<()> {
        (**self).enter(name, attributes)
    }

    fn leave(&mut self) -> Result<()> {
        (**self).leave()
    }

    fn content(&mut self, text: &str) -> Result<()> {
        (**self).content(text)
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        (**self).comment(text)
    }

    fn ignore(&mut self, text: &str) -> Result<()> {
        (**self).ignore(text)
    }

    fn warning(&mut self, warning: Warning) {
        (**self).warning(warning)
    }
}

/// One protocol call, as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StartDocument,
    EndDocument,
    Enter { name: String, attributes: Attributes },
    Leave,
    Content(String),
    Comment(String),
    Ignorable(String),
}

impl Event {
    /// Shorthand for an `Enter` without attributes.
    pub fn enter(name: impl Into<String>) -> Self {
        Event::Enter {
            name: name.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Event::Content(text.into())
    }

    /// Deliver this event to `handler`.
    pub fn dispatch<H: ContentHandler + ?Sized>(&self, handler: &mut H) -> Result<()> {
        match self {
            Event::StartDocument => handler.start_document(),
            Event::EndDocument => handler.end_document(),
            Event::Enter { name, attributes } => handler.enter(name, attributes),
            Event::Leave => handler.leave(),
            Event::Content(text) => handler.content(text),
            Event::Comment(text) => handler.comment(text),
            Event::Ignorable(text) => handler.ignore(text),
        }
    }
}

/// A consumer that records the stream so it can be inspected or replayed.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
    diagnostics: Diagnostics,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn warnings(&self) -> &[Warning] {
        self.diagnostics.warnings()
    }

    /// The recorded events without `Ignorable` padding.
    pub fn significant(&self) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(|event| !matches!(event, Event::Ignorable(_)))
    }

    /// Send every recorded event, and then every warning, to `handler`.
    pub fn replay<H: ContentHandler + ?Sized>(&self, handler: &mut H) -> Result<()> {
        for event in &self.events {
            event.dispatch(handler)?;
        }
        for warning in self.diagnostics.warnings() {
            handler.warning(warning.clone());
        }
        Ok(())
    }
}

impl ContentHandler for EventLog {
    fn start_document(&mut self) -> Result<()> {
        self.events.push(Event::StartDocument);
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.events.push(Event::EndDocument);
        Ok(())
    }

    fn enter(&mut self, name: &str, attributes: &Attributes) -> Result<()> {
        self.events.push(Event::Enter {
            name: name.to_string(),
            attributes: attributes.clone(),
        });
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        self.events.push(Event::Leave);
        Ok(())
    }

    fn content(&mut self, text: &str) -> Result<()> {
        self.events.push(Event::Content(text.to_string()));
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        self.events.push(Event::Comment(text.to_string()));
        Ok(())
    }

    fn ignore(&mut self, text: &str) -> Result<()> {
        self.events.push(Event::Ignorable(text.to_string()));
        Ok(())
    }

    fn warning(&mut self, warning: Warning) {
        self.diagnostics.warn(warning);
    }
}
