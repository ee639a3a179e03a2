//! Push reader over `quick-xml`.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use stanza_parse::{Attributes, ContentHandler, Error, ErrorKind, Location, Locator, Result};
use tracing::{debug, trace};

/// Reads XML and pushes protocol events into a [`ContentHandler`].
///
/// Elements become contexts, attributes their attributes, and character
/// data their content. Whitespace-only text is passed as ignorable.
/// Declarations, processing instructions and doctypes are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlReader;

impl XmlReader {
    pub fn new() -> Self {
        XmlReader
    }

    pub fn parse<H: ContentHandler + ?Sized>(&self, source: &str, handler: &mut H) -> Result<()> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(false);
        let locator = Locator::new();
        handler.set_locator(locator.clone());
        handler.start_document()?;

        let mut depth = 0usize;
        loop {
            let start = offset(reader.buffer_position());
            locator.set(Location::of_offset(source, start));
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    let at = Location::of_offset(source, offset(reader.error_position()));
                    return Err(Error::new(ErrorKind::Syntax, e.to_string()).at(at));
                }
            };
            trace!(?event, "xml event");
            let here = locator.location();
            match event {
                XmlEvent::Start(element) => {
                    let (name, attributes) = element_parts(&element).map_err(|e| e.at(here))?;
                    debug!(name = %name, depth, "enter");
                    handler.enter(&name, &attributes).map_err(|e| e.at(here))?;
                    depth += 1;
                }
                XmlEvent::End(_) => {
                    handler.leave().map_err(|e| e.at(here))?;
                    depth = depth.saturating_sub(1);
                }
                XmlEvent::Empty(element) => {
                    let (name, attributes) = element_parts(&element).map_err(|e| e.at(here))?;
                    handler.enter(&name, &attributes).map_err(|e| e.at(here))?;
                    handler.leave().map_err(|e| e.at(here))?;
                }
                XmlEvent::Text(text) => {
                    let text = text.unescape().map_err(|e| syntax(e).at(here))?;
                    let delivered = if text.trim().is_empty() {
                        handler.ignore(&text)
                    } else if depth == 0 {
                        return Err(outside_root().at(here));
                    } else {
                        handler.content(&text)
                    };
                    delivered.map_err(|e| e.at(here))?;
                }
                XmlEvent::CData(data) => {
                    if depth == 0 {
                        return Err(outside_root().at(here));
                    }
                    let text = utf8(data.into_inner()).map_err(|e| e.at(here))?;
                    handler.content(&text).map_err(|e| e.at(here))?;
                }
                XmlEvent::Comment(comment) => {
                    let text = utf8(comment.into_inner()).map_err(|e| e.at(here))?;
                    // Comments around the document element have no context to belong to.
                    let delivered = if depth == 0 {
                        handler.ignore(&text)
                    } else {
                        handler.comment(&text)
                    };
                    delivered.map_err(|e| e.at(here))?;
                }
                XmlEvent::Eof => break,
                _ => {}
            }
        }

        let end = Location::of_offset(source, source.len());
        locator.set(end);
        if depth > 0 {
            return Err(Error::new(
                ErrorKind::Syntax,
                format!("{depth} element(s) were not closed"),
            )
            .at(end));
        }
        handler.end_document()
    }
}

fn offset(position: impl TryInto<usize>) -> usize {
    position.try_into().unwrap_or(usize::MAX)
}

fn syntax(error: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Syntax, error.to_string())
}

fn outside_root() -> Error {
    Error::new(ErrorKind::Syntax, "Character data outside the document element")
}

fn utf8(bytes: Cow<'_, [u8]>) -> Result<String> {
    String::from_utf8(bytes.into_owned()).map_err(syntax)
}

fn element_parts(element: &BytesStart<'_>) -> Result<(String, Attributes)> {
    let name = utf8(Cow::Borrowed(element.name().as_ref()))?;
    let mut attributes = Attributes::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(syntax)?;
        let key = utf8(Cow::Borrowed(attribute.key.as_ref()))?;
        let value = attribute.unescape_value().map_err(syntax)?;
        attributes.insert(key, value.into_owned());
    }
    Ok((name, attributes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stanza_parse::{Event, EventLog};

    fn events(source: &str) -> Vec<Event> {
        let mut log = EventLog::new();
        XmlReader::new().parse(source, &mut log).unwrap();
        log.significant().cloned().collect()
    }

    #[test]
    fn elements_map_to_contexts() {
        let source = r#"<?xml version="1.0"?>
<config>
  <port>8080</port>
  <item name="a" />
  <!-- note -->
  <text><![CDATA[a < b]]> &amp; c</text>
</config>
"#;
        let attributes: Attributes = [("name".to_string(), "a".to_string())].into();
        assert_eq!(
            events(source),
            vec![
                Event::StartDocument,
                Event::enter("config"),
                Event::enter("port"),
                Event::content("8080"),
                Event::Leave,
                Event::Enter {
                    name: "item".to_string(),
                    attributes
                },
                Event::Leave,
                Event::Comment(" note ".to_string()),
                Event::enter("text"),
                Event::content("a < b"),
                Event::content(" & c"),
                Event::Leave,
                Event::Leave,
                Event::EndDocument,
            ]
        );
    }

    #[test]
    fn comments_around_the_document_element_are_padding() {
        let source = "<!-- header -->\n<doc><a>1</a></doc>\n<!-- trailer -->\n";
        let mut log = EventLog::new();
        XmlReader::new().parse(source, &mut log).unwrap();
        assert_eq!(
            log.significant().cloned().collect::<Vec<_>>(),
            vec![
                Event::StartDocument,
                Event::enter("doc"),
                Event::enter("a"),
                Event::content("1"),
                Event::Leave,
                Event::Leave,
                Event::EndDocument,
            ]
        );
        assert!(log.events().contains(&Event::Ignorable(" header ".to_string())));
        assert!(log.events().contains(&Event::Ignorable(" trailer ".to_string())));
    }

    #[test]
    fn text_outside_the_document_element_is_rejected() {
        let error = XmlReader::new()
            .parse("<doc/>\nstray", &mut EventLog::new())
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Syntax);
        assert_eq!(error.location().map(|l| l.line), Some(1));
    }

    #[test]
    fn malformed_xml_is_a_located_syntax_error() {
        let mut log = EventLog::new();
        let error = XmlReader::new()
            .parse("<a>\n  <b></c>\n</a>", &mut log)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Syntax);
        assert_eq!(error.location().map(|l| l.line), Some(2));
    }

    #[test]
    fn handler_errors_get_the_element_location() {
        struct Refuse;
        impl ContentHandler for Refuse {
            fn enter(&mut self, name: &str, _: &Attributes) -> Result<()> {
                if name == "bad" {
                    return Err(Error::structural("no"));
                }
                Ok(())
            }
            fn leave(&mut self) -> Result<()> {
                Ok(())
            }
            fn content(&mut self, _: &str) -> Result<()> {
                Ok(())
            }
        }
        let error = XmlReader::new()
            .parse("<a>\n <bad/></a>", &mut Refuse)
            .unwrap_err();
        assert_eq!(error.to_string(), "2:1: no");
    }
}
