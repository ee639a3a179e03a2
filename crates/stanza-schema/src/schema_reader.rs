//! Replays a bound schema tree as an event stream.

use stanza_parse::{Attributes, ContentHandler, Result};

use crate::Node;

/// Walks a tree and emits the events of a document that would bind the
/// same values.
///
/// Every value becomes one occurrence, lists one occurrence per element, and
/// proxies one occurrence per delegate carrying the selecting attribute.
/// Help text is written as a comment before a node's first occurrence.
/// Fallback children and ignored nodes produce nothing. The tree is not
/// modified.
#[derive(Debug, Clone, Copy)]
pub struct SchemaReader<'n> {
    root: &'n Node,
}

impl<'n> SchemaReader<'n> {
    pub fn new(root: &'n Node) -> Self {
        SchemaReader { root }
    }

    pub fn parse<H: ContentHandler + ?Sized>(&self, handler: &mut H) -> Result<()> {
        handler.start_document()?;
        handler.enter(self.root.name(), self.root.attribute_values())?;
        self.children(self.root, handler)?;
        handler.leave()?;
        handler.end_document()
    }

    fn node<H: ContentHandler + ?Sized>(&self, node: &Node, handler: &mut H) -> Result<()> {
        if node.is_ignore() {
            return Ok(());
        }
        if let Some(help) = node.help_text() {
            handler.comment(&format!(" {help}"))?;
        }
        match node.proxy() {
            Some(proxy) => {
                for delegate in proxy.delegates() {
                    let mut attributes = delegate.attribute_values().clone();
                    attributes.insert(proxy.key().to_string(), delegate.name().to_string());
                    self.occurrences(node.name(), &attributes, delegate, handler)?;
                }
                Ok(())
            }
            None => self.occurrences(node.name(), node.attribute_values(), node, handler),
        }
    }

    fn occurrences<H: ContentHandler + ?Sized>(
        &self,
        name: &str,
        attributes: &Attributes,
        body: &Node,
        handler: &mut H,
    ) -> Result<()> {
        let Some(binding) = body.binding() else {
            return self.occurrence(name, attributes, None, body, handler);
        };
        for value in binding.formatted() {
            self.occurrence(name, attributes, Some(&value), body, handler)?;
        }
        Ok(())
    }

    fn occurrence<H: ContentHandler + ?Sized>(
        &self,
        name: &str,
        attributes: &Attributes,
        content: Option<&str>,
        body: &Node,
        handler: &mut H,
    ) -> Result<()> {
        handler.enter(name, attributes)?;
        if let Some(content) = content {
            handler.content(content)?;
        }
        self.children(body, handler)?;
        handler.leave()
    }

    fn children<H: ContentHandler + ?Sized>(&self, node: &Node, handler: &mut H) -> Result<()> {
        if let Some(group) = node.group() {
            for child in group.children() {
                self.node(child, handler)?;
            }
        }
        Ok(())
    }
}
