//! The leaf/branch inference engine shared by all output formats.

use stanza_parse::{
    Attributes, ContentBuffer, ContentHandler, Diagnostics, Error, Location, Locator, Result,
    Warning,
};
use tracing::debug;

/// Output primitives of one format.
///
/// `depth` is the nesting level of the node: 0 for the outermost context,
/// 1 for its children, and so on. Comments get the depth of the nodes they
/// sit between.
pub trait Render {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn enter_branch(&mut self, name: &str, attributes: &Attributes, depth: usize) -> Result<()>;

    fn exit_branch(&mut self, name: &str, depth: usize) -> Result<()>;

    fn enter_leaf(&mut self, name: &str, attributes: &Attributes, depth: usize) -> Result<()>;

    /// The complete content of the current leaf. Empty for empty leaves.
    fn write_content(&mut self, content: &str) -> Result<()>;

    fn exit_leaf(&mut self, name: &str, depth: usize) -> Result<()>;

    fn write_comment(&mut self, comment: &str, depth: usize) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// What the writer knows about the innermost open node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Nothing is open.
    None,
    /// Entered, but neither content nor a child has been seen.
    Pending,
    /// Committed as a node carrying content.
    Leaf,
    /// Committed as a node carrying children.
    Branch,
}

/// A [`ContentHandler`] that renders the event stream through `R`.
///
/// A node is written only once it is known to be a leaf or a branch: the
/// first non-blank content makes it a leaf, a child or a comment makes it a
/// branch, and closing it undecided makes it an empty leaf.
pub struct Writer<R> {
    render: R,
    state: NodeState,
    pending: Option<(String, Attributes)>,
    /// Names of the open nodes, outermost first.
    stack: Vec<String>,
    buffer: ContentBuffer,
    locator: Option<Locator>,
    diagnostics: Diagnostics,
}

impl<R: Render> Writer<R> {
    pub fn new(render: R) -> Self {
        Self {
            render,
            state: NodeState::None,
            pending: None,
            stack: Vec::new(),
            buffer: ContentBuffer::new(),
            locator: None,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_inner(self) -> R {
        self.render
    }

    fn location(&self) -> Option<Location> {
        self.locator.as_ref().map(Locator::location)
    }

    fn fail(&self, message: &str) -> Error {
        Error::structural(message).at_opt(self.location())
    }

    /// Write the pending node as a branch.
    fn resolve_branch(&mut self) -> Result<()> {
        if let Some((name, attributes)) = self.pending.take() {
            self.render
                .enter_branch(&name, &attributes, self.stack.len() - 1)?;
        }
        self.buffer.clear();
        self.state = NodeState::Branch;
        Ok(())
    }

    /// Write the pending node as a leaf.
    fn resolve_leaf(&mut self) -> Result<()> {
        if let Some((name, attributes)) = self.pending.take() {
            self.render
                .enter_leaf(&name, &attributes, self.stack.len() - 1)?;
        }
        self.state = NodeState::Leaf;
        Ok(())
    }

    /// Write the end of the innermost node, deciding its kind if still open.
    fn close_node(&mut self, depth: usize) -> Result<()> {
        if self.state == NodeState::Pending {
            self.resolve_leaf()?;
            self.buffer.clear();
        }
        let name = &self.stack[depth];
        if self.state == NodeState::Leaf {
            let content = self.buffer.flush();
            self.render.write_content(&content)?;
            self.render.exit_leaf(name, depth)
        } else {
            self.buffer.clear();
            self.render.exit_branch(name, depth)
        }
    }
}

impl<R: Render> ContentHandler for Writer<R> {
    fn set_locator(&mut self, locator: Locator) {
        self.locator = Some(locator);
    }

    fn start_document(&mut self) -> Result<()> {
        self.state = NodeState::None;
        self.pending = None;
        self.stack.clear();
        self.buffer.clear();
        self.render.start()
    }

    fn end_document(&mut self) -> Result<()> {
        if !self.stack.is_empty() {
            let warning = Warning::new(format!(
                "{} context(s) were not closed properly.",
                self.stack.len()
            ))
            .at_opt(self.location());
            self.diagnostics.warn(warning);
            while !self.stack.is_empty() {
                self.leave()?;
            }
        }
        self.render.finish()
    }

    fn enter(&mut self, name: &str, attributes: &Attributes) -> Result<()> {
        debug!(name, depth = self.stack.len(), state = ?self.state, "enter");
        match self.state {
            NodeState::None => {
                self.render
                    .enter_branch(name, attributes, self.stack.len())
                    .map_err(|e| e.at_opt(self.location()))?;
                self.stack.push(name.to_string());
                self.state = NodeState::Branch;
                return Ok(());
            }
            NodeState::Pending => self.resolve_branch().map_err(|e| e.at_opt(self.location()))?,
            NodeState::Leaf => {
                return Err(self.fail(&format!(
                    "Cannot open '{name}' inside a node that already has content"
                )));
            }
            NodeState::Branch => {}
        }
        self.buffer.clear();
        self.pending = Some((name.to_string(), attributes.clone()));
        self.stack.push(name.to_string());
        self.state = NodeState::Pending;
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        let Some(depth) = self.stack.len().checked_sub(1) else {
            return Err(self.fail("Attempt to leave context without opening it"));
        };
        let location = self.location();
        self.close_node(depth).map_err(|e| e.at_opt(location))?;

        self.stack.pop();
        self.state = if self.stack.is_empty() {
            NodeState::None
        } else {
            NodeState::Branch
        };
        Ok(())
    }

    fn content(&mut self, text: &str) -> Result<()> {
        let blank = text.chars().all(char::is_whitespace);
        match self.state {
            NodeState::None => Err(self.fail("Content is not allowed here")),
            NodeState::Branch if blank => Ok(()),
            NodeState::Branch => Err(self.fail("Content is not allowed here")),
            NodeState::Pending => {
                if !blank {
                    self.resolve_leaf().map_err(|e| e.at_opt(self.location()))?;
                }
                self.buffer.push(text);
                Ok(())
            }
            NodeState::Leaf => {
                self.buffer.push(text);
                Ok(())
            }
        }
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        match self.state {
            NodeState::None | NodeState::Leaf => Err(self.fail("Comment not allowed here")),
            NodeState::Pending | NodeState::Branch => {
                let location = self.location();
                if self.state == NodeState::Pending {
                    self.resolve_branch().map_err(|e| e.at_opt(location))?;
                }
                self.render
                    .write_comment(text, self.stack.len())
                    .map_err(|e| e.at_opt(location))
            }
        }
    }

    fn warning(&mut self, warning: Warning) {
        self.diagnostics.warn(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every render call as a line of text.
    #[derive(Default)]
    struct Trace(Vec<String>);

    impl Render for Trace {
        fn enter_branch(&mut self, name: &str, _: &Attributes, depth: usize) -> Result<()> {
            self.0.push(format!("{depth} branch {name}"));
            Ok(())
        }
        fn exit_branch(&mut self, name: &str, depth: usize) -> Result<()> {
            self.0.push(format!("{depth} /branch {name}"));
            Ok(())
        }
        fn enter_leaf(&mut self, name: &str, _: &Attributes, depth: usize) -> Result<()> {
            self.0.push(format!("{depth} leaf {name}"));
            Ok(())
        }
        fn write_content(&mut self, content: &str) -> Result<()> {
            self.0.push(format!("content {content:?}"));
            Ok(())
        }
        fn exit_leaf(&mut self, name: &str, depth: usize) -> Result<()> {
            self.0.push(format!("{depth} /leaf {name}"));
            Ok(())
        }
        fn write_comment(&mut self, comment: &str, depth: usize) -> Result<()> {
            self.0.push(format!("{depth} comment {comment}"));
            Ok(())
        }
    }

    fn writer() -> Writer<Trace> {
        let mut writer = Writer::new(Trace::default());
        writer.start_document().unwrap();
        writer.enter("root", &Attributes::new()).unwrap();
        writer
    }

    fn finish(mut writer: Writer<Trace>) -> Vec<String> {
        writer.leave().unwrap();
        writer.end_document().unwrap();
        writer.into_inner().0
    }

    #[test]
    fn content_makes_a_leaf() {
        let mut w = writer();
        w.enter("a", &Attributes::new()).unwrap();
        assert_eq!(w.state(), NodeState::Pending);
        w.content("  ").unwrap();
        assert_eq!(w.state(), NodeState::Pending);
        w.content("5").unwrap();
        assert_eq!(w.state(), NodeState::Leaf);
        w.content(" more").unwrap();
        w.leave().unwrap();
        assert_eq!(w.state(), NodeState::Branch);
        assert_eq!(
            finish(w),
            [
                "0 branch root",
                "1 leaf a",
                "content \"  5 more\"",
                "1 /leaf a",
                "0 /branch root",
            ]
        );
    }

    #[test]
    fn child_makes_a_branch_and_drops_blank_content() {
        let mut w = writer();
        w.enter("a", &Attributes::new()).unwrap();
        w.content("\n   ").unwrap();
        w.enter("b", &Attributes::new()).unwrap();
        w.content("x").unwrap();
        w.leave().unwrap();
        w.content("\n").unwrap();
        w.leave().unwrap();
        assert_eq!(
            finish(w),
            [
                "0 branch root",
                "1 branch a",
                "2 leaf b",
                "content \"x\"",
                "2 /leaf b",
                "1 /branch a",
                "0 /branch root",
            ]
        );
    }

    #[test]
    fn undecided_node_is_an_empty_leaf() {
        let mut w = writer();
        w.enter("empty", &Attributes::new()).unwrap();
        w.content(" ").unwrap();
        w.leave().unwrap();
        assert_eq!(
            finish(w),
            [
                "0 branch root",
                "1 leaf empty",
                "content \"\"",
                "1 /leaf empty",
                "0 /branch root",
            ]
        );
    }

    #[test]
    fn comment_makes_a_branch() {
        let mut w = writer();
        w.enter("a", &Attributes::new()).unwrap();
        w.comment("inside").unwrap();
        w.leave().unwrap();
        w.comment("after").unwrap();
        assert_eq!(
            finish(w),
            [
                "0 branch root",
                "1 branch a",
                "2 comment inside",
                "1 /branch a",
                "1 comment after",
                "0 /branch root",
            ]
        );
    }

    #[test]
    fn structural_faults() {
        let mut w = writer();
        w.enter("a", &Attributes::new()).unwrap();
        w.content("1").unwrap();
        assert_eq!(
            w.comment("no").unwrap_err().message(),
            "Comment not allowed here"
        );
        assert!(w.enter("b", &Attributes::new()).is_err());
        w.leave().unwrap();
        assert_eq!(
            w.content("stray").unwrap_err().message(),
            "Content is not allowed here"
        );
        w.leave().unwrap();
        assert_eq!(
            w.leave().unwrap_err().message(),
            "Attempt to leave context without opening it"
        );
    }

    #[test]
    fn unclosed_nodes_are_closed_with_a_warning() {
        let mut w = writer();
        w.enter("a", &Attributes::new()).unwrap();
        w.end_document().unwrap();
        assert_eq!(w.diagnostics().warning_count(), 1);
        assert_eq!(
            w.into_inner().0.last().map(String::as_str),
            Some("0 /branch root")
        );
    }
}
