//! A cursor that walks a schema tree by name.

use stanza_parse::{Attributes, Error, ErrorKind, Fault};
use tracing::debug;

use crate::Node;
use crate::node::Step;

type Outcome = Result<(), Fault>;

/// Stack-based navigation over a [`Node`] tree.
///
/// The first [`Schema::enter`] must name the root. Every later name is
/// resolved against the innermost open node.
pub struct Schema<'s> {
    root: &'s mut Node,
    /// Route from the parent to each open node; the root's route is empty.
    stack: Vec<Vec<Step>>,
}

impl<'s> Schema<'s> {
    pub fn new(root: &'s mut Node) -> Self {
        Schema {
            root,
            stack: Vec::new(),
        }
    }

    pub fn root(&self) -> &Node {
        &*self.root
    }

    /// Number of open nodes.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The innermost open node.
    pub fn active(&self) -> Option<&Node> {
        if self.stack.is_empty() {
            return None;
        }
        let mut node = &*self.root;
        for step in self.stack.iter().flatten() {
            node = node.step(*step)?;
        }
        Some(node)
    }

    fn active_mut(&mut self) -> Result<&mut Node, Fault> {
        let mut node = &mut *self.root;
        for step in self.stack.iter().flatten() {
            node = node.step_mut(*step).ok_or_else(lost)?;
        }
        Ok(node)
    }

    /// Open the child `name` of the active node, or the root.
    pub fn enter(&mut self, name: &str, attributes: &Attributes) -> Outcome {
        let route = match self.active() {
            Some(parent) => parent.route(name)?,
            None if self.stack.is_empty() => {
                if name != self.root.name() {
                    return Err(Fault::structural(format!("Invalid root context '{name}'")));
                }
                Vec::new()
            }
            None => return Err(lost()),
        };

        let depth = self.stack.len();
        let mut node = self.active_mut()?;
        for step in &route {
            node = node.step_mut(*step).ok_or_else(lost)?;
        }
        debug!(name, resolved = node.name(), depth, "enter");
        let outcome = node.open(attributes);
        if !matches!(outcome, Err(Fault::Fatal(_))) {
            self.stack.push(route);
        }
        outcome
    }

    /// Close the active node.
    ///
    /// Calling this with nothing open is a structural error.
    pub fn leave(&mut self) -> Outcome {
        if self.stack.is_empty() {
            return Err(Fault::structural(
                "Attempt to leave context without opening it",
            ));
        }
        let outcome = self.active_mut()?.close();
        self.stack.pop();
        outcome
    }

    /// Give text to the active node.
    pub fn content(&mut self, text: &str) -> Outcome {
        if self.stack.is_empty() {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(Fault::structural("Content is not allowed here"));
        }
        self.active_mut()?.assign(text)
    }

    /// Close the cursor and reset the tree for a new pass.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.root.reset();
    }

    pub fn validate(&self) -> stanza_parse::Result<()> {
        self.root.validate()
    }
}

fn lost() -> Fault {
    Fault::Fatal(Error::new(
        ErrorKind::Structural,
        "Open context no longer exists in the schema",
    ))
}
