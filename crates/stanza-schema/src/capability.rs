//! The capabilities a [`Node`] can be widened with.

use std::collections::{HashMap, HashSet};
use std::fmt;

use stanza_parse::{Error, Result};

use crate::Node;
use crate::convert::{Convert, Map, Parsed, Slot, Verbatim};

/// Something that can be added to a node with `node << capability`.
pub enum Capability {
    Group(Group),
    Binding(Box<dyn Binding>),
    Proxy(Proxy),
    Ignore,
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Group(group) => fmt::Debug::fmt(group, f),
            Capability::Binding(binding) => write!(f, "Binding(list: {})", binding.is_list()),
            Capability::Proxy(proxy) => fmt::Debug::fmt(proxy, f),
            Capability::Ignore => f.write_str("Ignore"),
        }
    }
}

impl From<Group> for Capability {
    fn from(group: Group) -> Self {
        Capability::Group(group)
    }
}

impl From<Proxy> for Capability {
    fn from(proxy: Proxy) -> Self {
        Capability::Proxy(proxy)
    }
}

/// Connection between a node's content and a host destination.
pub trait Binding {
    /// A new occurrence of the node begins.
    fn open(&mut self) {}

    /// Store converted content. Returns the conversion failure reason.
    fn assign(&mut self, text: &str) -> std::result::Result<(), String>;

    /// The current occurrence ends.
    fn close(&mut self) {}

    /// Forget data accumulated by earlier passes.
    fn reset(&mut self) {}

    /// Content to write, one entry per occurrence.
    fn formatted(&self) -> Vec<String>;

    /// Whether every occurrence adds a value.
    fn is_list(&self) -> bool {
        false
    }
}

struct ValueBinding<C: Convert> {
    slot: Slot<C::Output>,
    convert: C,
    /// The current occurrence carried content.
    assigned: bool,
}

impl<C: Convert> Binding for ValueBinding<C> {
    fn open(&mut self) {
        self.assigned = false;
    }

    fn assign(&mut self, text: &str) -> std::result::Result<(), String> {
        let value = self.convert.parse(text)?;
        self.slot.set(value);
        self.assigned = true;
        Ok(())
    }

    fn close(&mut self) {
        if !self.assigned {
            self.slot.set(self.convert.default_value());
        }
        self.assigned = false;
    }

    fn formatted(&self) -> Vec<String> {
        vec![self.convert.format(&self.slot.borrow())]
    }
}

struct ListBinding<C: Convert> {
    slot: Slot<Vec<C::Output>>,
    convert: C,
    /// The current occurrence already added its element.
    appended: bool,
}

impl<C: Convert> Binding for ListBinding<C> {
    fn open(&mut self) {
        self.appended = false;
    }

    fn assign(&mut self, text: &str) -> std::result::Result<(), String> {
        let value = self.convert.parse(text)?;
        let mut list = self.slot.borrow_mut();
        if self.appended {
            if let Some(last) = list.last_mut() {
                *last = value;
                return Ok(());
            }
        }
        list.push(value);
        self.appended = true;
        Ok(())
    }

    fn close(&mut self) {
        if !self.appended {
            self.slot.borrow_mut().push(self.convert.default_value());
        }
        self.appended = false;
    }

    fn reset(&mut self) {
        self.slot.borrow_mut().clear();
        self.appended = false;
    }

    fn formatted(&self) -> Vec<String> {
        self.slot
            .borrow()
            .iter()
            .map(|value| self.convert.format(value))
            .collect()
    }

    fn is_list(&self) -> bool {
        true
    }
}

/// Bind content to `slot`, parsed with `FromStr`.
pub fn value<T>(slot: &Slot<T>) -> Capability
where
    T: std::str::FromStr + fmt::Display + Default + 'static,
    T::Err: fmt::Display,
{
    value_with(slot, Parsed::new())
}

/// Bind content to `slot` through a custom converter.
pub fn value_with<C: Convert + 'static>(slot: &Slot<C::Output>, convert: C) -> Capability {
    Capability::Binding(Box::new(ValueBinding {
        slot: slot.clone(),
        convert,
        assigned: false,
    }))
}

/// Bind content to a string slot without trimming.
pub fn text(slot: &Slot<String>) -> Capability {
    value_with(slot, Verbatim)
}

/// Bind content to a `bool` slot using [`Map::bool`].
pub fn flag(slot: &Slot<bool>) -> Capability {
    value_with(slot, Map::bool())
}

/// Append the content of every occurrence to `slot`.
pub fn list<T>(slot: &Slot<Vec<T>>) -> Capability
where
    T: std::str::FromStr + fmt::Display + Default + 'static,
    T::Err: fmt::Display,
{
    list_with(slot, Parsed::new())
}

pub fn list_with<C: Convert + 'static>(slot: &Slot<Vec<C::Output>>, convert: C) -> Capability {
    Capability::Binding(Box::new(ListBinding {
        slot: slot.clone(),
        convert,
        appended: false,
    }))
}

/// Accept any child, content, or attribute and keep none of it.
pub fn ignore() -> Capability {
    Capability::Ignore
}

/// Ordered children, looked up by name.
pub fn group(children: impl IntoIterator<Item = Node>) -> Group {
    let mut group = Group::default();
    group.set_children(children);
    group
}

/// Impersonate one of `delegates`, chosen by the value of attribute `key`.
pub fn proxy(key: impl Into<String>, delegates: impl IntoIterator<Item = Node>) -> Proxy {
    Proxy {
        key: key.into(),
        delegates: delegates.into_iter().collect(),
        selected: None,
    }
}

/// Named children of a node, in insertion order.
#[derive(Debug, Default)]
pub struct Group {
    pub(crate) children: Vec<Node>,
    index: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    pub(crate) fallback: Option<Box<Node>>,
}

/// Where a child lookup in a [`Group`] ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    Child(usize),
    Fallback,
}

impl Group {
    /// Child used for names that match no child or alias.
    pub fn fallback(mut self, node: Node) -> Self {
        self.fallback = Some(Box::new(node));
        self
    }

    /// Let `alias` find the child called `target`.
    pub fn alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }

    /// Replace all children.
    pub fn set_children(&mut self, children: impl IntoIterator<Item = Node>) {
        self.children.clear();
        self.index.clear();
        for child in children {
            self.insert(child);
        }
    }

    /// Add a child, replacing one with the same name in place.
    pub fn insert(&mut self, child: Node) {
        match self.index.get(child.name()) {
            Some(&i) => self.children[i] = child,
            None => {
                self.index.insert(child.name().to_string(), self.children.len());
                self.children.push(child);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.position(name).map(|i| &self.children[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.position(name).map(|i| &mut self.children[i])
    }

    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter()
    }

    pub fn fallback_child(&self) -> Option<&Node> {
        self.fallback.as_deref()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied().or_else(|| {
            self.aliases
                .get(name)
                .and_then(|target| self.index.get(target).copied())
        })
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Lookup> {
        match self.position(name) {
            Some(i) => Some(Lookup::Child(i)),
            None => self.fallback.as_ref().map(|_| Lookup::Fallback),
        }
    }

    /// Rename children, for example to read another dialect of a document.
    ///
    /// Fails without renaming anything if an old name is unknown or two
    /// children would end up with the same name.
    pub fn translate(&mut self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut names: Vec<String> = self.children.iter().map(|c| c.name().to_string()).collect();
        for &(old, new) in pairs {
            let Some(&i) = self.index.get(old) else {
                return Err(Error::structural(format!(
                    "Cannot translate unknown child '{old}'"
                )));
            };
            names[i] = new.to_string();
        }

        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(Error::structural(format!(
                    "Translation conflict: more than one child called '{name}'"
                )));
            }
        }

        for (child, name) in self.children.iter_mut().zip(names) {
            child.rename(name);
        }
        for target in self.aliases.values_mut() {
            if let Some(&(_, new)) = pairs.iter().find(|(old, _)| *old == target.as_str()) {
                *target = new.to_string();
            }
        }
        self.index = self
            .children
            .iter()
            .enumerate()
            .map(|(i, child)| (child.name().to_string(), i))
            .collect();
        Ok(())
    }
}

/// A node standing in for one of several delegates.
#[derive(Debug)]
pub struct Proxy {
    pub(crate) key: String,
    pub(crate) delegates: Vec<Node>,
    /// Valid between `open` and `close` only.
    pub(crate) selected: Option<usize>,
}

impl Proxy {
    /// The attribute that selects the delegate.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn delegates(&self) -> impl Iterator<Item = &Node> {
        self.delegates.iter()
    }

    pub fn selected(&self) -> Option<&Node> {
        self.selected.and_then(|i| self.delegates.get(i))
    }

    pub fn delegate(&self, name: &str) -> Option<&Node> {
        self.delegates.iter().find(|d| d.name() == name)
    }
}
