//! Schema tree nodes and their per-pass lifecycle.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Shl;

use stanza_parse::{Attributes, Error, ErrorKind, Fault, Result};

use crate::capability::{Binding, Capability, Group, Lookup, Proxy};

/// Maximum number of occurrences of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Limit {
    /// Unbounded for lists, proxies and ignored nodes, otherwise one.
    Derived,
    AtMost(usize),
    Unbounded,
}

/// One step from a node to the node a name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Child(usize),
    Fallback,
    Delegate(usize),
    /// Ignored nodes stand in for all of their descendants.
    Itself,
}

/// A named position in a schema tree.
///
/// A bare node accepts nothing. Capabilities are added with `<<`:
///
/// ```
/// use stanza_schema::{Slot, group, node, value};
///
/// let port = Slot::new(80u16);
/// let server = node("server") << group([node("port") << value(&port)]);
/// assert!(server.child("port").is_some());
/// ```
pub struct Node {
    name: String,
    help: Option<String>,
    min: usize,
    limit: Limit,
    count: usize,
    accepts: BTreeSet<String>,
    attributes: Attributes,
    binding: Option<Box<dyn Binding>>,
    group: Option<Group>,
    proxy: Option<Proxy>,
    ignore: bool,
}

/// A node without capabilities.
pub fn node(name: impl Into<String>) -> Node {
    Node {
        name: name.into(),
        help: None,
        min: 0,
        limit: Limit::Derived,
        count: 0,
        accepts: BTreeSet::new(),
        attributes: Attributes::new(),
        binding: None,
        group: None,
        proxy: None,
        ignore: false,
    }
}

impl<C: Into<Capability>> Shl<C> for Node {
    type Output = Node;

    fn shl(mut self, capability: C) -> Node {
        self.add(capability.into());
        self
    }
}

impl Node {
    /// Widen the node. A capability of a kind already present replaces it.
    pub fn add(&mut self, capability: Capability) {
        match capability {
            Capability::Group(group) => self.group = Some(group),
            Capability::Binding(binding) => self.binding = Some(binding),
            Capability::Proxy(proxy) => self.proxy = Some(proxy),
            Capability::Ignore => self.ignore = true,
        }
    }

    /// Text written as a comment before the node.
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    /// Must occur at least once.
    pub fn required(self) -> Self {
        self.min(1)
    }

    pub fn max(mut self, max: usize) -> Self {
        self.limit = Limit::AtMost(max);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.limit = Limit::Unbounded;
        self
    }

    /// Attribute names this node keeps instead of warning about.
    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepts.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn min_count(&self) -> usize {
        self.min
    }

    /// `None` when unbounded.
    pub fn max_count(&self) -> Option<usize> {
        match self.limit {
            Limit::AtMost(max) => Some(max),
            Limit::Unbounded => None,
            Limit::Derived => {
                let repeats = self.ignore
                    || self.proxy.is_some()
                    || self.binding.as_ref().is_some_and(|b| b.is_list());
                if repeats { None } else { Some(1) }
            }
        }
    }

    /// Occurrences since the enclosing group was last opened.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Accepted attributes of the latest occurrence.
    pub fn attribute_values(&self) -> &Attributes {
        &self.attributes
    }

    pub fn binding(&self) -> Option<&dyn Binding> {
        self.binding.as_deref()
    }

    pub fn group(&self) -> Option<&Group> {
        self.group.as_ref()
    }

    pub fn group_mut(&mut self) -> Option<&mut Group> {
        self.group.as_mut()
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    pub fn is_ignore(&self) -> bool {
        self.ignore
    }

    /// The node content and children go to: the selected delegate of a
    /// proxy, otherwise the node itself.
    pub fn target(&self) -> &Node {
        match self.proxy.as_ref().and_then(Proxy::selected) {
            Some(delegate) => delegate.target(),
            None => self,
        }
    }

    /// The node `name` resolves to below this one.
    pub fn child(&self, name: &str) -> Option<&Node> {
        let mut node = self;
        for step in self.route(name).ok()? {
            node = node.step(step)?;
        }
        Some(node)
    }

    /// Steps from this node to its child `name`, through selected delegates.
    pub(crate) fn route(&self, name: &str) -> std::result::Result<Vec<Step>, Fault> {
        let mut steps = Vec::new();
        let mut node = self;
        while let Some(proxy) = &node.proxy {
            let Some(i) = proxy.selected else {
                return Err(Fault::structural(format!(
                    "In proxy '{}': no delegate selected",
                    node.name
                )));
            };
            steps.push(Step::Delegate(i));
            node = &proxy.delegates[i];
        }
        if node.ignore {
            steps.push(Step::Itself);
            return Ok(steps);
        }
        let lookup = node.group.as_ref().and_then(|group| group.lookup(name));
        match lookup {
            Some(Lookup::Child(i)) => steps.push(Step::Child(i)),
            Some(Lookup::Fallback) => steps.push(Step::Fallback),
            None => {
                return Err(Fault::structural(format!(
                    "Child '{name}' not supported by '{}'",
                    node.name
                )));
            }
        }
        Ok(steps)
    }

    pub(crate) fn step(&self, step: Step) -> Option<&Node> {
        match step {
            Step::Child(i) => self.group.as_ref()?.children.get(i),
            Step::Fallback => self.group.as_ref()?.fallback.as_deref(),
            Step::Delegate(i) => self.proxy.as_ref()?.delegates.get(i),
            Step::Itself => Some(self),
        }
    }

    pub(crate) fn step_mut(&mut self, step: Step) -> Option<&mut Node> {
        match step {
            Step::Child(i) => self.group.as_mut()?.children.get_mut(i),
            Step::Fallback => self.group.as_mut()?.fallback.as_deref_mut(),
            Step::Delegate(i) => self.proxy.as_mut()?.delegates.get_mut(i),
            Step::Itself => Some(self),
        }
    }

    /// Begin an occurrence of this node.
    ///
    /// Counts the occurrence, rewinds the children's counters and keeps the
    /// declared attributes. Undeclared attributes are reported as one
    /// recoverable fault once the node is open.
    pub fn open(&mut self, attributes: &Attributes) -> std::result::Result<(), Fault> {
        if let Some(max) = self.max_count() {
            if self.count >= max {
                return Err(Fault::fatal(
                    ErrorKind::OccurrenceLimitExceeded,
                    format!("'{}' may occur at most {max} time(s)", self.name),
                ));
            }
        }

        if let Some(proxy) = &mut self.proxy {
            let Some(choice) = attributes.get(&proxy.key) else {
                return Err(Fault::structural(format!(
                    "In proxy '{}': missing mandatory attribute '{}'",
                    self.name, proxy.key
                )));
            };
            let Some(i) = proxy.delegates.iter().position(|d| d.name == *choice) else {
                return Err(Fault::structural(format!(
                    "In proxy '{}': no such delegate '{choice}'",
                    self.name
                )));
            };
            self.count += 1;
            let mut rest = attributes.clone();
            rest.remove(&proxy.key);
            proxy.selected = Some(i);
            return proxy.delegates[i].open(&rest);
        }

        self.count += 1;
        if let Some(group) = &mut self.group {
            group.children.iter_mut().for_each(Node::rewind);
            if let Some(fallback) = &mut group.fallback {
                fallback.rewind();
            }
        }
        if let Some(binding) = &mut self.binding {
            binding.open();
        }
        self.attributes.clear();
        if self.ignore {
            return Ok(());
        }

        let mut ignored = Vec::new();
        for (key, value) in attributes {
            if self.accepts.contains(key) {
                self.attributes.insert(key.clone(), value.clone());
            } else {
                ignored.push(format!("'{key}' ('{value}')"));
            }
        }
        if ignored.is_empty() {
            Ok(())
        } else {
            Err(Fault::warning(format!(
                "Ignored attributes: {}",
                ignored.join(", ")
            )))
        }
    }

    /// End the current occurrence and check the children's minimum counts.
    pub fn close(&mut self) -> std::result::Result<(), Fault> {
        if let Some(proxy) = &mut self.proxy {
            return match proxy.selected.take() {
                Some(i) => proxy.delegates[i].close(),
                None => Ok(()),
            };
        }
        if let Some(binding) = &mut self.binding {
            binding.close();
        }
        if let Some(group) = &self.group {
            if let Some(child) = group.children.iter().find(|c| c.count < c.min) {
                return Err(Fault::fatal(
                    ErrorKind::MissingOccurrence,
                    format!(
                        "'{}' must occur at least {} time(s) in '{}'",
                        child.name, child.min, self.name
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Convert and store content of the current occurrence.
    ///
    /// Whitespace-only text is dropped.
    pub fn assign(&mut self, text: &str) -> std::result::Result<(), Fault> {
        if let Some(proxy) = &mut self.proxy {
            return match proxy.selected {
                Some(i) => proxy.delegates[i].assign(text),
                None => Err(Fault::structural(format!(
                    "In proxy '{}': no delegate selected",
                    self.name
                ))),
            };
        }
        if self.ignore || text.trim().is_empty() {
            return Ok(());
        }
        match &mut self.binding {
            Some(binding) => binding.assign(text).map_err(|reason| {
                Fault::fatal(
                    ErrorKind::Conversion,
                    format!("Invalid content for '{}': {reason}", self.name),
                )
            }),
            None => Err(Fault::structural(format!(
                "Context '{}' does not support content",
                self.name
            ))),
        }
    }

    /// Forget the counters and selections of the current pass.
    pub fn rewind(&mut self) {
        self.count = 0;
        if let Some(group) = &mut self.group {
            group.children.iter_mut().for_each(Node::rewind);
            if let Some(fallback) = &mut group.fallback {
                fallback.rewind();
            }
        }
        if let Some(proxy) = &mut self.proxy {
            proxy.selected = None;
            proxy.delegates.iter_mut().for_each(Node::rewind);
        }
    }

    /// Prepare for a new pass: clear counters, lists, attributes and
    /// selections. Scalar values are kept.
    pub fn reset(&mut self) {
        self.count = 0;
        self.attributes.clear();
        if let Some(binding) = &mut self.binding {
            binding.reset();
        }
        if let Some(group) = &mut self.group {
            group.children.iter_mut().for_each(Node::reset);
            if let Some(fallback) = &mut group.fallback {
                fallback.reset();
            }
        }
        if let Some(proxy) = &mut self.proxy {
            proxy.selected = None;
            proxy.delegates.iter_mut().for_each(Node::reset);
        }
    }

    /// Check the minimum counts of every node below an occurrence.
    pub fn validate(&self) -> Result<()> {
        if let Some(group) = &self.group {
            for child in &group.children {
                if child.count < child.min {
                    return Err(Error::new(
                        ErrorKind::MissingOccurrence,
                        format!(
                            "'{}' must occur at least {} time(s) in '{}'",
                            child.name, child.min, self.name
                        ),
                    ));
                }
                if child.count > 0 {
                    child.validate()?;
                }
            }
        }
        if let Some(proxy) = &self.proxy {
            for delegate in proxy.delegates.iter().filter(|d| d.count > 0) {
                delegate.validate()?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("count", &self.count)
            .field("min", &self.min)
            .field("max", &self.max_count())
            .field("group", &self.group)
            .field("proxy", &self.proxy)
            .field("ignore", &self.ignore)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Map, Slot, group, ignore, list, proxy, value, value_with};

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn fatal_kind(fault: Fault) -> ErrorKind {
        match fault {
            Fault::Fatal(error) => error.kind(),
            Fault::Recoverable(warning) => panic!("expected an error, got warning {warning}"),
        }
    }

    #[test]
    fn capabilities_accumulate() {
        let slot = Slot::new(0i32);
        let n = node("n") << value(&slot) << group([node("c")]);
        assert!(n.binding().is_some());
        assert!(n.group().is_some_and(|g| g.contains("c")));
        assert_eq!(n.max_count(), Some(1));
    }

    #[test]
    fn lists_and_proxies_repeat_by_default() {
        let items: Slot<Vec<i32>> = Slot::default();
        assert_eq!((node("l") << list(&items)).max_count(), None);
        assert_eq!((node("p") << proxy("key", [])).max_count(), None);
        assert_eq!((node("i") << ignore()).max_count(), None);
        assert_eq!(node("n").max(3).max_count(), Some(3));
    }

    #[test]
    fn lookup_prefers_names_then_aliases_then_fallback() {
        let tree = node("root")
            << group([node("alpha"), node("beta")])
                .alias("a", "alpha")
                .fallback(node("other") << ignore());
        assert_eq!(tree.child("alpha").map(Node::name), Some("alpha"));
        assert_eq!(tree.child("a").map(Node::name), Some("alpha"));
        assert_eq!(tree.child("zeta").map(Node::name), Some("other"));
        assert_eq!(tree.child("zeta").and_then(|n| n.child("deep")).map(Node::name), Some("other"));
    }

    #[test]
    fn unknown_children_name_both_sides() {
        let tree = node("root") << group([node("alpha")]);
        let fault = tree.route("beta").unwrap_err();
        assert_eq!(fault.to_string(), "Child 'beta' not supported by 'root'");
    }

    #[test]
    fn occurrence_limit() {
        let mut n = node("once");
        n.open(&Attributes::new()).unwrap();
        n.close().unwrap();
        let fault = n.open(&Attributes::new()).unwrap_err();
        assert_eq!(fatal_kind(fault), ErrorKind::OccurrenceLimitExceeded);
        n.rewind();
        assert!(n.open(&Attributes::new()).is_ok());
    }

    #[test]
    fn undeclared_attributes_warn_once() {
        let mut n = node("n").attributes(["kept"]);
        let fault = n
            .open(&attrs(&[("kept", "1"), ("x", "2"), ("y", "3")]))
            .unwrap_err();
        assert_eq!(
            fault,
            Fault::warning("Ignored attributes: 'x' ('2'), 'y' ('3')")
        );
        assert_eq!(n.attribute_values(), &attrs(&[("kept", "1")]));
    }

    #[test]
    fn lists_append_per_occurrence() {
        let items: Slot<Vec<i32>> = Slot::default();
        let mut n = node("item") << list(&items);
        for text in ["1", "", "3"] {
            n.open(&Attributes::new()).unwrap();
            n.assign(text).unwrap();
            n.close().unwrap();
        }
        assert_eq!(items.get(), vec![1, 0, 3]);
        n.reset();
        assert!(items.get().is_empty());
    }

    #[test]
    fn values_survive_reset() {
        let port = Slot::new(80u16);
        let mut n = node("port") << value(&port);
        n.open(&Attributes::new()).unwrap();
        n.assign("8080").unwrap();
        n.reset();
        assert_eq!(port.get(), 8080);
    }

    #[test]
    fn empty_occurrences_take_the_converter_default() {
        let level = Slot::new(0u8);
        let levels = Map::new().entry("low", 1).entry("high", 3).default_entry(2);
        let mut n = node("level").max(2) << value_with(&level, levels);
        n.open(&Attributes::new()).unwrap();
        n.assign("high").unwrap();
        n.close().unwrap();
        assert_eq!(level.get(), 3);
        n.open(&Attributes::new()).unwrap();
        n.assign("  ").unwrap();
        n.close().unwrap();
        assert_eq!(level.get(), 2);

        let verbose = Slot::new(true);
        let mut n = node("verbose") << value_with(&verbose, Map::bool());
        n.open(&Attributes::new()).unwrap();
        n.close().unwrap();
        assert!(!verbose.get());
    }

    #[test]
    fn conversion_failures_are_fatal() {
        let flag = Slot::new(false);
        let mut n = node("flag") << value_with(&flag, Map::bool());
        n.open(&Attributes::new()).unwrap();
        let fault = n.assign("perhaps").unwrap_err();
        assert!(fault.to_string().starts_with("Invalid content for 'flag': unknown token 'perhaps'"));
        assert_eq!(fatal_kind(fault), ErrorKind::Conversion);
    }

    #[test]
    fn content_needs_a_binding() {
        let mut n = node("n") << group([]);
        assert!(n.assign("  \n").is_ok());
        assert_eq!(
            n.assign("x").unwrap_err().to_string(),
            "Context 'n' does not support content"
        );
    }

    #[test]
    fn groups_check_minimum_counts_on_close() {
        let mut n = node("g") << group([node("needed").required()]);
        n.open(&Attributes::new()).unwrap();
        let fault = n.close().unwrap_err();
        assert_eq!(fault.to_string(), "'needed' must occur at least 1 time(s) in 'g'");
        assert_eq!(fatal_kind(fault), ErrorKind::MissingOccurrence);
    }

    #[test]
    fn proxy_selects_a_delegate() {
        let a = Slot::new(0i32);
        let b = Slot::new(0i32);
        let mut p = node("item")
            << proxy("name", [node("a") << value(&a), node("b") << value(&b)]);

        let fault = p.open(&Attributes::new()).unwrap_err();
        assert_eq!(
            fault.to_string(),
            "In proxy 'item': missing mandatory attribute 'name'"
        );
        let fault = p.open(&attrs(&[("name", "c")])).unwrap_err();
        assert_eq!(fault.to_string(), "In proxy 'item': no such delegate 'c'");
        assert_eq!(p.count(), 0);

        p.open(&attrs(&[("name", "b")])).unwrap();
        assert_eq!(p.count(), 1);
        assert_eq!(p.target().name(), "b");
        p.assign("7").unwrap();
        p.close().unwrap();
        assert_eq!((a.get(), b.get()), (0, 7));
        assert!(p.proxy().and_then(Proxy::selected).is_none());
        assert!(p.assign("1").is_err());
    }

    #[test]
    fn translate_is_atomic() {
        let mut g = group([node("a"), node("b"), node("c")]).alias("first", "a");
        assert!(g.translate(&[("a", "b")]).is_err());
        assert!(g.translate(&[("zz", "y")]).is_err());
        assert!(g.contains("a") && g.contains("b"));

        g.translate(&[("a", "x"), ("b", "a")]).unwrap();
        let names: Vec<_> = g.children().map(Node::name).collect();
        assert_eq!(names, ["x", "a", "c"]);
        assert_eq!(g.get("first").map(Node::name), Some("x"));
    }
}
